//! Storage layer for kanban
//!
//! The whole board lives in one JSON Lines file, one [`TaskRecord`] per line:
//!
//! ```text
//! .kanban/
//!   tasks.jsonl         # tasks, then epics, then subtasks
//!   tasks.jsonl.lock    # advisory lock held while reading or rewriting
//! ```
//!
//! Every save rewrites the file atomically under the lock.

use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::lock::{self, DEFAULT_LOCK_TIMEOUT_MS};
use crate::task::{Entity, Epic, Subtask, Task, TaskId, TaskKind, TaskStatus};

/// Default data directory under the working directory
pub const DATA_DIR: &str = ".kanban";

/// Default task file name inside [`DATA_DIR`]
pub const TASKS_FILE: &str = "tasks.jsonl";

// =============================================================================
// Records
// =============================================================================

/// Serialized form of one entity.
///
/// For epics, `status`, the times and `subtask_ids` are informational; they
/// are derived again from the subtasks on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub kind: TaskKind,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub duration_minutes: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epic_id: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtask_ids: Vec<TaskId>,
}

impl From<&Entity> for TaskRecord {
    fn from(entity: &Entity) -> Self {
        TaskRecord {
            id: entity.id(),
            kind: entity.kind(),
            name: entity.name().to_string(),
            description: entity.description().to_string(),
            status: entity.status(),
            start_time: entity.start_time(),
            end_time: entity.end_time(),
            duration_minutes: entity.duration().num_minutes(),
            epic_id: entity.epic_id(),
            subtask_ids: entity
                .as_epic()
                .map(|epic| epic.subtask_ids().to_vec())
                .unwrap_or_default(),
        }
    }
}

impl From<&Task> for TaskRecord {
    fn from(task: &Task) -> Self {
        TaskRecord::from(&Entity::Task(task.clone()))
    }
}

impl From<&Epic> for TaskRecord {
    fn from(epic: &Epic) -> Self {
        TaskRecord::from(&Entity::Epic(epic.clone()))
    }
}

impl From<&Subtask> for TaskRecord {
    fn from(subtask: &Subtask) -> Self {
        TaskRecord::from(&Entity::Subtask(subtask.clone()))
    }
}

impl TaskRecord {
    /// Rebuild the entity this record describes.
    pub fn into_entity(self) -> Result<Entity> {
        if self.duration_minutes < 0 {
            return Err(Error::MalformedInput(format!(
                "{} {} has a negative duration",
                self.kind, self.id
            )));
        }
        let duration = Duration::try_minutes(self.duration_minutes).ok_or_else(|| {
            Error::MalformedInput(format!("{} {} has an oversized duration", self.kind, self.id))
        })?;

        let entity = match self.kind {
            TaskKind::Task => {
                let mut task = Task::new(self.id, self.name, self.description)
                    .with_status(self.status);
                task.start_time = self.start_time;
                task.duration = duration;
                Entity::Task(task)
            }
            TaskKind::Epic => Entity::Epic(Epic::new(self.id, self.name, self.description)),
            TaskKind::Subtask => {
                let epic_id = self.epic_id.ok_or_else(|| {
                    Error::MalformedInput(format!("subtask {} has no epic_id", self.id))
                })?;
                let mut subtask = Subtask::new(epic_id, self.id, self.name, self.description)
                    .with_status(self.status);
                subtask.start_time = self.start_time;
                subtask.duration = duration;
                Entity::Subtask(subtask)
            }
        };
        entity.validate()?;
        Ok(entity)
    }
}

// =============================================================================
// Task file
// =============================================================================

/// Handle on the JSON Lines task file
#[derive(Debug, Clone)]
pub struct Storage {
    path: PathBuf,
    lock_timeout_ms: u64,
    lock_held: bool,
}

impl Storage {
    pub fn new(path: impl Into<PathBuf>, lock_timeout_ms: u64) -> Self {
        Self {
            path: path.into(),
            lock_timeout_ms,
            lock_held: false,
        }
    }

    /// The caller holds the lock on [`Storage::lock_path`]; reads and writes skip it.
    pub fn with_lock_held(mut self) -> Self {
        self.lock_held = true;
        self
    }

    pub fn lock_timeout_ms(&self) -> u64 {
        self.lock_timeout_ms
    }

    /// Default task file under `dir`
    pub fn for_dir(dir: &Path) -> Self {
        Self::new(dir.join(DATA_DIR).join(TASKS_FILE), DEFAULT_LOCK_TIMEOUT_MS)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> PathBuf {
        lock::lock_path_for(&self.path)
    }

    /// Read every record in file order. A missing file yields no records.
    pub fn read_records(&self) -> Result<Vec<TaskRecord>> {
        Ok(self
            .read_numbered_records()?
            .into_iter()
            .map(|(_, record)| record)
            .collect())
    }

    /// Like [`Storage::read_records`], paired with 1-based line numbers.
    pub fn read_numbered_records(&self) -> Result<Vec<(usize, TaskRecord)>> {
        let content = if self.lock_held {
            lock::read_str(&self.path)?
        } else {
            lock::read_locked_str(&self.path, self.lock_timeout_ms)?
        };
        let Some(content) = content else {
            return Ok(Vec::new());
        };

        let mut records = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record: TaskRecord = serde_json::from_str(line).map_err(|err| {
                Error::MalformedInput(format!(
                    "{}:{}: {}",
                    self.path.display(),
                    idx + 1,
                    err
                ))
            })?;
            records.push((idx + 1, record));
        }

        info!(path = %self.path.display(), records = records.len(), "task file read");
        Ok(records)
    }

    /// Replace the file with `records`, one per line.
    pub fn write_records(&self, records: &[TaskRecord]) -> Result<()> {
        let mut content = String::new();
        for record in records {
            content.push_str(&serde_json::to_string(record)?);
            content.push('\n');
        }
        if self.lock_held {
            lock::write_atomic(&self.path, content.as_bytes())?;
        } else {
            lock::write_atomic_locked(&self.path, content.as_bytes(), self.lock_timeout_ms)?;
        }

        info!(path = %self.path.display(), records = records.len(), "task file written");
        Ok(())
    }
}
