//! Manager that mirrors every successful change to the task file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::lock::FileLock;
use crate::manager::{InMemoryTaskManager, TaskManager};
use crate::storage::{Storage, TaskRecord};
use crate::task::{Entity, Epic, Subtask, Task, TaskId, TaskStatus};

/// [`InMemoryTaskManager`] plus a JSON Lines file rewritten after each mutation.
///
/// Failed operations never touch the file. View history is not persisted.
#[derive(Debug, Clone)]
pub struct FileBackedTaskManager {
    inner: InMemoryTaskManager,
    storage: Storage,
    guard: Option<Arc<FileLock>>,
}

impl FileBackedTaskManager {
    /// Empty manager writing to `path`
    pub fn new(path: impl Into<PathBuf>, config: &Config) -> Self {
        Self {
            inner: InMemoryTaskManager::with_history_config(&config.history),
            storage: Storage::new(path, config.storage.lock_timeout_ms),
            guard: None,
        }
    }

    /// Like [`FileBackedTaskManager::load`], but holds the task file lock
    /// until the manager (and every clone of it) is dropped.
    ///
    /// Another process opening the same file waits for it, so its load
    /// always sees this manager's last save.
    pub fn open_exclusive(path: impl Into<PathBuf>, config: &Config) -> Result<Self> {
        let mut manager = Self::new(path, config);
        let guard = FileLock::acquire(
            manager.storage.lock_path(),
            manager.storage.lock_timeout_ms(),
        )?;
        debug!(path = %manager.storage.path().display(), "task file locked for this session");
        manager.storage = manager.storage.with_lock_held();
        manager.guard = Some(Arc::new(guard));
        manager.restore()
    }

    /// Restore a manager from `path`.
    ///
    /// A missing or empty file gives an empty manager. Records are re-added in
    /// file order, so epic state is derived again from the restored subtasks.
    pub fn load(path: impl Into<PathBuf>, config: &Config) -> Result<Self> {
        Self::new(path, config).restore()
    }

    /// Whether this manager holds the task file lock
    pub fn is_exclusive(&self) -> bool {
        self.guard.is_some()
    }

    fn restore(mut self) -> Result<Self> {
        let records = self.storage.read_numbered_records()?;

        let mut max_id: TaskId = 0;
        for (line, record) in records {
            max_id = max_id.max(record.id);
            let entity = record.into_entity().map_err(|err| at_line(line, err))?;
            self.inner.add(entity).map_err(|err| at_line(line, err))?;
        }
        self.inner.advance_counter(max_id);

        info!(
            path = %self.storage.path().display(),
            tasks = self.inner.tasks().len(),
            epics = self.inner.epics().len(),
            subtasks = self.inner.subtasks().len(),
            "board loaded"
        );
        Ok(self)
    }

    pub fn path(&self) -> &Path {
        self.storage.path()
    }

    /// The wrapped in-memory manager
    pub fn inner(&self) -> &InMemoryTaskManager {
        &self.inner
    }

    /// Rewrite the task file: tasks, then epics, then subtasks.
    pub fn save(&self) -> Result<()> {
        let records: Vec<TaskRecord> = self
            .inner
            .tasks()
            .iter()
            .map(TaskRecord::from)
            .chain(self.inner.epics().iter().map(TaskRecord::from))
            .chain(self.inner.subtasks().iter().map(TaskRecord::from))
            .collect();
        self.storage.write_records(&records)
    }

    fn saved(&self, result: Result<()>) -> Result<()> {
        result?;
        self.save()
    }
}

/// Tag a restore failure with the offending line.
fn at_line(line: usize, err: Error) -> Error {
    match err {
        Error::MalformedInput(message) => Error::MalformedInput(format!("line {line}: {message}")),
        Error::NotFound(id) => {
            Error::MalformedInput(format!("line {line}: references missing epic {id}"))
        }
        Error::TimeConflict { id, conflicting_id } => Error::MalformedInput(format!(
            "line {line}: task {id} overlaps task {conflicting_id}"
        )),
        other => other,
    }
}

impl TaskManager for FileBackedTaskManager {
    fn create_task(&mut self, name: &str, description: &str) -> Task {
        self.inner.create_task(name, description)
    }

    fn create_epic(&mut self, name: &str, description: &str) -> Epic {
        self.inner.create_epic(name, description)
    }

    fn create_subtask(&mut self, epic_id: TaskId, name: &str, description: &str) -> Subtask {
        self.inner.create_subtask(epic_id, name, description)
    }

    fn add_task(&mut self, task: Task) -> Result<()> {
        let result = self.inner.add_task(task);
        self.saved(result)
    }

    fn add_epic(&mut self, epic: Epic) -> Result<()> {
        let result = self.inner.add_epic(epic);
        self.saved(result)
    }

    fn add_subtask(&mut self, subtask: Subtask) -> Result<()> {
        let result = self.inner.add_subtask(subtask);
        self.saved(result)
    }

    fn update_task(&mut self, task: Task) -> Result<()> {
        let result = self.inner.update_task(task);
        self.saved(result)
    }

    fn update_epic(&mut self, epic: Epic) -> Result<()> {
        let result = self.inner.update_epic(epic);
        self.saved(result)
    }

    fn update_subtask(&mut self, subtask: Subtask) -> Result<()> {
        let result = self.inner.update_subtask(subtask);
        self.saved(result)
    }

    fn set_status(&mut self, id: TaskId, status: TaskStatus) -> Result<()> {
        let result = self.inner.set_status(id, status);
        self.saved(result)
    }

    fn get_by_id(&mut self, id: TaskId) -> Result<Entity> {
        self.inner.get_by_id(id)
    }

    fn delete_by_id(&mut self, id: TaskId) -> Result<()> {
        let result = self.inner.delete_by_id(id);
        self.saved(result)
    }

    fn delete_all_tasks(&mut self) -> Result<()> {
        let result = self.inner.delete_all_tasks();
        self.saved(result)
    }

    fn delete_all_subtasks(&mut self) -> Result<()> {
        let result = self.inner.delete_all_subtasks();
        self.saved(result)
    }

    fn delete_all_epics(&mut self) -> Result<()> {
        let result = self.inner.delete_all_epics();
        self.saved(result)
    }

    fn tasks(&self) -> Vec<Task> {
        self.inner.tasks()
    }

    fn epics(&self) -> Vec<Epic> {
        self.inner.epics()
    }

    fn subtasks(&self) -> Vec<Subtask> {
        self.inner.subtasks()
    }

    fn epic_subtasks(&self, epic_id: TaskId) -> Result<Vec<Subtask>> {
        self.inner.epic_subtasks(epic_id)
    }

    fn prioritized(&self) -> Vec<Entity> {
        self.inner.prioritized()
    }

    fn history(&self) -> Vec<Entity> {
        self.inner.history()
    }
}
