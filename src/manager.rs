//! Task manager: the single entry point over tasks, epics and subtasks.
//!
//! [`InMemoryTaskManager`] owns three identity maps plus the [`Scheduler`]
//! and the [`History`]. Every mutation validates first and commits after,
//! so a failed call leaves all indexes as they were.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::config::HistoryConfig;
use crate::error::{Error, Result};
use crate::history::History;
use crate::schedule::Scheduler;
use crate::task::{Entity, Epic, Subtask, Task, TaskId, TaskKind, TaskStatus};

/// Operations shared by every manager implementation
pub trait TaskManager {
    /// New, unindexed task with the next id
    fn create_task(&mut self, name: &str, description: &str) -> Task;

    /// New, unindexed epic with the next id
    fn create_epic(&mut self, name: &str, description: &str) -> Epic;

    /// New, unindexed subtask of `epic_id` with the next id
    fn create_subtask(&mut self, epic_id: TaskId, name: &str, description: &str) -> Subtask;

    fn add_task(&mut self, task: Task) -> Result<()>;
    fn add_epic(&mut self, epic: Epic) -> Result<()>;
    fn add_subtask(&mut self, subtask: Subtask) -> Result<()>;

    fn update_task(&mut self, task: Task) -> Result<()>;
    fn update_epic(&mut self, epic: Epic) -> Result<()>;
    fn update_subtask(&mut self, subtask: Subtask) -> Result<()>;

    /// Set the status of a task or subtask. Epics reject it.
    fn set_status(&mut self, id: TaskId, status: TaskStatus) -> Result<()>;

    /// Look up any kind (tasks, then subtasks, then epics) and record the view.
    fn get_by_id(&mut self, id: TaskId) -> Result<Entity>;

    fn delete_by_id(&mut self, id: TaskId) -> Result<()>;
    fn delete_all_tasks(&mut self) -> Result<()>;
    fn delete_all_subtasks(&mut self) -> Result<()>;
    fn delete_all_epics(&mut self) -> Result<()>;

    /// Snapshots sorted by id
    fn tasks(&self) -> Vec<Task>;
    fn epics(&self) -> Vec<Epic>;
    fn subtasks(&self) -> Vec<Subtask>;

    /// Subtasks of `epic_id` in the epic's insertion order
    fn epic_subtasks(&self, epic_id: TaskId) -> Result<Vec<Subtask>>;

    /// Scheduled tasks and subtasks by start time, ties by id
    fn prioritized(&self) -> Vec<Entity>;

    /// Viewed entities, least recent first
    fn history(&self) -> Vec<Entity>;

    fn add(&mut self, entity: Entity) -> Result<()> {
        match entity {
            Entity::Task(task) => self.add_task(task),
            Entity::Epic(epic) => self.add_epic(epic),
            Entity::Subtask(subtask) => self.add_subtask(subtask),
        }
    }

    fn update(&mut self, entity: Entity) -> Result<()> {
        match entity {
            Entity::Task(task) => self.update_task(task),
            Entity::Epic(epic) => self.update_epic(epic),
            Entity::Subtask(subtask) => self.update_subtask(subtask),
        }
    }

    fn get_task(&mut self, id: TaskId) -> Result<Task> {
        match self.get_by_id(id)? {
            Entity::Task(task) => Ok(task),
            _ => Err(Error::NotFound(id)),
        }
    }

    fn get_epic(&mut self, id: TaskId) -> Result<Epic> {
        match self.get_by_id(id)? {
            Entity::Epic(epic) => Ok(epic),
            _ => Err(Error::NotFound(id)),
        }
    }

    fn get_subtask(&mut self, id: TaskId) -> Result<Subtask> {
        match self.get_by_id(id)? {
            Entity::Subtask(subtask) => Ok(subtask),
            _ => Err(Error::NotFound(id)),
        }
    }
}

// =============================================================================
// In-memory manager
// =============================================================================

/// Manager holding all state in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskManager {
    tasks: HashMap<TaskId, Task>,
    epics: HashMap<TaskId, Epic>,
    subtasks: HashMap<TaskId, Subtask>,
    scheduler: Scheduler,
    history: History,
    last_id: TaskId,
    refresh_history_on_update: bool,
}

impl InMemoryTaskManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history_config(config: &HistoryConfig) -> Self {
        Self {
            history: History::with_limit(config.limit),
            refresh_history_on_update: config.refresh_on_update,
            ..Self::default()
        }
    }

    /// Highest id issued or indexed so far
    pub fn last_id(&self) -> TaskId {
        self.last_id
    }

    /// Make sure future ids are greater than `id`.
    pub fn advance_counter(&mut self, id: TaskId) {
        if id > self.last_id {
            self.last_id = id;
        }
    }

    pub fn kind_of(&self, id: TaskId) -> Option<TaskKind> {
        if self.tasks.contains_key(&id) {
            Some(TaskKind::Task)
        } else if self.subtasks.contains_key(&id) {
            Some(TaskKind::Subtask)
        } else if self.epics.contains_key(&id) {
            Some(TaskKind::Epic)
        } else {
            None
        }
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.kind_of(id).is_some()
    }

    fn next_id(&mut self) -> TaskId {
        self.last_id += 1;
        self.last_id
    }

    fn ensure_unindexed(&self, id: TaskId) -> Result<()> {
        match self.kind_of(id) {
            Some(kind) => {
                warn!(id, %kind, "add rejected: id already indexed");
                Err(Error::MalformedInput(format!(
                    "id {id} is already used by a {kind}"
                )))
            }
            None => Ok(()),
        }
    }

    /// Fail with `NotFound` when `id` belongs to a kind other than `kind`.
    fn ensure_kind_or_absent(&self, id: TaskId, kind: TaskKind) -> Result<()> {
        match self.kind_of(id) {
            Some(existing) if existing != kind => {
                warn!(id, %existing, expected = %kind, "update rejected: kind mismatch");
                Err(Error::NotFound(id))
            }
            _ => Ok(()),
        }
    }

    fn ensure_epic(&self, epic_id: TaskId) -> Result<()> {
        if self.epics.contains_key(&epic_id) {
            Ok(())
        } else {
            warn!(epic_id, "epic not found");
            Err(Error::NotFound(epic_id))
        }
    }

    /// Recompute an epic's derived status and window from its current subtasks.
    fn refresh_epic(&mut self, epic_id: TaskId) {
        let Some(epic) = self.epics.get_mut(&epic_id) else {
            return;
        };
        let members: Vec<&Subtask> = epic
            .subtask_ids()
            .iter()
            .filter_map(|id| self.subtasks.get(id))
            .collect();
        epic.recompute(members);
        debug!(epic_id, status = %epic.status(), "epic recomputed");

        if self.refresh_history_on_update {
            self.history.refresh(&Entity::Epic(epic.clone()));
        }
    }

    fn refresh_history(&mut self, entity: Entity) {
        if self.refresh_history_on_update {
            self.history.refresh(&entity);
        }
    }

    fn forget(&mut self, id: TaskId) {
        self.history.remove(id);
        self.scheduler.remove(id);
    }
}

impl TaskManager for InMemoryTaskManager {
    fn create_task(&mut self, name: &str, description: &str) -> Task {
        Task::new(self.next_id(), name, description)
    }

    fn create_epic(&mut self, name: &str, description: &str) -> Epic {
        Epic::new(self.next_id(), name, description)
    }

    fn create_subtask(&mut self, epic_id: TaskId, name: &str, description: &str) -> Subtask {
        Subtask::new(epic_id, self.next_id(), name, description)
    }

    fn add_task(&mut self, task: Task) -> Result<()> {
        task.validate()?;
        self.ensure_unindexed(task.id())?;
        self.scheduler.schedule(task.id(), task.window())?;

        let id = task.id();
        self.advance_counter(id);
        self.tasks.insert(id, task);
        debug!(id, "task added");
        Ok(())
    }

    fn add_epic(&mut self, epic: Epic) -> Result<()> {
        epic.validate()?;
        self.ensure_unindexed(epic.id())?;

        let id = epic.id();
        self.advance_counter(id);
        self.epics.insert(id, epic);
        self.refresh_epic(id);
        debug!(id, "epic added");
        Ok(())
    }

    fn add_subtask(&mut self, subtask: Subtask) -> Result<()> {
        subtask.validate()?;
        self.ensure_unindexed(subtask.id())?;
        self.ensure_epic(subtask.epic_id())?;
        self.scheduler.schedule(subtask.id(), subtask.window())?;

        let id = subtask.id();
        let epic_id = subtask.epic_id();
        self.advance_counter(id);
        self.subtasks.insert(id, subtask);
        if let Some(epic) = self.epics.get_mut(&epic_id) {
            epic.attach(id);
        }
        self.refresh_epic(epic_id);
        debug!(id, epic_id, "subtask added");
        Ok(())
    }

    fn update_task(&mut self, task: Task) -> Result<()> {
        task.validate()?;
        self.ensure_kind_or_absent(task.id(), TaskKind::Task)?;
        self.scheduler.schedule(task.id(), task.window())?;

        let id = task.id();
        self.advance_counter(id);
        self.refresh_history(Entity::Task(task.clone()));
        self.tasks.insert(id, task);
        debug!(id, "task updated");
        Ok(())
    }

    fn update_epic(&mut self, epic: Epic) -> Result<()> {
        epic.validate()?;
        self.ensure_kind_or_absent(epic.id(), TaskKind::Epic)?;

        let id = epic.id();
        match self.epics.get_mut(&id) {
            Some(existing) => {
                existing.name = epic.name;
                existing.description = epic.description;
            }
            None => {
                self.advance_counter(id);
                self.epics.insert(id, epic);
            }
        }
        self.refresh_epic(id);
        debug!(id, "epic updated");
        Ok(())
    }

    fn update_subtask(&mut self, subtask: Subtask) -> Result<()> {
        subtask.validate()?;
        self.ensure_kind_or_absent(subtask.id(), TaskKind::Subtask)?;
        self.ensure_epic(subtask.epic_id())?;
        self.scheduler.schedule(subtask.id(), subtask.window())?;

        let id = subtask.id();
        let epic_id = subtask.epic_id();
        self.advance_counter(id);
        self.refresh_history(Entity::Subtask(subtask.clone()));

        let previous_epic = self
            .subtasks
            .insert(id, subtask)
            .map(|previous| previous.epic_id())
            .filter(|previous| *previous != epic_id);
        if let Some(previous_epic) = previous_epic {
            if let Some(epic) = self.epics.get_mut(&previous_epic) {
                epic.detach(id);
            }
            self.refresh_epic(previous_epic);
            debug!(id, from = previous_epic, to = epic_id, "subtask moved");
        }

        if let Some(epic) = self.epics.get_mut(&epic_id) {
            epic.attach(id);
        }
        self.refresh_epic(epic_id);
        debug!(id, epic_id, "subtask updated");
        Ok(())
    }

    fn set_status(&mut self, id: TaskId, status: TaskStatus) -> Result<()> {
        if let Some(task) = self.tasks.get_mut(&id) {
            task.status = status;
            let snapshot = Entity::Task(task.clone());
            self.refresh_history(snapshot);
        } else if let Some(subtask) = self.subtasks.get_mut(&id) {
            subtask.status = status;
            let epic_id = subtask.epic_id();
            let snapshot = Entity::Subtask(subtask.clone());
            self.refresh_history(snapshot);
            self.refresh_epic(epic_id);
        } else if self.epics.contains_key(&id) {
            warn!(id, "status change rejected: epic status is derived");
            return Err(Error::IllegalDirectMutation { id, field: "status" });
        } else {
            warn!(id, "status change rejected: not found");
            return Err(Error::NotFound(id));
        }
        debug!(id, %status, "status set");
        Ok(())
    }

    fn get_by_id(&mut self, id: TaskId) -> Result<Entity> {
        let entity = if let Some(task) = self.tasks.get(&id) {
            Entity::Task(task.clone())
        } else if let Some(subtask) = self.subtasks.get(&id) {
            Entity::Subtask(subtask.clone())
        } else if let Some(epic) = self.epics.get(&id) {
            Entity::Epic(epic.clone())
        } else {
            return Err(Error::NotFound(id));
        };
        self.history.record(entity.clone());
        Ok(entity)
    }

    fn delete_by_id(&mut self, id: TaskId) -> Result<()> {
        if self.tasks.remove(&id).is_some() {
            self.forget(id);
            debug!(id, "task deleted");
        } else if let Some(subtask) = self.subtasks.remove(&id) {
            self.forget(id);
            let epic_id = subtask.epic_id();
            if let Some(epic) = self.epics.get_mut(&epic_id) {
                epic.detach(id);
            }
            self.refresh_epic(epic_id);
            debug!(id, epic_id, "subtask deleted");
        } else if let Some(epic) = self.epics.remove(&id) {
            for subtask_id in epic.subtask_ids() {
                self.subtasks.remove(subtask_id);
                self.forget(*subtask_id);
            }
            self.history.remove(id);
            debug!(id, subtasks = epic.subtask_ids().len(), "epic deleted");
        } else {
            warn!(id, "delete rejected: not found");
            return Err(Error::NotFound(id));
        }
        Ok(())
    }

    fn delete_all_tasks(&mut self) -> Result<()> {
        let ids: Vec<TaskId> = self.tasks.keys().copied().collect();
        for id in &ids {
            self.forget(*id);
        }
        self.tasks.clear();
        debug!(count = ids.len(), "all tasks deleted");
        Ok(())
    }

    fn delete_all_subtasks(&mut self) -> Result<()> {
        let ids: Vec<TaskId> = self.subtasks.keys().copied().collect();
        for id in &ids {
            self.forget(*id);
        }
        self.subtasks.clear();

        let epic_ids: Vec<TaskId> = self.epics.keys().copied().collect();
        for epic_id in epic_ids {
            if let Some(epic) = self.epics.get_mut(&epic_id) {
                epic.clear_subtasks();
            }
            self.refresh_epic(epic_id);
        }
        debug!(count = ids.len(), "all subtasks deleted");
        Ok(())
    }

    fn delete_all_epics(&mut self) -> Result<()> {
        self.delete_all_subtasks()?;
        let ids: Vec<TaskId> = self.epics.keys().copied().collect();
        for id in &ids {
            self.history.remove(*id);
        }
        self.epics.clear();
        debug!(count = ids.len(), "all epics deleted");
        Ok(())
    }

    fn tasks(&self) -> Vec<Task> {
        let mut tasks: Vec<Task> = self.tasks.values().cloned().collect();
        tasks.sort_by_key(Task::id);
        tasks
    }

    fn epics(&self) -> Vec<Epic> {
        let mut epics: Vec<Epic> = self.epics.values().cloned().collect();
        epics.sort_by_key(Epic::id);
        epics
    }

    fn subtasks(&self) -> Vec<Subtask> {
        let mut subtasks: Vec<Subtask> = self.subtasks.values().cloned().collect();
        subtasks.sort_by_key(Subtask::id);
        subtasks
    }

    fn epic_subtasks(&self, epic_id: TaskId) -> Result<Vec<Subtask>> {
        let epic = self.epics.get(&epic_id).ok_or(Error::NotFound(epic_id))?;
        Ok(epic
            .subtask_ids()
            .iter()
            .filter_map(|id| self.subtasks.get(id).cloned())
            .collect())
    }

    fn prioritized(&self) -> Vec<Entity> {
        self.scheduler
            .ordered_ids()
            .filter_map(|id| {
                self.tasks
                    .get(&id)
                    .cloned()
                    .map(Entity::Task)
                    .or_else(|| self.subtasks.get(&id).cloned().map(Entity::Subtask))
            })
            .collect()
    }

    fn history(&self) -> Vec<Entity> {
        self.history.snapshot()
    }
}
