//! Entity model for kanban.
//!
//! Three kinds of work item share one id space:
//! - [`Task`]: a plain, independently scheduled item
//! - [`Epic`]: a container whose status and time window are derived from its subtasks
//! - [`Subtask`]: a scheduled item owned by exactly one epic
//!
//! [`Entity`] is the sum type the manager hands out. Epic status and timing
//! have no setters at all; the `Entity` setters reject them at runtime.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schedule::TimeWindow;

/// Identifier shared by tasks, epics and subtasks. Zero is never issued.
pub type TaskId = u64;

// =============================================================================
// Status and kind
// =============================================================================

/// Progress state of a work item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    New,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::New => "NEW",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "new" => Ok(TaskStatus::New),
            "in_progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            _ => Err(Error::InvalidArgument(format!(
                "Invalid status '{}'. Expected: new, in_progress, done",
                s
            ))),
        }
    }
}

/// Which of the three identity maps an entity belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Task,
    Epic,
    Subtask,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Task => write!(f, "task"),
            TaskKind::Epic => write!(f, "epic"),
            TaskKind::Subtask => write!(f, "subtask"),
        }
    }
}

impl FromStr for TaskKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "task" => Ok(TaskKind::Task),
            "epic" => Ok(TaskKind::Epic),
            "subtask" => Ok(TaskKind::Subtask),
            _ => Err(Error::InvalidArgument(format!(
                "Invalid kind '{}'. Expected: task, epic, subtask",
                s
            ))),
        }
    }
}

fn window_of(start_time: Option<NaiveDateTime>, duration: Duration) -> Option<TimeWindow> {
    start_time.map(|start| TimeWindow::new(start, duration))
}

fn validate_fields(
    id: TaskId,
    start_time: Option<NaiveDateTime>,
    duration: Duration,
) -> Result<()> {
    if id == 0 {
        return Err(Error::MalformedInput("id 0 is reserved".to_string()));
    }
    if duration < Duration::zero() {
        return Err(Error::MalformedInput(format!(
            "task {id} has a negative duration"
        )));
    }
    if let Some(start) = start_time {
        if TimeWindow::checked(start, duration).is_none() {
            return Err(Error::MalformedInput(format!(
                "task {id} ends past the supported time range"
            )));
        }
    }
    Ok(())
}

// =============================================================================
// Task
// =============================================================================

/// A plain work item.
///
/// Equality and hashing look at the id only.
#[derive(Debug, Clone)]
pub struct Task {
    id: TaskId,
    pub name: String,
    pub description: String,
    pub status: TaskStatus,
    pub start_time: Option<NaiveDateTime>,
    pub duration: Duration,
}

impl Task {
    pub fn new(id: TaskId, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            status: TaskStatus::New,
            start_time: None,
            duration: Duration::zero(),
        }
    }

    pub fn with_schedule(mut self, start_time: NaiveDateTime, duration: Duration) -> Self {
        self.start_time = Some(start_time);
        self.duration = duration;
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    /// `start_time + duration`, or `None` when unscheduled
    pub fn end_time(&self) -> Option<NaiveDateTime> {
        self.window().map(|window| window.end())
    }

    pub fn window(&self) -> Option<TimeWindow> {
        window_of(self.start_time, self.duration)
    }

    pub fn validate(&self) -> Result<()> {
        validate_fields(self.id, self.start_time, self.duration)
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Task {}

impl Hash for Task {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// =============================================================================
// Subtask
// =============================================================================

/// A work item owned by one epic.
///
/// The owning epic is referenced by id and fixed at construction.
#[derive(Debug, Clone)]
pub struct Subtask {
    id: TaskId,
    epic_id: TaskId,
    pub name: String,
    pub description: String,
    pub status: TaskStatus,
    pub start_time: Option<NaiveDateTime>,
    pub duration: Duration,
}

impl Subtask {
    pub fn new(
        epic_id: TaskId,
        id: TaskId,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            epic_id,
            name: name.into(),
            description: description.into(),
            status: TaskStatus::New,
            start_time: None,
            duration: Duration::zero(),
        }
    }

    pub fn with_schedule(mut self, start_time: NaiveDateTime, duration: Duration) -> Self {
        self.start_time = Some(start_time);
        self.duration = duration;
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn epic_id(&self) -> TaskId {
        self.epic_id
    }

    pub fn end_time(&self) -> Option<NaiveDateTime> {
        self.window().map(|window| window.end())
    }

    pub fn window(&self) -> Option<TimeWindow> {
        window_of(self.start_time, self.duration)
    }

    pub fn validate(&self) -> Result<()> {
        validate_fields(self.id, self.start_time, self.duration)?;
        if self.epic_id == 0 || self.epic_id == self.id {
            return Err(Error::MalformedInput(format!(
                "subtask {} has an invalid epic id {}",
                self.id, self.epic_id
            )));
        }
        Ok(())
    }
}

impl PartialEq for Subtask {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Subtask {}

impl Hash for Subtask {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// =============================================================================
// Epic
// =============================================================================

/// A group of subtasks.
///
/// Status and time window are recomputed from the current subtasks whenever
/// the manager changes them; nothing else can write them.
#[derive(Debug, Clone)]
pub struct Epic {
    id: TaskId,
    pub name: String,
    pub description: String,
    subtask_ids: Vec<TaskId>,
    status: TaskStatus,
    window: Option<TimeWindow>,
}

impl Epic {
    pub fn new(id: TaskId, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            subtask_ids: Vec::new(),
            status: TaskStatus::New,
            window: None,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// Subtask ids in insertion order
    pub fn subtask_ids(&self) -> &[TaskId] {
        &self.subtask_ids
    }

    pub fn start_time(&self) -> Option<NaiveDateTime> {
        self.window.map(|window| window.start())
    }

    pub fn end_time(&self) -> Option<NaiveDateTime> {
        self.window.map(|window| window.end())
    }

    /// Span from the earliest subtask start to the latest subtask end; zero when unscheduled
    pub fn duration(&self) -> Duration {
        self.window
            .map(|window| window.duration())
            .unwrap_or_else(Duration::zero)
    }

    pub fn window(&self) -> Option<TimeWindow> {
        self.window
    }

    pub fn validate(&self) -> Result<()> {
        validate_fields(self.id, None, Duration::zero())
    }

    /// Append a subtask id; an id already present keeps its position.
    pub(crate) fn attach(&mut self, subtask_id: TaskId) {
        if !self.subtask_ids.contains(&subtask_id) {
            self.subtask_ids.push(subtask_id);
        }
    }

    pub(crate) fn detach(&mut self, subtask_id: TaskId) -> bool {
        let before = self.subtask_ids.len();
        self.subtask_ids.retain(|id| *id != subtask_id);
        before != self.subtask_ids.len()
    }

    pub(crate) fn clear_subtasks(&mut self) {
        self.subtask_ids.clear();
    }

    /// Derive status and time window from the given subtasks.
    pub(crate) fn recompute<'a, I>(&mut self, subtasks: I)
    where
        I: IntoIterator<Item = &'a Subtask>,
    {
        let (statuses, windows): (Vec<TaskStatus>, Vec<Option<TimeWindow>>) = subtasks
            .into_iter()
            .map(|subtask| (subtask.status, subtask.window()))
            .unzip();
        self.status = aggregate_status(statuses);
        self.window = aggregate_window(windows.into_iter().flatten());
    }
}

impl PartialEq for Epic {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Epic {}

impl Hash for Epic {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Epic status rule over a full subtask status collection.
///
/// Empty or all-NEW is NEW, all-DONE is DONE, anything else is IN_PROGRESS.
pub fn aggregate_status<I>(statuses: I) -> TaskStatus
where
    I: IntoIterator<Item = TaskStatus>,
{
    let mut has_new = false;
    let mut has_in_progress = false;
    let mut has_done = false;
    for status in statuses {
        match status {
            TaskStatus::New => has_new = true,
            TaskStatus::InProgress => has_in_progress = true,
            TaskStatus::Done => has_done = true,
        }
    }

    if has_in_progress || (has_done && has_new) {
        TaskStatus::InProgress
    } else if has_done {
        TaskStatus::Done
    } else {
        TaskStatus::New
    }
}

/// Earliest start to latest end over the given windows; `None` if there are none.
pub fn aggregate_window<I>(windows: I) -> Option<TimeWindow>
where
    I: IntoIterator<Item = TimeWindow>,
{
    windows.into_iter().fold(None, |acc, window| match acc {
        None => Some(window),
        Some(current) => Some(TimeWindow::from_bounds(
            current.start().min(window.start()),
            current.end().max(window.end()),
        )),
    })
}

// =============================================================================
// Entity
// =============================================================================

/// Any indexed work item
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Entity {
    Task(Task),
    Epic(Epic),
    Subtask(Subtask),
}

impl Entity {
    pub fn id(&self) -> TaskId {
        match self {
            Entity::Task(task) => task.id(),
            Entity::Epic(epic) => epic.id(),
            Entity::Subtask(subtask) => subtask.id(),
        }
    }

    pub fn kind(&self) -> TaskKind {
        match self {
            Entity::Task(_) => TaskKind::Task,
            Entity::Epic(_) => TaskKind::Epic,
            Entity::Subtask(_) => TaskKind::Subtask,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Entity::Task(task) => &task.name,
            Entity::Epic(epic) => &epic.name,
            Entity::Subtask(subtask) => &subtask.name,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Entity::Task(task) => &task.description,
            Entity::Epic(epic) => &epic.description,
            Entity::Subtask(subtask) => &subtask.description,
        }
    }

    pub fn status(&self) -> TaskStatus {
        match self {
            Entity::Task(task) => task.status,
            Entity::Epic(epic) => epic.status(),
            Entity::Subtask(subtask) => subtask.status,
        }
    }

    pub fn window(&self) -> Option<TimeWindow> {
        match self {
            Entity::Task(task) => task.window(),
            Entity::Epic(epic) => epic.window(),
            Entity::Subtask(subtask) => subtask.window(),
        }
    }

    pub fn start_time(&self) -> Option<NaiveDateTime> {
        self.window().map(|window| window.start())
    }

    pub fn end_time(&self) -> Option<NaiveDateTime> {
        self.window().map(|window| window.end())
    }

    pub fn duration(&self) -> Duration {
        match self {
            Entity::Task(task) => task.duration,
            Entity::Epic(epic) => epic.duration(),
            Entity::Subtask(subtask) => subtask.duration,
        }
    }

    /// Owning epic, for subtasks
    pub fn epic_id(&self) -> Option<TaskId> {
        match self {
            Entity::Subtask(subtask) => Some(subtask.epic_id()),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Entity::Task(task) => task.validate(),
            Entity::Epic(epic) => epic.validate(),
            Entity::Subtask(subtask) => subtask.validate(),
        }
    }

    pub fn set_status(&mut self, status: TaskStatus) -> Result<()> {
        match self {
            Entity::Task(task) => task.status = status,
            Entity::Subtask(subtask) => subtask.status = status,
            Entity::Epic(epic) => return Err(illegal(epic.id(), "status")),
        }
        Ok(())
    }

    pub fn set_start_time(&mut self, start_time: Option<NaiveDateTime>) -> Result<()> {
        match self {
            Entity::Task(task) => task.start_time = start_time,
            Entity::Subtask(subtask) => subtask.start_time = start_time,
            Entity::Epic(epic) => return Err(illegal(epic.id(), "start_time")),
        }
        Ok(())
    }

    pub fn set_duration(&mut self, duration: Duration) -> Result<()> {
        match self {
            Entity::Task(task) => task.duration = duration,
            Entity::Subtask(subtask) => subtask.duration = duration,
            Entity::Epic(epic) => return Err(illegal(epic.id(), "duration")),
        }
        Ok(())
    }

    pub fn as_task(&self) -> Option<&Task> {
        match self {
            Entity::Task(task) => Some(task),
            _ => None,
        }
    }

    pub fn as_epic(&self) -> Option<&Epic> {
        match self {
            Entity::Epic(epic) => Some(epic),
            _ => None,
        }
    }

    pub fn as_subtask(&self) -> Option<&Subtask> {
        match self {
            Entity::Subtask(subtask) => Some(subtask),
            _ => None,
        }
    }
}

fn illegal(id: TaskId, field: &'static str) -> Error {
    Error::IllegalDirectMutation { id, field }
}

impl From<Task> for Entity {
    fn from(task: Task) -> Self {
        Entity::Task(task)
    }
}

impl From<Epic> for Entity {
    fn from(epic: Epic) -> Self {
        Entity::Epic(epic)
    }
}

impl From<Subtask> for Entity {
    fn from(subtask: Subtask) -> Self {
        Entity::Subtask(subtask)
    }
}

fn wrong_kind(entity: &Entity, expected: TaskKind) -> Error {
    Error::MalformedInput(format!(
        "expected a {expected}, got {} {}",
        entity.kind(),
        entity.id()
    ))
}

impl TryFrom<Entity> for Task {
    type Error = Error;

    fn try_from(entity: Entity) -> Result<Self> {
        match entity {
            Entity::Task(task) => Ok(task),
            other => Err(wrong_kind(&other, TaskKind::Task)),
        }
    }
}

impl TryFrom<Entity> for Epic {
    type Error = Error;

    fn try_from(entity: Entity) -> Result<Self> {
        match entity {
            Entity::Epic(epic) => Ok(epic),
            other => Err(wrong_kind(&other, TaskKind::Epic)),
        }
    }
}

impl TryFrom<Entity> for Subtask {
    type Error = Error;

    fn try_from(entity: Entity) -> Result<Self> {
        match entity {
            Entity::Subtask(subtask) => Ok(subtask),
            other => Err(wrong_kind(&other, TaskKind::Subtask)),
        }
    }
}
