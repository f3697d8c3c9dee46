//! kanban get / list / prioritized / history command implementation

use crate::cli::{BoardOptions, Scope};
use crate::error::Result;
use crate::manager::TaskManager;
use crate::output::{emit_success, entity_line, HumanOutput};
use crate::storage::TaskRecord;
use crate::task::{Entity, TaskId};

/// Options for the get command
pub struct GetOptions {
    pub id: TaskId,
    pub board: BoardOptions,
}

/// Options for the list command
pub struct ListOptions {
    pub scope: String,
    pub board: BoardOptions,
}

/// Options for the history command
pub struct HistoryOptions {
    pub ids: Vec<TaskId>,
    pub board: BoardOptions,
}

#[derive(serde::Serialize)]
struct ListReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    tasks: Option<Vec<TaskRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    epics: Option<Vec<TaskRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subtasks: Option<Vec<TaskRecord>>,
}

pub fn run_get(options: GetOptions) -> Result<()> {
    let mut manager = options.board.open()?;
    let entity = manager.get_by_id(options.id)?;

    let mut human = HumanOutput::new(format!("kanban get: #{}", entity.id()));
    human.push_entity(&entity);
    if let Entity::Epic(epic) = &entity {
        if !epic.subtask_ids().is_empty() {
            human.push_next_step(format!("kanban epic subtasks {}", epic.id()));
        }
    }

    emit_success(
        options.board.output(),
        "get",
        &TaskRecord::from(&entity),
        Some(&human),
    )
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let scope: Scope = options.scope.parse()?;
    let manager = options.board.open()?;

    let wants = |kind: Scope| scope == Scope::All || scope == kind;
    let tasks: Option<Vec<Entity>> = wants(Scope::Tasks)
        .then(|| manager.tasks().into_iter().map(Entity::Task).collect());
    let epics: Option<Vec<Entity>> = wants(Scope::Epics)
        .then(|| manager.epics().into_iter().map(Entity::Epic).collect());
    let subtasks: Option<Vec<Entity>> = wants(Scope::Subtasks)
        .then(|| manager.subtasks().into_iter().map(Entity::Subtask).collect());

    let total = tasks.as_ref().map_or(0, Vec::len)
        + epics.as_ref().map_or(0, Vec::len)
        + subtasks.as_ref().map_or(0, Vec::len);
    let mut human = HumanOutput::new(format!("kanban list: {total} items"));
    for (label, group) in [("tasks", &tasks), ("epics", &epics), ("subtasks", &subtasks)] {
        if let Some(group) = group {
            human.push_summary(label, group.len().to_string());
            for entity in group {
                human.push_detail(entity_line(entity));
            }
        }
    }
    if total == 0 {
        human.push_next_step("kanban task add <name>");
    }

    let records = |group: &Option<Vec<Entity>>| -> Option<Vec<TaskRecord>> {
        group
            .as_ref()
            .map(|entities| entities.iter().map(TaskRecord::from).collect())
    };
    let report = ListReport {
        tasks: records(&tasks),
        epics: records(&epics),
        subtasks: records(&subtasks),
    };
    emit_success(options.board.output(), "list", &report, Some(&human))
}

pub fn run_prioritized(board: BoardOptions) -> Result<()> {
    let manager = board.open()?;
    let prioritized = manager.prioritized();

    let mut human = HumanOutput::new(format!(
        "kanban prioritized: {} scheduled items",
        prioritized.len()
    ));
    for entity in &prioritized {
        human.push_detail(entity_line(entity));
    }

    let records: Vec<TaskRecord> = prioritized.iter().map(TaskRecord::from).collect();
    emit_success(board.output(), "prioritized", &records, Some(&human))
}

pub fn run_history(options: HistoryOptions) -> Result<()> {
    let mut manager = options.board.open()?;
    for id in &options.ids {
        manager.get_by_id(*id)?;
    }
    let history = manager.history();

    let mut human = HumanOutput::new(format!("kanban history: {} entries", history.len()));
    for entity in &history {
        human.push_detail(entity_line(entity));
    }
    if options.ids.is_empty() {
        human.push_warning("history is kept per process; pass ids to view them in order");
    }

    let records: Vec<TaskRecord> = history.iter().map(TaskRecord::from).collect();
    emit_success(options.board.output(), "history", &records, Some(&human))
}
