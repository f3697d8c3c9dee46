//! kanban epic command implementation

use crate::cli::BoardOptions;
use crate::error::{Error, Result};
use crate::manager::TaskManager;
use crate::output::{emit_success, entity_line, HumanOutput};
use crate::storage::TaskRecord;
use crate::task::{Entity, Epic, TaskId};

/// Options for `epic add`
pub struct AddOptions {
    pub name: String,
    pub description: Option<String>,
    pub board: BoardOptions,
}

/// Options for `epic update`
pub struct UpdateOptions {
    pub id: TaskId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub board: BoardOptions,
}

/// Options for `epic subtasks`
pub struct SubtasksOptions {
    pub id: TaskId,
    pub board: BoardOptions,
}

#[derive(serde::Serialize)]
struct SubtasksReport {
    epic: TaskRecord,
    subtasks: Vec<TaskRecord>,
}

pub fn run_add(options: AddOptions) -> Result<()> {
    let mut manager = options.board.open()?;
    let description = options.description.unwrap_or_default();
    let epic = manager.create_epic(&options.name, &description);
    manager.add_epic(epic.clone())?;

    let entity = Entity::Epic(epic);
    let mut human = HumanOutput::new(format!("kanban: added epic #{}", entity.id()));
    human.push_entity(&entity);
    human.push_next_step(format!("kanban subtask add {} <name>", entity.id()));

    emit_success(
        options.board.output(),
        "epic add",
        &TaskRecord::from(&entity),
        Some(&human),
    )
}

pub fn run_update(options: UpdateOptions) -> Result<()> {
    let mut manager = options.board.open()?;
    let current = find_epic(&manager.epics(), options.id)?;

    let mut epic = Epic::new(current.id(), current.name.clone(), current.description.clone());
    if let Some(name) = options.name {
        epic.name = name;
    }
    if let Some(description) = options.description {
        epic.description = description;
    }
    manager.update_epic(epic)?;

    // Re-read so the derived fields are current.
    let entity = Entity::Epic(find_epic(&manager.epics(), options.id)?);
    let mut human = HumanOutput::new(format!("kanban: updated epic #{}", entity.id()));
    human.push_entity(&entity);

    emit_success(
        options.board.output(),
        "epic update",
        &TaskRecord::from(&entity),
        Some(&human),
    )
}

pub fn run_subtasks(options: SubtasksOptions) -> Result<()> {
    let manager = options.board.open()?;
    let epic = find_epic(&manager.epics(), options.id)?;
    let subtasks = manager.epic_subtasks(options.id)?;

    let entity = Entity::Epic(epic);
    let mut human = HumanOutput::new(format!(
        "kanban epic subtasks: #{} {} ({}, {} subtasks)",
        entity.id(),
        entity.name(),
        entity.status(),
        subtasks.len()
    ));
    for subtask in &subtasks {
        human.push_detail(entity_line(&Entity::Subtask(subtask.clone())));
    }
    if subtasks.is_empty() {
        human.push_next_step(format!("kanban subtask add {} <name>", entity.id()));
    }

    let report = SubtasksReport {
        epic: TaskRecord::from(&entity),
        subtasks: subtasks.iter().map(TaskRecord::from).collect(),
    };
    emit_success(options.board.output(), "epic subtasks", &report, Some(&human))
}

fn find_epic(epics: &[Epic], id: TaskId) -> Result<Epic> {
    epics
        .iter()
        .find(|epic| epic.id() == id)
        .cloned()
        .ok_or(Error::NotFound(id))
}
