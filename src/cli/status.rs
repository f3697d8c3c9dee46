//! kanban status command implementation

use crate::cli::BoardOptions;
use crate::error::Result;
use crate::manager::TaskManager;
use crate::output::{emit_success, HumanOutput};
use crate::task::{TaskId, TaskStatus};

/// Options for the status command
pub struct StatusOptions {
    pub id: TaskId,
    pub status: String,
    pub board: BoardOptions,
}

#[derive(serde::Serialize)]
struct StatusReport {
    id: TaskId,
    status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    epic_id: Option<TaskId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    epic_status: Option<TaskStatus>,
}

pub fn run(options: StatusOptions) -> Result<()> {
    let status: TaskStatus = options.status.parse()?;
    let mut manager = options.board.open()?;
    manager.set_status(options.id, status)?;

    let epic_id = manager
        .subtasks()
        .into_iter()
        .find(|subtask| subtask.id() == options.id)
        .map(|subtask| subtask.epic_id());
    let epic_status = epic_id.and_then(|epic_id| {
        manager
            .epics()
            .into_iter()
            .find(|epic| epic.id() == epic_id)
            .map(|epic| epic.status())
    });

    let mut human = HumanOutput::new(format!("kanban status: #{} is now {}", options.id, status));
    if let (Some(epic_id), Some(epic_status)) = (epic_id, epic_status) {
        human.push_summary(format!("epic #{epic_id}"), epic_status.to_string());
    }

    let report = StatusReport {
        id: options.id,
        status,
        epic_id,
        epic_status,
    };
    emit_success(options.board.output(), "status", &report, Some(&human))
}
