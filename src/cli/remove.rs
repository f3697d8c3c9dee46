//! kanban delete / clear command implementation

use crate::cli::{BoardOptions, Scope};
use crate::error::{Error, Result};
use crate::manager::TaskManager;
use crate::output::{emit_success, HumanOutput};
use crate::task::TaskId;

/// Options for the delete command
pub struct DeleteOptions {
    pub id: TaskId,
    pub board: BoardOptions,
}

/// Options for the clear command
pub struct ClearOptions {
    pub scope: String,
    pub board: BoardOptions,
}

#[derive(serde::Serialize)]
struct RemovalReport {
    removed: Vec<TaskId>,
}

pub fn run_delete(options: DeleteOptions) -> Result<()> {
    let mut manager = options.board.open()?;

    // An epic takes its subtasks with it.
    let mut removed = vec![options.id];
    if let Ok(subtasks) = manager.epic_subtasks(options.id) {
        removed.extend(subtasks.iter().map(|subtask| subtask.id()));
    }
    manager.delete_by_id(options.id)?;

    let mut human = HumanOutput::new(format!("kanban delete: removed #{}", options.id));
    if removed.len() > 1 {
        let cascaded: Vec<String> = removed[1..].iter().map(|id| format!("#{id}")).collect();
        human.push_summary("subtasks", cascaded.join(", "));
    }

    emit_success(
        options.board.output(),
        "delete",
        &RemovalReport { removed },
        Some(&human),
    )
}

pub fn run_clear(options: ClearOptions) -> Result<()> {
    let scope: Scope = options.scope.parse()?;
    let mut manager = options.board.open()?;

    let removed: Vec<TaskId> = match scope {
        Scope::Tasks => {
            let ids = manager.tasks().iter().map(|task| task.id()).collect();
            manager.delete_all_tasks()?;
            ids
        }
        Scope::Subtasks => {
            let ids = manager.subtasks().iter().map(|subtask| subtask.id()).collect();
            manager.delete_all_subtasks()?;
            ids
        }
        Scope::Epics => {
            let ids = manager
                .epics()
                .iter()
                .map(|epic| epic.id())
                .chain(manager.subtasks().iter().map(|subtask| subtask.id()))
                .collect();
            manager.delete_all_epics()?;
            ids
        }
        Scope::All => {
            return Err(Error::InvalidArgument(
                "clear needs one kind: tasks, epics, subtasks".to_string(),
            ))
        }
    };

    let mut human = HumanOutput::new(format!(
        "kanban clear: removed {} {}",
        removed.len(),
        options.scope.trim().to_ascii_lowercase()
    ));
    if matches!(scope, Scope::Epics) {
        human.push_warning("subtasks were removed along with their epics");
    }

    emit_success(
        options.board.output(),
        "clear",
        &RemovalReport { removed },
        Some(&human),
    )
}
