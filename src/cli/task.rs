//! kanban task / subtask command implementation
//!
//! Tasks and subtasks share their editable fields, so both kinds go through
//! the same add and update paths here.

use chrono::{Duration, NaiveDateTime};

use crate::cli::{parse_minutes, parse_start, BoardOptions, ItemArgs};
use crate::error::{Error, Result};
use crate::manager::TaskManager;
use crate::output::{emit_success, HumanOutput};
use crate::storage::TaskRecord;
use crate::task::{Entity, Subtask, Task, TaskId, TaskStatus};

/// Options for `task add` and `subtask add`
pub struct AddOptions {
    /// Owning epic; `None` adds a plain task
    pub epic_id: Option<TaskId>,
    pub name: String,
    pub fields: ItemArgs,
    pub board: BoardOptions,
}

/// Options for `task update` and `subtask update`
pub struct UpdateOptions {
    pub id: TaskId,
    pub name: Option<String>,
    /// New owning epic (subtasks only)
    pub epic_id: Option<TaskId>,
    pub fields: ItemArgs,
    pub unschedule: bool,
    pub subtask: bool,
    pub board: BoardOptions,
}

/// Parsed values of [`ItemArgs`]
struct Fields {
    description: Option<String>,
    status: Option<TaskStatus>,
    start: Option<NaiveDateTime>,
    duration: Option<Duration>,
}

impl TryFrom<ItemArgs> for Fields {
    type Error = Error;

    fn try_from(args: ItemArgs) -> Result<Self> {
        Ok(Fields {
            description: args.description,
            status: args.status.as_deref().map(str::parse).transpose()?,
            start: args.start.as_deref().map(parse_start).transpose()?,
            duration: args.duration.map(parse_minutes).transpose()?,
        })
    }
}

pub fn run_add(options: AddOptions) -> Result<()> {
    let fields = Fields::try_from(options.fields)?;
    if fields.duration.is_some() && fields.start.is_none() {
        return Err(Error::InvalidArgument(
            "--duration needs --start".to_string(),
        ));
    }

    let mut manager = options.board.open()?;
    let description = fields.description.clone().unwrap_or_default();

    let entity = match options.epic_id {
        None => {
            let mut task = manager.create_task(&options.name, &description);
            apply_task(&mut task, &fields, false);
            manager.add_task(task.clone())?;
            Entity::Task(task)
        }
        Some(epic_id) => {
            let mut subtask = manager.create_subtask(epic_id, &options.name, &description);
            apply_subtask(&mut subtask, &fields, false);
            manager.add_subtask(subtask.clone())?;
            Entity::Subtask(subtask)
        }
    };

    let mut human = HumanOutput::new(format!("kanban: added {} #{}", entity.kind(), entity.id()));
    human.push_entity(&entity);
    if let Some(epic_id) = entity.epic_id() {
        human.push_next_step(format!("kanban epic subtasks {epic_id}"));
    }

    let command = if options.epic_id.is_some() {
        "subtask add"
    } else {
        "task add"
    };
    emit_success(
        options.board.output(),
        command,
        &TaskRecord::from(&entity),
        Some(&human),
    )
}

pub fn run_update(options: UpdateOptions) -> Result<()> {
    let fields = Fields::try_from(options.fields)?;
    let mut manager = options.board.open()?;

    let entity = if options.subtask {
        let current = manager
            .subtasks()
            .into_iter()
            .find(|subtask| subtask.id() == options.id)
            .ok_or(Error::NotFound(options.id))?;

        let epic_id = options.epic_id.unwrap_or(current.epic_id());
        let mut subtask = Subtask::new(
            epic_id,
            current.id(),
            current.name.clone(),
            current.description.clone(),
        )
        .with_status(current.status);
        subtask.start_time = current.start_time;
        subtask.duration = current.duration;
        if let Some(name) = options.name {
            subtask.name = name;
        }
        apply_subtask(&mut subtask, &fields, options.unschedule);

        manager.update_subtask(subtask.clone())?;
        Entity::Subtask(subtask)
    } else {
        let mut task = manager
            .tasks()
            .into_iter()
            .find(|task| task.id() == options.id)
            .ok_or(Error::NotFound(options.id))?;
        if let Some(name) = options.name {
            task.name = name;
        }
        apply_task(&mut task, &fields, options.unschedule);

        manager.update_task(task.clone())?;
        Entity::Task(task)
    };

    let mut human = HumanOutput::new(format!("kanban: updated {} #{}", entity.kind(), entity.id()));
    human.push_entity(&entity);

    let command = if options.subtask {
        "subtask update"
    } else {
        "task update"
    };
    emit_success(
        options.board.output(),
        command,
        &TaskRecord::from(&entity),
        Some(&human),
    )
}

fn apply_task(task: &mut Task, fields: &Fields, unschedule: bool) {
    if let Some(description) = &fields.description {
        task.description = description.clone();
    }
    if let Some(status) = fields.status {
        task.status = status;
    }
    if unschedule {
        task.start_time = None;
        task.duration = Duration::zero();
    }
    if let Some(start) = fields.start {
        task.start_time = Some(start);
    }
    if let Some(duration) = fields.duration {
        task.duration = duration;
    }
}

fn apply_subtask(subtask: &mut Subtask, fields: &Fields, unschedule: bool) {
    if let Some(description) = &fields.description {
        subtask.description = description.clone();
    }
    if let Some(status) = fields.status {
        subtask.status = status;
    }
    if unschedule {
        subtask.start_time = None;
        subtask.duration = Duration::zero();
    }
    if let Some(start) = fields.start {
        subtask.start_time = Some(start);
    }
    if let Some(duration) = fields.duration {
        subtask.duration = duration;
    }
}
