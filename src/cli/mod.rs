//! Command-line interface for kanban
//!
//! This module defines the CLI structure using clap derive macros.
//! Each group of subcommands is implemented in its own submodule.

use std::path::PathBuf;
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime};
use clap::{Parser, Subcommand};

use crate::config::{Config, CONFIG_FILE};
use crate::error::{Error, Result};
use crate::file_backed::FileBackedTaskManager;
use crate::output::OutputOptions;

mod epic;
mod remove;
mod status;
mod task;
mod view;

/// kanban - task board with epics, time slots and view history
///
/// Tracks tasks, epics and subtasks in a JSON Lines file. Epic status and
/// timing are derived from subtasks; scheduled items may not overlap.
#[derive(Parser, Debug)]
#[command(name = "kanban")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Task file (defaults to storage.path from the config)
    #[arg(long, global = true, env = "KANBAN_FILE")]
    pub file: Option<PathBuf>,

    /// Config file (defaults to ./.kanban.toml when present)
    #[arg(long, global = true, env = "KANBAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Plain task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// Epic management
    #[command(subcommand)]
    Epic(EpicCommands),

    /// Subtask management
    #[command(subcommand)]
    Subtask(SubtaskCommands),

    /// Set the status of a task or subtask
    Status {
        /// Task or subtask id
        id: u64,

        /// New status: new, in_progress, done
        status: String,
    },

    /// Show one item
    Get {
        /// Item id
        id: u64,
    },

    /// Delete one item (epics take their subtasks with them)
    Delete {
        /// Item id
        id: u64,
    },

    /// List items by kind
    List {
        /// Which items: tasks, epics, subtasks, all
        #[arg(default_value = "all")]
        scope: String,
    },

    /// Delete every item of one kind
    Clear {
        /// Which items: tasks, epics, subtasks
        scope: String,
    },

    /// Scheduled tasks and subtasks in start-time order
    Prioritized,

    /// View the given ids in order, then print the resulting view history
    History {
        /// Ids to view, oldest first
        ids: Vec<u64>,
    },
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a task
    Add {
        /// Task name
        name: String,

        #[command(flatten)]
        fields: ItemArgs,
    },

    /// Change an existing task
    Update {
        /// Task id
        id: u64,

        /// New name
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        fields: ItemArgs,

        /// Remove the time slot
        #[arg(long, conflicts_with_all = ["start", "duration"])]
        unschedule: bool,
    },
}

/// Epic subcommands
#[derive(Subcommand, Debug)]
pub enum EpicCommands {
    /// Create an epic
    Add {
        /// Epic name
        name: String,

        /// Description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Rename or re-describe an epic
    Update {
        /// Epic id
        id: u64,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// List an epic's subtasks
    Subtasks {
        /// Epic id
        id: u64,
    },
}

/// Subtask subcommands
#[derive(Subcommand, Debug)]
pub enum SubtaskCommands {
    /// Create a subtask under an epic
    Add {
        /// Owning epic id
        epic_id: u64,

        /// Subtask name
        name: String,

        #[command(flatten)]
        fields: ItemArgs,
    },

    /// Change an existing subtask
    Update {
        /// Subtask id
        id: u64,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// Move to another epic
        #[arg(long)]
        epic: Option<u64>,

        #[command(flatten)]
        fields: ItemArgs,

        /// Remove the time slot
        #[arg(long, conflicts_with_all = ["start", "duration"])]
        unschedule: bool,
    },
}

/// Fields shared by task and subtask commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ItemArgs {
    /// Description
    #[arg(short, long)]
    pub description: Option<String>,

    /// Status: new, in_progress, done
    #[arg(long)]
    pub status: Option<String>,

    /// Start time, "YYYY-MM-DD HH:MM"
    #[arg(long)]
    pub start: Option<String>,

    /// Duration in minutes
    #[arg(long)]
    pub duration: Option<i64>,
}

/// Global options every command needs to open the board
#[derive(Debug, Clone)]
pub struct BoardOptions {
    pub file: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

impl BoardOptions {
    pub fn output(&self) -> OutputOptions {
        OutputOptions {
            json: self.json,
            quiet: self.quiet,
        }
    }

    /// Load config and restore the board it points at, locked until the returned manager drops.
    pub fn open(&self) -> Result<FileBackedTaskManager> {
        let cwd = std::env::current_dir()?;
        let config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::load_from_dir(&cwd)?,
        };
        let path = match &self.file {
            Some(path) => path.clone(),
            None => config.storage_path(&cwd),
        };
        tracing::debug!(path = %path.display(), config = CONFIG_FILE, "opening board");
        FileBackedTaskManager::open_exclusive(path, &config)
    }
}

/// Which kinds a listing or clear applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Tasks,
    Epics,
    Subtasks,
    All,
}

impl FromStr for Scope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "task" | "tasks" => Ok(Scope::Tasks),
            "epic" | "epics" => Ok(Scope::Epics),
            "subtask" | "subtasks" => Ok(Scope::Subtasks),
            "all" => Ok(Scope::All),
            _ => Err(Error::InvalidArgument(format!(
                "Invalid scope '{}'. Expected: tasks, epics, subtasks, all",
                s
            ))),
        }
    }
}

const START_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Parse a start time given on the command line.
pub fn parse_start(value: &str) -> Result<NaiveDateTime> {
    START_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value.trim(), format).ok())
        .ok_or_else(|| {
            Error::InvalidArgument(format!(
                "Invalid start time '{}'. Expected: YYYY-MM-DD HH:MM",
                value
            ))
        })
}

/// Parse a duration given in minutes.
pub fn parse_minutes(minutes: i64) -> Result<Duration> {
    if minutes < 0 {
        return Err(Error::InvalidArgument(format!(
            "Invalid duration {minutes}: minutes cannot be negative"
        )));
    }
    Duration::try_minutes(minutes)
        .ok_or_else(|| Error::InvalidArgument(format!("Invalid duration {minutes}: too large")))
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let board = BoardOptions {
            file: self.file,
            config: self.config,
            json: self.json,
            quiet: self.quiet,
        };

        match self.command {
            Commands::Task(cmd) => match cmd {
                TaskCommands::Add { name, fields } => {
                    task::run_add(task::AddOptions {
                        epic_id: None,
                        name,
                        fields,
                        board,
                    })
                }
                TaskCommands::Update {
                    id,
                    name,
                    fields,
                    unschedule,
                } => task::run_update(task::UpdateOptions {
                    id,
                    name,
                    epic_id: None,
                    fields,
                    unschedule,
                    subtask: false,
                    board,
                }),
            },
            Commands::Subtask(cmd) => match cmd {
                SubtaskCommands::Add {
                    epic_id,
                    name,
                    fields,
                } => task::run_add(task::AddOptions {
                    epic_id: Some(epic_id),
                    name,
                    fields,
                    board,
                }),
                SubtaskCommands::Update {
                    id,
                    name,
                    epic,
                    fields,
                    unschedule,
                } => task::run_update(task::UpdateOptions {
                    id,
                    name,
                    epic_id: epic,
                    fields,
                    unschedule,
                    subtask: true,
                    board,
                }),
            },
            Commands::Epic(cmd) => match cmd {
                EpicCommands::Add { name, description } => epic::run_add(epic::AddOptions {
                    name,
                    description,
                    board,
                }),
                EpicCommands::Update {
                    id,
                    name,
                    description,
                } => epic::run_update(epic::UpdateOptions {
                    id,
                    name,
                    description,
                    board,
                }),
                EpicCommands::Subtasks { id } => {
                    epic::run_subtasks(epic::SubtasksOptions { id, board })
                }
            },
            Commands::Status { id, status } => {
                status::run(status::StatusOptions { id, status, board })
            }
            Commands::Get { id } => view::run_get(view::GetOptions { id, board }),
            Commands::List { scope } => view::run_list(view::ListOptions { scope, board }),
            Commands::Prioritized => view::run_prioritized(board),
            Commands::History { ids } => view::run_history(view::HistoryOptions { ids, board }),
            Commands::Delete { id } => remove::run_delete(remove::DeleteOptions { id, board }),
            Commands::Clear { scope } => remove::run_clear(remove::ClearOptions { scope, board }),
        }
    }
}
