//! kanban - in-process task tracking engine
//!
//! # Core Concepts
//!
//! - **Tasks**: plain work items with an optional time slot
//! - **Epics**: containers whose status and time window are derived from their subtasks
//! - **Subtasks**: scheduled work items owned by one epic
//! - **Scheduler**: keeps time slots from overlapping and orders them by start time
//! - **History**: recently viewed items, most recent last, one entry per id
//!
//! # Module Organization
//!
//! - `task`: entity model and epic aggregation rules
//! - `schedule`: time windows and the interval scheduler
//! - `history`: view history with constant-time removal
//! - `manager`: the `TaskManager` trait and the in-memory manager
//! - `file_backed`: manager persisted to a JSON Lines file
//! - `storage`: task file records and I/O
//! - `lock`: file locking and atomic writes
//! - `config`: configuration loading from `.kanban.toml`
//! - `output`: human and JSON output for the CLI
//! - `cli`: command-line interface using clap
//! - `error`: error types and result aliases

pub mod cli;
pub mod config;
pub mod error;
pub mod file_backed;
pub mod history;
pub mod lock;
pub mod manager;
pub mod output;
pub mod schedule;
pub mod storage;
pub mod task;

pub use error::{Error, Result};
pub use file_backed::FileBackedTaskManager;
pub use manager::{InMemoryTaskManager, TaskManager};
pub use task::{Entity, Epic, Subtask, Task, TaskId, TaskKind, TaskStatus};
