//! Error types for kanban
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, unknown id, malformed input)
//! - 3: Rejected by engine rules (time conflict, read-only epic field)
//! - 4: Operation failed (I/O, lock, serialization)
//!
//! Transport status codes (for HTTP-style callers):
//! - 404: not found, malformed input
//! - 406: time conflict
//! - 500: everything else

use std::path::PathBuf;
use thiserror::Error;

use crate::task::TaskId;

/// Exit codes for the kanban CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const RULE_REJECTED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Status codes used by request/response transports
pub mod status_codes {
    pub const NOT_FOUND: u16 = 404;
    pub const NOT_ACCEPTABLE: u16 = 406;
    pub const INTERNAL: u16 = 500;
}

/// Main error type for kanban operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Task not found: {0}")]
    NotFound(TaskId),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Rule rejections (exit code 3)
    #[error("Time conflict: task {id} overlaps scheduled task {conflicting_id}")]
    TimeConflict { id: TaskId, conflicting_id: TaskId },

    #[error("Illegal direct mutation: {field} of epic {id} is derived from its subtasks")]
    IllegalDirectMutation { id: TaskId, field: &'static str },

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::NotFound(_)
            | Error::MalformedInput(_)
            | Error::InvalidArgument(_)
            | Error::InvalidConfig(_) => exit_codes::USER_ERROR,

            // Rule rejections
            Error::TimeConflict { .. } | Error::IllegalDirectMutation { .. } => {
                exit_codes::RULE_REJECTED
            }

            // Operation failures
            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Status code a request/response transport should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            Error::NotFound(_)
            | Error::MalformedInput(_)
            | Error::InvalidArgument(_)
            | Error::IllegalDirectMutation { .. } => status_codes::NOT_FOUND,
            Error::TimeConflict { .. } => status_codes::NOT_ACCEPTABLE,
            _ => status_codes::INTERNAL,
        }
    }

    /// Short class name matching the exit code
    pub fn kind(&self) -> &'static str {
        match self.exit_code() {
            exit_codes::USER_ERROR => "user_error",
            exit_codes::RULE_REJECTED => "rule_rejected",
            _ => "operation_failed",
        }
    }

    /// Structured details for machine-readable output
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::NotFound(id) => Some(serde_json::json!({ "id": id })),
            Error::TimeConflict { id, conflicting_id } => Some(serde_json::json!({
                "id": id,
                "conflicting_id": conflicting_id,
            })),
            Error::IllegalDirectMutation { id, field } => Some(serde_json::json!({
                "id": id,
                "field": field,
            })),
            Error::MalformedInput(message)
            | Error::InvalidArgument(message)
            | Error::InvalidConfig(message) => Some(serde_json::json!({ "message": message })),
            Error::LockFailed(path) => Some(serde_json::json!({ "path": path })),
            _ => None,
        }
    }
}

/// Result type alias for kanban operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error body of the JSON output envelope
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub message: String,
    pub code: i32,
    pub status_code: u16,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            message: err.to_string(),
            code: err.exit_code(),
            status_code: err.status_code(),
            kind: err.kind(),
            details: err.details(),
        }
    }
}
