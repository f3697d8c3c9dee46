//! Shared output formatting for kanban CLI commands.

use serde::Serialize;

use crate::error::{Error, JsonError, Result};
use crate::task::Entity;

pub const SCHEMA_VERSION: &str = "kanban.v1";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone)]
pub struct HumanOutput {
    header: String,
    summary: Vec<(String, String)>,
    details: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            summary: Vec::new(),
            details: Vec::new(),
            warnings: Vec::new(),
            next_steps: Vec::new(),
        }
    }

    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.summary.push((key.into(), value.into()));
    }

    pub fn push_detail(&mut self, value: impl Into<String>) {
        self.details.push(value.into());
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }

    pub fn push_next_step(&mut self, value: impl Into<String>) {
        self.next_steps.push(value.into());
    }

    /// Summary rows describing one entity
    pub fn push_entity(&mut self, entity: &Entity) {
        self.push_summary("id", entity.id().to_string());
        self.push_summary("kind", entity.kind().to_string());
        self.push_summary("name", entity.name());
        if !entity.description().is_empty() {
            self.push_summary("description", entity.description());
        }
        self.push_summary("status", entity.status().to_string());
        if let Some(epic_id) = entity.epic_id() {
            self.push_summary("epic", epic_id.to_string());
        }
        if let Some(epic) = entity.as_epic() {
            let ids: Vec<String> = epic.subtask_ids().iter().map(|id| id.to_string()).collect();
            self.push_summary("subtasks", ids.join(", "));
        }
        if let Some(window) = entity.window() {
            self.push_summary(
                "scheduled",
                format!(
                    "{} - {} ({} min)",
                    window.start().format(TIME_FORMAT),
                    window.end().format(TIME_FORMAT),
                    window.duration().num_minutes()
                ),
            );
        }
    }
}

/// One-line rendering used by listings
pub fn entity_line(entity: &Entity) -> String {
    let mut line = format!(
        "#{} [{}] {} ({})",
        entity.id(),
        entity.kind(),
        entity.name(),
        entity.status()
    );
    if let Some(window) = entity.window() {
        line.push_str(&format!(
            " {} - {}",
            window.start().format(TIME_FORMAT),
            window.end().format(TIME_FORMAT)
        ));
    }
    if let Some(epic_id) = entity.epic_id() {
        line.push_str(&format!(" epic #{epic_id}"));
    }
    line
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        let warnings = human.map(|h| h.warnings.clone()).unwrap_or_default();
        let next_steps = human.map(|h| h.next_steps.clone()).unwrap_or_default();

        #[derive(Serialize)]
        struct Envelope<'a, T: Serialize> {
            schema_version: &'static str,
            command: &'a str,
            status: &'static str,
            data: &'a T,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            warnings: Vec<String>,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            next_steps: Vec<String>,
        }

        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "success",
            data,
            warnings,
            next_steps,
        };

        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if options.quiet {
        return Ok(());
    }

    if let Some(human) = human {
        println!("{}", format_human(human));
    }

    Ok(())
}

pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let next_steps = error_next_steps(err);
    let hint = next_steps.first().map(|step| step.as_str());
    if json {
        #[derive(Serialize)]
        struct Envelope<'a> {
            schema_version: &'static str,
            command: &'a str,
            status: &'static str,
            error: JsonError,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            next_steps: Vec<String>,
        }

        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "error",
            error: JsonError::from(err),
            next_steps,
        };

        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    eprintln!("error: {err}");
    if let Some(hint) = hint {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

pub fn format_human(output: &HumanOutput) -> String {
    let mut lines = Vec::new();
    lines.push(output.header.clone());

    push_summary(&mut lines, &output.summary);
    push_section(&mut lines, "Details", &output.details);
    push_section(&mut lines, "Warnings", &output.warnings);
    push_section(&mut lines, "Next steps", &output.next_steps);

    lines.join("\n")
}

pub fn infer_command_name_from_args() -> String {
    let mut args = std::env::args().skip(1);
    let mut command = None;
    let mut subcommand = None;

    // Value-taking global flags must not be mistaken for the command.
    while let Some(arg) = args.next() {
        if matches!(arg.as_str(), "--file" | "--config") {
            args.next();
            continue;
        }
        if arg.starts_with('-') {
            continue;
        }
        command = Some(arg);
        break;
    }

    let command = match command {
        Some(cmd) => cmd,
        None => return "kanban".to_string(),
    };

    if matches!(command.as_str(), "task" | "epic" | "subtask") {
        for arg in args.by_ref() {
            if arg.starts_with('-') {
                continue;
            }
            subcommand = Some(arg);
            break;
        }
    }

    if let Some(sub) = subcommand {
        format!("{command} {sub}")
    } else {
        command
    }
}

fn error_next_steps(err: &Error) -> Vec<String> {
    match err {
        Error::NotFound(_) => vec!["kanban list all".to_string()],
        Error::TimeConflict { conflicting_id, .. } => vec![
            format!("kanban get {conflicting_id}"),
            "kanban prioritized".to_string(),
        ],
        Error::IllegalDirectMutation { id, .. } => {
            vec![format!("kanban epic subtasks {id}")]
        }
        Error::InvalidConfig(_) | Error::TomlParse(_) => {
            vec!["fix .kanban.toml then retry".to_string()]
        }
        Error::LockFailed(_) => vec!["retry once the other kanban process finishes".to_string()],
        _ => Vec::new(),
    }
}

fn push_summary(lines: &mut Vec<String>, summary: &[(String, String)]) {
    if summary.is_empty() {
        return;
    }

    lines.push(String::new());
    lines.push("Summary:".to_string());
    for (key, value) in summary {
        if value.is_empty() {
            lines.push(format!("- {key}"));
        } else {
            lines.push(format!("- {key}: {value}"));
        }
    }
}

fn push_section(lines: &mut Vec<String>, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }

    lines.push(String::new());
    lines.push(format!("{title}:"));
    for item in items {
        lines.push(format!("- {item}"));
    }
}
