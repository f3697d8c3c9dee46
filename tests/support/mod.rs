#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use chrono::{NaiveDate, NaiveDateTime};
use kanban::storage::TaskRecord;
use tempfile::TempDir;

/// Scratch working directory for driving the `kanban` binary
pub struct TestBoard {
    dir: TempDir,
}

impl TestBoard {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn tasks_file(&self) -> PathBuf {
        self.dir.path().join(".kanban").join("tasks.jsonl")
    }

    pub fn write_config(&self, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(".kanban.toml");
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// `kanban` command running inside the board directory
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("kanban").expect("binary");
        cmd.current_dir(self.dir.path())
            .env_remove("KANBAN_FILE")
            .env_remove("KANBAN_CONFIG")
            .env_remove("RUST_LOG");
        cmd
    }

    /// Run with `--json` and return the `data` member of the success envelope.
    pub fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self
            .cmd()
            .args(args)
            .arg("--json")
            .output()
            .expect("run kanban");
        assert!(
            output.status.success(),
            "kanban {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stdout)
        );
        let value: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("json envelope");
        value["data"].clone()
    }

    pub fn read_records(&self) -> Vec<TaskRecord> {
        let path = self.tasks_file();
        if !path.exists() {
            return Vec::new();
        }
        fs::read_to_string(&path)
            .expect("read tasks file")
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).expect("task record"))
            .collect()
    }
}

/// 2024-07-24 at `hour:minute`
pub fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 7, 24)
        .expect("date")
        .and_hms_opt(hour, minute, 0)
        .expect("time")
}
