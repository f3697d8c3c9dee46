mod support;

use predicates::str::contains;
use support::TestBoard;

#[test]
fn help_lists_commands() {
    let board = TestBoard::new();
    board
        .cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("task"))
        .stdout(contains("epic"))
        .stdout(contains("subtask"))
        .stdout(contains("prioritized"))
        .stdout(contains("history"));
}

#[test]
fn subcommand_help_shows_schedule_flags() {
    let board = TestBoard::new();
    board
        .cmd()
        .args(["task", "add", "--help"])
        .assert()
        .success()
        .stdout(contains("--start"))
        .stdout(contains("--duration"));
}

#[test]
fn add_then_get_and_list() {
    let board = TestBoard::new();
    board
        .cmd()
        .args(["task", "add", "Write report", "-d", "quarterly"])
        .assert()
        .success()
        .stdout(contains("kanban: added task #1"));

    board
        .cmd()
        .args(["get", "1"])
        .assert()
        .success()
        .stdout(contains("name: Write report"))
        .stdout(contains("description: quarterly"))
        .stdout(contains("status: NEW"));

    board
        .cmd()
        .args(["list", "tasks"])
        .assert()
        .success()
        .stdout(contains("#1 [task] Write report (NEW)"));
}

#[test]
fn json_envelope_carries_record() {
    let board = TestBoard::new();
    let data = board.json(&[
        "task",
        "add",
        "Standup",
        "--start",
        "2024-07-24 09:00",
        "--duration",
        "15",
    ]);
    assert_eq!(data["id"], 1);
    assert_eq!(data["kind"], "task");
    assert_eq!(data["status"], "NEW");
    assert_eq!(data["duration_minutes"], 15);
    assert_eq!(data["start_time"], "2024-07-24T09:00:00");
    assert_eq!(data["end_time"], "2024-07-24T09:15:00");

    let output = board.cmd().args(["get", "1", "--json"]).output().unwrap();
    let envelope: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(envelope["schema_version"], "kanban.v1");
    assert_eq!(envelope["command"], "get");
    assert_eq!(envelope["status"], "success");
}

#[test]
fn overlapping_slot_exits_with_rule_rejected() {
    let board = TestBoard::new();
    board
        .cmd()
        .args(["task", "add", "A", "--start", "2024-07-24 09:00", "--duration", "60"])
        .assert()
        .success();

    board
        .cmd()
        .args(["task", "add", "B", "--start", "2024-07-24 09:30", "--duration", "60"])
        .assert()
        .code(3)
        .stderr(contains("Time conflict"))
        .stderr(contains("hint: kanban get 1"));

    assert_eq!(board.read_records().len(), 1);
}

#[test]
fn conflict_json_reports_status_code() {
    let board = TestBoard::new();
    board
        .cmd()
        .args(["task", "add", "A", "--start", "2024-07-24 09:00", "--duration", "60"])
        .assert()
        .success();

    let output = board
        .cmd()
        .args([
            "task",
            "add",
            "B",
            "--start",
            "2024-07-24 10:00",
            "--duration",
            "30",
            "--json",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    let envelope: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(envelope["command"], "task add");
    assert_eq!(envelope["status"], "error");
    assert_eq!(envelope["error"]["status_code"], 406);
    assert_eq!(envelope["error"]["kind"], "rule_rejected");
    assert_eq!(envelope["error"]["details"]["conflicting_id"], 1);
}

#[test]
fn unknown_id_exits_with_user_error() {
    let board = TestBoard::new();
    board
        .cmd()
        .args(["get", "42"])
        .assert()
        .code(2)
        .stderr(contains("Task not found: 42"));
}

#[test]
fn epic_status_follows_subtasks() {
    let board = TestBoard::new();
    board.json(&["epic", "add", "Release"]);
    board.json(&["subtask", "add", "1", "Build"]);
    board.json(&["subtask", "add", "1", "Ship"]);

    let report = board.json(&["status", "2", "done"]);
    assert_eq!(report["status"], "DONE");
    assert_eq!(report["epic_id"], 1);
    assert_eq!(report["epic_status"], "IN_PROGRESS");

    let report = board.json(&["status", "3", "DONE"]);
    assert_eq!(report["epic_status"], "DONE");

    // Epic status is derived, never set.
    board
        .cmd()
        .args(["status", "1", "new"])
        .assert()
        .code(3)
        .stderr(contains("Illegal direct mutation"));
}

#[test]
fn epic_window_spans_subtasks() {
    let board = TestBoard::new();
    board.json(&["epic", "add", "Offsite"]);
    board.json(&[
        "subtask", "add", "1", "Travel", "--start", "2024-07-24 08:00", "--duration", "60",
    ]);
    board.json(&[
        "subtask", "add", "1", "Workshop", "--start", "2024-07-24 13:00", "--duration", "120",
    ]);

    let epic = board.json(&["get", "1"]);
    assert_eq!(epic["start_time"], "2024-07-24T08:00:00");
    assert_eq!(epic["end_time"], "2024-07-24T15:00:00");
    assert_eq!(epic["duration_minutes"], 420);
    assert_eq!(epic["subtask_ids"], serde_json::json!([2, 3]));
}

#[test]
fn deleting_epic_cascades() {
    let board = TestBoard::new();
    board.json(&["epic", "add", "Cleanup"]);
    board.json(&["subtask", "add", "1", "Sweep"]);
    board.json(&["task", "add", "Unrelated"]);

    let removed = board.json(&["delete", "1"]);
    assert_eq!(removed["removed"], serde_json::json!([1, 2]));

    let records = board.read_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, 3);
}

#[test]
fn prioritized_orders_by_start() {
    let board = TestBoard::new();
    board.json(&["task", "add", "Late", "--start", "2024-07-24 15:00", "--duration", "30"]);
    board.json(&["task", "add", "Unscheduled"]);
    board.json(&["task", "add", "Early", "--start", "2024-07-24 08:00", "--duration", "30"]);

    let items = board.json(&["prioritized"]);
    let ids: Vec<u64> = items
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![3, 1]);
}

#[test]
fn history_dedupes_within_one_run() {
    let board = TestBoard::new();
    board.json(&["task", "add", "One"]);
    board.json(&["task", "add", "Two"]);
    board.json(&["task", "add", "Three"]);

    let items = board.json(&["history", "1", "2", "1", "3"]);
    let ids: Vec<u64> = items
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![2, 1, 3]);
}

#[test]
fn clear_requires_a_kind() {
    let board = TestBoard::new();
    board
        .cmd()
        .args(["clear", "all"])
        .assert()
        .code(2)
        .stderr(contains("clear needs one kind"));
}

#[test]
fn duration_without_start_is_rejected() {
    let board = TestBoard::new();
    board
        .cmd()
        .args(["task", "add", "Floating", "--duration", "30"])
        .assert()
        .code(2)
        .stderr(contains("--duration needs --start"));
}

#[test]
fn oversized_duration_is_a_user_error() {
    let board = TestBoard::new();
    board
        .cmd()
        .args([
            "task",
            "add",
            "Forever",
            "--start",
            "2024-07-24 09:00",
            "--duration",
            "100000000000000",
        ])
        .assert()
        .code(2)
        .stderr(contains("supported time range"));

    assert!(board.read_records().is_empty());
}

#[test]
fn file_flag_overrides_default_location() {
    let board = TestBoard::new();
    let path = board.path().join("elsewhere.jsonl");
    board
        .cmd()
        .args(["task", "add", "Moved", "--file"])
        .arg(&path)
        .assert()
        .success();

    assert!(path.exists());
    assert!(!board.tasks_file().exists());
}
