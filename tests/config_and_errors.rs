mod support;

use kanban::config::Config;
use kanban::error::{exit_codes, status_codes, Error, JsonError};
use predicates::str::contains;
use support::TestBoard;

#[test]
fn exit_codes_follow_error_class() {
    assert_eq!(Error::NotFound(1).exit_code(), exit_codes::USER_ERROR);
    assert_eq!(
        Error::MalformedInput("x".into()).exit_code(),
        exit_codes::USER_ERROR
    );
    assert_eq!(
        Error::TimeConflict {
            id: 2,
            conflicting_id: 1
        }
        .exit_code(),
        exit_codes::RULE_REJECTED
    );
    assert_eq!(
        Error::IllegalDirectMutation {
            id: 1,
            field: "status"
        }
        .exit_code(),
        exit_codes::RULE_REJECTED
    );
    assert_eq!(
        Error::LockFailed("tasks.jsonl.lock".into()).exit_code(),
        exit_codes::OPERATION_FAILED
    );
}

#[test]
fn status_codes_for_transports() {
    assert_eq!(Error::NotFound(1).status_code(), status_codes::NOT_FOUND);
    assert_eq!(
        Error::MalformedInput("missing name".into()).status_code(),
        status_codes::NOT_FOUND
    );
    assert_eq!(
        Error::TimeConflict {
            id: 2,
            conflicting_id: 1
        }
        .status_code(),
        status_codes::NOT_ACCEPTABLE
    );
    assert_eq!(
        Error::LockFailed("x".into()).status_code(),
        status_codes::INTERNAL
    );
}

#[test]
fn json_error_includes_details() {
    let err = Error::TimeConflict {
        id: 5,
        conflicting_id: 3,
    };
    let json = JsonError::from(&err);
    assert_eq!(json.code, exit_codes::RULE_REJECTED);
    assert_eq!(json.status_code, status_codes::NOT_ACCEPTABLE);
    assert_eq!(json.kind, "rule_rejected");
    assert_eq!(json.message, err.to_string());
    let details = json.details.expect("details");
    assert_eq!(details["conflicting_id"], 3);
}

#[test]
fn error_envelope_body_matches_json_error() {
    let board = TestBoard::new();
    let output = board.cmd().args(["get", "9", "--json"]).output().unwrap();
    assert_eq!(output.status.code(), Some(exit_codes::USER_ERROR));

    let envelope: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let expected = serde_json::to_value(JsonError::from(&Error::NotFound(9))).unwrap();
    assert_eq!(envelope["error"], expected);
    assert_eq!(envelope["next_steps"][0], "kanban list all");
}

#[test]
fn config_storage_path_is_used_by_cli() {
    let board = TestBoard::new();
    board
        .write_config("[storage]\npath = \"board/items.jsonl\"\n")
        .unwrap();

    board.cmd().args(["task", "add", "Configured"]).assert().success();

    assert!(board.path().join("board/items.jsonl").exists());
    assert!(!board.tasks_file().exists());
}

#[test]
fn invalid_config_is_a_user_error() {
    let board = TestBoard::new();
    board.write_config("[history]\nlimit = 0\n").unwrap();

    board
        .cmd()
        .args(["list"])
        .assert()
        .code(exit_codes::USER_ERROR)
        .stderr(contains("history.limit"));
}

#[test]
fn unparsable_config_fails_the_operation() {
    let board = TestBoard::new();
    board.write_config("[history\n").unwrap();

    board
        .cmd()
        .args(["list"])
        .assert()
        .code(exit_codes::OPERATION_FAILED)
        .stderr(contains("TOML parse error"));
}

#[test]
fn config_round_trips_through_file() {
    let board = TestBoard::new();
    let mut config = Config::default();
    config.history.limit = Some(10);
    config.history.refresh_on_update = true;
    let path = board.path().join("custom.toml");
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.history.limit, Some(10));
    assert!(loaded.history.refresh_on_update);
    assert_eq!(loaded.storage.path, config.storage.path);

    // Explicit --config wins over the directory default.
    board
        .cmd()
        .args(["list", "--config"])
        .arg(&path)
        .assert()
        .success();
}
