//! Behaviour every `TaskManager` implementation must share.

mod support;

use chrono::Duration;
use kanban::config::Config;
use kanban::error::Error;
use kanban::{
    Entity, FileBackedTaskManager, InMemoryTaskManager, TaskId, TaskManager, TaskStatus,
};
use support::{at, TestBoard};

fn with_each_manager(check: impl Fn(&mut dyn TaskManager)) {
    let mut memory = InMemoryTaskManager::new();
    check(&mut memory);

    let board = TestBoard::new();
    let mut file = FileBackedTaskManager::new(board.tasks_file(), &Config::default());
    check(&mut file);
}

fn ids<T>(items: &[T], id: impl Fn(&T) -> TaskId) -> Vec<TaskId> {
    items.iter().map(id).collect()
}

#[test]
fn created_items_are_not_indexed_until_added() {
    with_each_manager(|manager| {
        let task = manager.create_task("Draft", "");
        assert_eq!(task.id(), 1);
        assert!(manager.tasks().is_empty());
        assert!(matches!(manager.get_by_id(1), Err(Error::NotFound(1))));

        manager.add_task(task).unwrap();
        assert_eq!(ids(&manager.tasks(), |task| task.id()), vec![1]);
    });
}

#[test]
fn epic_aggregates_status_and_window() {
    with_each_manager(|manager| {
        let epic = manager.create_epic("Launch", "");
        let epic_id = epic.id();
        manager.add_epic(epic).unwrap();

        let first = manager
            .create_subtask(epic_id, "Design", "")
            .with_schedule(at(9, 0), Duration::minutes(60));
        let second = manager
            .create_subtask(epic_id, "Build", "")
            .with_schedule(at(11, 0), Duration::minutes(90));
        let (first_id, second_id) = (first.id(), second.id());
        manager.add_subtask(first).unwrap();
        manager.add_subtask(second).unwrap();

        let epic = manager.get_epic(epic_id).unwrap();
        assert_eq!(epic.status(), TaskStatus::New);
        assert_eq!(epic.subtask_ids(), &[first_id, second_id]);
        assert_eq!(epic.start_time(), Some(at(9, 0)));
        assert_eq!(epic.end_time(), Some(at(12, 30)));
        assert_eq!(epic.duration(), Duration::minutes(210));

        manager.set_status(first_id, TaskStatus::Done).unwrap();
        assert_eq!(manager.get_epic(epic_id).unwrap().status(), TaskStatus::InProgress);
        manager.set_status(second_id, TaskStatus::Done).unwrap();
        assert_eq!(manager.get_epic(epic_id).unwrap().status(), TaskStatus::Done);

        manager.delete_by_id(second_id).unwrap();
        let epic = manager.get_epic(epic_id).unwrap();
        assert_eq!(epic.end_time(), Some(at(10, 0)));
        assert_eq!(epic.status(), TaskStatus::Done);

        manager.delete_all_subtasks().unwrap();
        let epic = manager.get_epic(epic_id).unwrap();
        assert_eq!(epic.status(), TaskStatus::New);
        assert_eq!(epic.start_time(), None);
    });
}

#[test]
fn epic_fields_reject_direct_mutation() {
    with_each_manager(|manager| {
        let epic = manager.create_epic("Read only", "");
        let epic_id = epic.id();
        manager.add_epic(epic).unwrap();

        assert!(matches!(
            manager.set_status(epic_id, TaskStatus::Done),
            Err(Error::IllegalDirectMutation { field: "status", .. })
        ));

        let mut entity = manager.get_by_id(epic_id).unwrap();
        assert!(entity.set_status(TaskStatus::Done).is_err());
        assert!(entity.set_start_time(Some(at(9, 0))).is_err());
        assert!(entity.set_duration(Duration::minutes(5)).is_err());
    });
}

#[test]
fn conflicting_slot_is_rejected_without_changes() {
    with_each_manager(|manager| {
        let a = manager
            .create_task("A", "")
            .with_schedule(at(12, 0), Duration::minutes(30));
        manager.add_task(a).unwrap();

        let b = manager
            .create_task("B", "")
            .with_schedule(at(12, 0), Duration::minutes(10));
        let b_id = b.id();
        assert!(matches!(
            manager.add_task(b),
            Err(Error::TimeConflict { conflicting_id: 1, .. })
        ));
        assert!(matches!(manager.get_by_id(b_id), Err(Error::NotFound(_))));

        let c = manager
            .create_task("C", "")
            .with_schedule(at(13, 0), Duration::minutes(10));
        manager.add_task(c).unwrap();
        assert_eq!(manager.prioritized().len(), 2);
    });
}

#[test]
fn boundary_touch_counts_as_conflict() {
    with_each_manager(|manager| {
        let a = manager
            .create_task("A", "")
            .with_schedule(at(9, 0), Duration::minutes(60));
        manager.add_task(a).unwrap();

        let b = manager
            .create_task("B", "")
            .with_schedule(at(10, 0), Duration::minutes(30));
        assert!(matches!(
            manager.add_task(b),
            Err(Error::TimeConflict { .. })
        ));
    });
}

#[test]
fn prioritized_skips_epics_and_unscheduled() {
    with_each_manager(|manager| {
        let epic = manager.create_epic("Container", "");
        let epic_id = epic.id();
        manager.add_epic(epic).unwrap();

        let late = manager
            .create_subtask(epic_id, "Late", "")
            .with_schedule(at(16, 0), Duration::minutes(15));
        let floating = manager.create_task("Floating", "");
        let early = manager
            .create_task("Early", "")
            .with_schedule(at(8, 0), Duration::minutes(15));
        let (late_id, early_id) = (late.id(), early.id());
        manager.add_subtask(late).unwrap();
        manager.add_task(floating).unwrap();
        manager.add_task(early).unwrap();

        let order: Vec<TaskId> = manager.prioritized().iter().map(Entity::id).collect();
        assert_eq!(order, vec![early_id, late_id]);
    });
}

#[test]
fn history_tracks_unique_views_in_order() {
    with_each_manager(|manager| {
        for name in ["one", "two", "three"] {
            let task = manager.create_task(name, "");
            manager.add_task(task).unwrap();
        }
        for id in [1, 2, 1, 3] {
            manager.get_by_id(id).unwrap();
        }
        let viewed: Vec<TaskId> = manager.history().iter().map(Entity::id).collect();
        assert_eq!(viewed, vec![2, 1, 3]);

        manager.delete_by_id(1).unwrap();
        let viewed: Vec<TaskId> = manager.history().iter().map(Entity::id).collect();
        assert_eq!(viewed, vec![2, 3]);

        manager.delete_all_tasks().unwrap();
        assert!(manager.history().is_empty());
    });
}

#[test]
fn deleting_epics_removes_their_subtasks_from_history() {
    with_each_manager(|manager| {
        let epic = manager.create_epic("Epic", "");
        let epic_id = epic.id();
        manager.add_epic(epic).unwrap();
        let subtask = manager.create_subtask(epic_id, "Part", "");
        let subtask_id = subtask.id();
        manager.add_subtask(subtask).unwrap();

        manager.get_by_id(subtask_id).unwrap();
        manager.get_by_id(epic_id).unwrap();
        manager.delete_all_epics().unwrap();

        assert!(manager.subtasks().is_empty());
        assert!(manager.history().is_empty());
        assert!(matches!(
            manager.epic_subtasks(epic_id),
            Err(Error::NotFound(_))
        ));
    });
}

#[test]
fn subtask_requires_existing_epic() {
    with_each_manager(|manager| {
        let orphan = manager.create_subtask(99, "Orphan", "");
        assert!(matches!(
            manager.add_subtask(orphan),
            Err(Error::NotFound(99))
        ));
        assert!(manager.subtasks().is_empty());
    });
}
