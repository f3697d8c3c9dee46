//! Time-slot scheduling for tasks and subtasks.
//!
//! Only items with a start time are members. Two members interfere when
//! either window contains an endpoint of the other, boundaries included:
//! a window ending at 12:30 interferes with one starting at 12:30.

use std::collections::{BTreeSet, HashMap};

use chrono::{Duration, NaiveDateTime};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::task::TaskId;

/// Closed interval `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TimeWindow {
    /// Window of `duration` from `start`; `None` when the end falls outside the calendar range.
    pub fn checked(start: NaiveDateTime, duration: Duration) -> Option<Self> {
        start
            .checked_add_signed(duration)
            .map(|end| Self { start, end })
    }

    /// Like [`TimeWindow::checked`], with an unrepresentable end clamped to the range limit.
    pub fn new(start: NaiveDateTime, duration: Duration) -> Self {
        Self::checked(start, duration).unwrap_or_else(|| {
            let end = if duration < Duration::zero() {
                NaiveDateTime::MIN
            } else {
                NaiveDateTime::MAX
            };
            Self { start, end }
        })
    }

    /// Build from explicit bounds; swapped bounds are normalized.
    pub fn from_bounds(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        if end < start {
            Self {
                start: end,
                end: start,
            }
        } else {
            Self { start, end }
        }
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// Inclusive overlap, checked in both directions
    pub fn interferes_with(&self, other: &TimeWindow) -> bool {
        other.contains(self.start)
            || other.contains(self.end)
            || self.contains(other.start)
            || self.contains(other.end)
    }
}

/// Ordered set of scheduled items.
///
/// Ordered by `(start, id)`, so equal start times come out by ascending id.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    ordered: BTreeSet<(NaiveDateTime, TaskId)>,
    windows: HashMap<TaskId, TimeWindow>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.windows.contains_key(&id)
    }

    pub fn window(&self, id: TaskId) -> Option<TimeWindow> {
        self.windows.get(&id).copied()
    }

    /// First member (in schedule order) that interferes with `window`, ignoring `id` itself
    pub fn find_conflict(&self, id: TaskId, window: &TimeWindow) -> Option<TaskId> {
        // Members starting after the candidate ends cannot interfere.
        self.ordered
            .range(..=(window.end(), TaskId::MAX))
            .filter(|(_, other_id)| *other_id != id)
            .find(|(_, other_id)| {
                self.windows
                    .get(other_id)
                    .is_some_and(|other| window.interferes_with(other))
            })
            .map(|(_, other_id)| *other_id)
    }

    /// Reject `window` if it interferes with any other member.
    pub fn check(&self, id: TaskId, window: Option<&TimeWindow>) -> Result<()> {
        let Some(window) = window else {
            return Ok(());
        };
        match self.find_conflict(id, window) {
            Some(conflicting_id) => {
                warn!(id, conflicting_id, "time conflict");
                Err(Error::TimeConflict { id, conflicting_id })
            }
            None => Ok(()),
        }
    }

    /// Check and then insert or replace `id`. `None` unschedules it.
    ///
    /// Nothing changes when the check fails.
    pub fn schedule(&mut self, id: TaskId, window: Option<TimeWindow>) -> Result<()> {
        self.check(id, window.as_ref())?;
        self.remove(id);
        if let Some(window) = window {
            self.ordered.insert((window.start(), id));
            self.windows.insert(id, window);
            debug!(id, start = %window.start(), end = %window.end(), "scheduled");
        }
        Ok(())
    }

    pub fn remove(&mut self, id: TaskId) -> Option<TimeWindow> {
        let window = self.windows.remove(&id)?;
        self.ordered.remove(&(window.start(), id));
        debug!(id, "unscheduled");
        Some(window)
    }

    pub fn clear(&mut self) {
        self.ordered.clear();
        self.windows.clear();
    }

    /// Member ids by ascending start time, ties by ascending id
    pub fn ordered_ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.ordered.iter().map(|(_, id)| *id)
    }
}
