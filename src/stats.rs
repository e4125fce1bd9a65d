//! Derived workload statistics.
//!
//! A pure function of (tasks, notifications): no hidden state, no clock reads.
//! "Today" is passed in by the caller so one render pass sees a single date
//! even if it straddles midnight. [`StatsCache`] adds the only permitted
//! caching: recompute when the workspace revision moves, otherwise reuse.

use chrono::NaiveDate;

use crate::collections::Workspace;
use crate::fields::{Priority, Status};
use crate::notify::Notification;
use crate::task::Task;

/// Aggregate counters for the dashboard header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub total: usize,
    pub todo: usize,
    pub in_progress: usize,
    pub review: usize,
    pub completed: usize,
    /// Urgent-priority tasks.
    pub urgent: usize,
    /// Due exactly today.
    pub due_today: usize,
    /// Due strictly before today and not completed.
    pub overdue: usize,
    pub unread_notifications: usize,
}

impl Stats {
    pub fn compute<'a, T, N>(tasks: T, notifications: N, today: NaiveDate) -> Stats
    where
        T: IntoIterator<Item = &'a Task>,
        N: IntoIterator<Item = &'a Notification>,
    {
        let mut stats = Stats::default();
        for task in tasks {
            stats.total += 1;
            match task.status {
                Status::Todo => stats.todo += 1,
                Status::InProgress => stats.in_progress += 1,
                Status::Review => stats.review += 1,
                Status::Completed => stats.completed += 1,
            }
            if task.priority == Priority::Urgent {
                stats.urgent += 1;
            }
            if task.due_date == today {
                stats.due_today += 1;
            }
            if task.due_date < today && task.status != Status::Completed {
                stats.overdue += 1;
            }
        }
        stats.unread_notifications = notifications.into_iter().filter(|n| !n.read).count();
        stats
    }

    pub fn status_count(&self, status: Status) -> usize {
        match status {
            Status::Todo => self.todo,
            Status::InProgress => self.in_progress,
            Status::Review => self.review,
            Status::Completed => self.completed,
        }
    }
}

/// Revision-gated memo of the latest computed stats.
#[derive(Debug, Default)]
pub struct StatsCache {
    computed_at: Option<(u64, NaiveDate)>,
    stats: Stats,
}

impl StatsCache {
    /// Current stats for the workspace, recomputing only if the workspace
    /// revision or the calendar date changed since the last call.
    pub fn get(&mut self, workspace: &Workspace, today: NaiveDate) -> Stats {
        let key = (workspace.revision(), today);
        if self.computed_at != Some(key) {
            self.stats = Stats::compute(
                workspace.tasks.values(),
                workspace.notifications.iter(),
                today,
            );
            self.computed_at = Some(key);
        }
        self.stats
    }
}
