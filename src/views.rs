//! Filtered and grouped task projections.
//!
//! The feed shows a bounded, due-date-ordered slice of the task collection,
//! optionally narrowed by a KPI selector or a status bucket. The two filter
//! kinds are mutually exclusive: activating one clears the other, and
//! re-activating the current one clears the filter entirely (toggle
//! semantics). The kanban board ignores filters and groups everything.

use chrono::NaiveDate;

use crate::fields::{Kpi, Priority, Status};
use crate::task::Task;

/// Maximum rows in feed-style views.
pub const FEED_PREVIEW_LEN: usize = 10;

/// Active feed narrowing: at most one of KPI or status bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedFilter {
    kpi: Option<Kpi>,
    status: Option<Status>,
}

impl FeedFilter {
    pub fn kpi(&self) -> Option<Kpi> {
        self.kpi
    }

    pub fn status(&self) -> Option<Status> {
        self.status
    }

    /// Select a KPI; selecting the active one clears it. Always clears any
    /// status-bucket selection.
    pub fn toggle_kpi(&mut self, kpi: Kpi) {
        self.kpi = if self.kpi == Some(kpi) { None } else { Some(kpi) };
        self.status = None;
    }

    /// Select a status bucket; selecting the active one clears it. Always
    /// clears any KPI selection.
    pub fn toggle_status(&mut self, status: Status) {
        self.status = if self.status == Some(status) {
            None
        } else {
            Some(status)
        };
        self.kpi = None;
    }

    pub fn clear(&mut self) {
        self.kpi = None;
        self.status = None;
    }

    pub fn is_active(&self) -> bool {
        self.kpi.is_some() || self.status.is_some()
    }

    fn matches(&self, task: &Task, today: NaiveDate) -> bool {
        if let Some(status) = self.status {
            return task.status == status;
        }
        match self.kpi {
            None | Some(Kpi::Total) => true,
            Some(Kpi::Completed) => task.status == Status::Completed,
            Some(Kpi::Overdue) => task.due_date < today && task.status != Status::Completed,
            Some(Kpi::Priority) => {
                matches!(task.priority, Priority::Urgent | Priority::High)
            }
        }
    }
}

/// The filtered feed: matching tasks sorted by due date ascending, capped at
/// [`FEED_PREVIEW_LEN`].
pub fn feed<'a, I>(tasks: I, filter: &FeedFilter, today: NaiveDate) -> Vec<&'a Task>
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut rows: Vec<&Task> = tasks
        .into_iter()
        .filter(|t| filter.matches(t, today))
        .collect();
    rows.sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.id.cmp(&b.id)));
    rows.truncate(FEED_PREVIEW_LEN);
    rows
}

/// The kanban board: the unfiltered collection grouped into the four status
/// buckets, uncapped, each column sorted by due date ascending.
pub fn kanban<'a, I>(tasks: I) -> [(Status, Vec<&'a Task>); 4]
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut board = Status::SEQUENCE.map(|status| (status, Vec::new()));
    for task in tasks {
        let column = Status::SEQUENCE
            .iter()
            .position(|s| *s == task.status)
            .unwrap_or(0);
        board[column].1.push(task);
    }
    for (_, column) in board.iter_mut() {
        column.sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.id.cmp(&b.id)));
    }
    board
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, status: Status, priority: Priority, due: &str) -> Task {
        Task {
            id: id.to_string(),
            title: format!("task {id}"),
            description: String::new(),
            priority,
            status,
            due_date: due.parse().unwrap(),
            assignee_id: "u-1".to_string(),
            project_id: "p-1".to_string(),
            dept_id: "d-1".to_string(),
            created_at: "2025-01-01".parse().unwrap(),
            tags: vec![],
        }
    }

    fn today() -> NaiveDate {
        "2025-01-15".parse().unwrap()
    }

    #[test]
    fn priority_kpi_keeps_urgent_and_high_sorted_by_due_date() {
        let tasks = vec![
            task("a", Status::Todo, Priority::Urgent, "2025-02-10"),
            task("b", Status::Todo, Priority::High, "2025-02-01"),
            task("c", Status::Todo, Priority::Medium, "2025-01-20"),
            task("d", Status::Todo, Priority::Low, "2025-01-18"),
        ];
        let mut filter = FeedFilter::default();
        filter.toggle_kpi(Kpi::Priority);

        let rows = feed(&tasks, &filter, today());
        let ids: Vec<&str> = rows.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn toggling_the_same_kpi_twice_restores_the_unfiltered_view() {
        let tasks = vec![
            task("a", Status::Completed, Priority::Low, "2025-02-01"),
            task("b", Status::Todo, Priority::Low, "2025-02-02"),
        ];
        let mut filter = FeedFilter::default();

        filter.toggle_kpi(Kpi::Completed);
        assert_eq!(feed(&tasks, &filter, today()).len(), 1);

        filter.toggle_kpi(Kpi::Completed);
        assert!(!filter.is_active());
        assert_eq!(feed(&tasks, &filter, today()).len(), 2);
    }

    #[test]
    fn kpi_and_status_selection_are_mutually_exclusive() {
        let mut filter = FeedFilter::default();
        filter.toggle_kpi(Kpi::Overdue);
        filter.toggle_status(Status::Review);
        assert_eq!(filter.kpi(), None);
        assert_eq!(filter.status(), Some(Status::Review));

        filter.toggle_kpi(Kpi::Overdue);
        assert_eq!(filter.status(), None);
        assert_eq!(filter.kpi(), Some(Kpi::Overdue));

        filter.clear();
        assert!(!filter.is_active());
    }

    #[test]
    fn feed_is_capped_at_the_preview_length() {
        let tasks: Vec<Task> = (0..25)
            .map(|i| {
                task(
                    &format!("t-{i:02}"),
                    Status::Todo,
                    Priority::Low,
                    "2025-02-01",
                )
            })
            .collect();
        let rows = feed(&tasks, &FeedFilter::default(), today());
        assert_eq!(rows.len(), FEED_PREVIEW_LEN);
    }

    #[test]
    fn overdue_kpi_uses_strict_before_today_and_skips_completed() {
        let tasks = vec![
            task("late", Status::InProgress, Priority::Low, "2025-01-10"),
            task("due-today", Status::InProgress, Priority::Low, "2025-01-15"),
            task("done-late", Status::Completed, Priority::Low, "2025-01-10"),
        ];
        let mut filter = FeedFilter::default();
        filter.toggle_kpi(Kpi::Overdue);
        let rows = feed(&tasks, &filter, today());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "late");
    }

    #[test]
    fn kanban_groups_every_task_without_a_cap() {
        let mut tasks = Vec::new();
        for i in 0..12 {
            tasks.push(task(&format!("t-{i:02}"), Status::Todo, Priority::Low, "2025-02-01"));
        }
        tasks.push(task("r", Status::Review, Priority::Low, "2025-02-01"));

        let board = kanban(&tasks);
        assert_eq!(board[0].0, Status::Todo);
        assert_eq!(board[0].1.len(), 12);
        assert_eq!(board[2].0, Status::Review);
        assert_eq!(board[2].1.len(), 1);
        assert!(board[1].1.is_empty());
        assert!(board[3].1.is_empty());
    }
}
