//! Command dispatcher: user intents as remote-store writes.
//!
//! One method per intent. Each performs a direct write and returns once the
//! store acknowledges it; the local workspace is never mutated optimistically,
//! so the view catches up when the next snapshot arrives and a failed write
//! needs no rollback. No retries: a [`WriteError`] goes straight back to the
//! caller.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use crate::error::WriteError;
use crate::fields::{Locale, NotificationKind, Priority, Status};
use crate::notify::{Notification, NotificationDraft};
use crate::org::User;
use crate::session::Session;
use crate::store::{Collection, RemoteStore};
use crate::task::TaskDraft;

pub struct Dispatcher {
    store: Arc<dyn RemoteStore>,
    session: Session,
    locale: Locale,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn RemoteStore>, session: Session, locale: Locale) -> Self {
        Dispatcher {
            store,
            session,
            locale,
        }
    }

    /// Write a new status. Completing a task additionally notifies the acting
    /// user; any other status writes nothing else.
    pub async fn set_task_status(&self, task_id: &str, status: Status) -> Result<(), WriteError> {
        self.store
            .update(Collection::Tasks, task_id, json!({ "status": status }))
            .await?;
        if status == Status::Completed {
            self.create_notification(NotificationDraft {
                user_id: self.session.user_id.clone(),
                title: completed_title(self.locale).to_string(),
                message: format!("Task updated to completed by {}", self.session.display_name),
                kind: NotificationKind::Status,
                task_id: Some(task_id.to_string()),
            })
            .await?;
        }
        Ok(())
    }

    /// Write a new assignee and notify them, whoever held the task before.
    pub async fn reassign_task(
        &self,
        task_id: &str,
        new_assignee_id: &str,
    ) -> Result<(), WriteError> {
        self.store
            .update(
                Collection::Tasks,
                task_id,
                json!({ "assigneeId": new_assignee_id }),
            )
            .await?;
        self.create_notification(NotificationDraft {
            user_id: new_assignee_id.to_string(),
            title: assigned_title(self.locale).to_string(),
            message: format!("New task assigned to you by {}", self.session.display_name),
            kind: NotificationKind::Assignment,
            task_id: Some(task_id.to_string()),
        })
        .await?;
        Ok(())
    }

    /// Write a new priority. No side effects.
    pub async fn set_task_priority(
        &self,
        task_id: &str,
        priority: Priority,
    ) -> Result<(), WriteError> {
        self.store
            .update(Collection::Tasks, task_id, json!({ "priority": priority }))
            .await
    }

    /// Create a task with a generated id. The initial status is always
    /// `To Do`, whatever the draft carries.
    pub async fn create_task(&self, draft: TaskDraft) -> Result<String, WriteError> {
        let mut doc = serde_json::to_value(&draft)?;
        doc["status"] = serde_json::to_value(Status::Todo)?;
        self.store.create(Collection::Tasks, doc).await
    }

    /// Create or overwrite a team member document at the caller-chosen id.
    pub async fn add_team_member(&self, user: &User) -> Result<(), WriteError> {
        self.store
            .put(Collection::Users, &user.id, serde_json::to_value(user)?)
            .await
    }

    /// Create a notification, stamping the current time and `read = false`
    /// over whatever the draft says.
    pub async fn create_notification(
        &self,
        draft: NotificationDraft,
    ) -> Result<String, WriteError> {
        let mut doc = serde_json::to_value(&draft)?;
        doc["timestamp"] = serde_json::to_value(Utc::now())?;
        doc["read"] = json!(false);
        self.store.create(Collection::Notifications, doc).await
    }

    /// Mark every unread notification of the signed-in user read, one write
    /// per document, sequentially. A mid-sequence failure leaves the earlier
    /// writes in place; the error is returned as-is and nothing is retried.
    /// Returns how many documents were written.
    pub async fn mark_all_notifications_read<'a, I>(
        &self,
        notifications: I,
    ) -> Result<usize, WriteError>
    where
        I: IntoIterator<Item = &'a Notification>,
    {
        let mut written = 0;
        let unread = notifications
            .into_iter()
            .filter(|n| !n.read && n.user_id == self.session.user_id);
        for notification in unread {
            self.store
                .update(
                    Collection::Notifications,
                    &notification.id,
                    json!({ "read": true }),
                )
                .await?;
            written += 1;
        }
        Ok(written)
    }
}

fn completed_title(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "Task Completed",
        Locale::Ar => "مهمة مكتملة",
    }
}

fn assigned_title(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "New Task Assigned",
        Locale::Ar => "تم إسناد مهمة إليك",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::Workspace;
    use crate::fields::Role;
    use crate::store::{LocalStore, Query};

    fn dispatcher(store: Arc<LocalStore>) -> Dispatcher {
        Dispatcher::new(
            store,
            Session {
                user_id: "u-1".to_string(),
                display_name: "Karim".to_string(),
            },
            Locale::En,
        )
    }

    fn draft(status: Status) -> TaskDraft {
        TaskDraft {
            title: "Ship the release".to_string(),
            description: "cut, tag, announce".to_string(),
            priority: Priority::High,
            status,
            due_date: "2025-02-01".parse().unwrap(),
            assignee_id: "u-2".to_string(),
            project_id: "p-1".to_string(),
            dept_id: "d-1".to_string(),
            created_at: "2025-01-10".parse().unwrap(),
            tags: vec!["release".to_string()],
        }
    }

    fn session() -> Session {
        Session {
            user_id: "u-1".to_string(),
            display_name: "Karim".to_string(),
        }
    }

    #[tokio::test]
    async fn completing_a_task_notifies_the_acting_user_exactly_once() {
        let store = Arc::new(LocalStore::in_memory());
        let dispatcher = dispatcher(store.clone());
        let task_id = dispatcher.create_task(draft(Status::Todo)).await.unwrap();

        dispatcher
            .set_task_status(&task_id, Status::InProgress)
            .await
            .unwrap();
        let ws = Workspace::hydrate(store.as_ref(), &session());
        assert!(ws.notifications.is_empty());

        dispatcher
            .set_task_status(&task_id, Status::Completed)
            .await
            .unwrap();
        let ws = Workspace::hydrate(store.as_ref(), &session());
        assert_eq!(ws.notifications.len(), 1);
        let n = &ws.notifications[0];
        assert_eq!(n.user_id, "u-1");
        assert_eq!(n.kind, NotificationKind::Status);
        assert_eq!(n.task_id.as_deref(), Some(task_id.as_str()));
        assert!(!n.read);
    }

    #[tokio::test]
    async fn reassignment_notifies_the_new_assignee() {
        let store = Arc::new(LocalStore::in_memory());
        let dispatcher = dispatcher(store.clone());
        let task_id = dispatcher.create_task(draft(Status::Todo)).await.unwrap();

        dispatcher.reassign_task(&task_id, "u-3").await.unwrap();

        let mut sub = store.subscribe(Collection::Notifications, Query::recipient("u-3"));
        let snap = sub.current();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].1["type"], serde_json::json!("assignment"));

        let mut tasks = store.subscribe(Collection::Tasks, Query::default());
        assert_eq!(
            tasks.current()[0].1["assigneeId"],
            serde_json::json!("u-3")
        );
    }

    #[tokio::test]
    async fn created_tasks_start_in_todo_whatever_the_draft_says() {
        let store = Arc::new(LocalStore::in_memory());
        let dispatcher = dispatcher(store.clone());
        let task_id = dispatcher.create_task(draft(Status::Review)).await.unwrap();

        let ws = Workspace::hydrate(store.as_ref(), &session());
        assert_eq!(ws.tasks[&task_id].status, Status::Todo);
    }

    #[tokio::test]
    async fn priority_change_writes_no_notification() {
        let store = Arc::new(LocalStore::in_memory());
        let dispatcher = dispatcher(store.clone());
        let task_id = dispatcher.create_task(draft(Status::Todo)).await.unwrap();

        dispatcher
            .set_task_priority(&task_id, Priority::Urgent)
            .await
            .unwrap();

        let ws = Workspace::hydrate(store.as_ref(), &session());
        assert_eq!(ws.tasks[&task_id].priority, Priority::Urgent);
        assert!(ws.notifications.is_empty());
    }

    #[tokio::test]
    async fn add_team_member_overwrites_at_the_chosen_id() {
        let store = Arc::new(LocalStore::in_memory());
        let dispatcher = dispatcher(store.clone());
        let member = User {
            id: "u-9".to_string(),
            name: "Shahd".to_string(),
            role: Role::Employee,
            dept_id: "d-1".to_string(),
        };
        dispatcher.add_team_member(&member).await.unwrap();
        dispatcher
            .add_team_member(&User {
                name: "Shahd Fouad".to_string(),
                ..member.clone()
            })
            .await
            .unwrap();

        let ws = Workspace::hydrate(store.as_ref(), &session());
        assert_eq!(ws.users.len(), 1);
        assert_eq!(ws.users["u-9"].name, "Shahd Fouad");
    }

    #[tokio::test]
    async fn mark_all_read_clears_only_this_users_unread() {
        let store = Arc::new(LocalStore::in_memory());
        let dispatcher = dispatcher(store.clone());

        // 3 unread + 2 read for u-1, plus one unread for someone else.
        for read in [false, false, false, true, true] {
            let id = dispatcher
                .create_notification(NotificationDraft {
                    user_id: "u-1".to_string(),
                    title: "t".to_string(),
                    message: "m".to_string(),
                    kind: NotificationKind::Alert,
                    task_id: None,
                })
                .await
                .unwrap();
            if read {
                store
                    .update(Collection::Notifications, &id, json!({ "read": true }))
                    .await
                    .unwrap();
            }
        }
        dispatcher
            .create_notification(NotificationDraft {
                user_id: "u-2".to_string(),
                title: "t".to_string(),
                message: "m".to_string(),
                kind: NotificationKind::Alert,
                task_id: None,
            })
            .await
            .unwrap();

        let ws = Workspace::hydrate(store.as_ref(), &session());
        let written = dispatcher
            .mark_all_notifications_read(ws.notifications.iter())
            .await
            .unwrap();
        assert_eq!(written, 3);

        let ws = Workspace::hydrate(store.as_ref(), &session());
        assert_eq!(ws.notifications.len(), 5);
        assert!(ws.notifications.iter().all(|n| n.read));

        let mut other = store.subscribe(Collection::Notifications, Query::recipient("u-2"));
        assert_eq!(other.current()[0].1["read"], serde_json::json!(false));
    }
}
