//! Command implementations for the CLI interface.
//!
//! Every data command follows the same shape: load the session, open the
//! store, hydrate a workspace from the seed snapshots, then either render a
//! projection of it or hand an intent to the dispatcher. Commands never
//! mutate the workspace directly; a mutation is visible only through the next
//! snapshot.

use std::path::Path;
use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate};
use clap::{CommandFactory, Subcommand};
use clap_complete::{generate, Shell};
use serde_json::json;

use crate::cli::Cli;
use crate::collections::{spawn_sync, Workspace};
use crate::dispatch::Dispatcher;
use crate::error::{Error, ReadError, Result};
use crate::fields::{Kpi, Locale, Priority, Role, Status};
use crate::insight::{InsightClient, InsightContext};
use crate::session::Session;
use crate::stats::StatsCache;
use crate::store::{Collection, LocalStore, RemoteStore};
use crate::task::{Task, TaskDraft};
use crate::views::{feed, kanban, FeedFilter};

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in as a team member.
    Login {
        /// User id to act as.
        user_id: String,
        /// Display name; defaults to the user id.
        #[arg(long)]
        name: Option<String>,
    },

    /// Sign out and release the session.
    Logout,

    /// Show the signed-in identity.
    Whoami,

    /// Populate the store with demo departments, members, projects and tasks.
    Seed,

    /// Show the dashboard counters.
    Stats,

    /// Show the task feed (due-date order, first 10 rows).
    Feed {
        /// Slice by KPI: total | completed | overdue | priority.
        #[arg(long, value_enum, conflicts_with = "status")]
        kpi: Option<Kpi>,
        /// Slice by status bucket instead.
        #[arg(long, value_enum)]
        status: Option<Status>,
    },

    /// Show the kanban board (all tasks grouped by status).
    Board,

    /// Create a task. It always starts in To Do.
    Add {
        /// Short title for the task.
        title: String,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        /// Priority: low | medium | high | urgent.
        #[arg(long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
        /// Due date, YYYY-MM-DD.
        #[arg(long)]
        due: NaiveDate,
        /// Assignee user id.
        #[arg(long)]
        assignee: String,
        /// Project id.
        #[arg(long)]
        project: String,
        /// Department id.
        #[arg(long)]
        dept: String,
        /// Comma-separated tags. May be repeated.
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Set a task's status directly.
    SetStatus {
        /// Task id or title.
        task: String,
        #[arg(value_enum)]
        status: Status,
    },

    /// Move a task one step forward in the status sequence.
    Advance {
        /// Task id or title.
        task: String,
    },

    /// Move a task one step back in the status sequence.
    Retreat {
        /// Task id or title.
        task: String,
    },

    /// Reassign a task; the new assignee is notified.
    Assign {
        /// Task id or title.
        task: String,
        /// New assignee user id.
        user_id: String,
    },

    /// Change a task's priority.
    Priority {
        /// Task id or title.
        task: String,
        #[arg(value_enum)]
        priority: Priority,
    },

    /// Add or overwrite a team member.
    MemberAdd {
        /// User id to create the member at.
        id: String,
        /// Display name.
        name: String,
        /// Role: admin | manager | employee | viewer.
        #[arg(long, value_enum, default_value_t = Role::Employee)]
        role: Role,
        /// Department id.
        #[arg(long)]
        dept: String,
    },

    /// List your notifications, newest first.
    Inbox {
        /// Mark everything read after listing.
        #[arg(long)]
        read_all: bool,
    },

    /// Ask the AI assistant about the current workload.
    Insight {
        /// Free-text prompt.
        prompt: String,
        /// Response language.
        #[arg(long, value_enum, default_value_t = Locale::En)]
        locale: Locale,
    },

    /// Expand a short task idea into a two-sentence description.
    Describe {
        /// Short title or idea.
        input: String,
        /// Response language.
        #[arg(long, value_enum, default_value_t = Locale::En)]
        locale: Locale,
    },

    /// Follow live snapshots and print the counters on every change.
    Watch,

    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn open_store(data_dir: &Path) -> Arc<LocalStore> {
    Arc::new(LocalStore::open(&data_dir.join("store.json")))
}

fn signed_in(data_dir: &Path) -> Result<(Arc<LocalStore>, Session)> {
    let session = Session::current(data_dir)?;
    Ok((open_store(data_dir), session))
}

pub fn cmd_login(data_dir: &Path, user_id: &str, name: Option<String>) -> Result<()> {
    let display = name.unwrap_or_else(|| user_id.to_string());
    let session = Session::sign_in(data_dir, user_id, &display)?;
    println!("Signed in as {} ({})", session.display_name, session.user_id);
    Ok(())
}

pub fn cmd_logout(data_dir: &Path) -> Result<()> {
    Session::sign_out(data_dir)?;
    println!("Signed out");
    Ok(())
}

pub fn cmd_whoami(data_dir: &Path) -> Result<()> {
    let session = Session::current(data_dir)?;
    println!("{} ({})", session.display_name, session.user_id);
    Ok(())
}

pub fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "wd", &mut std::io::stdout());
}

pub async fn cmd_stats(data_dir: &Path) -> Result<()> {
    let (store, session) = signed_in(data_dir)?;
    let ws = Workspace::hydrate(store.as_ref(), &session);
    let today = Local::now().date_naive();
    let stats = StatsCache::default().get(&ws, today);

    println!("Total:      {}", stats.total);
    for status in Status::SEQUENCE {
        println!("{:<11} {}", format!("{}:", status.label()), stats.status_count(status));
    }
    println!("Urgent:     {}", stats.urgent);
    println!("Due today:  {}", stats.due_today);
    println!("Overdue:    {}", stats.overdue);
    println!("Unread:     {}", stats.unread_notifications);
    Ok(())
}

pub async fn cmd_feed(data_dir: &Path, kpi: Option<Kpi>, status: Option<Status>) -> Result<()> {
    let (store, session) = signed_in(data_dir)?;
    let ws = Workspace::hydrate(store.as_ref(), &session);

    let mut filter = FeedFilter::default();
    if let Some(kpi) = kpi {
        filter.toggle_kpi(kpi);
    } else if let Some(status) = status {
        filter.toggle_status(status);
    }

    let today = Local::now().date_naive();
    let rows = feed(ws.tasks.values(), &filter, today);
    print_task_table(&rows, &ws, today);
    Ok(())
}

pub async fn cmd_board(data_dir: &Path) -> Result<()> {
    let (store, session) = signed_in(data_dir)?;
    let ws = Workspace::hydrate(store.as_ref(), &session);
    let today = Local::now().date_naive();

    for (status, column) in kanban(ws.tasks.values()) {
        println!("== {} ({}) ==", status.label(), column.len());
        print_task_table(&column, &ws, today);
        println!();
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn cmd_add(
    data_dir: &Path,
    title: String,
    desc: Option<String>,
    priority: Priority,
    due: NaiveDate,
    assignee: String,
    project: String,
    dept: String,
    tags: Vec<String>,
) -> Result<()> {
    let (store, session) = signed_in(data_dir)?;
    let dispatcher = Dispatcher::new(store, session, Locale::En);
    let id = dispatcher
        .create_task(TaskDraft {
            title,
            description: desc.unwrap_or_default(),
            priority,
            status: Status::Todo,
            due_date: due,
            assignee_id: assignee,
            project_id: project,
            dept_id: dept,
            created_at: Local::now().date_naive(),
            tags: split_tags(&tags),
        })
        .await?;
    println!("Added task {id}");
    Ok(())
}

pub async fn cmd_set_status(data_dir: &Path, task: &str, status: Status) -> Result<()> {
    let (store, session) = signed_in(data_dir)?;
    let ws = Workspace::hydrate(store.as_ref(), &session);
    let task_id = resolve_task(task, &ws)?;
    Dispatcher::new(store, session, Locale::En)
        .set_task_status(&task_id, status)
        .await?;
    println!("{task_id} -> {}", status.label());
    Ok(())
}

pub async fn cmd_advance(data_dir: &Path, task: &str) -> Result<()> {
    let (store, session) = signed_in(data_dir)?;
    let ws = Workspace::hydrate(store.as_ref(), &session);
    let task_id = resolve_task(task, &ws)?;
    let next = ws.tasks[&task_id].status.advanced();
    Dispatcher::new(store, session, Locale::En)
        .set_task_status(&task_id, next)
        .await?;
    println!("{task_id} -> {}", next.label());
    Ok(())
}

pub async fn cmd_retreat(data_dir: &Path, task: &str) -> Result<()> {
    let (store, session) = signed_in(data_dir)?;
    let ws = Workspace::hydrate(store.as_ref(), &session);
    let task_id = resolve_task(task, &ws)?;
    let prev = ws.tasks[&task_id].status.retreated();
    Dispatcher::new(store, session, Locale::En)
        .set_task_status(&task_id, prev)
        .await?;
    println!("{task_id} -> {}", prev.label());
    Ok(())
}

pub async fn cmd_assign(data_dir: &Path, task: &str, user_id: &str) -> Result<()> {
    let (store, session) = signed_in(data_dir)?;
    let ws = Workspace::hydrate(store.as_ref(), &session);
    let task_id = resolve_task(task, &ws)?;
    Dispatcher::new(store, session, Locale::En)
        .reassign_task(&task_id, user_id)
        .await?;
    println!("{task_id} -> {user_id}");
    Ok(())
}

pub async fn cmd_priority(data_dir: &Path, task: &str, priority: Priority) -> Result<()> {
    let (store, session) = signed_in(data_dir)?;
    let ws = Workspace::hydrate(store.as_ref(), &session);
    let task_id = resolve_task(task, &ws)?;
    Dispatcher::new(store, session, Locale::En)
        .set_task_priority(&task_id, priority)
        .await?;
    println!("{task_id} -> {}", priority.label());
    Ok(())
}

pub async fn cmd_member_add(
    data_dir: &Path,
    id: String,
    name: String,
    role: Role,
    dept: String,
) -> Result<()> {
    let (store, session) = signed_in(data_dir)?;
    let member = crate::org::User {
        id,
        name,
        role,
        dept_id: dept,
    };
    Dispatcher::new(store, session, Locale::En)
        .add_team_member(&member)
        .await?;
    println!("Member {} saved", member.id);
    Ok(())
}

pub async fn cmd_inbox(data_dir: &Path, read_all: bool) -> Result<()> {
    let (store, session) = signed_in(data_dir)?;
    let ws = Workspace::hydrate(store.as_ref(), &session);

    if ws.notifications.is_empty() {
        println!("No notifications");
    }
    for n in &ws.notifications {
        let marker = if n.read { " " } else { "*" };
        println!(
            "{marker} {} {} — {}",
            n.timestamp.format("%Y-%m-%d %H:%M"),
            n.title,
            n.message
        );
    }

    if read_all {
        let written = Dispatcher::new(store, session, Locale::En)
            .mark_all_notifications_read(ws.notifications.iter())
            .await?;
        println!("Marked {written} notifications read");
    }
    Ok(())
}

pub async fn cmd_insight(data_dir: &Path, prompt: &str, locale: Locale) -> Result<()> {
    let (store, session) = signed_in(data_dir)?;
    let ws = Workspace::hydrate(store.as_ref(), &session);
    let client = InsightClient::from_env()?;
    let context = InsightContext::from_workspace(&ws);

    match client.request_insight(prompt, &context, locale).await {
        Ok(text) => println!("{text}"),
        Err(e) => {
            tracing::warn!(error = %e, "insight request failed");
            println!("{}", ai_fallback(locale));
        }
    }
    Ok(())
}

pub async fn cmd_describe(data_dir: &Path, input: &str, locale: Locale) -> Result<()> {
    // Needs a session like every other command, even though the prompt
    // carries no workspace state.
    let _ = Session::current(data_dir)?;
    let client = InsightClient::from_env()?;
    match client.describe_task(input, locale).await {
        Ok(text) => println!("{text}"),
        Err(e) => {
            tracing::warn!(error = %e, "describe request failed");
            println!("{}", ai_fallback(locale));
        }
    }
    Ok(())
}

pub async fn cmd_watch(data_dir: &Path) -> Result<()> {
    let (store, session) = signed_in(data_dir)?;
    let (mut events, _sync) = spawn_sync(store, &session);

    let mut ws = Workspace::default();
    let mut cache = StatsCache::default();
    while let Some(event) = events.recv().await {
        let collection = event.collection;
        ws.apply(event);
        let stats = cache.get(&ws, Local::now().date_naive());
        println!(
            "[{}] total={} todo={} in-progress={} review={} completed={} overdue={} unread={}",
            collection.name(),
            stats.total,
            stats.todo,
            stats.in_progress,
            stats.review,
            stats.completed,
            stats.overdue,
            stats.unread_notifications
        );
    }
    // The channel only closes once every forwarder has lost its subscription.
    Err(ReadError::SubscriptionClosed.into())
}

/// Populate the store with the demo fixture set. Fixed ids, so reseeding
/// overwrites rather than duplicates.
pub async fn cmd_seed(data_dir: &Path) -> Result<()> {
    let (store, _session) = signed_in(data_dir)?;
    let today = Local::now().date_naive();

    let departments = [
        ("dept-1", "Marketing"),
        ("dept-2", "Sales"),
        ("dept-3", "Operations"),
        ("dept-4", "Customer Support"),
        ("dept-5", "Logistics"),
    ];
    for (id, name) in departments {
        store
            .put(Collection::Departments, id, json!({ "name": name }))
            .await?;
    }

    let users = [
        ("u-1", "Karim", "Admin", "dept-3"),
        ("u-2", "Bedawy", "Manager", "dept-1"),
        ("u-3", "Haitham", "Employee", "dept-3"),
        ("u-4", "Shahd Fouad", "Employee", "dept-1"),
        ("u-5", "Mostafa Tarek", "Employee", "dept-2"),
        ("u-6", "Mohamed Tarek", "Employee", "dept-4"),
        ("u-7", "Hanafy", "Employee", "dept-5"),
    ];
    for (id, name, role, dept) in users {
        store
            .put(
                Collection::Users,
                id,
                json!({ "name": name, "role": role, "deptId": dept }),
            )
            .await?;
    }

    let projects = [
        ("p-1", "Autumn Campaign", "dept-1", 45),
        ("p-2", "Fleet Tracking", "dept-5", 12),
        ("p-3", "Partner Portal", "dept-2", 85),
    ];
    for (id, name, dept, progress) in projects {
        store
            .put(
                Collection::Projects,
                id,
                json!({ "name": name, "deptId": dept, "progress": progress }),
            )
            .await?;
    }

    let tasks = [
        ("t-1", "Social media strategy review", "High", "In Progress", 5, "u-4", "p-1", "dept-1"),
        ("t-2", "Quarterly sales forecast", "Urgent", "To Do", -2, "u-5", "p-3", "dept-2"),
        ("t-3", "Warehouse route audit", "Medium", "Review", 0, "u-7", "p-2", "dept-5"),
        ("t-4", "Onboarding flow copy", "Low", "To Do", 12, "u-2", "p-1", "dept-1"),
        ("t-5", "Support macros cleanup", "High", "Completed", -7, "u-6", "p-3", "dept-4"),
    ];
    for (id, title, priority, status, due_offset, assignee, project, dept) in tasks {
        let due = today + Duration::days(due_offset);
        store
            .put(
                Collection::Tasks,
                id,
                json!({
                    "title": title,
                    "description": "",
                    "priority": priority,
                    "status": status,
                    "dueDate": due,
                    "assigneeId": assignee,
                    "projectId": project,
                    "deptId": dept,
                    "createdAt": today,
                    "tags": []
                }),
            )
            .await?;
    }

    println!("Seeded demo data");
    Ok(())
}

fn ai_fallback(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "The assistant is unavailable right now. Please try again later.",
        Locale::Ar => "المساعد غير متاح حالياً، حاول مرة أخرى لاحقاً.",
    }
}

/// Resolve a task identifier (id, unique id prefix, or exact title) to an id.
fn resolve_task(identifier: &str, ws: &Workspace) -> Result<String> {
    if ws.tasks.contains_key(identifier) {
        return Ok(identifier.to_string());
    }

    let by_prefix: Vec<&String> = ws
        .tasks
        .keys()
        .filter(|id| id.starts_with(identifier))
        .collect();
    if by_prefix.len() == 1 {
        return Ok(by_prefix[0].clone());
    }
    if by_prefix.len() > 1 {
        return Err(Error::Usage(format!(
            "id prefix '{identifier}' is ambiguous ({} matches)",
            by_prefix.len()
        )));
    }

    let by_title: Vec<&Task> = ws
        .tasks
        .values()
        .filter(|t| t.title.eq_ignore_ascii_case(identifier))
        .collect();
    match by_title.len() {
        0 => Err(Error::Usage(format!("no task matching '{identifier}'"))),
        1 => Ok(by_title[0].id.clone()),
        n => Err(Error::Usage(format!(
            "title '{identifier}' is ambiguous ({n} matches); use the id"
        ))),
    }
}

/// Normalize a tag by trimming, lowercasing, and replacing spaces with hyphens.
fn normalise_tag(s: &str) -> String {
    s.trim().to_lowercase().replace(' ', "-")
}

/// Split comma-separated tag inputs and normalize each tag.
fn split_tags(inputs: &[String]) -> Vec<String> {
    let mut tags = Vec::new();
    for raw in inputs {
        for part in raw.split(',') {
            let tag = normalise_tag(part);
            if !tag.is_empty() {
                tags.push(tag);
            }
        }
    }
    tags.sort();
    tags.dedup();
    tags
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
fn format_due_relative(due: NaiveDate, today: NaiveDate) -> String {
    let delta = (due - today).num_days();
    match delta {
        0 => "today".into(),
        1 => "tomorrow".into(),
        d if d > 1 => format!("in {d}d"),
        d => format!("{}d late", -d),
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

fn print_task_table(rows: &[&Task], ws: &Workspace, today: NaiveDate) {
    println!(
        "{:<9} {:<28} {:<12} {:<7} {:<10} {:<16} {}",
        "ID", "Title", "Status", "Pri", "Due", "Project", "Assignee"
    );
    for t in rows {
        let project = ws
            .projects
            .get(&t.project_id)
            .map(|p| p.name.as_str())
            .unwrap_or("-");
        let assignee = ws
            .users
            .get(&t.assignee_id)
            .map(|u| u.name.as_str())
            .unwrap_or("-");
        println!(
            "{:<9} {:<28} {:<12} {:<7} {:<10} {:<16} {}",
            truncate(&t.id, 9),
            truncate(&t.title, 28),
            t.status.label(),
            t.priority.label(),
            format_due_relative(t.due_date, today),
            truncate(project, 16),
            assignee
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::SnapshotEvent;

    fn workspace_with_titles(entries: &[(&str, &str)]) -> Workspace {
        let mut ws = Workspace::default();
        let docs = entries
            .iter()
            .map(|(id, title)| {
                (
                    id.to_string(),
                    json!({
                        "title": title, "description": "", "priority": "Low",
                        "status": "To Do", "dueDate": "2025-02-01",
                        "assigneeId": "u-1", "projectId": "p-1", "deptId": "d-1",
                        "createdAt": "2025-01-01", "tags": []
                    }),
                )
            })
            .collect();
        ws.apply(SnapshotEvent {
            collection: Collection::Tasks,
            docs,
        });
        ws
    }

    #[test]
    fn resolve_prefers_exact_id_then_prefix_then_title() {
        let ws = workspace_with_titles(&[
            ("abc-123", "Fix login"),
            ("abd-456", "Write docs"),
        ]);
        assert_eq!(resolve_task("abc-123", &ws).unwrap(), "abc-123");
        assert_eq!(resolve_task("abd", &ws).unwrap(), "abd-456");
        assert_eq!(resolve_task("fix login", &ws).unwrap(), "abc-123");
        assert!(matches!(resolve_task("ab", &ws), Err(Error::Usage(_))));
        assert!(matches!(resolve_task("zzz", &ws), Err(Error::Usage(_))));
    }

    #[test]
    fn tags_are_split_normalised_and_deduped() {
        let tags = split_tags(&["Front End, urgent".to_string(), "urgent".to_string()]);
        assert_eq!(tags, vec!["front-end".to_string(), "urgent".to_string()]);
    }

    #[test]
    fn due_dates_format_relative_to_today() {
        let today: NaiveDate = "2025-01-15".parse().unwrap();
        assert_eq!(format_due_relative("2025-01-15".parse().unwrap(), today), "today");
        assert_eq!(format_due_relative("2025-01-16".parse().unwrap(), today), "tomorrow");
        assert_eq!(format_due_relative("2025-01-18".parse().unwrap(), today), "in 3d");
        assert_eq!(format_due_relative("2025-01-13".parse().unwrap(), today), "2d late");
    }
}
