//! # wd - Team Task Dashboard CLI
//!
//! A terminal front end over the dashboard core: live entity collections
//! synchronised from a document store, derived workload statistics, filtered
//! feed and kanban projections, and AI-generated workload insights.
//!
//! ## Key Features
//!
//! - **Live collections**: tasks, members, departments, projects and your
//!   notifications, each kept current by full-snapshot subscriptions
//! - **Derived stats**: per-status counts, urgent/due-today/overdue counters,
//!   unread notifications, recomputed only when the data changes
//! - **Feed and board views**: KPI/status slicing with toggle semantics, a
//!   bounded due-date-ordered feed, and a four-column kanban board
//! - **Commands over writes**: every mutation is a direct store write; the
//!   view updates when the next snapshot lands, never optimistically
//! - **AI assistant**: workload summaries and task descriptions in English or
//!   Arabic via a hosted text-generation service
//!
//! ## Quick Start
//!
//! ```bash
//! # Sign in and load the demo fixtures
//! wd login u-1 --name Karim
//! wd seed
//!
//! # Look around
//! wd stats
//! wd board
//! wd feed --kpi priority
//!
//! # Work a task
//! wd add "Draft launch email" --due 2025-09-15 --assignee u-4 --project p-1 --dept dept-1
//! wd advance "Draft launch email"
//! wd inbox --read-all
//!
//! # Ask the assistant (needs WORKDASH_AI_KEY)
//! wd insight "What should the team finish first?"
//! ```
//!
//! State lives in `~/.workdash` (override with `--data-dir`): a single JSON
//! store file plus the signed-in session.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod cli;
pub mod cmd;
pub mod collections;
pub mod dispatch;
pub mod error;
pub mod fields;
pub mod insight;
pub mod notify;
pub mod org;
pub mod session;
pub mod stats;
pub mod store;
pub mod task;
pub mod views;

use cli::Cli;
use cmd::*;
use error::Result;

fn data_dir(cli_override: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = cli_override {
        return dir;
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".workdash")
}

async fn run(cli: Cli) -> Result<()> {
    let dir = data_dir(cli.data_dir);
    std::fs::create_dir_all(&dir)?;

    match cli.command {
        Commands::Login { user_id, name } => cmd_login(&dir, &user_id, name),
        Commands::Logout => cmd_logout(&dir),
        Commands::Whoami => cmd_whoami(&dir),
        Commands::Seed => cmd_seed(&dir).await,
        Commands::Stats => cmd_stats(&dir).await,
        Commands::Feed { kpi, status } => cmd_feed(&dir, kpi, status).await,
        Commands::Board => cmd_board(&dir).await,
        Commands::Add {
            title,
            desc,
            priority,
            due,
            assignee,
            project,
            dept,
            tags,
        } => cmd_add(&dir, title, desc, priority, due, assignee, project, dept, tags).await,
        Commands::SetStatus { task, status } => cmd_set_status(&dir, &task, status).await,
        Commands::Advance { task } => cmd_advance(&dir, &task).await,
        Commands::Retreat { task } => cmd_retreat(&dir, &task).await,
        Commands::Assign { task, user_id } => cmd_assign(&dir, &task, &user_id).await,
        Commands::Priority { task, priority } => cmd_priority(&dir, &task, priority).await,
        Commands::MemberAdd {
            id,
            name,
            role,
            dept,
        } => cmd_member_add(&dir, id, name, role, dept).await,
        Commands::Inbox { read_all } => cmd_inbox(&dir, read_all).await,
        Commands::Insight { prompt, locale } => cmd_insight(&dir, &prompt, locale).await,
        Commands::Describe { input, locale } => cmd_describe(&dir, &input, locale).await,
        Commands::Watch => cmd_watch(&dir).await,
        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
