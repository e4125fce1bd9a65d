use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Team task dashboard CLI.
/// State defaults to ~/.workdash or a directory passed via --data-dir.
#[derive(Parser)]
#[command(name = "wd", version, about = "Team task dashboard")]
pub struct Cli {
    /// Directory holding the store file and session.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
