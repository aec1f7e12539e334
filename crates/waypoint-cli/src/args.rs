use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::{PlanCommands, TaskCommands};

/// Command-line front end for the Waypoint plan and task store
///
/// Plans group tasks under an application; every plan keeps its tasks in a
/// dense, reorderable sequence. Data lives in a SQLite file by default, or in
/// Redis when `--redis-url` is given and the binary was built with the
/// `redis` feature.
#[derive(Parser)]
#[command(version, about, name = "wp")]
pub struct Args {
    /// Path to the SQLite database file. Defaults to
    /// $XDG_DATA_HOME/waypoint/waypoint.db
    #[arg(long, global = true)]
    pub database_file: Option<PathBuf>,

    /// Redis connection URL; takes precedence over --database-file
    #[arg(long, global = true, env = "WAYPOINT_REDIS_URL")]
    pub redis_url: Option<String>,

    /// Abort any storage call that takes longer than this many milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Print results as JSON instead of markdown
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands for the Waypoint CLI
#[derive(Subcommand)]
pub enum Commands {
    /// Manage plans
    #[command(alias = "p")]
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Manage tasks within plans
    #[command(alias = "t")]
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
}
