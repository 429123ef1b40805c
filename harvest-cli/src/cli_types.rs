//! CLI type definitions: command enums and argument structs.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "harvest")]
#[command(about = "Harvest game screenshots into a pool of storage targets", long_about = None)]
pub(crate) struct Cli {
    /// Settings file (defaults to ~/.config/harvest/settings.toml)
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Only show warnings and errors (suppress normal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose/debug logging (timestamps + debug-level messages)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Storage and file locations shared by the commands that touch them.
#[derive(Args, Clone, Default)]
pub(crate) struct PathArgs {
    /// Checkpoint file
    #[arg(long)]
    pub checkpoint: Option<PathBuf>,

    /// Storage targets in priority order (e.g., drive1,drive2)
    #[arg(long, value_delimiter = ',')]
    pub targets: Option<Vec<String>>,
}

#[derive(Args, Clone, Default)]
pub(crate) struct RunArgs {
    #[command(flatten)]
    pub paths: PathArgs,

    /// Output JSON file written when the catalog is exhausted
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Local directory images are staged in before transfer
    #[arg(long)]
    pub stage_dir: Option<PathBuf>,

    /// Concurrent downloads per batch
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Images per batch
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Treat targets whose capacity cannot be queried as full
    #[arg(long)]
    pub skip_on_probe_failure: bool,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Harvest screenshots until the catalog is exhausted (resumes automatically)
    Run(RunArgs),

    /// Rebuild the delivered set by listing every storage target
    Recover {
        #[command(flatten)]
        paths: PathArgs,
    },

    /// Show checkpoint progress
    Status {
        /// Checkpoint file
        #[arg(long)]
        checkpoint: Option<PathBuf>,
    },

    /// Probe free space on every storage target
    Targets {
        /// Storage targets in priority order (e.g., drive1,drive2)
        #[arg(long, value_delimiter = ',')]
        targets: Option<Vec<String>>,
    },

    /// Manage catalog credentials and settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Show current credentials, their sources and effective settings
    Show,

    /// Interactively set up credentials
    Setup,

    /// Test credentials against the catalog API
    Test,

    /// Print the config file paths
    Path,
}
