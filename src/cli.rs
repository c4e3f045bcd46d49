use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Project and task board.
/// Storage defaults to ~/.taskboard or a directory passed via --data-dir.
#[derive(Parser)]
#[command(name = "tb", version, about = "Project task board with queue, development and done columns")]
pub struct Cli {
    /// Directory holding projects.json, config.toml and the TUI log.
    #[arg(long, global = true, env = "TASKBOARD_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
