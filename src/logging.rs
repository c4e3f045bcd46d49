//! Tracing setup.
//!
//! CLI commands log to stderr. The TUI owns the terminal, so while it runs
//! logs go to `<data_dir>/taskboard.log` instead.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

pub const LOG_FILE: &str = "taskboard.log";

/// Where log output should go.
pub enum LogTarget<'a> {
    Stderr,
    File(&'a Path),
}

fn filter(verbose: bool) -> EnvFilter {
    let default = if verbose {
        "tb=debug,warn"
    } else {
        "tb=info,warn"
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber. Falls back to stderr if the log file
/// cannot be opened.
pub fn init(verbose: bool, target: LogTarget<'_>) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_target(false);

    if let LogTarget::File(dir) = target {
        match OpenOptions::new().create(true).append(true).open(dir.join(LOG_FILE)) {
            Ok(file) => {
                builder.with_ansi(false).with_writer(Mutex::new(file)).init();
                return;
            }
            Err(e) => eprintln!("Failed to open log file, logging to stderr: {e}"),
        }
    }
    builder.with_writer(std::io::stderr).init();
}
