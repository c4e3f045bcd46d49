//! # TB - Project Task Board
//!
//! A local project and task board. Each project owns a board with three
//! fixed columns (Queue, Development, Done); moving a card between columns
//! updates its status and stamps when work started and finished.
//!
//! ## Quick Start
//!
//! ```bash
//! # Launch the interactive board
//! tb
//!
//! # Create a project and add a task to its queue
//! tb new-project "Website"
//! tb add Website "Write copy" --priority high --file brief.pdf
//!
//! # Start work on it, then finish it
//! tb move Website queue 0 development 0
//! tb move Website development 0 done 0
//!
//! # Show the board
//! tb board Website
//! ```
//!
//! ## Key Commands
//!
//! - `tb ui` - Interactive project list and kanban board
//! - `tb projects` / `tb new-project` / `tb rm-project` - Manage projects
//! - `tb add` / `tb edit` / `tb move` - Change tasks on a board
//! - `tb export-file` - Write a task's attachment back to disk
//!
//! Data is stored in `~/.taskboard/projects.json` unless `--data-dir` or
//! `TASKBOARD_DATA_DIR` points elsewhere. Optional settings are read from
//! `config.toml` in the same directory.

use std::process;

use clap::Parser;
use tracing::error;

pub mod attachment;
pub mod board;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod db;
pub mod error;
pub mod fields;
pub mod logging;
pub mod project;
pub mod storage;
pub mod task;
pub mod timefmt;
pub mod tui {
    pub mod app;
    pub mod board_view;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod projects_view;
    pub mod run;
    pub mod task_form;
    pub mod utils;
}

use cli::Cli;
use cmd::*;
use config::{resolve_data_dir, Settings};
use db::ProjectStore;
use logging::LogTarget;
use storage::FileStorage;

fn main() {
    let cli = Cli::parse();

    // Completions need neither data nor logging; `None` means the TUI
    let command = match cli.command {
        Some(Commands::Completions { shell }) => {
            cmd_completions(shell);
            return;
        }
        Some(Commands::Store(command)) => Some(command),
        Some(Commands::Ui) | None => None,
    };

    let data_dir = match resolve_data_dir(cli.data_dir.as_deref()) {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    let target = if command.is_none() {
        LogTarget::File(&data_dir)
    } else {
        LogTarget::Stderr
    };
    logging::init(cli.verbose, target);

    let settings = match Settings::load(&data_dir) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    let mut store = ProjectStore::load(FileStorage::new(data_dir.clone()), &settings.storage_key);

    match command {
        None => {
            if let Err(e) = tui::run::run_tui(store, settings) {
                error!("Terminal interface failed: {e}");
                eprintln!("error: {e}");
                process::exit(1);
            }
        }
        Some(command) => {
            if let Err(e) = dispatch(&mut store, &settings, command) {
                eprintln!("error: {e}");
                process::exit(1);
            }
        }
    }
}
