//! Command implementations for the CLI interface.
//!
//! Each subcommand loads what it needs from the project store, applies one
//! board or project operation and lets the store persist the result.

use std::fs;
use std::path::PathBuf;

use clap::Subcommand;
use clap_complete::{generate, Shell};

use crate::attachment::{decode_data_uri, read_attachment};
use crate::board::{Board, Position};
use crate::config::Settings;
use crate::db::*;
use crate::error::{BoardError, Result};
use crate::fields::*;
use crate::storage::Storage;
use crate::task::TaskInput;
use crate::timefmt::Timestamp;

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive board (default).
    Ui,

    #[command(flatten)]
    Store(StoreCommand),

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Subcommands that read or change the project store.
#[derive(Subcommand)]
pub enum StoreCommand {
    /// List projects.
    Projects,

    /// Create a project.
    NewProject {
        /// Title; defaults to "New project".
        title: Option<String>,
    },

    /// Remove a project by ID or title.
    RmProject {
        project: String,
    },

    /// Print a project's board.
    Board {
        /// Project ID or title.
        project: String,
    },

    /// Add a task to the head of a project's queue.
    Add {
        /// Project ID or title.
        project: String,
        /// Task title; defaults to "New task".
        title: Option<String>,
        /// Longer description.
        #[arg(long)]
        desc: Option<String>,
        /// Priority: low | medium | high.
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Local file to embed in the task.
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Edit a task's title, description, priority or file.
    Edit {
        /// Project ID or title.
        project: String,
        /// Task ID or name.
        task: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Replace the embedded file.
        #[arg(long, conflicts_with = "clear_file")]
        file: Option<PathBuf>,
        /// Remove the embedded file.
        #[arg(long)]
        clear_file: bool,
    },

    /// Move a task between or within columns.
    Move {
        /// Project ID or title.
        project: String,
        /// Source column: queue | development | done.
        #[arg(value_enum)]
        from: ColumnKey,
        /// Index within the source column (0 = top).
        from_index: usize,
        /// Destination column: queue | development | done.
        #[arg(value_enum)]
        to: ColumnKey,
        /// Index within the destination column; past the end appends.
        to_index: usize,
    },

    /// Write a task's embedded file back to disk.
    ExportFile {
        /// Project ID or title.
        project: String,
        /// Task ID or name.
        task: String,
        /// Output path (default: the attachment's file name).
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

}

/// Resolve a project identifier (either ID or title) to a project ID.
pub fn resolve_project<S: Storage>(store: &ProjectStore<S>, identifier: &str) -> Result<String> {
    if store.get(identifier).is_some() {
        return Ok(identifier.to_string());
    }
    let matches: Vec<&str> = store
        .list_projects()
        .iter()
        .filter(|p| p.title.eq_ignore_ascii_case(identifier))
        .map(|p| p.id.as_str())
        .collect();
    match matches.as_slice() {
        [] => Err(BoardError::ProjectNotFound(identifier.to_string())),
        [id] => Ok(id.to_string()),
        _ => Err(BoardError::Ambiguous {
            name: identifier.to_string(),
            kind: "projects",
        }),
    }
}

/// Resolve a task identifier (either ID or name) to a task ID.
pub fn resolve_task(board: &Board, identifier: &str) -> Result<String> {
    if board.find(identifier).is_some() {
        return Ok(identifier.to_string());
    }
    let matches: Vec<&str> = board
        .tasks()
        .filter(|(_, t)| t.name.eq_ignore_ascii_case(identifier))
        .map(|(_, t)| t.id.as_str())
        .collect();
    match matches.as_slice() {
        [] => Err(BoardError::TaskNotFound(identifier.to_string())),
        [id] => Ok(id.to_string()),
        _ => Err(BoardError::Ambiguous {
            name: identifier.to_string(),
            kind: "tasks",
        }),
    }
}

/// Run a non-interactive subcommand.
pub fn dispatch<S: Storage>(
    store: &mut ProjectStore<S>,
    settings: &Settings,
    command: StoreCommand,
) -> Result<()> {
    match command {
        StoreCommand::Projects => cmd_projects(store),
        StoreCommand::NewProject { title } => cmd_new_project(store, title),
        StoreCommand::RmProject { project } => cmd_rm_project(store, &project),
        StoreCommand::Board { project } => cmd_board(store, &project),
        StoreCommand::Add { project, title, desc, priority, file } => cmd_add(
            store,
            &project,
            TaskInput {
                title: title.unwrap_or_default(),
                description: desc.unwrap_or_default(),
                priority: priority.unwrap_or(settings.default_priority),
                file: None,
            },
            file,
        ),
        StoreCommand::Edit { project, task, title, desc, priority, file, clear_file } => {
            cmd_edit(store, &project, &task, title, desc, priority, file, clear_file)
        }
        StoreCommand::Move { project, from, from_index, to, to_index } => cmd_move(
            store,
            &project,
            Position::new(from, from_index),
            Position::new(to, to_index),
        ),
        StoreCommand::ExportFile { project, task, output } => {
            cmd_export_file(store, &project, &task, output)
        }
    }
}

/// List all projects.
pub fn cmd_projects<S: Storage>(store: &ProjectStore<S>) -> Result<()> {
    if store.list_projects().is_empty() {
        println!("No projects yet. Create one with `tb new-project <title>`.");
    } else {
        print_projects(store.list_projects());
    }
    Ok(())
}

/// Create a project.
pub fn cmd_new_project<S: Storage>(store: &mut ProjectStore<S>, title: Option<String>) -> Result<()> {
    let project = store.add_project(title.as_deref())?;
    println!("Added project {} ({})", project.id, project.title);
    Ok(())
}

/// Remove a project.
pub fn cmd_rm_project<S: Storage>(store: &mut ProjectStore<S>, project: &str) -> Result<()> {
    // An unknown id is not an error for removal.
    let id = match resolve_project(store, project) {
        Ok(id) => id,
        Err(BoardError::ProjectNotFound(_)) => project.to_string(),
        Err(e) => return Err(e),
    };
    if store.remove_project(&id)? {
        println!("Removed project {id}");
    } else {
        println!("No project {id}; nothing removed.");
    }
    Ok(())
}

/// Print a project's board.
pub fn cmd_board<S: Storage>(store: &ProjectStore<S>, project: &str) -> Result<()> {
    let id = resolve_project(store, project)?;
    let board = store.load_board(&id)?;
    let title = store.get(&id).map(|p| p.title.as_str()).unwrap_or_default();
    print_board(&format!("Project {id}: {title}"), &board);
    Ok(())
}

/// Add a task, optionally embedding a local file.
pub fn cmd_add<S: Storage>(
    store: &mut ProjectStore<S>,
    project: &str,
    mut input: TaskInput,
    file: Option<PathBuf>,
) -> Result<()> {
    let id = resolve_project(store, project)?;
    if let Some(path) = file {
        input.file = Some(read_attachment(&path)?);
    }
    let task_id = store.update_board(&id, |board| Ok(board.add_task(input, Timestamp::now()).id.clone()))?;
    println!("Added task {task_id}");
    Ok(())
}

/// Update the editable fields of a task, keeping any not given.
#[allow(clippy::too_many_arguments)]
pub fn cmd_edit<S: Storage>(
    store: &mut ProjectStore<S>,
    project: &str,
    task: &str,
    title: Option<String>,
    desc: Option<String>,
    priority: Option<Priority>,
    file: Option<PathBuf>,
    clear_file: bool,
) -> Result<()> {
    let id = resolve_project(store, project)?;
    let new_file = file.as_deref().map(read_attachment).transpose()?;
    let task_id = store.update_board(&id, |board| {
        let task_id = resolve_task(board, task)?;
        let current = board
            .find(&task_id)
            .map(|(_, t)| TaskInput::from_task(t))
            .ok_or_else(|| BoardError::TaskNotFound(task_id.clone()))?;
        let input = TaskInput {
            title: title.unwrap_or(current.title),
            description: desc.unwrap_or(current.description),
            priority: priority.unwrap_or(current.priority),
            file: if clear_file { None } else { new_file.or(current.file) },
        };
        board.edit_task(&task_id, input)?;
        Ok(task_id)
    })?;
    println!("Updated task {task_id}");
    Ok(())
}

/// Apply one drag-and-drop move.
pub fn cmd_move<S: Storage>(
    store: &mut ProjectStore<S>,
    project: &str,
    from: Position,
    to: Position,
) -> Result<()> {
    let id = resolve_project(store, project)?;
    let moved = store.update_board(&id, |board| board.move_task(from, Some(to), Timestamp::now()))?;
    if moved {
        println!("Moved {} #{} to {} #{}", from.column, from.index, to.column, to.index);
    } else {
        println!("Nothing to move.");
    }
    Ok(())
}

/// Write a task's embedded file to disk.
pub fn cmd_export_file<S: Storage>(
    store: &ProjectStore<S>,
    project: &str,
    task: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let id = resolve_project(store, project)?;
    let board = store.load_board(&id)?;
    let task_id = resolve_task(&board, task)?;
    let Some((_, t)) = board.find(&task_id) else {
        return Err(BoardError::TaskNotFound(task_id));
    };
    let Some(file) = t.file.as_ref() else {
        println!("Task {task_id} has no file.");
        return Ok(());
    };
    let bytes = decode_data_uri(&file.url)?;
    let out = output.unwrap_or_else(|| PathBuf::from(&file.name));
    fs::write(&out, bytes)?;
    println!("Wrote {}", out.display());
    Ok(())
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use tempfile::TempDir;
    use clap::Parser;
    use crate::cli::Cli;

    fn store_with(titles: &[&str]) -> ProjectStore<MemoryStorage> {
        let mut store = ProjectStore::load(MemoryStorage::new(), DEFAULT_STORAGE_KEY);
        for t in titles {
            store.add_project(Some(t)).unwrap();
        }
        store
    }

    fn add(store: &mut ProjectStore<MemoryStorage>, project: &str, title: &str) {
        let input = TaskInput { title: title.into(), ..TaskInput::default() };
        cmd_add(store, project, input, None).unwrap();
    }

    #[test]
    fn test_resolve_project_by_id_or_title() {
        let store = store_with(&["Website", "Mobile", "mobile"]);
        assert_eq!(resolve_project(&store, "1").unwrap(), "1");
        assert_eq!(resolve_project(&store, "website").unwrap(), "1");
        assert!(matches!(resolve_project(&store, "Mobile"), Err(BoardError::Ambiguous { .. })));
        assert!(matches!(resolve_project(&store, "Desktop"), Err(BoardError::ProjectNotFound(_))));
    }

    #[test]
    fn test_add_then_move_through_commands() {
        let mut store = store_with(&["Website"]);
        add(&mut store, "Website", "Write brief");
        add(&mut store, "Website", "Review");
        cmd_move(
            &mut store,
            "1",
            Position::new(ColumnKey::Queue, 1),
            Position::new(ColumnKey::Development, 0),
        )
        .unwrap();

        let board = store.load_board("1").unwrap();
        assert_eq!(board.queue.items[0].name, "Review");
        assert_eq!(board.development.items[0].name, "Write brief");
        assert!(board.development.items[0].started_at.is_some());
    }

    #[test]
    fn test_move_from_empty_column_reports_error() {
        let mut store = store_with(&["Website"]);
        let err = cmd_move(
            &mut store,
            "1",
            Position::new(ColumnKey::Done, 0),
            Position::new(ColumnKey::Queue, 0),
        )
        .unwrap_err();
        assert!(matches!(err, BoardError::InvalidPosition { .. }));
        assert_eq!(store.get("1").unwrap().tasks, None);
    }

    #[test]
    fn test_edit_keeps_unspecified_fields() {
        let mut store = store_with(&["Website"]);
        let input = TaskInput {
            title: "Write brief".into(),
            description: "draft".into(),
            priority: Priority::High,
            file: None,
        };
        cmd_add(&mut store, "1", input, None).unwrap();
        cmd_edit(&mut store, "1", "write brief", None, Some("final".into()), None, None, false).unwrap();

        let board = store.load_board("1").unwrap();
        let task = &board.queue.items[0];
        assert_eq!(task.name, "Write brief");
        assert_eq!(task.description, "final");
        assert_eq!(task.priority, Priority::High);
    }

    #[test]
    fn test_file_attach_and_export() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("diagram.png");
        fs::write(&src, [137u8, 80, 78, 71]).unwrap();

        let mut store = store_with(&["Website"]);
        add(&mut store, "1", "Draw");
        cmd_edit(&mut store, "1", "1", None, None, None, Some(src), false).unwrap();
        let out = tmp.path().join("copy.png");
        cmd_export_file(&store, "1", "Draw", Some(out.clone())).unwrap();
        assert_eq!(fs::read(&out).unwrap(), vec![137u8, 80, 78, 71]);

        cmd_edit(&mut store, "1", "1", None, None, None, None, true).unwrap();
        assert_eq!(store.load_board("1").unwrap().queue.items[0].file, None);
    }

    #[test]
    fn test_rm_unknown_project_is_not_an_error() {
        let mut store = store_with(&["Website"]);
        cmd_rm_project(&mut store, "9").unwrap();
        assert_eq!(store.list_projects().len(), 1);
        cmd_rm_project(&mut store, "website").unwrap();
        assert!(store.list_projects().is_empty());
    }

    fn parse_store_command(args: &[&str]) -> StoreCommand {
        match Cli::try_parse_from(args).unwrap().command {
            Some(Commands::Store(command)) => command,
            _ => panic!("not a store command: {args:?}"),
        }
    }

    #[test]
    fn test_parsed_commands_dispatch_to_store() {
        let mut store = store_with(&["Website"]);
        let settings = Settings::default();
        for args in [
            &["tb", "add", "Website", "Write copy", "--priority", "high"][..],
            &["tb", "move", "website", "queue", "0", "dev", "0"][..],
        ] {
            dispatch(&mut store, &settings, parse_store_command(args)).unwrap();
        }
        let board = store.load_board("1").unwrap();
        assert_eq!(board.development.items[0].name, "Write copy");
        assert_eq!(board.development.items[0].priority, Priority::High);
    }

    #[test]
    fn test_ui_and_completions_are_not_store_commands() {
        assert!(matches!(Cli::try_parse_from(["tb"]).unwrap().command, None));
        assert!(matches!(Cli::try_parse_from(["tb", "ui"]).unwrap().command, Some(Commands::Ui)));
        assert!(matches!(
            Cli::try_parse_from(["tb", "completions", "bash"]).unwrap().command,
            Some(Commands::Completions { .. })
        ));
    }
}
