//! Project store and board printing helpers.
//!
//! `ProjectStore` owns the ordered project list. It is loaded once from a
//! `Storage` backend and every mutation rewrites the whole serialized list
//! under one key. A mutation whose write fails is rolled back in memory so the
//! list never drifts from what was persisted.

use tracing::{debug, info, warn};

use crate::board::{elapsed_time, time_in_progress, Board};
use crate::error::{BoardError, Result};
use crate::fields::*;
use crate::project::{next_project_id, Project};
use crate::storage::{FileStorage, Storage};
use crate::timefmt::Timestamp;

/// Default storage key for the project list.
pub const DEFAULT_STORAGE_KEY: &str = "projects";

/// In-memory project list with save-on-change persistence.
#[derive(Debug)]
pub struct ProjectStore<S: Storage = FileStorage> {
    storage: S,
    key: String,
    projects: Vec<Project>,
    /// Set when stored data could neither be loaded nor moved aside; every
    /// write is then refused so it is never clobbered.
    locked: bool,
}

impl<S: Storage> ProjectStore<S> {
    /// Load the project list, starting empty if it is missing or unreadable.
    ///
    /// Stored data that cannot be read or parsed is moved aside first, so
    /// the next write never replaces it.
    pub fn load(mut storage: S, key: &str) -> Self {
        let loaded = match storage.get(key) {
            Ok(Some(raw)) => serde_json::from_str::<Vec<Project>>(&raw).map_err(BoardError::from),
            Ok(None) => Ok(Vec::new()),
            Err(e) => Err(e),
        };
        let (projects, locked) = match loaded {
            Ok(projects) => (projects, false),
            Err(e) => match storage.set_aside(key) {
                Ok(Some(backup)) => {
                    warn!("Error loading project list ({e}); moved it to {backup} and starting fresh");
                    (Vec::new(), false)
                }
                Ok(None) => {
                    warn!("Error loading project list, starting fresh: {e}");
                    (Vec::new(), false)
                }
                Err(aside) => {
                    warn!("Error loading project list ({e}) and could not move it aside ({aside}); changes will not be saved");
                    (Vec::new(), true)
                }
            },
        };
        debug!(count = projects.len(), key, "loaded project list");
        ProjectStore {
            storage,
            key: key.to_string(),
            projects,
            locked,
        }
    }

    /// Write the whole project list.
    pub fn persist(&mut self) -> Result<()> {
        if self.locked {
            return Err(BoardError::StateLocked(self.key.clone()));
        }
        let data = serde_json::to_string(&self.projects)?;
        self.storage.set(&self.key, &data)
    }

    pub fn list_projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn get(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.projects
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| BoardError::ProjectNotFound(id.to_string()))
    }

    /// Append a project without a board.
    pub fn add_project(&mut self, title: Option<&str>) -> Result<&Project> {
        let project = Project::new(next_project_id(&self.projects), title);
        self.projects.push(project);
        if let Err(e) = self.persist() {
            self.projects.pop();
            return Err(e);
        }
        let project = &self.projects[self.projects.len() - 1];
        info!(id = %project.id, title = %project.title, "created project");
        Ok(project)
    }

    /// Remove the first project with `id`. Returns `false` if there was none.
    pub fn remove_project(&mut self, id: &str) -> Result<bool> {
        let Some(idx) = self.projects.iter().position(|p| p.id == id) else {
            debug!(id, "no project to remove");
            return Ok(false);
        };
        let removed = self.projects.remove(idx);
        if let Err(e) = self.persist() {
            self.projects.insert(idx, removed);
            return Err(e);
        }
        info!(id, title = %removed.title, "removed project");
        Ok(true)
    }

    /// The board of project `id`, or a fresh one if it has none yet.
    pub fn load_board(&self, id: &str) -> Result<Board> {
        let idx = self.position(id)?;
        Ok(self.projects[idx].load_board())
    }

    /// Write `board` back into its project and persist the full list.
    pub fn save_board(&mut self, id: &str, board: &Board) -> Result<()> {
        let idx = self.position(id)?;
        let previous = self.projects[idx].tasks.replace(board.clone());
        if let Err(e) = self.persist() {
            self.projects[idx].tasks = previous;
            return Err(e);
        }
        debug!(id, tasks = board.len(), "saved board");
        Ok(())
    }

    /// Load a board, apply `f`, and write it back if `f` succeeds.
    pub fn update_board<R>(
        &mut self,
        id: &str,
        f: impl FnOnce(&mut Board) -> Result<R>,
    ) -> Result<R> {
        let mut board = self.load_board(id)?;
        let out = f(&mut board)?;
        self.save_board(id, &board)?;
        Ok(out)
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
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

/// Print projects in a formatted table.
pub fn print_projects(projects: &[Project]) {
    println!("{:<5} {:<6} {}", "ID", "Tasks", "Title");
    for p in projects {
        println!("{:<5} {:<6} {}", truncate(&p.id, 5), p.task_count(), p.title);
    }
}

/// Print every column of a board with per-task details.
pub fn print_board(title: &str, board: &Board) {
    let now = Timestamp::now();
    println!("{title}");
    for key in ColumnKey::ALL {
        let column = board.column(key);
        println!();
        println!("{} ({})", column.title, column.items.len());
        println!("{:<5} {:<4} {:<7} {:<18} {}", "Idx", "ID", "Pri", "Created", "Name");
        for (i, t) in column.items.iter().enumerate() {
            let mut extra = String::new();
            match key {
                ColumnKey::Development => {
                    if let Some(elapsed) = elapsed_time(t, now) {
                        extra = format!("  [in progress {elapsed}]");
                    }
                }
                ColumnKey::Done => {
                    let spent = time_in_progress(t).unwrap_or_else(|| "-".into());
                    let completed = t.completed_at.map(|c| c.to_string()).unwrap_or_default();
                    extra = format!("  [completed {completed}, took {spent}]");
                }
                ColumnKey::Queue => {}
            }
            let file = t.file.as_ref().map(|f| format!(" ({})", f.name)).unwrap_or_default();
            println!(
                "{:<5} {:<4} {:<7} {:<18} {}{}{}",
                i,
                truncate(&t.id, 4),
                format_priority(t.priority),
                t.created_on.to_string(),
                t.name,
                file,
                extra
            );
        }
    }
}
