//! Project records owned by the project store.
//!
//! A project is a titled container holding at most one board. Projects are
//! persisted together as a single JSON list; see `db::ProjectStore`.

use serde::{Deserialize, Serialize};

use crate::board::Board;

/// Title given to a project created without one.
pub const DEFAULT_PROJECT_TITLE: &str = "New project";

/// A named container owning at most one board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub title: String,
    /// `null` until the board is first opened and written back.
    #[serde(default)]
    pub tasks: Option<Board>,
}

impl Project {
    /// Create a project without a board.
    pub fn new(id: String, title: Option<&str>) -> Self {
        Project {
            id,
            title: resolve_project_title(title),
            tasks: None,
        }
    }

    /// The project's board, or a fresh empty one if it has none yet.
    pub fn load_board(&self) -> Board {
        self.tasks.clone().unwrap_or_default()
    }

    /// Number of tasks on the project's board.
    pub fn task_count(&self) -> usize {
        self.tasks.as_ref().map_or(0, Board::len)
    }
}

/// Trim a user-supplied title, falling back to the default when blank.
pub fn resolve_project_title(title: Option<&str>) -> String {
    match title.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => DEFAULT_PROJECT_TITLE.to_string(),
    }
}

/// Next free project id: one past the largest numeric id in the list.
///
/// Reuse is intended: deleting the highest project frees its id for the next
/// one, because the stored list is a bare array with no room for a counter.
/// An id is never shared with a live project.
pub fn next_project_id(projects: &[Project]) -> String {
    let max = projects
        .iter()
        .filter_map(|p| p.id.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    (max + 1).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_project_title() {
        assert_eq!(resolve_project_title(Some("Website")), "Website");
        assert_eq!(resolve_project_title(Some("  Padded  ")), "Padded");
        assert_eq!(resolve_project_title(Some("   ")), "New project");
        assert_eq!(resolve_project_title(None), "New project");
    }

    #[test]
    fn test_next_project_id_skips_live_ids() {
        let projects = vec![
            Project::new("1".into(), None),
            Project::new("3".into(), None),
            Project::new("legacy".into(), None),
        ];
        assert_eq!(next_project_id(&projects), "4");
        assert_eq!(next_project_id(&[]), "1");
    }

    #[test]
    fn test_next_project_id_reuses_freed_highest_id() {
        let mut projects: Vec<Project> =
            (1..=3).map(|i| Project::new(i.to_string(), None)).collect();
        projects.pop();
        assert_eq!(next_project_id(&projects), "3");
    }

    #[test]
    fn test_missing_board_loads_empty() {
        let project = Project::new("1".into(), Some("Website"));
        let board = project.load_board();
        assert!(board.is_empty());
        assert_eq!(board.queue.title, "Queue");
        assert_eq!(project.task_count(), 0);
    }
}
