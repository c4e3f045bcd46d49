//! Enumerations for TUI state management.

/// Logical location of the interface, the terminal equivalent of a URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    ProjectList,
    Board { project_id: String },
}

/// Whether the task editor creates a new task or edits an existing one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit { task_id: String },
}

/// Sub-state of the project list view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProjectsMode {
    Browse,
    NewProject,
    ConfirmDelete { project_id: String },
}

/// What a view asks the application to do after handling a key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewAction {
    None,
    Navigate(Route),
    Quit,
}
