//! Project list view: browse, create, delete and open projects.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};
use tracing::warn;

use crate::db::ProjectStore;
use crate::storage::Storage;
use crate::tui::enums::{ProjectsMode, Route, ViewAction};
use crate::tui::input::InputField;
use crate::tui::utils::centered_rect;

/// State of the project list view.
pub struct ProjectsView {
    list_state: ListState,
    mode: ProjectsMode,
    input: InputField,
}

impl ProjectsView {
    pub fn new() -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        ProjectsView {
            list_state,
            mode: ProjectsMode::Browse,
            input: InputField::new(),
        }
    }

    /// Keep the selection inside the list after it changed size.
    fn clamp_selection(&mut self, len: usize) {
        let selected = match self.list_state.selected() {
            _ if len == 0 => 0,
            Some(i) if i >= len => len - 1,
            Some(i) => i,
            None => 0,
        };
        self.list_state.select(Some(selected));
    }

    /// Handle a key press; `status` receives any message for the status bar.
    pub fn handle_key<S: Storage>(
        &mut self,
        key: KeyEvent,
        store: &mut ProjectStore<S>,
        status: &mut String,
    ) -> ViewAction {
        match self.mode.clone() {
            ProjectsMode::Browse => self.handle_browse_input(key.code, store, status),
            ProjectsMode::NewProject => {
                self.handle_new_project_input(key.code, store, status);
                ViewAction::None
            }
            ProjectsMode::ConfirmDelete { project_id } => {
                self.handle_delete_confirmation_input(key.code, &project_id, store, status);
                ViewAction::None
            }
        }
    }

    fn handle_browse_input<S: Storage>(
        &mut self,
        key: KeyCode,
        store: &mut ProjectStore<S>,
        status: &mut String,
    ) -> ViewAction {
        let len = store.list_projects().len();
        match key {
            KeyCode::Up => {
                if let Some(selected) = self.list_state.selected() {
                    if selected > 0 {
                        self.list_state.select(Some(selected - 1));
                    }
                }
            }
            KeyCode::Down => {
                if let Some(selected) = self.list_state.selected() {
                    if selected + 1 < len {
                        self.list_state.select(Some(selected + 1));
                    }
                }
            }
            KeyCode::Enter => {
                let selected = self.list_state.selected().unwrap_or(0);
                if let Some(project) = store.list_projects().get(selected) {
                    return ViewAction::Navigate(Route::Board {
                        project_id: project.id.clone(),
                    });
                }
                *status = "No projects yet. Press n to create one.".to_string();
            }
            KeyCode::Char('n') | KeyCode::Char('a') => {
                self.mode = ProjectsMode::NewProject;
                self.input = InputField::new();
                self.input.active = true;
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                let selected = self.list_state.selected().unwrap_or(0);
                if let Some(project) = store.list_projects().get(selected) {
                    self.mode = ProjectsMode::ConfirmDelete {
                        project_id: project.id.clone(),
                    };
                }
            }
            KeyCode::Esc | KeyCode::Char('q') => return ViewAction::Quit,
            _ => {}
        }
        ViewAction::None
    }

    fn handle_new_project_input<S: Storage>(
        &mut self,
        key: KeyCode,
        store: &mut ProjectStore<S>,
        status: &mut String,
    ) {
        match key {
            KeyCode::Esc => {
                self.mode = ProjectsMode::Browse;
                self.input.clear();
            }
            KeyCode::Enter => {
                match store.add_project(Some(self.input.value.as_str())) {
                    Ok(project) => {
                        *status = format!("Project '{}' created.", project.title);
                    }
                    Err(e) => {
                        warn!("Failed to create project: {e}");
                        *status = format!("Error: {e}");
                    }
                }
                self.mode = ProjectsMode::Browse;
                self.input.clear();
                let len = store.list_projects().len();
                self.list_state.select(Some(len.saturating_sub(1)));
            }
            KeyCode::Backspace => self.input.handle_backspace(),
            KeyCode::Delete => self.input.handle_delete(),
            KeyCode::Left => self.input.move_cursor_left(),
            KeyCode::Right => self.input.move_cursor_right(),
            KeyCode::Char(c) => self.input.handle_char(c),
            _ => {}
        }
    }

    fn handle_delete_confirmation_input<S: Storage>(
        &mut self,
        key: KeyCode,
        project_id: &str,
        store: &mut ProjectStore<S>,
        status: &mut String,
    ) {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                let title = store.get(project_id).map(|p| p.title.clone()).unwrap_or_default();
                match store.remove_project(project_id) {
                    Ok(_) => *status = format!("Project '{title}' deleted."),
                    Err(e) => {
                        warn!("Failed to delete project: {e}");
                        *status = format!("Failed to delete project: {e}");
                    }
                }
                self.mode = ProjectsMode::Browse;
                self.clamp_selection(store.list_projects().len());
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.mode = ProjectsMode::Browse;
            }
            _ => {}
        }
    }

    /// Render the project list and any open dialog.
    pub fn render<S: Storage>(&mut self, f: &mut Frame, area: Rect, store: &ProjectStore<S>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Projects
            ])
            .split(area);

        let header = Paragraph::new(Line::from(vec![Span::styled(
            "PROJECTS",
            Style::default().add_modifier(Modifier::BOLD),
        )]))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::White));
        f.render_widget(header, chunks[0]);

        let items: Vec<ListItem> = store
            .list_projects()
            .iter()
            .map(|p| {
                ListItem::new(Line::from(vec![
                    Span::raw(format!("  {}", p.title)),
                    Span::styled(
                        format!("  ({} tasks)", p.task_count()),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]))
            })
            .collect();
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Select Project"))
            .highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol("► ");
        f.render_stateful_widget(list, chunks[1], &mut self.list_state);

        match &self.mode {
            ProjectsMode::NewProject => self.render_new_project(f, area),
            ProjectsMode::ConfirmDelete { project_id } => {
                let title = store.get(project_id).map(|p| p.title.as_str()).unwrap_or("?");
                render_delete_confirmation(f, area, title);
            }
            ProjectsMode::Browse => {}
        }
    }

    fn render_new_project(&self, f: &mut Frame, area: Rect) {
        let area = centered_rect(60, 20, area);
        f.render_widget(Clear, area);
        let input = Paragraph::new(self.input.value.as_str())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("New project title (Enter to create, Esc to cancel)"),
            )
            .style(Style::default().fg(Color::Yellow));
        f.render_widget(input, area);
        f.set_cursor_position((area.x + 1 + self.input.cursor as u16, area.y + 1));
    }
}

impl Default for ProjectsView {
    fn default() -> Self {
        Self::new()
    }
}

fn render_delete_confirmation(f: &mut Frame, area: Rect, title: &str) {
    let area = centered_rect(50, 20, area);
    f.render_widget(Clear, area);
    let text = vec![
        Line::from(""),
        Line::from(format!("Delete project '{title}' and its board?")),
        Line::from(""),
        Line::from("y: delete   n/Esc: keep"),
    ];
    let dialog = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Confirm Delete")
                .border_style(Style::default().fg(Color::Red)),
        )
        .alignment(Alignment::Center);
    f.render_widget(dialog, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DEFAULT_STORAGE_KEY;
    use crate::storage::MemoryStorage;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn press<S: Storage>(
        view: &mut ProjectsView,
        store: &mut ProjectStore<S>,
        codes: &[KeyCode],
    ) -> ViewAction {
        let mut status = String::new();
        let mut action = ViewAction::None;
        for &code in codes {
            action = view.handle_key(key(code), store, &mut status);
        }
        action
    }

    #[test]
    fn test_create_open_and_delete_projects() {
        let mut store = ProjectStore::load(MemoryStorage::new(), DEFAULT_STORAGE_KEY);
        let mut view = ProjectsView::new();

        press(&mut view, &mut store, &[KeyCode::Char('n'), KeyCode::Enter]);
        press(
            &mut view,
            &mut store,
            &[KeyCode::Char('n'), KeyCode::Char('W'), KeyCode::Char('e'), KeyCode::Char('b'), KeyCode::Enter],
        );
        let titles: Vec<&str> = store.list_projects().iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["New project", "Web"]);
        assert_eq!(view.list_state.selected(), Some(1));

        let action = press(&mut view, &mut store, &[KeyCode::Enter]);
        assert_eq!(action, ViewAction::Navigate(Route::Board { project_id: "2".into() }));

        press(&mut view, &mut store, &[KeyCode::Char('d')]);
        assert_eq!(&view.mode, &ProjectsMode::ConfirmDelete { project_id: "2".into() });
        press(&mut view, &mut store, &[KeyCode::Char('y')]);
        assert_eq!(store.list_projects().len(), 1);
        assert_eq!(view.list_state.selected(), Some(0));
        assert_eq!(&view.mode, &ProjectsMode::Browse);
    }

    #[test]
    fn test_cancelled_dialogs_change_nothing() {
        let mut store = ProjectStore::load(MemoryStorage::new(), DEFAULT_STORAGE_KEY);
        store.add_project(Some("Keep")).unwrap();
        let mut view = ProjectsView::new();

        press(&mut view, &mut store, &[KeyCode::Char('n'), KeyCode::Char('x'), KeyCode::Esc]);
        press(&mut view, &mut store, &[KeyCode::Char('d'), KeyCode::Char('n')]);
        assert_eq!(store.list_projects().len(), 1);
        assert_eq!(press(&mut view, &mut store, &[KeyCode::Char('q')]), ViewAction::Quit);
    }
}
