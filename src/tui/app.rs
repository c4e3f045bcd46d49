//! Top-level terminal application: owns the project store, routes between
//! the project list and a board, and runs the event loop.

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    prelude::Backend,
    style::{Color, Style},
    widgets::Paragraph,
    Frame, Terminal,
};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::db::ProjectStore;
use crate::storage::{FileStorage, Storage};
use crate::timefmt::Timestamp;
use crate::tui::board_view::BoardView;
use crate::tui::colors::{column_color, GOLD};
use crate::tui::enums::{Route, ViewAction};
use crate::tui::projects_view::ProjectsView;

/// The view currently on screen.
enum ActiveView {
    Projects(ProjectsView),
    Board(Box<BoardView>),
}

/// Application state.
pub struct App<S: Storage = FileStorage> {
    store: ProjectStore<S>,
    settings: Settings,
    view: ActiveView,
    status_message: String,
    should_quit: bool,
}

impl<S: Storage> App<S> {
    pub fn new(store: ProjectStore<S>, settings: Settings) -> Self {
        App {
            store,
            settings,
            view: ActiveView::Projects(ProjectsView::new()),
            status_message: String::new(),
            should_quit: false,
        }
    }

    pub fn route(&self) -> Route {
        match &self.view {
            ActiveView::Projects(_) => Route::ProjectList,
            ActiveView::Board(board) => Route::Board {
                project_id: board.project_id().to_string(),
            },
        }
    }

    /// Switch to `route`. A board that cannot be opened sends the user back
    /// to the project list with a message.
    pub fn navigate(&mut self, route: Route) {
        debug!(from = ?self.route(), to = ?route, "navigating");
        match route {
            Route::ProjectList => {
                self.view = ActiveView::Projects(ProjectsView::new());
            }
            Route::Board { project_id } => {
                match BoardView::open(&self.store, &project_id, &self.settings) {
                    Ok(board) => {
                        info!(project = %project_id, "opened board");
                        self.view = ActiveView::Board(Box::new(board));
                    }
                    Err(e) => {
                        warn!("Cannot open project {project_id}: {e}");
                        self.status_message = format!("Error: {e}");
                        self.view = ActiveView::Projects(ProjectsView::new());
                    }
                }
            }
        }
    }

    /// Dispatch a key press to the active view.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        self.status_message.clear();

        let action = match &mut self.view {
            ActiveView::Projects(view) => view.handle_key(key, &mut self.store, &mut self.status_message),
            ActiveView::Board(view) => view.handle_key(key, &mut self.store, &mut self.status_message),
        };
        match action {
            ViewAction::None => {}
            ViewAction::Navigate(route) => self.navigate(route),
            ViewAction::Quit => self.should_quit = true,
        }
    }

    /// Periodic work for the active view.
    pub fn tick(&mut self, at: Instant) {
        if let ActiveView::Board(view) = &mut self.view {
            view.tick(at, Timestamp::now(), &mut self.status_message);
        }
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let (status_text, bg) = match &self.view {
            ActiveView::Projects(_) => (
                if self.status_message.is_empty() {
                    format!(
                        "Projects: {} | n: New | d: Delete | Enter: Open | q: Quit",
                        self.store.list_projects().len()
                    )
                } else {
                    self.status_message.clone()
                },
                Color::DarkGray,
            ),
            ActiveView::Board(board) => {
                let color = column_color(board.selected_position().column);
                let text = if self.status_message.is_empty() {
                    format!("Tasks: {} | Press 'h' for help", board.board().len())
                } else {
                    self.status_message.clone()
                };
                (text, color)
            }
        };
        let fg = if bg == GOLD { Color::Rgb(20, 20, 20) } else { Color::White };
        let status = Paragraph::new(status_text)
            .style(Style::default().bg(bg).fg(fg))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());

        match &mut self.view {
            ActiveView::Projects(view) => view.render(f, chunks[0], &self.store),
            ActiveView::Board(view) => view.render(f, chunks[0]),
        }
        self.render_status_bar(f, chunks[1]);
    }

    /// Main event loop. Runs until the user quits.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        while !self.should_quit {
            self.tick(Instant::now());
            terminal.draw(|f| self.render(f))?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DEFAULT_STORAGE_KEY;
    use crate::storage::MemoryStorage;
    use ratatui::backend::TestBackend;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app_with_project() -> App<MemoryStorage> {
        let mut store = ProjectStore::load(MemoryStorage::new(), DEFAULT_STORAGE_KEY);
        store.add_project(Some("Website")).unwrap();
        App::new(store, Settings::default())
    }

    #[test]
    fn test_open_board_and_go_back() {
        let mut app = app_with_project();
        assert_eq!(app.route(), Route::ProjectList);

        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.route(), Route::Board { project_id: "1".into() });

        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.route(), Route::ProjectList);
        assert!(!app.should_quit);
    }

    #[test]
    fn test_unknown_project_redirects_to_list() {
        let mut app = app_with_project();
        app.navigate(Route::Board { project_id: "3".into() });
        assert_eq!(app.route(), Route::ProjectList);
        assert!(app.status_message.contains("3"));
    }

    #[test]
    fn test_add_task_from_board_persists() {
        let mut app = app_with_project();
        app.handle_key(key(KeyCode::Enter));
        for code in [KeyCode::Char('a'), KeyCode::Char('G'), KeyCode::Char('o'), KeyCode::Enter] {
            app.handle_key(key(code));
        }
        let board = app.store.load_board("1").unwrap();
        assert_eq!(board.queue.items[0].name, "Go");
    }

    #[test]
    fn test_ctrl_c_quits_from_any_view() {
        let mut app = app_with_project();
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }

    #[test]
    fn test_renders_both_views() {
        let mut app = app_with_project();
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        let screen = format!("{:?}", terminal.backend().buffer());
        assert!(screen.contains("Website"));

        app.handle_key(key(KeyCode::Enter));
        terminal.draw(|f| app.render(f)).unwrap();
        let screen = format!("{:?}", terminal.backend().buffer());
        assert!(screen.contains("Queue"));
        assert!(screen.contains("Development"));
    }
}
