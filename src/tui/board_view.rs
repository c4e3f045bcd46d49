//! Kanban board view for one project.
//!
//! Cards are arranged in the queue, development and done columns. Moving a
//! card is keyboard drag-and-drop: Space picks the selected card up, the
//! arrows choose a drop slot, and Space drops it (Esc drops it nowhere).
//! Ctrl+arrows move the selected card one step directly. Every change is
//! written back to the project store immediately.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use tracing::{debug, warn};

use crate::board::{elapsed_time, time_in_progress, Board, Position};
use crate::config::Settings;
use crate::db::{truncate, ProjectStore};
use crate::error::Result;
use crate::fields::*;
use crate::storage::Storage;
use crate::task::Task;
use crate::timefmt::Timestamp;
use crate::tui::colors::{column_color, priority_color, GOLD};
use crate::tui::enums::{EditorMode, Route, ViewAction};
use crate::tui::task_form::{Submission, TaskEditor, DESCRIPTION_ORDER, FILE_ORDER, PRIORITY_ORDER, TITLE_ORDER};
use crate::tui::utils::centered_rect;

const CARD_HEIGHT: usize = 6;

/// State of the board view.
pub struct BoardView {
    project_id: String,
    project_title: String,
    board: Board,
    selected_column: ColumnKey,
    selected_card: usize,
    column_scroll_offsets: [usize; 3],
    /// Card picked up for a drag, with the position it was taken from.
    grabbed: Option<Position>,
    editor: TaskEditor,
    show_task_detail: bool,
    /// Elapsed-time labels for development cards, keyed by task id.
    elapsed: HashMap<String, String>,
    refresh_every: Duration,
    next_refresh: Instant,
}

impl BoardView {
    /// Load the board of `project_id`. Fails if the project does not exist.
    pub fn open<S: Storage>(
        store: &ProjectStore<S>,
        project_id: &str,
        settings: &Settings,
    ) -> Result<Self> {
        let board = store.load_board(project_id)?;
        let project_title = store
            .get(project_id)
            .map(|p| p.title.clone())
            .unwrap_or_default();
        let refresh_every = settings.refresh_interval();
        let mut view = BoardView {
            project_id: project_id.to_string(),
            project_title,
            board,
            selected_column: ColumnKey::Queue,
            selected_card: 0,
            column_scroll_offsets: [0; 3],
            grabbed: None,
            editor: TaskEditor::new(settings.default_priority),
            show_task_detail: false,
            elapsed: HashMap::new(),
            refresh_every,
            next_refresh: Instant::now() + refresh_every,
        };
        view.refresh_elapsed(Timestamp::now());
        Ok(view)
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn selected_position(&self) -> Position {
        Position::new(self.selected_column, self.selected_card)
    }

    pub fn elapsed_label(&self, task_id: &str) -> Option<&str> {
        self.elapsed.get(task_id).map(String::as_str)
    }

    fn selected_task(&self) -> Option<&Task> {
        self.board.get(self.selected_position())
    }

    fn column_len(&self, key: ColumnKey) -> usize {
        self.board.column(key).items.len()
    }

    /// Recompute elapsed labels of development cards.
    fn refresh_elapsed(&mut self, now: Timestamp) {
        self.elapsed = self
            .board
            .development
            .items
            .iter()
            .filter_map(|t| elapsed_time(t, now).map(|e| (t.id.clone(), e)))
            .collect();
    }

    /// Periodic work: refresh elapsed labels when due and collect a finished
    /// attachment read.
    pub fn tick(&mut self, at: Instant, now: Timestamp, status: &mut String) {
        if at >= self.next_refresh {
            self.refresh_elapsed(now);
            self.next_refresh = at + self.refresh_every;
        }
        if let Some(result) = self.editor.poll_attachment() {
            *status = match result {
                Ok(name) => format!("Attached {name}"),
                Err(e) => {
                    warn!("Attachment read failed: {e}");
                    format!("Error: {e}")
                }
            };
        }
    }

    /// Persist the board. On failure the board is reloaded from the store so
    /// the view never shows unsaved state.
    fn commit<S: Storage>(&mut self, store: &mut ProjectStore<S>, status: &mut String) -> bool {
        match store.save_board(&self.project_id, &self.board) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to save board: {e}");
                *status = format!("Error saving: {e}");
                if let Ok(board) = store.load_board(&self.project_id) {
                    self.board = board;
                }
                self.clamp_selection();
                false
            }
        }
    }

    /// Apply a drag-and-drop result and persist it.
    pub fn apply_move<S: Storage>(
        &mut self,
        store: &mut ProjectStore<S>,
        source: Position,
        destination: Option<Position>,
        now: Timestamp,
        status: &mut String,
    ) {
        match self.board.move_task(source, destination, now) {
            Ok(true) => {
                if !self.commit(store, status) {
                    return;
                }
                if let Some(dest) = destination {
                    self.selected_column = dest.column;
                    self.selected_card = dest.index;
                    *status = format!("Moved task to {}", self.board.column(dest.column).title);
                }
                self.clamp_selection();
                self.refresh_elapsed(now);
            }
            Ok(false) => {}
            Err(e) => *status = format!("Error: {e}"),
        }
    }

    /// Apply a submitted editor form and persist it.
    pub fn apply_submission<S: Storage>(
        &mut self,
        store: &mut ProjectStore<S>,
        submission: Submission,
        now: Timestamp,
        status: &mut String,
    ) {
        let result = match submission.mode {
            EditorMode::Create => {
                let id = self.board.add_task(submission.input, now).id.clone();
                self.selected_column = ColumnKey::Queue;
                self.selected_card = 0;
                Ok(format!("Added task #{id}"))
            }
            EditorMode::Edit { task_id } => self
                .board
                .edit_task(&task_id, submission.input)
                .map(|()| format!("Updated task #{task_id}")),
        };
        match result {
            Ok(msg) => {
                if self.commit(store, status) {
                    *status = msg;
                }
            }
            Err(e) => *status = format!("Error: {e}"),
        }
    }

    /// Highest index the selection may take in `key`. While dragging, the
    /// slot past the last card of another column is a valid drop target.
    fn max_card_index(&self, key: ColumnKey) -> Option<usize> {
        let len = self.column_len(key);
        match self.grabbed {
            Some(src) if src.column != key => Some(len),
            _ => len.checked_sub(1),
        }
    }

    /// Ensure the selected card index is valid for the selected column.
    fn clamp_selection(&mut self) {
        match self.max_card_index(self.selected_column) {
            Some(max) if self.selected_card > max => self.selected_card = max,
            None => self.selected_card = 0,
            _ => {}
        }
    }

    /// Move the selected card to the neighbouring column.
    fn move_card_sideways<S: Storage>(
        &mut self,
        store: &mut ProjectStore<S>,
        right: bool,
        status: &mut String,
    ) {
        let source = self.selected_position();
        if self.selected_task().is_none() {
            return;
        }
        let target = self.selected_column.index() as isize + if right { 1 } else { -1 };
        let Some(column) = usize::try_from(target).ok().and_then(ColumnKey::from_index) else {
            return;
        };
        let index = self.selected_card.min(self.column_len(column));
        self.apply_move(store, source, Some(Position::new(column, index)), Timestamp::now(), status);
    }

    /// Move the selected card up or down within its column.
    fn move_card_vertically<S: Storage>(
        &mut self,
        store: &mut ProjectStore<S>,
        down: bool,
        status: &mut String,
    ) {
        let source = self.selected_position();
        if self.selected_task().is_none() {
            return;
        }
        let index = if down {
            source.index + 1
        } else if source.index > 0 {
            source.index - 1
        } else {
            return;
        };
        if index >= self.column_len(source.column) {
            return;
        }
        self.apply_move(store, source, Some(Position::new(source.column, index)), Timestamp::now(), status);
    }

    /// Pick up the selected card, or drop the one being dragged.
    fn grab_or_drop<S: Storage>(&mut self, store: &mut ProjectStore<S>, status: &mut String) {
        match self.grabbed.take() {
            None => {
                if let Some(task) = self.selected_task() {
                    *status = format!("Dragging #{}: choose a slot, Space to drop, Esc to cancel", task.id);
                    debug!(id = %task.id, "picked up card");
                    self.grabbed = Some(self.selected_position());
                }
            }
            Some(source) => {
                let destination = self.selected_position();
                self.apply_move(store, source, Some(destination), Timestamp::now(), status);
            }
        }
    }

    /// Handle a key press; `status` receives any message for the status bar.
    pub fn handle_key<S: Storage>(
        &mut self,
        key: KeyEvent,
        store: &mut ProjectStore<S>,
        status: &mut String,
    ) -> ViewAction {
        if self.editor.is_open() {
            self.handle_editor_key(key, store, status);
            return ViewAction::None;
        }

        if self.show_task_detail {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.show_task_detail = false;
            }
            return ViewAction::None;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => {
                if let Some(source) = self.grabbed.take() {
                    self.apply_move(store, source, None, Timestamp::now(), status);
                    *status = "Drag cancelled".to_string();
                    self.clamp_selection();
                } else {
                    return ViewAction::Navigate(Route::ProjectList);
                }
            }

            // Card movement between columns (check first, before regular navigation)
            KeyCode::Left if ctrl && self.grabbed.is_none() => self.move_card_sideways(store, false, status),
            KeyCode::Right if ctrl && self.grabbed.is_none() => self.move_card_sideways(store, true, status),
            KeyCode::Up if ctrl && self.grabbed.is_none() => self.move_card_vertically(store, false, status),
            KeyCode::Down if ctrl && self.grabbed.is_none() => self.move_card_vertically(store, true, status),

            KeyCode::Left => {
                if let Some(prev) = self.selected_column.index().checked_sub(1).and_then(ColumnKey::from_index) {
                    self.selected_column = prev;
                    self.clamp_selection();
                }
            }
            KeyCode::Right => {
                if let Some(next) = ColumnKey::from_index(self.selected_column.index() + 1) {
                    self.selected_column = next;
                    self.clamp_selection();
                }
            }
            KeyCode::Up => {
                self.selected_card = self.selected_card.saturating_sub(1);
            }
            KeyCode::Down => {
                if let Some(max) = self.max_card_index(self.selected_column) {
                    if self.selected_card < max {
                        self.selected_card += 1;
                    }
                }
            }

            KeyCode::Char(' ') => self.grab_or_drop(store, status),

            KeyCode::Char('a') | KeyCode::Char('n') if self.grabbed.is_none() => {
                self.editor.open_create();
            }
            KeyCode::Char('e') if self.grabbed.is_none() => {
                if let Some(task) = self.board.get(self.selected_position()) {
                    self.editor.open_edit(task);
                }
            }
            KeyCode::Enter if self.grabbed.is_none() => {
                if self.selected_task().is_some() {
                    self.show_task_detail = true;
                }
            }
            KeyCode::Char('h') => {
                *status = "a: Add | e: Edit | Enter: Details | Space: Drag/Drop | Ctrl+Arrows: Move | Esc: Projects".to_string();
            }
            _ => {}
        }
        ViewAction::None
    }

    fn handle_editor_key<S: Storage>(
        &mut self,
        key: KeyEvent,
        store: &mut ProjectStore<S>,
        status: &mut String,
    ) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.editor.cancel(),
            KeyCode::Char('s') if ctrl => self.submit_editor(store, status),
            KeyCode::Enter => {
                if self.editor.current_field == FILE_ORDER && !self.editor.file_path.value.trim().is_empty() {
                    if self.editor.is_reading_file() {
                        return;
                    }
                    self.editor.request_file();
                    *status = format!("Reading {}…", self.editor.file_path.value.trim());
                } else {
                    self.submit_editor(store, status);
                }
            }
            KeyCode::Tab | KeyCode::Down => self.editor.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.editor.prev_field(),
            KeyCode::Left => self.editor.handle_left_right(false),
            KeyCode::Right => self.editor.handle_left_right(true),
            KeyCode::Backspace => self.editor.handle_backspace(),
            KeyCode::Delete => self.editor.handle_delete(),
            KeyCode::Char(c) => self.editor.handle_char(c),
            _ => {}
        }
    }

    fn submit_editor<S: Storage>(&mut self, store: &mut ProjectStore<S>, status: &mut String) {
        if let Some(submission) = self.editor.submit() {
            self.apply_submission(store, submission, Timestamp::now(), status);
        }
    }

    /// Render the board, status-independent parts only.
    pub fn render(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Board
            ])
            .split(area);

        self.render_header(f, chunks[0]);
        self.render_board(f, chunks[1]);

        if self.show_task_detail {
            self.render_task_detail_popup(f);
        }
        if self.editor.is_open() {
            self.render_editor(f);
        }
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let header_text = vec![Line::from(vec![
            Span::styled("TASK BOARD", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                format!("Project #{}: {}", self.project_id, self.project_title),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ),
        ])];
        let header = Paragraph::new(header_text)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header, area);
    }

    fn render_board(&mut self, f: &mut Frame, area: Rect) {
        let columns_layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(33),
                Constraint::Percentage(34),
                Constraint::Percentage(33),
            ])
            .split(area);

        for (key, &column_area) in ColumnKey::ALL.iter().zip(columns_layout.iter()) {
            self.render_column(f, column_area, *key);
        }
    }

    fn render_column(&mut self, f: &mut Frame, area: Rect, key: ColumnKey) {
        let is_selected = key == self.selected_column;
        let color = column_color(key);
        let column = self.board.column(key);

        let border_style = if is_selected {
            Style::default().fg(color).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let mut title = format!("{} ({})", column.title, column.items.len());
        if is_selected && self.grabbed.is_some() {
            title.push_str(&format!(" ▼ drop at {}", self.selected_card));
        }
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(border_style);
        let inner = block.inner(area);
        f.render_widget(block, area);

        let cards = &self.board.column(key).items;
        if cards.is_empty() {
            return;
        }

        let available_height = inner.height as usize;
        let visible_cards = (available_height / CARD_HEIGHT).max(1);
        let col = key.index();

        // Keep the selected card in view.
        let scroll_offset = if is_selected {
            let start_visible = self.column_scroll_offsets[col];
            if self.selected_card < start_visible {
                self.column_scroll_offsets[col] = self.selected_card;
            } else if self.selected_card >= start_visible + visible_cards {
                self.column_scroll_offsets[col] = self.selected_card + 1 - visible_cards;
            }
            self.column_scroll_offsets[col].min(cards.len().saturating_sub(1))
        } else {
            self.column_scroll_offsets[col].min(cards.len().saturating_sub(1))
        };

        let mut current_y = 0;
        let mut rendered = 0;
        for (card_index, task) in cards.iter().enumerate().skip(scroll_offset) {
            if current_y + CARD_HEIGHT > available_height {
                break;
            }
            let card_area = Rect {
                x: inner.x,
                y: inner.y + current_y as u16,
                width: inner.width,
                height: CARD_HEIGHT as u16,
            };
            let selected = is_selected && card_index == self.selected_card;
            let grabbed = self.grabbed == Some(Position::new(key, card_index));
            self.render_card(f, card_area, key, task, selected, grabbed);
            current_y += CARD_HEIGHT;
            rendered += 1;
        }

        let remaining = cards.len() - scroll_offset - rendered;
        if remaining > 0 && inner.height > 0 {
            let indicator = Paragraph::new(format!("▼ +{remaining} below"))
                .style(Style::default().fg(Color::Cyan));
            f.render_widget(
                indicator,
                Rect {
                    x: inner.x,
                    y: inner.y + inner.height - 1,
                    width: inner.width,
                    height: 1,
                },
            );
        }
    }

    fn render_card(
        &self,
        f: &mut Frame,
        area: Rect,
        key: ColumnKey,
        task: &Task,
        is_selected: bool,
        is_grabbed: bool,
    ) {
        let color = column_color(key);
        let mut style = if is_selected {
            let fg = if color == GOLD { Color::Rgb(20, 20, 20) } else { Color::Black };
            Style::default().bg(color).fg(fg).add_modifier(Modifier::BOLD)
        } else {
            Style::default().bg(Color::DarkGray)
        };
        if is_grabbed {
            style = style.add_modifier(Modifier::REVERSED);
        }

        let width = area.width.saturating_sub(2) as usize;
        let mut lines = vec![
            Line::from(truncate(&format!("#{} {}", task.id, task.name), width)),
            Line::from(Span::styled(
                format!("{} priority", format_priority(task.priority)),
                Style::default().fg(priority_color(task.priority)),
            )),
        ];
        match key {
            ColumnKey::Queue => lines.push(Line::from(format!("Created: {}", task.created_on))),
            ColumnKey::Development => {
                let elapsed = self.elapsed_label(&task.id).unwrap_or("…");
                lines.push(Line::from(format!("In progress: {elapsed}")));
            }
            ColumnKey::Done => {
                let took = time_in_progress(task).unwrap_or_else(|| "-".into());
                lines.push(Line::from(format!("Took: {took}")));
            }
        }
        if let Some(file) = &task.file {
            lines.push(Line::from(truncate(&format!("📎 {}", file.name), width)));
        }

        let card = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL))
            .style(style);
        f.render_widget(card, area);
    }

    fn render_task_detail_popup(&self, f: &mut Frame) {
        let Some(task) = self.selected_task() else {
            return;
        };
        let popup_area = centered_rect(70, 60, f.area());
        f.render_widget(Clear, popup_area);

        let mut detail_lines = vec![
            Line::from(Span::styled(
                format!("Task #{}: {}", task.id, task.name),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(format!("Status:      {}", format_status(task.status))),
            Line::from(format!("Priority:    {}", format_priority(task.priority))),
            Line::from(format!("Created:     {}", task.created_on)),
        ];
        if let Some(started) = task.started_at {
            detail_lines.push(Line::from(format!("Started:     {started}")));
        }
        if let Some(completed) = task.completed_at {
            detail_lines.push(Line::from(format!("Completed:   {completed}")));
        }
        match task.status {
            Status::InProgress => {
                let elapsed = self.elapsed_label(&task.id).unwrap_or("…");
                detail_lines.push(Line::from(format!("In progress: {elapsed}")));
            }
            Status::Completed => {
                let took = time_in_progress(task).unwrap_or_else(|| "-".into());
                detail_lines.push(Line::from(format!("Took:        {took}")));
            }
            Status::Pending => {}
        }
        if let Some(file) = &task.file {
            detail_lines.push(Line::from(format!(
                "File:        {} (tb export-file {} {})",
                file.name, self.project_id, task.id
            )));
        }
        detail_lines.extend([
            Line::from(""),
            Line::from("Description:"),
            Line::from(if task.description.is_empty() { "-" } else { task.description.as_str() }),
        ]);

        let popup = Paragraph::new(detail_lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Task Details (Press Enter to close)")
                    .title_alignment(Alignment::Center)
                    .border_style(Style::default().fg(column_color(self.selected_column))),
            )
            .wrap(Wrap { trim: true })
            .style(Style::default().bg(Color::Black));
        f.render_widget(popup, popup_area);
    }

    fn render_editor(&self, f: &mut Frame) {
        let area = centered_rect(60, 60, f.area());
        f.render_widget(Clear, area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.editor.title_text())
            .title_alignment(Alignment::Center)
            .border_style(Style::default().fg(Color::Yellow));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Length(3), // Description
                Constraint::Length(3), // Priority
                Constraint::Length(3), // File
                Constraint::Length(2), // Attachment
                Constraint::Min(0),    // Help
            ])
            .split(inner);

        let field_style = |order: usize| {
            if self.editor.current_field == order {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            }
        };

        let title = Paragraph::new(self.editor.title.value.as_str())
            .block(Block::default().borders(Borders::ALL).title("Title"))
            .style(field_style(TITLE_ORDER));
        f.render_widget(title, rows[0]);

        let description = Paragraph::new(self.editor.description.value.as_str())
            .block(Block::default().borders(Borders::ALL).title("Description"))
            .style(field_style(DESCRIPTION_ORDER));
        f.render_widget(description, rows[1]);

        let priority = Paragraph::new(format!("◀ {} ▶", self.editor.priority_label()))
            .block(Block::default().borders(Borders::ALL).title("Priority"))
            .style(field_style(PRIORITY_ORDER));
        f.render_widget(priority, rows[2]);

        let file = Paragraph::new(self.editor.file_path.value.as_str())
            .block(Block::default().borders(Borders::ALL).title("File path (Enter to attach)"))
            .style(field_style(FILE_ORDER));
        f.render_widget(file, rows[3]);

        let attachment = if let Some(path) = self.editor.reading_path() {
            format!("Reading {}…", path.display())
        } else {
            match self.editor.attachment() {
                Some(file) => format!("Attached: {}", file.name),
                None => "No file attached".to_string(),
            }
        };
        f.render_widget(Paragraph::new(attachment), rows[4]);

        let help = Paragraph::new("Tab/↑↓: Field | ←→: Priority | Enter/Ctrl+S: Save | Esc: Cancel")
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(help, rows[5]);

        let cursor_field = match self.editor.current_field {
            TITLE_ORDER => Some((&self.editor.title, rows[0])),
            DESCRIPTION_ORDER => Some((&self.editor.description, rows[1])),
            FILE_ORDER => Some((&self.editor.file_path, rows[3])),
            _ => None,
        };
        if let Some((field, rect)) = cursor_field {
            f.set_cursor_position((rect.x + 1 + field.cursor as u16, rect.y + 1));
        }
    }
}
