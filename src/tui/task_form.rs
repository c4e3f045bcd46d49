//! Modal task editor for the terminal user interface.
//!
//! The editor is transient: nothing it holds touches the board until it is
//! submitted. It moves `Closed -> Open(Create) -> Closed` or
//! `Closed -> Open(Edit, prefilled) -> Closed`; cancelling discards every
//! field, including an attachment that is still being read.

use std::path::{Path, PathBuf};

use crate::attachment::PendingAttachment;
use crate::error::Result;
use crate::fields::{format_priority, Priority};
use crate::task::{Attachment, Task, TaskInput};
use crate::tui::{enums::EditorMode, input::InputField};

/// Field order for keyboard navigation.
pub const TITLE_ORDER: usize = 0;
pub const DESCRIPTION_ORDER: usize = 1;
pub const PRIORITY_ORDER: usize = 2;
pub const FILE_ORDER: usize = 3;
const FIELD_COUNT: usize = 4;

/// A completed form, ready to apply to the board.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub mode: EditorMode,
    pub input: TaskInput,
}

/// Task editor state.
pub struct TaskEditor {
    mode: Option<EditorMode>,
    pub title: InputField,
    pub description: InputField,
    pub file_path: InputField,
    pub priority: usize,
    pub current_field: usize,
    pub priorities: Vec<Priority>,
    file: Option<Attachment>,
    pending: Option<PendingAttachment>,
    default_priority: Priority,
}

impl TaskEditor {
    /// A closed editor whose create form preselects `default_priority`.
    pub fn new(default_priority: Priority) -> Self {
        let priorities = Priority::ALL.to_vec();
        let priority = priorities.iter().position(|&p| p == default_priority).unwrap_or(0);
        Self {
            mode: None,
            title: InputField::new(),
            description: InputField::new(),
            file_path: InputField::new(),
            priority,
            current_field: TITLE_ORDER,
            priorities,
            file: None,
            pending: None,
            default_priority,
        }
    }

    pub fn is_open(&self) -> bool {
        self.mode.is_some()
    }

    /// Open an empty form for a new task.
    pub fn open_create(&mut self) {
        self.reset();
        self.mode = Some(EditorMode::Create);
        self.update_active_field();
    }

    /// Open a form prefilled from `task`.
    pub fn open_edit(&mut self, task: &Task) {
        self.reset();
        let input = TaskInput::from_task(task);
        self.title = InputField::with_value(&input.title);
        self.description = InputField::with_value(&input.description);
        self.priority = self.priorities.iter().position(|&p| p == input.priority).unwrap_or(0);
        self.file = input.file;
        self.mode = Some(EditorMode::Edit { task_id: task.id.clone() });
        self.update_active_field();
    }

    /// Close without applying anything.
    pub fn cancel(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        *self = Self::new(self.default_priority);
    }

    /// Close and hand back the entered values. `None` if the editor was closed.
    ///
    /// An attachment still being read is not waited for.
    pub fn submit(&mut self) -> Option<Submission> {
        let mode = self.mode.take()?;
        let submission = Submission {
            mode,
            input: TaskInput {
                title: self.title.value.clone(),
                description: self.description.value.clone(),
                priority: self.selected_priority(),
                file: self.file.take(),
            },
        };
        self.reset();
        Some(submission)
    }

    pub fn selected_priority(&self) -> Priority {
        self.priorities.get(self.priority).copied().unwrap_or_default()
    }

    /// The attachment that will be submitted, if any.
    pub fn attachment(&self) -> Option<&Attachment> {
        self.file.as_ref()
    }

    pub fn is_reading_file(&self) -> bool {
        self.pending.is_some()
    }

    /// Path of the file currently being read.
    pub fn reading_path(&self) -> Option<&Path> {
        self.pending.as_ref().map(PendingAttachment::path)
    }

    /// Start reading the file named in the file field.
    pub fn request_file(&mut self) {
        let path = self.file_path.value.trim();
        if path.is_empty() {
            return;
        }
        self.pending = Some(PendingAttachment::spawn(PathBuf::from(path)));
    }

    /// Collect a finished background read. On success the file replaces any
    /// previous attachment; on failure the attachment is left as it was.
    /// Either way the path field is emptied.
    pub fn poll_attachment(&mut self) -> Option<Result<String>> {
        let result = self.pending.as_ref()?.poll()?;
        self.pending = None;
        self.file_path.clear();
        Some(result.map(|file| {
            let name = file.name.clone();
            self.file = Some(file);
            name
        }))
    }

    pub fn title_text(&self) -> &'static str {
        match self.mode {
            Some(EditorMode::Edit { .. }) => "Edit task",
            _ => "Add new task",
        }
    }

    pub fn priority_label(&self) -> &'static str {
        format_priority(self.selected_priority())
    }

    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % FIELD_COUNT;
        self.update_active_field();
    }

    pub fn prev_field(&mut self) {
        self.current_field = if self.current_field == 0 {
            FIELD_COUNT - 1
        } else {
            self.current_field - 1
        };
        self.update_active_field();
    }

    /// Update which text field shows a cursor.
    pub fn update_active_field(&mut self) {
        self.title.active = self.current_field == TITLE_ORDER;
        self.description.active = self.current_field == DESCRIPTION_ORDER;
        self.file_path.active = self.current_field == FILE_ORDER;
    }

    fn active_input(&mut self) -> Option<&mut InputField> {
        match self.current_field {
            TITLE_ORDER => Some(&mut self.title),
            DESCRIPTION_ORDER => Some(&mut self.description),
            FILE_ORDER => Some(&mut self.file_path),
            _ => None,
        }
    }

    pub fn handle_char(&mut self, c: char) {
        if let Some(field) = self.active_input() {
            field.handle_char(c);
        }
    }

    pub fn handle_backspace(&mut self) {
        if let Some(field) = self.active_input() {
            field.handle_backspace();
        }
    }

    pub fn handle_delete(&mut self) {
        if let Some(field) = self.active_input() {
            field.handle_delete();
        }
    }

    /// Left/right move the cursor in text fields and cycle the priority.
    pub fn handle_left_right(&mut self, right: bool) {
        if self.current_field == PRIORITY_ORDER {
            let len = self.priorities.len();
            self.priority = if right {
                (self.priority + 1) % len
            } else {
                (self.priority + len - 1) % len
            };
            return;
        }
        if let Some(field) = self.active_input() {
            if right {
                field.move_cursor_right();
            } else {
                field.move_cursor_left();
            }
        }
    }
}
