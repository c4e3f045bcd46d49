//! Task data structure and related functionality.
//!
//! This module defines the `Task` card that lives in a board column, the
//! inline file attachment a task may carry, and `TaskInput`, the set of
//! user-editable fields submitted by the editor or the CLI.

use serde::{de, Deserialize, Deserializer, Serialize};

use crate::fields::*;
use crate::timefmt::Timestamp;

/// Name given to a task submitted without a title.
pub const DEFAULT_TASK_NAME: &str = "New task";

/// A single card on a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: Status,
    #[serde(default)]
    pub priority: Priority,
    pub created_on: Timestamp,
    #[serde(default)]
    pub started_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub file: Option<Attachment>,
}

/// A file embedded in a task as a base64 data URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub url: String,
}

/// Accept `null`, `""` (written by the browser form for "no file") or an
/// attachment object.
fn empty_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Attachment>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawFile {
        File(Attachment),
        Text(String),
    }

    match Option::<RawFile>::deserialize(deserializer)? {
        Some(RawFile::File(file)) => Ok(Some(file)),
        Some(RawFile::Text(s)) if s.is_empty() => Ok(None),
        Some(RawFile::Text(s)) => Err(de::Error::custom(format!("unexpected file value '{s}'"))),
        None => Ok(None),
    }
}

/// Editable task fields, as submitted by the task editor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskInput {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub file: Option<Attachment>,
}

impl TaskInput {
    /// Prefill from an existing task for editing.
    pub fn from_task(task: &Task) -> Self {
        TaskInput {
            title: task.name.clone(),
            description: task.description.clone(),
            priority: task.priority,
            file: task.file.clone(),
        }
    }

    /// Title to store, falling back to the default name when blank.
    pub fn resolved_name(&self) -> String {
        let trimmed = self.title.trim();
        if trimmed.is_empty() {
            DEFAULT_TASK_NAME.to_string()
        } else {
            trimmed.to_string()
        }
    }
}

impl Task {
    /// Overwrite the user-editable fields, keeping id, status and timestamps.
    pub fn apply(&mut self, input: TaskInput) {
        self.name = input.resolved_name();
        self.description = input.description;
        self.priority = input.priority;
        self.file = input.file;
    }
}
