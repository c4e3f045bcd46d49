//! Enumerations and field types for the task board.
//!
//! This module defines the fixed column set, the task status that mirrors each
//! column, and the priority scale offered by the task editor.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// The three fixed columns of every board, in display order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnKey {
    #[value(alias = "pending")]
    Queue,
    #[value(alias = "dev", alias = "in-progress")]
    Development,
    #[value(alias = "completed")]
    Done,
}

impl ColumnKey {
    pub const ALL: [ColumnKey; 3] = [ColumnKey::Queue, ColumnKey::Development, ColumnKey::Done];

    /// Status carried by every task that sits in this column.
    pub fn status(self) -> Status {
        match self {
            ColumnKey::Queue => Status::Pending,
            ColumnKey::Development => Status::InProgress,
            ColumnKey::Done => Status::Completed,
        }
    }

    /// Title a freshly initialised column is given.
    pub fn default_title(self) -> &'static str {
        match self {
            ColumnKey::Queue => "Queue",
            ColumnKey::Development => "Development",
            ColumnKey::Done => "Done",
        }
    }

    /// Position of this column in `ALL`.
    pub fn index(self) -> usize {
        match self {
            ColumnKey::Queue => 0,
            ColumnKey::Development => 1,
            ColumnKey::Done => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<ColumnKey> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColumnKey::Queue => "queue",
            ColumnKey::Development => "development",
            ColumnKey::Done => "done",
        };
        f.write_str(s)
    }
}

/// Task status; always equal to the status of the column holding the task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Status {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "in progress", alias = "in-progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
}

/// Priority classification offered by the task editor.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];
}

/// Format a task status for display.
pub fn format_status(s: Status) -> &'static str {
    match s {
        Status::Pending => "pending",
        Status::InProgress => "in progress",
        Status::Completed => "completed",
    }
}

/// Format a priority level for display.
pub fn format_priority(p: Priority) -> &'static str {
    match p {
        Priority::Low => "low",
        Priority::Medium => "medium",
        Priority::High => "high",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_column_maps_to_its_status() {
        assert_eq!(ColumnKey::Queue.status(), Status::Pending);
        assert_eq!(ColumnKey::Development.status(), Status::InProgress);
        assert_eq!(ColumnKey::Done.status(), Status::Completed);
        for key in ColumnKey::ALL {
            assert_eq!(ColumnKey::from_index(key.index()), Some(key));
        }
        assert_eq!(ColumnKey::from_index(3), None);
    }

    #[test]
    fn test_status_accepts_both_spellings() {
        let spaced: Status = serde_json::from_str("\"in progress\"").unwrap();
        let dashed: Status = serde_json::from_str("\"in-progress\"").unwrap();
        assert_eq!(spaced, Status::InProgress);
        assert_eq!(dashed, Status::InProgress);
        assert_eq!(serde_json::to_string(&Status::InProgress).unwrap(), "\"in progress\"");
    }
}
