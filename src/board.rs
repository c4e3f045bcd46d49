//! Per-project task board with its three fixed columns.
//!
//! A board owns the ordered task sequence of every column. All mutations are
//! validated before the board is touched, so a failed move or edit leaves it
//! exactly as it was, and a successful move relocates the task by value: it
//! is never observable in both columns or in neither.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BoardError, Result};
use crate::fields::*;
use crate::task::{Task, TaskInput};
use crate::timefmt::{relative_duration, Timestamp};

/// One column: a title and its tasks in display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub title: String,
    #[serde(default)]
    pub items: Vec<Task>,
}

impl Column {
    fn new(key: ColumnKey) -> Self {
        Column {
            title: key.default_title().to_string(),
            items: Vec::new(),
        }
    }
}

/// A slot on the board: a column and an index into its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub column: ColumnKey,
    pub index: usize,
}

impl Position {
    pub fn new(column: ColumnKey, index: usize) -> Self {
        Position { column, index }
    }
}

/// The complete set of columns for one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub queue: Column,
    pub development: Column,
    pub done: Column,
}

impl Default for Board {
    fn default() -> Self {
        Board {
            queue: Column::new(ColumnKey::Queue),
            development: Column::new(ColumnKey::Development),
            done: Column::new(ColumnKey::Done),
        }
    }
}

impl Board {
    pub fn column(&self, key: ColumnKey) -> &Column {
        match key {
            ColumnKey::Queue => &self.queue,
            ColumnKey::Development => &self.development,
            ColumnKey::Done => &self.done,
        }
    }

    fn column_mut(&mut self, key: ColumnKey) -> &mut Column {
        match key {
            ColumnKey::Queue => &mut self.queue,
            ColumnKey::Development => &mut self.development,
            ColumnKey::Done => &mut self.done,
        }
    }

    /// Total number of tasks across all columns.
    pub fn len(&self) -> usize {
        ColumnKey::ALL.iter().map(|&k| self.column(k).items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate every task together with its position.
    pub fn tasks(&self) -> impl Iterator<Item = (Position, &Task)> {
        ColumnKey::ALL.into_iter().flat_map(move |key| {
            self.column(key)
                .items
                .iter()
                .enumerate()
                .map(move |(i, t)| (Position::new(key, i), t))
        })
    }

    /// Locate a task by id.
    pub fn find(&self, id: &str) -> Option<(Position, &Task)> {
        self.tasks().find(|(_, t)| t.id == id)
    }

    pub fn get(&self, pos: Position) -> Option<&Task> {
        self.column(pos.column).items.get(pos.index)
    }

    /// Next free task id: one past the largest numeric id on the board.
    ///
    /// On a board that never lost a task this equals `len() + 1`.
    pub fn next_id(&self) -> String {
        let max = self
            .tasks()
            .filter_map(|(_, t)| t.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        (max + 1).to_string()
    }

    /// Create a pending task at the head of the queue.
    pub fn add_task(&mut self, input: TaskInput, now: Timestamp) -> &Task {
        let task = Task {
            id: self.next_id(),
            name: input.resolved_name(),
            description: input.description,
            status: Status::Pending,
            priority: input.priority,
            created_on: now,
            started_at: None,
            completed_at: None,
            file: input.file,
        };
        debug!(id = %task.id, name = %task.name, "adding task to queue");
        self.queue.items.insert(0, task);
        &self.queue.items[0]
    }

    /// Move a task from `source` to `destination`, updating its status and
    /// timestamps to match the destination column.
    ///
    /// Returns `Ok(false)` without touching the board when there is no
    /// destination or the destination equals the source. A destination index
    /// past the end of its column appends.
    pub fn move_task(
        &mut self,
        source: Position,
        destination: Option<Position>,
        now: Timestamp,
    ) -> Result<bool> {
        let Some(destination) = destination else {
            return Ok(false);
        };
        if source == destination {
            return Ok(false);
        }
        if source.index >= self.column(source.column).items.len() {
            return Err(BoardError::InvalidPosition {
                column: source.column,
                index: source.index,
            });
        }

        let mut task = self.column_mut(source.column).items.remove(source.index);
        task.status = destination.column.status();
        match task.status {
            Status::InProgress if task.started_at.is_none() => task.started_at = Some(now),
            Status::Completed => task.completed_at = Some(now),
            _ => {}
        }

        debug!(
            id = %task.id,
            from = %source.column,
            to = %destination.column,
            index = destination.index,
            "moving task"
        );
        let items = &mut self.column_mut(destination.column).items;
        let index = destination.index.min(items.len());
        items.insert(index, task);
        Ok(true)
    }

    /// Replace the editable fields of a task, keeping its place, id, status
    /// and timestamps.
    pub fn edit_task(&mut self, id: &str, input: TaskInput) -> Result<()> {
        let pos = self
            .find(id)
            .map(|(pos, _)| pos)
            .ok_or_else(|| BoardError::TaskNotFound(id.to_string()))?;
        let task = &mut self.column_mut(pos.column).items[pos.index];
        task.apply(input);
        debug!(id = %task.id, "edited task");
        Ok(())
    }
}

/// How long a task has been in progress, relative to `now`.
///
/// `None` when the task was never started.
pub fn elapsed_time(task: &Task, now: Timestamp) -> Option<String> {
    task.started_at
        .map(|started| relative_duration(started.as_naive(), now.as_naive()))
}

/// Time a finished task spent between starting and completion.
pub fn time_in_progress(task: &Task) -> Option<String> {
    match (task.started_at, task.completed_at) {
        (Some(started), Some(completed)) => {
            Some(relative_duration(started.as_naive(), completed.as_naive()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Attachment;
    use chrono::{Duration, NaiveDate};
    use pretty_assertions::assert_eq;

    fn at(minutes: i64) -> Timestamp {
        let base = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        Timestamp::new(base + Duration::minutes(minutes))
    }

    fn input(title: &str, priority: Priority) -> TaskInput {
        TaskInput {
            title: title.to_string(),
            priority,
            ..TaskInput::default()
        }
    }

    fn names(column: &Column) -> Vec<&str> {
        column.items.iter().map(|t| t.name.as_str()).collect()
    }

    fn sample() -> Board {
        let mut board = Board::default();
        board.add_task(input("Write brief", Priority::High), at(0));
        board.add_task(input("Review", Priority::Low), at(1));
        board
    }

    #[test]
    fn test_add_task_puts_newest_first() {
        let board = sample();
        assert_eq!(names(&board.queue), vec!["Review", "Write brief"]);
        assert!(board.queue.items.iter().all(|t| t.status == Status::Pending));
        assert!(board.development.items.is_empty());
        assert!(board.done.items.is_empty());
        assert_eq!(board.queue.items[1].id, "1");
        assert_eq!(board.queue.items[0].id, "2");
        assert_eq!(board.queue.items[1].priority, Priority::High);
        assert_eq!(board.queue.items[1].created_on, at(0));
        assert_eq!(board.queue.items[1].started_at, None);
    }

    #[test]
    fn test_add_task_defaults_blank_title() {
        let mut board = Board::default();
        let task = board.add_task(input("   ", Priority::Low), at(0));
        assert_eq!(task.name, "New task");
    }

    #[test]
    fn test_add_task_leaves_other_columns_alone() {
        let mut board = sample();
        board
            .move_task(Position::new(ColumnKey::Queue, 0), Some(Position::new(ColumnKey::Done, 0)), at(2))
            .unwrap();
        let done_before = board.done.clone();
        board.add_task(input("Deploy", Priority::Medium), at(3));
        assert_eq!(board.done, done_before);
        assert_eq!(names(&board.queue), vec!["Deploy", "Write brief"]);
    }

    #[test]
    fn test_drag_into_development_starts_task() {
        let mut board = sample();
        let moved = board
            .move_task(
                Position::new(ColumnKey::Queue, 1),
                Some(Position::new(ColumnKey::Development, 0)),
                at(5),
            )
            .unwrap();
        assert!(moved);
        assert_eq!(names(&board.queue), vec!["Review"]);
        assert_eq!(names(&board.development), vec!["Write brief"]);
        let task = &board.development.items[0];
        assert_eq!(task.status, Status::InProgress);
        assert_eq!(task.started_at, Some(at(5)));
    }

    #[test]
    fn test_started_at_is_stamped_once() {
        let mut board = sample();
        let dev = Position::new(ColumnKey::Development, 0);
        board.move_task(Position::new(ColumnKey::Queue, 0), Some(dev), at(5)).unwrap();
        board.move_task(dev, Some(Position::new(ColumnKey::Queue, 0)), at(6)).unwrap();
        board.move_task(Position::new(ColumnKey::Queue, 0), Some(dev), at(7)).unwrap();

        let task = &board.development.items[0];
        assert_eq!(task.name, "Review");
        assert_eq!(task.status, Status::InProgress);
        assert_eq!(task.started_at, Some(at(5)));
    }

    #[test]
    fn test_completed_at_is_stamped_every_time() {
        let mut board = sample();
        let done = Position::new(ColumnKey::Done, 0);
        board.move_task(Position::new(ColumnKey::Queue, 0), Some(done), at(5)).unwrap();
        assert_eq!(board.done.items[0].completed_at, Some(at(5)));
        assert_eq!(board.done.items[0].status, Status::Completed);
        // Straight to done without development keeps started_at unset.
        assert_eq!(board.done.items[0].started_at, None);

        board.move_task(done, Some(Position::new(ColumnKey::Queue, 0)), at(6)).unwrap();
        assert_eq!(board.queue.items[0].status, Status::Pending);
        board.move_task(Position::new(ColumnKey::Queue, 0), Some(done), at(9)).unwrap();
        assert_eq!(board.done.items[0].completed_at, Some(at(9)));
    }

    #[test]
    fn test_move_preserves_task_count() {
        let mut board = sample();
        board.add_task(input("Ship", Priority::Low), at(2));
        let moves = [
            (Position::new(ColumnKey::Queue, 2), Position::new(ColumnKey::Development, 0)),
            (Position::new(ColumnKey::Queue, 0), Position::new(ColumnKey::Development, 1)),
            (Position::new(ColumnKey::Development, 0), Position::new(ColumnKey::Done, 0)),
            (Position::new(ColumnKey::Queue, 0), Position::new(ColumnKey::Queue, 0)),
            (Position::new(ColumnKey::Development, 0), Position::new(ColumnKey::Done, 7)),
            (Position::new(ColumnKey::Done, 1), Position::new(ColumnKey::Done, 0)),
        ];
        for (from, to) in moves {
            board.move_task(from, Some(to), at(10)).unwrap();
            assert_eq!(board.len(), 3);
        }
        let mut ids: Vec<&str> = board.tasks().map(|(_, t)| t.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["1", "2", "3"]);
        for (pos, task) in board.tasks() {
            assert_eq!(task.status, pos.column.status());
        }
    }

    #[test]
    fn test_move_reorders_within_column() {
        let mut board = sample();
        board
            .move_task(Position::new(ColumnKey::Queue, 0), Some(Position::new(ColumnKey::Queue, 1)), at(2))
            .unwrap();
        assert_eq!(names(&board.queue), vec!["Write brief", "Review"]);
        assert!(board.queue.items.iter().all(|t| t.started_at.is_none()));
    }

    #[test]
    fn test_move_without_destination_is_noop() {
        let mut board = sample();
        let before = board.clone();
        assert!(!board.move_task(Position::new(ColumnKey::Queue, 0), None, at(2)).unwrap());
        let same = Position::new(ColumnKey::Queue, 1);
        assert!(!board.move_task(same, Some(same), at(2)).unwrap());
        assert_eq!(board, before);
    }

    #[test]
    fn test_move_from_empty_slot_fails_cleanly() {
        let mut board = sample();
        let before = board.clone();
        let err = board
            .move_task(
                Position::new(ColumnKey::Development, 0),
                Some(Position::new(ColumnKey::Done, 0)),
                at(2),
            )
            .unwrap_err();
        assert!(matches!(err, BoardError::InvalidPosition { column: ColumnKey::Development, index: 0 }));
        assert_eq!(board, before);
    }

    #[test]
    fn test_edit_task_keeps_identity_and_timestamps() {
        let mut board = sample();
        board
            .move_task(Position::new(ColumnKey::Queue, 1), Some(Position::new(ColumnKey::Development, 0)), at(5))
            .unwrap();
        let file = Attachment {
            name: "notes.txt".into(),
            url: "data:text/plain;base64,aGk=".into(),
        };
        board
            .edit_task(
                "1",
                TaskInput {
                    title: "Write full brief".into(),
                    description: "with examples".into(),
                    priority: Priority::Medium,
                    file: Some(file.clone()),
                },
            )
            .unwrap();

        let task = &board.development.items[0];
        assert_eq!(task.id, "1");
        assert_eq!(task.name, "Write full brief");
        assert_eq!(task.description, "with examples");
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.file, Some(file));
        assert_eq!(task.status, Status::InProgress);
        assert_eq!(task.created_on, at(0));
        assert_eq!(task.started_at, Some(at(5)));
    }

    #[test]
    fn test_edit_unknown_task_is_an_error() {
        let mut board = sample();
        let err = board.edit_task("99", TaskInput::default()).unwrap_err();
        assert!(matches!(err, BoardError::TaskNotFound(id) if id == "99"));
    }

    #[test]
    fn test_ids_do_not_collide_after_removal() {
        let mut board = sample();
        board.queue.items.remove(0); // drops id 2
        board.add_task(input("Again", Priority::Low), at(3));
        board.queue.items.retain(|t| t.id != "1");
        board.add_task(input("Once more", Priority::Low), at(4));
        let ids: Vec<&str> = board.tasks().map(|(_, t)| t.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "2"]);
    }

    #[test]
    fn test_elapsed_time_reports_duration_since_start() {
        let mut board = sample();
        assert_eq!(elapsed_time(&board.queue.items[0], at(30)), None);
        board
            .move_task(Position::new(ColumnKey::Queue, 0), Some(Position::new(ColumnKey::Development, 0)), at(5))
            .unwrap();
        let task = &board.development.items[0];
        assert_eq!(elapsed_time(task, at(8)).as_deref(), Some("3 minutes"));
        assert_eq!(elapsed_time(task, at(5)).as_deref(), Some("a few seconds"));
    }

    #[test]
    fn test_time_in_progress_for_finished_task() {
        let mut board = sample();
        let dev = Position::new(ColumnKey::Development, 0);
        board.move_task(Position::new(ColumnKey::Queue, 0), Some(dev), at(0)).unwrap();
        board.move_task(dev, Some(Position::new(ColumnKey::Done, 0)), at(120)).unwrap();
        assert_eq!(time_in_progress(&board.done.items[0]).as_deref(), Some("2 hours"));
        assert_eq!(time_in_progress(&board.queue.items[0]), None);
    }

    #[test]
    fn test_board_json_layout() {
        let board = sample();
        let value = serde_json::to_value(&board).unwrap();
        assert_eq!(value["queue"]["title"], "Queue");
        assert_eq!(value["development"]["title"], "Development");
        assert_eq!(value["done"]["items"], serde_json::json!([]));
        let first = &value["queue"]["items"][1];
        assert_eq!(first["id"], "1");
        assert_eq!(first["name"], "Write brief");
        assert_eq!(first["status"], "pending");
        assert_eq!(first["priority"], "high");
        assert_eq!(first["createdOn"], "Mar 5, 2024 09:00");
        assert!(first["startedAt"].is_null());
        assert!(first.get("completedAt").is_none());
        assert!(first.get("file").is_none());
    }
}
