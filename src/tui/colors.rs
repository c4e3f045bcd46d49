//! Color constants for the terminal user interface.

use ratatui::style::Color;

use crate::fields::{ColumnKey, Priority};

/// Used for the queue column
pub const SLATE: Color = Color::Rgb(96, 110, 140);
/// Used for the development column
pub const GOLD: Color = Color::Rgb(255, 215, 0);
/// Used for the done column
pub const DARK_GREEN: Color = Color::Rgb(0, 120, 0);
/// Used for high priority markers
pub const DARK_RED: Color = Color::Rgb(170, 20, 20);

/// Accent color of a column.
pub fn column_color(key: ColumnKey) -> Color {
    match key {
        ColumnKey::Queue => SLATE,
        ColumnKey::Development => GOLD,
        ColumnKey::Done => DARK_GREEN,
    }
}

pub fn priority_color(p: Priority) -> Color {
    match p {
        Priority::Low => Color::Gray,
        Priority::Medium => Color::Yellow,
        Priority::High => DARK_RED,
    }
}
