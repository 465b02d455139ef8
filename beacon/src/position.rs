//! Cursor positions as reported by the host editor.

use std::fmt;

/// A single cursor location in the active buffer.
///
/// Both coordinates are 0-based. Positions are plain snapshots: the host
/// produces a fresh one on every movement and the core copies it into its own
/// tracking state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CursorPosition {
    pub line: u32,
    pub column: u32,
}

impl CursorPosition {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Distance in lines between two positions.
    ///
    /// Columns are ignored, a jump is measured vertically only.
    pub fn line_distance(&self, other: &CursorPosition) -> u32 {
        self.line.abs_diff(other.line)
    }
}

impl fmt::Display for CursorPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
