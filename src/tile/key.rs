use std::fmt;

use serde::{Deserialize, Serialize};

/// Address of a single tile in the pyramid.
///
/// Rows and columns are 0-indexed from the top-left corner of the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileKey {
    /// Pyramid level (0 = coarsest)
    pub level: usize,

    /// Tile row (0-indexed from top)
    pub row: u32,

    /// Tile column (0-indexed from left)
    pub col: u32,
}

impl TileKey {
    /// Create a new tile key.
    pub fn new(level: usize, row: u32, col: u32) -> Self {
        Self { level, row, col }
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.level, self.row, self.col)
    }
}
