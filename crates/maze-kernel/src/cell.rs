//! Cell classification and the confidence ranking used to merge observations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What is known about a grid cell.
///
/// Variants are ordered by [`CellKind::rank`]: a recorded cell may only move
/// up the ranking, never down.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    /// Never observed
    #[default]
    Unknown,
    /// Traversable, no lock
    Room,
    /// Traversable only with the matching key
    Door,
    /// Never traversable
    Wall,
    /// Maze boundary, never traversable
    Outside,
}

impl CellKind {
    /// Confidence rank: Unknown=1, Room=2, Door=3, Wall=4, Outside=5.
    #[inline]
    pub const fn rank(self) -> u8 {
        match self {
            CellKind::Unknown => 1,
            CellKind::Room => 2,
            CellKind::Door => 3,
            CellKind::Wall => 4,
            CellKind::Outside => 5,
        }
    }

    /// Room or Door: a cell a crawler can at least try to step into.
    #[inline]
    pub const fn is_open(self) -> bool {
        matches!(self, CellKind::Room | CellKind::Door)
    }
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CellKind::Unknown => "unknown",
            CellKind::Room => "room",
            CellKind::Door => "door",
            CellKind::Wall => "wall",
            CellKind::Outside => "outside",
        };
        f.write_str(s)
    }
}
