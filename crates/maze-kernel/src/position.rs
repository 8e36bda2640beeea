//! Grid coordinates and facing directions.
//!
//! The grid uses screen orientation: `x` grows to the right and `y` grows
//! downward, so "up" (north) is `(0, -1)`.

use std::fmt;
use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Integer cell coordinate in the maze grid.
///
/// Stepping past `i32::MIN`/`i32::MAX` wraps around.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    /// Column index
    pub x: i32,
    /// Row index
    pub y: i32,
}

impl Position {
    /// Create a new position.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another position, saturating at `u32::MAX`.
    #[inline]
    pub fn manhattan_distance(&self, other: &Position) -> u32 {
        self.x
            .abs_diff(other.x)
            .saturating_add(self.y.abs_diff(other.y))
    }

    /// The 4 orthogonal neighbors in up, right, down, left order.
    ///
    /// This order is also the BFS expansion order, which makes it the
    /// tie-break between equally short paths.
    #[inline]
    pub fn neighbors_4(&self) -> [Position; 4] {
        Direction::CARDINALS.map(|d| *self + d)
    }
}

impl Add<Direction> for Position {
    type Output = Position;

    #[inline]
    fn add(self, d: Direction) -> Position {
        Position::new(self.x.wrapping_add(d.dx), self.y.wrapping_add(d.dy))
    }
}

impl Add<(i32, i32)> for Position {
    type Output = Position;

    #[inline]
    fn add(self, (dx, dy): (i32, i32)) -> Position {
        Position::new(self.x.wrapping_add(dx), self.y.wrapping_add(dy))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A unit direction vector a crawler can face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Direction {
    /// Column step
    pub dx: i32,
    /// Row step (negative is up)
    pub dy: i32,
}

impl Direction {
    /// Up, `(0, -1)`.
    pub const NORTH: Direction = Direction { dx: 0, dy: -1 };
    /// Right, `(1, 0)`.
    pub const EAST: Direction = Direction { dx: 1, dy: 0 };
    /// Down, `(0, 1)`.
    pub const SOUTH: Direction = Direction { dx: 0, dy: 1 };
    /// Left, `(-1, 0)`.
    pub const WEST: Direction = Direction { dx: -1, dy: 0 };

    /// Up, right, down, left.
    pub const CARDINALS: [Direction; 4] = [
        Direction::NORTH,
        Direction::EAST,
        Direction::SOUTH,
        Direction::WEST,
    ];

    /// Rotate a quarter turn counter-clockwise (north -> west).
    #[inline]
    pub fn turn_left(self) -> Direction {
        Direction {
            dx: self.dy,
            dy: -self.dx,
        }
    }

    /// Rotate a quarter turn clockwise (north -> east).
    #[inline]
    pub fn turn_right(self) -> Direction {
        Direction {
            dx: -self.dy,
            dy: self.dx,
        }
    }

    /// Direction of a single orthogonal step from `from` to `to`.
    ///
    /// Returns `None` when the positions are not 4-adjacent.
    pub fn toward(from: Position, to: Position) -> Option<Direction> {
        let delta = (to.x.wrapping_sub(from.x), to.y.wrapping_sub(from.y));
        Direction::CARDINALS
            .into_iter()
            .find(|d| (d.dx, d.dy) == delta)
    }

    /// The direction as a `(dx, dy)` pair.
    #[inline]
    pub fn delta(self) -> (i32, i32) {
        (self.dx, self.dy)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Direction::NORTH => "north",
            Direction::EAST => "east",
            Direction::SOUTH => "south",
            Direction::WEST => "west",
            _ => return write!(f, "({}, {})", self.dx, self.dy),
        };
        f.write_str(name)
    }
}
