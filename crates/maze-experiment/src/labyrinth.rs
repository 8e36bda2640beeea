//! In-process labyrinth: the local transport crawlers walk on.
//!
//! Parses the ASCII layout used by the console client:
//!
//! ```text
//! +--+-----+      + - | #   wall
//! |  /  k  |      space     room
//! |x +-----+      /         door (locked until its key is used)
//! +--+            k         room holding a key
//!                 x         start room
//! ```
//!
//! Doors and key rooms are paired in scan order (row by row, left to
//! right): the first door opens with the key of the first key room, and so
//! on. A layout with more doors than key rooms, or the reverse, is rejected.
//! Cells beyond the layout (and padding of short rows) are `Outside`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Result, bail};
use maze_kernel::{CellKind, Inventory, Item, KeyId, Position};

use crate::crawler::GridCrawler;

/// Layout the experiment binary uses when no maze file is given.
pub const DEMO_MAZE: &str = include_str!("../mazes/demo.txt");

#[derive(Debug)]
enum Tile {
    Room(Inventory),
    Door(DoorLock),
    Wall,
    Outside,
}

#[derive(Debug)]
struct DoorLock {
    key: KeyId,
    opened: AtomicBool,
    floor: Inventory,
}

impl DoorLock {
    /// Open with the matching key from `bag`, which stays in the lock.
    async fn try_open(&self, bag: &Inventory) -> bool {
        if self.opened.load(Ordering::Acquire) {
            return true;
        }
        if bag.remove(Item::Key(self.key)).await {
            self.opened.store(true, Ordering::Release);
            return true;
        }
        false
    }
}

#[derive(Debug)]
struct Grid {
    width: usize,
    height: usize,
    /// Row-major
    tiles: Vec<Tile>,
    start: Position,
}

/// Immutable tile layout shared by every crawler on it.
///
/// Cheap to clone; clones share doors and room floors.
#[derive(Debug, Clone)]
pub struct Labyrinth {
    grid: Arc<Grid>,
}

impl Labyrinth {
    /// Parse an ASCII layout.
    pub fn parse(ascii: &str) -> Result<Self> {
        let rows: Vec<&str> = ascii.lines().collect();
        let height = rows.len();
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        if width < 3 || height < 3 {
            bail!("labyrinth must be at least 3x3, got {width}x{height}");
        }

        let mut tiles = Vec::with_capacity(width * height);
        let mut start: Option<Position> = None;
        let mut door_count: KeyId = 0;
        let mut key_rooms: Vec<Inventory> = Vec::new();

        for (y, row) in rows.iter().enumerate() {
            let mut chars = row.chars();
            for x in 0..width {
                let p = Position::new(x as i32, y as i32);
                let tile = match chars.next() {
                    None => Tile::Outside,
                    Some('+' | '-' | '|' | '#') => Tile::Wall,
                    Some(' ') => Tile::Room(Inventory::new()),
                    Some('/') => {
                        let key = door_count;
                        door_count += 1;
                        Tile::Door(DoorLock {
                            key,
                            opened: AtomicBool::new(false),
                            floor: Inventory::new(),
                        })
                    }
                    Some('k') => {
                        let key = key_rooms.len() as KeyId;
                        let floor = Inventory::with_items([Item::Key(key)]);
                        key_rooms.push(floor.clone());
                        Tile::Room(floor)
                    }
                    Some('x') => {
                        if let Some(existing) = start {
                            bail!("second start position at {p}, first at {existing}");
                        }
                        start = Some(p);
                        Tile::Room(Inventory::new())
                    }
                    Some(other) => bail!("unexpected character {other:?} at {p}"),
                };
                tiles.push(tile);
            }
        }

        if key_rooms.len() != door_count as usize {
            bail!(
                "unmatched key/door creation: {} doors, {} key rooms",
                door_count,
                key_rooms.len()
            );
        }
        let Some(start) = start else {
            bail!("labyrinth must have a starting position marked with x");
        };

        Ok(Self {
            grid: Arc::new(Grid {
                width,
                height,
                tiles,
                start,
            }),
        })
    }

    /// The built-in demo layout.
    pub fn demo() -> Result<Self> {
        Self::parse(DEMO_MAZE)
    }

    pub fn width(&self) -> usize {
        self.grid.width
    }

    pub fn height(&self) -> usize {
        self.grid.height
    }

    pub fn start(&self) -> Position {
        self.grid.start
    }

    /// Ground-truth kind at `p`; `Outside` beyond the layout.
    pub fn kind_at(&self, p: Position) -> CellKind {
        match self.tile(p) {
            Some(Tile::Room(_)) => CellKind::Room,
            Some(Tile::Door(_)) => CellKind::Door,
            Some(Tile::Wall) => CellKind::Wall,
            Some(Tile::Outside) | None => CellKind::Outside,
        }
    }

    /// Number of Room and Door cells.
    pub fn open_cells(&self) -> usize {
        self.grid
            .tiles
            .iter()
            .filter(|t| matches!(t, Tile::Room(_) | Tile::Door(_)))
            .count()
    }

    /// Put a new crawler on the start cell, facing north.
    pub fn new_crawler(&self, bag: Inventory, latency: Duration) -> GridCrawler {
        GridCrawler::new(self.clone(), bag, latency)
    }

    /// Try to enter `p` with `bag`; returns the floor inventory on success.
    pub(crate) async fn enter(&self, p: Position, bag: &Inventory) -> Option<Inventory> {
        match self.tile(p)? {
            Tile::Room(floor) => Some(floor.clone()),
            Tile::Door(lock) => {
                if lock.try_open(bag).await {
                    Some(lock.floor.clone())
                } else {
                    None
                }
            }
            Tile::Wall | Tile::Outside => None,
        }
    }

    fn tile(&self, p: Position) -> Option<&Tile> {
        if p.x < 0 || p.y < 0 {
            return None;
        }
        let (x, y) = (p.x as usize, p.y as usize);
        if x >= self.grid.width || y >= self.grid.height {
            return None;
        }
        self.grid.tiles.get(y * self.grid.width + x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_demo() {
        let lab = Labyrinth::demo().unwrap();
        assert_eq!(lab.width(), 13);
        assert_eq!(lab.height(), 9);
        assert_eq!(lab.start(), Position::new(7, 5));
        assert_eq!(lab.kind_at(Position::new(0, 0)), CellKind::Wall);
        assert_eq!(lab.kind_at(Position::new(3, 1)), CellKind::Door);
        assert_eq!(lab.kind_at(Position::new(1, 1)), CellKind::Room);
        assert_eq!(lab.kind_at(Position::new(-1, 4)), CellKind::Outside);
        assert_eq!(lab.kind_at(Position::new(13, 0)), CellKind::Outside);
    }

    #[test]
    fn test_rejects_small_layout() {
        let err = Labyrinth::parse("+-+\n|x|\n").unwrap_err();
        assert!(err.to_string().contains("at least 3x3"));
    }

    #[test]
    fn test_rejects_missing_start() {
        let err = Labyrinth::parse("+-+\n| |\n+-+\n").unwrap_err();
        assert!(err.to_string().contains("starting position"));
    }

    #[test]
    fn test_rejects_unmatched_door() {
        let err = Labyrinth::parse("+--+\n|x/|\n+--+\n").unwrap_err();
        assert!(err.to_string().contains("unmatched"));
    }

    #[test]
    fn test_rejects_unknown_character() {
        assert!(Labyrinth::parse("+-+\n|x?\n+-+\n").is_err());
    }

    #[test]
    fn test_short_rows_are_padded_with_outside() {
        let lab = Labyrinth::parse("+--+\n|x|\n+--+\n").unwrap();
        assert_eq!(lab.kind_at(Position::new(3, 1)), CellKind::Outside);
        assert_eq!(lab.open_cells(), 1);
    }

    #[tokio::test]
    async fn test_door_opens_with_paired_key_only() {
        // door 0 pairs with the first key room, door 1 with the second
        let lab = Labyrinth::parse("+------+\n|xk/k/ |\n+------+\n").unwrap();
        let door0 = Position::new(3, 1);
        let door1 = Position::new(5, 1);

        let bag = Inventory::with_items([Item::Key(1)]);
        assert!(lab.enter(door0, &bag).await.is_none());
        assert!(lab.enter(door1, &bag).await.is_some());
        // key stays in the lock, door stays open
        assert!(bag.is_empty().await);
        assert!(lab.enter(door1, &Inventory::new()).await.is_some());
    }
}
