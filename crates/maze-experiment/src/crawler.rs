//! Crawler bodies living on an in-process [`Labyrinth`].

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use maze_kernel::{CellKind, Crawler, Direction, Inventory, Position};
use tracing::trace;

use crate::labyrinth::Labyrinth;

/// A crawler walking a shared [`Labyrinth`].
///
/// Every remote-style call (`facing_tile`, `try_walk`) waits `latency`
/// first, so runs can mimic a crawler server on the other end of a socket.
#[derive(Debug)]
pub struct GridCrawler {
    labyrinth: Labyrinth,
    bag: Inventory,
    position: Position,
    direction: Direction,
    latency: Duration,
}

impl GridCrawler {
    pub fn new(labyrinth: Labyrinth, bag: Inventory, latency: Duration) -> Self {
        Self {
            position: labyrinth.start(),
            labyrinth,
            bag,
            direction: Direction::NORTH,
            latency,
        }
    }

    /// Bag used to unlock doors.
    pub fn bag(&self) -> &Inventory {
        &self.bag
    }

    async fn round_trip(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl Crawler for GridCrawler {
    fn position(&self) -> Position {
        self.position
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn turn_left(&mut self) {
        self.direction = self.direction.turn_left();
    }

    fn turn_right(&mut self) {
        self.direction = self.direction.turn_right();
    }

    async fn facing_tile(&mut self) -> Result<CellKind> {
        self.round_trip().await;
        Ok(self.labyrinth.kind_at(self.position + self.direction))
    }

    async fn try_walk(&mut self) -> Result<Option<Inventory>> {
        self.round_trip().await;
        let target = self.position + self.direction;
        let Some(floor) = self.labyrinth.enter(target, &self.bag).await else {
            trace!(from = %self.position, to = %target, "Walk blocked");
            return Ok(None);
        };
        self.position = target;
        Ok(Some(floor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_kernel::{Bag, Item};

    const CORRIDOR: &str = "\
+-----+
|xk/  |
+-----+
";

    #[tokio::test]
    async fn test_starts_on_start_cell_facing_north() {
        let lab = Labyrinth::parse(CORRIDOR).unwrap();
        let mut crawler = lab.new_crawler(Inventory::new(), Duration::ZERO);
        assert_eq!(crawler.position(), Position::new(1, 1));
        assert_eq!(crawler.direction(), Direction::NORTH);
        assert_eq!(crawler.facing_tile().await.unwrap(), CellKind::Wall);
        assert!(crawler.try_walk().await.unwrap().is_none());
        assert_eq!(crawler.position(), Position::new(1, 1));
    }

    #[tokio::test]
    async fn test_key_carried_through_door() {
        let lab = Labyrinth::parse(CORRIDOR).unwrap();
        let bag = Inventory::new();
        let mut crawler = lab.new_crawler(bag.clone(), Duration::ZERO);
        crawler.turn_right();
        assert_eq!(crawler.direction(), Direction::EAST);

        let floor = crawler.try_walk().await.unwrap().unwrap();
        assert_eq!(bag.take_all_from(&floor).await.unwrap(), 1);
        assert_eq!(bag.items().await, vec![Item::Key(0)]);

        assert_eq!(crawler.facing_tile().await.unwrap(), CellKind::Door);
        assert!(crawler.try_walk().await.unwrap().is_some());
        assert_eq!(crawler.position(), Position::new(3, 1));
        assert!(bag.is_empty().await);
    }

    #[tokio::test]
    async fn test_locked_door_refuses_empty_bag() {
        let lab = Labyrinth::parse(CORRIDOR).unwrap();
        let mut crawler = lab.new_crawler(Inventory::new(), Duration::ZERO);
        crawler.turn_right();
        crawler.try_walk().await.unwrap();
        assert!(crawler.try_walk().await.unwrap().is_none());
        assert_eq!(crawler.position(), Position::new(2, 1));
    }
}
