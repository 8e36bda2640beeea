//! ExplorerAgent: one decision loop per crawler.
//!
//! Each iteration:
//!
//! ```text
//! Observe ──► faced tile open? ──yes──► walk ──ok──► collect items, publish move
//!                  │                      │
//!                  no                  refused
//!                  ▼                      ▼
//!            SelectFrontier (reserve up to N candidates, filter locally)
//!                  │ none ──► random turn
//!                  ▼
//!            Path over snapshot ── < 2 cells ──► release, skip, random turn
//!                  ▼
//!            Face first step ──► walk ──ok──► collect, publish, release on arrival
//!                                   └─refused─► publish real kind, remember door, random turn
//! ```
//!
//! `blocked_doors` and `skipped_frontiers` are private to the agent. They
//! stop it from thrashing against the same locked or unreachable target and
//! are cleared when the bag receives its first item, since a key can make
//! those targets reachable.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cell::CellKind;
use crate::config::AgentConfig;
use crate::coordinator::MapCoordinator;
use crate::crawler::Crawler;
use crate::inventory::{Bag, Inventory};
use crate::messages::Observation;
use crate::pathfinder::{room_only, room_or_door, shortest_path_with};
use crate::position::{Direction, Position};

/// Identifier of an explorer agent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Stable 64-bit seed derived from the id (FNV-1a).
    pub fn seed(&self) -> u64 {
        self.0.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(0x0000_0100_0000_01b3)
        })
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// What one agent did during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentReport {
    pub agent: AgentId,
    /// Decision loop iterations started
    pub iterations: u64,
    /// Successful steps
    pub walks: u64,
    /// Refused steps along a planned path
    pub failed_walks: u64,
    /// Items moved into the bag
    pub items_collected: u64,
    /// Frontiers accepted as navigation targets
    pub frontiers_targeted: u64,
    /// Accepted frontiers dropped because no path led there
    pub unreachable_frontiers: u64,
    /// Fallback turns taken
    pub random_turns: u64,
    /// Where the crawler ended up
    pub final_position: Position,
}

impl AgentReport {
    fn new(agent: AgentId, position: Position) -> Self {
        Self {
            agent,
            iterations: 0,
            walks: 0,
            failed_walks: 0,
            items_collected: 0,
            frontiers_targeted: 0,
            unreachable_frontiers: 0,
            random_turns: 0,
            final_position: position,
        }
    }
}

/// Drives one crawler against the shared map.
pub struct ExplorerAgent<C, B = Inventory> {
    id: AgentId,
    crawler: C,
    bag: B,
    coordinator: Arc<MapCoordinator>,
    config: AgentConfig,
    rng: ChaCha8Rng,
    blocked_doors: HashSet<Position>,
    skipped_frontiers: HashSet<Position>,
    /// Frontier currently navigated to
    target: Option<Position>,
    report: AgentReport,
}

impl<C, B> ExplorerAgent<C, B>
where
    C: Crawler,
    B: Bag,
{
    pub fn new(
        id: AgentId,
        crawler: C,
        bag: B,
        coordinator: Arc<MapCoordinator>,
        config: AgentConfig,
    ) -> Self {
        let seed = config.seed.unwrap_or_else(|| id.seed());
        let report = AgentReport::new(id.clone(), crawler.position());
        Self {
            id,
            crawler,
            bag,
            coordinator,
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
            blocked_doors: HashSet::new(),
            skipped_frontiers: HashSet::new(),
            target: None,
            report,
        }
    }

    pub fn id(&self) -> &AgentId {
        &self.id
    }

    pub fn position(&self) -> Position {
        self.crawler.position()
    }

    pub fn crawler(&self) -> &C {
        &self.crawler
    }

    pub fn bag(&self) -> &B {
        &self.bag
    }

    /// Run the decision loop until `max_duration` elapses or `cancel` fires.
    ///
    /// No iteration starts after either condition holds; an in-flight crawler
    /// call is allowed to finish. Crawler or bag failures end the loop with
    /// `Err`. Reservations still held are released on every exit path.
    pub async fn run(
        &mut self,
        max_duration: Duration,
        cancel: CancellationToken,
    ) -> Result<AgentReport> {
        let deadline = Instant::now() + max_duration;
        info!(agent = %self.id, position = %self.position(), "Explorer agent started");

        let outcome = self.explore(deadline, &cancel).await;

        self.coordinator.release_all(&self.id).await;
        self.target = None;
        self.report.final_position = self.crawler.position();

        match outcome {
            Ok(()) => {
                info!(
                    agent = %self.id,
                    iterations = self.report.iterations,
                    walks = self.report.walks,
                    items = self.report.items_collected,
                    position = %self.report.final_position,
                    "Explorer agent finished"
                );
                Ok(self.report.clone())
            }
            Err(e) => {
                warn!(agent = %self.id, error = %e, "Explorer agent stopped on error");
                Err(e)
            }
        }
    }

    async fn explore(&mut self, deadline: Instant, cancel: &CancellationToken) -> Result<()> {
        while !cancel.is_cancelled() && Instant::now() < deadline {
            self.report.iterations += 1;
            self.step().await?;

            let delay = self.config.step_delay();
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep_until(deadline) => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
        Ok(())
    }

    /// One Observe → (WalkGreedy | SelectFrontier) → Navigate iteration.
    async fn step(&mut self) -> Result<()> {
        let current = self.crawler.position();
        let dir = self.crawler.direction();

        let facing = self.crawler.facing_tile().await?;
        self.coordinator
            .publish(Observation::facing(current, dir, facing))
            .await?;

        if facing.is_open() {
            if let Some(found) = self.crawler.try_walk().await? {
                return self.arrived(current, dir, facing, &found).await;
            }
            debug!(agent = %self.id, facing = %(current + dir), kind = %facing, "Walk refused");
        }

        let Some(frontier) = self.select_frontier(current).await? else {
            self.random_turn();
            return Ok(());
        };

        let snapshot = self.coordinator.snapshot();
        let path = if self.bag.has_items().await? {
            shortest_path_with(&snapshot, current, frontier, room_or_door)
        } else {
            shortest_path_with(&snapshot, current, frontier, room_only)
        };

        if path.len() < 2 {
            self.coordinator.release_reservation(&self.id, frontier).await;
            self.target = None;
            self.skipped_frontiers.insert(frontier);
            self.report.unreachable_frontiers += 1;
            debug!(agent = %self.id, frontier = %frontier, "Frontier unreachable, skipping");
            self.random_turn();
            return Ok(());
        }

        self.face_toward(current, path[1]).await?;
        let dir = self.crawler.direction();
        let facing_now = self.crawler.facing_tile().await?;

        match self.crawler.try_walk().await? {
            Some(found) => self.arrived(current, dir, facing_now, &found).await?,
            None => {
                self.report.failed_walks += 1;
                let real = self.crawler.facing_tile().await?;
                self.coordinator
                    .publish(Observation::facing(current, dir, real))
                    .await?;

                if real == CellKind::Door {
                    let door = current + dir;
                    self.blocked_doors.insert(door);
                    self.skipped_frontiers.insert(door);
                    debug!(agent = %self.id, door = %door, "Door is locked for this agent");
                }
                self.random_turn();
            }
        }

        if self.crawler.position() == frontier {
            self.coordinator.release_reservation(&self.id, frontier).await;
            self.target = None;
            debug!(agent = %self.id, frontier = %frontier, "Reached frontier");
        }

        Ok(())
    }

    /// Reserve a frontier that survives the local filters.
    ///
    /// Rejected candidates are released immediately. Returns `None` when the
    /// coordinator has nothing left or every attempt was rejected.
    async fn select_frontier(&mut self, current: Position) -> Result<Option<Position>> {
        let has_items = self.bag.has_items().await?;

        for _ in 0..self.config.max_frontier_attempts {
            let Some(candidate) = self
                .coordinator
                .reserve_frontier_excluding(&self.id, current, &self.skipped_frontiers)
                .await
            else {
                break;
            };

            let kind = self.coordinator.map().get(candidate);
            let rejection = if self.skipped_frontiers.contains(&candidate) {
                Some("previously skipped")
            } else if !has_items && kind == CellKind::Door {
                self.skipped_frontiers.insert(candidate);
                Some("door without key")
            } else if kind == CellKind::Door && self.blocked_doors.contains(&candidate) {
                self.skipped_frontiers.insert(candidate);
                Some("blocked door")
            } else {
                None
            };

            if let Some(reason) = rejection {
                self.coordinator.release_reservation(&self.id, candidate).await;
                debug!(agent = %self.id, frontier = %candidate, reason = reason, "Frontier rejected");
                continue;
            }

            // navigate to one frontier at a time
            if let Some(previous) = self.target.replace(candidate)
                && previous != candidate
            {
                self.coordinator.release_reservation(&self.id, previous).await;
            }
            self.report.frontiers_targeted += 1;
            return Ok(Some(candidate));
        }

        Ok(None)
    }

    /// Move the items found at the destination into the bag and publish the move.
    async fn arrived(
        &mut self,
        from: Position,
        dir: Direction,
        facing: CellKind,
        found: &Inventory,
    ) -> Result<()> {
        let had_items = self.bag.has_items().await?;
        let collected = self.bag.take_all_from(found).await?;

        self.report.walks += 1;
        self.report.items_collected += collected as u64;

        if !had_items && collected > 0 {
            debug!(
                agent = %self.id,
                collected = collected,
                forgotten_doors = self.blocked_doors.len(),
                forgotten_frontiers = self.skipped_frontiers.len(),
                "First item collected, retrying avoided targets"
            );
            self.blocked_doors.clear();
            self.skipped_frontiers.clear();
        }

        let moved_to = self.crawler.position();
        self.coordinator
            .publish(Observation::moved(from, dir, facing, moved_to))
            .await
    }

    /// Turn left until facing `to`, re-reading the faced tile after each turn
    /// so remote crawler state stays in sync.
    async fn face_toward(&mut self, from: Position, to: Position) -> Result<()> {
        let Some(desired) = Direction::toward(from, to) else {
            return Ok(());
        };
        for _ in 0..self.config.max_alignment_turns {
            if self.crawler.direction() == desired {
                break;
            }
            self.crawler.turn_left();
            self.crawler.facing_tile().await?;
        }
        Ok(())
    }

    fn random_turn(&mut self) {
        if self.rng.random_bool(0.5) {
            self.crawler.turn_left();
        } else {
            self.crawler.turn_right();
        }
        self.report.random_turns += 1;
    }
}
