//! MapCoordinator: single writer for the shared map and owner of frontier reservations.
//!
//! ## Acton-Reactive Pattern
//!
//! The coordinator is an actor. Its mailbox serializes every map merge and
//! every reservation change, so there is no lock around the reservation
//! table and scan-then-reserve can never interleave with another agent's.
//!
//! ```text
//! ExplorerAgent ─┐
//! ExplorerAgent ─┼─ Observation ─────────────────► MapCoordinator actor ─► SharedMazeMap
//! ExplorerAgent ─┘                                   (mutate_on, FIFO)
//!                  ReserveFrontier { reply } ───────►      │
//!                  ◄──────────── Option<Position> ─────────┘
//! ```
//!
//! Agents are plain tokio tasks, so requests carry an mpsc reply sender and
//! [`MapCoordinator`] waits on the receiver.
//!
//! Readers go straight to the [`SharedMazeMap`]; it only reflects
//! observations the actor has already handled.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use acton_reactive::prelude::*;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use crate::agent::AgentId;
use crate::cell::CellKind;
use crate::map::{MapSnapshot, SharedMazeMap};
use crate::messages::{
    FlushMap, Observation, QueryReservations, QueryStats, ReleaseAll, ReleaseReservation,
    ReserveFrontier,
};
use crate::position::Position;
use crate::reservations::ReservationTable;

/// Counters for progress reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorStats {
    /// Observations accepted by `publish`
    pub published: u64,
    /// Observations applied by the actor
    pub applied: u64,
    /// Merges that changed a cell
    pub cells_changed: u64,
    /// Cells currently recorded in the map
    pub known_cells: usize,
    /// Active frontier reservations
    pub active_reservations: usize,
    /// Reservation requests that got a frontier
    pub reservations_granted: u64,
    /// Reservation requests that found nothing
    pub reservations_denied: u64,
}

/// Actor state for the map coordinator.
#[derive(Default, Clone)]
pub struct MapCoordinatorState {
    map: Arc<SharedMazeMap>,
    reservations: ReservationTable,
    applied: u64,
    cells_changed: u64,
}

impl std::fmt::Debug for MapCoordinatorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapCoordinatorState")
            .field("known_cells", &self.map.len())
            .field("active_reservations", &self.reservations.len())
            .field("applied", &self.applied)
            .finish()
    }
}

impl MapCoordinatorState {
    /// Merge one observation: `from` is Room, the faced cell is `facing_kind`,
    /// and the destination of a move is Room.
    fn apply(&mut self, observation: &Observation) {
        let map = &self.map;
        let mut changed = 0u64;

        changed += u64::from(map.merge(observation.from, CellKind::Room));
        changed += u64::from(map.merge(observation.facing_position(), observation.facing_kind));
        if let Some(to) = observation.moved_to {
            changed += u64::from(map.merge(to, CellKind::Room));
        }

        trace!(
            from = %observation.from,
            facing = %observation.facing_position(),
            kind = %observation.facing_kind,
            moved_to = ?observation.moved_to,
            changed = changed,
            "Observation applied"
        );

        self.applied += 1;
        self.cells_changed += changed;
    }

    fn stats(&self) -> CoordinatorStats {
        let (granted, denied) = self.reservations.counters();
        CoordinatorStats {
            published: 0,
            applied: self.applied,
            cells_changed: self.cells_changed,
            known_cells: self.map.len(),
            active_reservations: self.reservations.len(),
            reservations_granted: granted,
            reservations_denied: denied,
        }
    }
}

/// Handle agents use to talk to the coordinator actor.
///
/// Cheap to share behind an `Arc`. The actor itself lives in the
/// [`ActorRuntime`] it was spawned into and stops with that runtime.
pub struct MapCoordinator {
    map: Arc<SharedMazeMap>,
    handle: ActorHandle,
    published: AtomicU64,
    closed: AtomicBool,
}

impl std::fmt::Debug for MapCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapCoordinator")
            .field("known_cells", &self.map.len())
            .field("published", &self.published.load(Ordering::Relaxed))
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}

fn reply_channel<T>() -> (mpsc::Sender<T>, mpsc::Receiver<T>) {
    mpsc::channel(1)
}

impl MapCoordinator {
    /// Spawn the coordinator actor in the given runtime.
    ///
    /// The actor handles, in mailbox order:
    /// 1. `Observation`: merge into the map
    /// 2. `ReserveFrontier` / `ReleaseReservation` / `ReleaseAll`: reservation table
    /// 3. `FlushMap` / `QueryReservations` / `QueryStats`: answered on the reply sender
    pub async fn spawn(runtime: &mut ActorRuntime) -> Self {
        let map = Arc::new(SharedMazeMap::new());

        let mut actor =
            runtime.new_actor_with_name::<MapCoordinatorState>("MapCoordinator".to_string());
        actor.model.map = Arc::clone(&map);

        actor.after_start(|_actor| {
            Reply::pending(async move {
                info!("Map coordinator started");
            })
        });

        actor.mutate_on::<Observation>(|actor, context| {
            let observation = *context.message();
            actor.model.apply(&observation);
            Reply::ready()
        });

        actor.mutate_on::<ReserveFrontier>(|actor, context| {
            let msg = context.message().clone();
            let frontiers = actor.model.map.frontiers();
            let granted = actor.model.reservations.reserve_nearest(
                &msg.agent,
                msg.position,
                &frontiers,
                |p| !msg.excluded.contains(&p),
            );
            Reply::pending(async move {
                let _ = msg.reply.send(granted).await;
            })
        });

        actor.mutate_on::<ReleaseReservation>(|actor, context| {
            let msg = context.message().clone();
            let released = actor.model.reservations.release(&msg.agent, msg.frontier);
            Reply::pending(async move {
                let _ = msg.reply.send(released).await;
            })
        });

        actor.mutate_on::<ReleaseAll>(|actor, context| {
            let msg = context.message().clone();
            let released = actor.model.reservations.release_all(&msg.agent);
            if released > 0 {
                debug!(agent = %msg.agent, released = released, "Released remaining reservations");
            }
            Reply::pending(async move {
                let _ = msg.reply.send(released).await;
            })
        });

        actor.mutate_on::<FlushMap>(|_actor, context| {
            let reply = context.message().reply.clone();
            Reply::pending(async move {
                let _ = reply.send(()).await;
            })
        });

        actor.mutate_on::<QueryReservations>(|actor, context| {
            let reply = context.message().reply.clone();
            let claims = actor.model.reservations.claims();
            Reply::pending(async move {
                let _ = reply.send(claims).await;
            })
        });

        actor.mutate_on::<QueryStats>(|actor, context| {
            let reply = context.message().reply.clone();
            let stats = actor.model.stats();
            Reply::pending(async move {
                let _ = reply.send(stats).await;
            })
        });

        let handle = actor.start().await;

        Self {
            map,
            handle,
            published: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Queue an observation for the actor.
    ///
    /// Fails once the coordinator has been shut down.
    pub async fn publish(&self, observation: Observation) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            bail!("map coordinator is shut down; observation dropped");
        }
        self.published.fetch_add(1, Ordering::AcqRel);
        self.handle.send(observation).await;
        Ok(())
    }

    /// Wait until every observation published before this call has been applied.
    pub async fn flush(&self) -> Result<()> {
        let (reply, mut rx) = reply_channel();
        self.handle.send(FlushMap { reply }).await;
        rx.recv()
            .await
            .context("map coordinator stopped before applying all observations")
    }

    /// The shared map. Reflects observations applied so far, not those still queued.
    pub fn map(&self) -> &SharedMazeMap {
        &self.map
    }

    /// Point-in-time copy of the map.
    pub fn snapshot(&self) -> MapSnapshot {
        self.map.snapshot()
    }

    /// Reserve the nearest unclaimed frontier for `agent`.
    pub async fn reserve_frontier(&self, agent: &AgentId, agent_pos: Position) -> Option<Position> {
        self.reserve_frontier_excluding(agent, agent_pos, &HashSet::new())
            .await
    }

    /// Reserve the nearest unclaimed frontier for `agent` outside `excluded`.
    ///
    /// Candidates are the current frontiers in row-major order; Manhattan
    /// distance ties go to the earliest. `None` also covers a stopped actor.
    pub async fn reserve_frontier_excluding(
        &self,
        agent: &AgentId,
        agent_pos: Position,
        excluded: &HashSet<Position>,
    ) -> Option<Position> {
        let (reply, mut rx) = reply_channel();
        self.handle
            .send(ReserveFrontier {
                agent: agent.clone(),
                position: agent_pos,
                excluded: excluded.clone(),
                reply,
            })
            .await;
        rx.recv().await.flatten()
    }

    /// Release `frontier` if `agent` holds it; otherwise a no-op.
    pub async fn release_reservation(&self, agent: &AgentId, frontier: Position) -> bool {
        let (reply, mut rx) = reply_channel();
        self.handle
            .send(ReleaseReservation {
                agent: agent.clone(),
                frontier,
                reply,
            })
            .await;
        rx.recv().await.unwrap_or(false)
    }

    /// Release every reservation `agent` holds.
    pub async fn release_all(&self, agent: &AgentId) -> usize {
        let (reply, mut rx) = reply_channel();
        self.handle
            .send(ReleaseAll {
                agent: agent.clone(),
                reply,
            })
            .await;
        rx.recv().await.unwrap_or(0)
    }

    /// Copy of the reservation table.
    pub async fn reservations(&self) -> HashMap<Position, AgentId> {
        let (reply, mut rx) = reply_channel();
        self.handle.send(QueryReservations { reply }).await;
        rx.recv().await.unwrap_or_default()
    }

    pub async fn stats(&self) -> CoordinatorStats {
        let (reply, mut rx) = reply_channel();
        self.handle.send(QueryStats { reply }).await;
        let mut stats = rx.recv().await.unwrap_or_default();
        stats.published = self.published.load(Ordering::Acquire);
        stats
    }

    /// Stop accepting observations and wait until everything already queued
    /// has been applied. Reservations and queries keep working until the
    /// runtime shuts down. Safe to call more than once.
    pub async fn shutdown(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.flush().await?;
        info!(
            known_cells = self.map.len(),
            published = self.published.load(Ordering::Acquire),
            "Map coordinator stopped accepting observations"
        );
        Ok(())
    }
}
