//! Messages handled by the map coordinator actor.
//!
//! `Observation` is the only way knowledge enters the shared map. The
//! request messages carry a reply sender so plain async callers (agent
//! loops, the experiment runner) can wait for the actor's answer.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::agent::AgentId;
use crate::cell::CellKind;
use crate::coordinator::CoordinatorStats;
use crate::position::{Direction, Position};

/// What one agent knows right now, published to the coordinator.
///
/// Applying an observation records `from` as Room (the crawler stands on
/// it), `from + dir` as `facing_kind`, and `moved_to` as Room when present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// Cell the crawler was standing on
    pub from: Position,
    /// Direction the crawler was facing
    pub dir: Direction,
    /// Classification of the faced cell
    pub facing_kind: CellKind,
    /// New position after a successful step
    pub moved_to: Option<Position>,
}

impl Observation {
    /// Observation of the faced tile without moving.
    pub fn facing(from: Position, dir: Direction, facing_kind: CellKind) -> Self {
        Self {
            from,
            dir,
            facing_kind,
            moved_to: None,
        }
    }

    /// Observation after stepping from `from` into `moved_to`.
    pub fn moved(from: Position, dir: Direction, facing_kind: CellKind, moved_to: Position) -> Self {
        Self {
            from,
            dir,
            facing_kind,
            moved_to: Some(moved_to),
        }
    }

    /// The faced cell.
    pub fn facing_position(&self) -> Position {
        self.from + self.dir
    }
}

/// Answered once every message queued before it has been handled.
#[derive(Debug, Clone)]
pub struct FlushMap {
    pub reply: mpsc::Sender<()>,
}

/// Reserve the nearest unclaimed frontier not in `excluded`.
#[derive(Debug, Clone)]
pub struct ReserveFrontier {
    pub agent: AgentId,
    pub position: Position,
    pub excluded: HashSet<Position>,
    pub reply: mpsc::Sender<Option<Position>>,
}

/// Release one frontier held by `agent`.
#[derive(Debug, Clone)]
pub struct ReleaseReservation {
    pub agent: AgentId,
    pub frontier: Position,
    pub reply: mpsc::Sender<bool>,
}

/// Release every frontier held by `agent`.
#[derive(Debug, Clone)]
pub struct ReleaseAll {
    pub agent: AgentId,
    pub reply: mpsc::Sender<usize>,
}

/// Copy of the reservation table.
#[derive(Debug, Clone)]
pub struct QueryReservations {
    pub reply: mpsc::Sender<HashMap<Position, AgentId>>,
}

/// Coordinator counters.
#[derive(Debug, Clone)]
pub struct QueryStats {
    pub reply: mpsc::Sender<CoordinatorStats>,
}
