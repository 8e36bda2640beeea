//! Frontier reservations: exclusive claims that keep agents off each other's leads.
//!
//! A frontier is held by at most one agent. Only the holder can release it.
//! The table lives in the [`MapCoordinator`] actor's state, so every
//! scan-then-reserve runs as one mailbox message and two agents racing for
//! the same nearest frontier produce exactly one winner.
//!
//! [`MapCoordinator`]: crate::coordinator::MapCoordinator

use std::collections::HashMap;

use dashmap::DashMap;
use tracing::{debug, trace};

use crate::agent::AgentId;
use crate::position::Position;

/// Frontier -> holding agent.
#[derive(Debug, Default, Clone)]
pub struct ReservationTable {
    /// Frontier -> agent that reserved it
    claims: DashMap<Position, AgentId>,
    /// Reservations handed out (for metrics)
    granted: u64,
    /// Requests that found no candidate (for metrics)
    denied: u64,
}

impl ReservationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the frontier nearest to `agent_pos` for `agent`.
    ///
    /// `frontiers` must be in enumeration order; among candidates at equal
    /// Manhattan distance the earliest wins. Frontiers held by other agents
    /// and those rejected by `accept` are skipped. Frontiers already held by
    /// `agent` stay eligible.
    pub fn reserve_nearest<F>(
        &mut self,
        agent: &AgentId,
        agent_pos: Position,
        frontiers: &[Position],
        accept: F,
    ) -> Option<Position>
    where
        F: Fn(Position) -> bool,
    {
        let mut best: Option<(u32, Position)> = None;

        for &f in frontiers {
            if self.claims.get(&f).is_some_and(|holder| *holder != *agent) {
                continue;
            }
            if !accept(f) {
                continue;
            }
            let score = f.manhattan_distance(&agent_pos);
            if best.is_none_or(|(best_score, _)| score < best_score) {
                best = Some((score, f));
            }
        }

        match best {
            Some((distance, frontier)) => {
                self.claims.insert(frontier, agent.clone());
                self.granted += 1;
                debug!(
                    agent = %agent,
                    frontier = %frontier,
                    distance = distance,
                    "Frontier reserved"
                );
                Some(frontier)
            }
            None => {
                self.denied += 1;
                trace!(agent = %agent, candidates = frontiers.len(), "No frontier available");
                None
            }
        }
    }

    /// Drop the claim on `frontier` if `agent` holds it. Returns whether it did.
    pub fn release(&mut self, agent: &AgentId, frontier: Position) -> bool {
        let released = self
            .claims
            .remove_if(&frontier, |_, holder| holder == agent)
            .is_some();
        if released {
            trace!(agent = %agent, frontier = %frontier, "Reservation released");
        }
        released
    }

    /// Drop every claim held by `agent`. Returns how many were dropped.
    pub fn release_all(&mut self, agent: &AgentId) -> usize {
        let before = self.claims.len();
        self.claims.retain(|_, holder| *holder != *agent);
        before - self.claims.len()
    }

    /// Agent holding `frontier`, if any.
    pub fn holder(&self, frontier: Position) -> Option<AgentId> {
        self.claims.get(&frontier).map(|holder| holder.clone())
    }

    /// Copy of all active claims.
    pub fn claims(&self) -> HashMap<Position, AgentId> {
        self.claims
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// `(granted, denied)` request counts since creation.
    pub fn counters(&self) -> (u64, u64) {
        (self.granted, self.denied)
    }
}
