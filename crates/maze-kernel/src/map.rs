//! SharedMazeMap: the knowledge base every agent's observations merge into.
//!
//! Unknown cells are simply absent. Merges are rank-monotonic, so a cell's
//! kind only ever moves up [`CellKind::rank`].

use std::collections::HashMap;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::cell::CellKind;
use crate::position::Position;

/// Point-in-time copy of the map. Absent positions are unknown.
pub type MapSnapshot = HashMap<Position, CellKind>;

/// Concurrently mergeable `Position -> CellKind` map.
#[derive(Default)]
pub struct SharedMazeMap {
    cells: DashMap<Position, CellKind>,
}

impl std::fmt::Debug for SharedMazeMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedMazeMap")
            .field("known_cells", &self.cells.len())
            .finish()
    }
}

impl SharedMazeMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded kind at `p`, or [`CellKind::Unknown`] if never observed.
    pub fn get(&self, p: Position) -> CellKind {
        self.cells.get(&p).map(|k| *k).unwrap_or_default()
    }

    /// Store `kind` at `p` iff it outranks what is already there.
    ///
    /// Returns whether the stored value changed. The entry is held locked
    /// for the compare-and-set, so racing writers never lose the highest rank.
    pub fn merge(&self, p: Position, kind: CellKind) -> bool {
        match self.cells.entry(p) {
            Entry::Occupied(mut existing) => {
                if kind.rank() > existing.get().rank() {
                    existing.insert(kind);
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(vacant) => {
                if kind.rank() > CellKind::Unknown.rank() {
                    vacant.insert(kind);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Copy of the current state, unaffected by later merges.
    pub fn snapshot(&self) -> MapSnapshot {
        self.cells
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect()
    }

    /// Number of observed cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Current frontier cells, in row-major order.
    ///
    /// Computed from a fresh snapshot on every call.
    pub fn frontiers(&self) -> Vec<Position> {
        frontiers_of(&self.snapshot())
    }
}

/// Room/Door cells of `snapshot` with at least one absent 4-neighbor.
///
/// Sorted by `y` then `x` so callers get a stable enumeration order
/// regardless of hash iteration order.
pub fn frontiers_of(snapshot: &MapSnapshot) -> Vec<Position> {
    let mut frontiers: Vec<Position> = snapshot
        .iter()
        .filter(|(_, kind)| kind.is_open())
        .filter(|(pos, _)| {
            pos.neighbors_4()
                .iter()
                .any(|n| !snapshot.contains_key(n))
        })
        .map(|(pos, _)| *pos)
        .collect();
    frontiers.sort_by_key(|p| (p.y, p.x));
    frontiers
}
