//! Maze Kernel: cooperative exploration of an unknown grid maze by many crawlers.
//!
//! Agents publish what they see to a [`MapCoordinator`], which merges every
//! observation into one [`SharedMazeMap`] from its actor mailbox and
//! hands out frontier reservations so that no two agents chase the same lead.
//! Each [`ExplorerAgent`] turns the shared knowledge into movement through
//! breadth-first paths over map snapshots.

pub mod agent;
pub mod cell;
pub mod config;
pub mod coordinator;
pub mod crawler;
pub mod inventory;
pub mod map;
pub mod messages;
pub mod pathfinder;
pub mod position;
pub mod reservations;

pub use agent::{AgentId, AgentReport, ExplorerAgent};
pub use cell::CellKind;
pub use config::{AgentConfig, ExplorationConfig, RunConfig};
pub use coordinator::{CoordinatorStats, MapCoordinator};
pub use crawler::Crawler;
pub use inventory::{Bag, Inventory, Item, KeyId};
pub use map::{MapSnapshot, SharedMazeMap, frontiers_of};
pub use messages::Observation;
pub use pathfinder::{shortest_path, shortest_path_with};
pub use position::{Direction, Position};
pub use reservations::ReservationTable;
