//! The crawler capability: what an agent can ask of the body it drives.
//!
//! A crawler may be an in-process object or a client for a remote server;
//! the kernel only sees this trait. Transport failures come back as `Err`
//! and end the agent loop.

use anyhow::Result;
use async_trait::async_trait;

use crate::cell::CellKind;
use crate::inventory::Inventory;
use crate::position::{Direction, Position};

#[async_trait]
pub trait Crawler: Send {
    /// Cell the crawler stands on.
    fn position(&self) -> Position;

    /// Direction the crawler faces.
    fn direction(&self) -> Direction;

    /// Rotate a quarter turn counter-clockwise.
    fn turn_left(&mut self);

    /// Rotate a quarter turn clockwise.
    fn turn_right(&mut self);

    /// Kind of the tile currently faced.
    async fn facing_tile(&mut self) -> Result<CellKind>;

    /// Step into the faced tile.
    ///
    /// `Ok(Some(items))` carries the inventory lying at the destination;
    /// `Ok(None)` means the step was refused (wall, boundary, locked door).
    async fn try_walk(&mut self) -> Result<Option<Inventory>>;
}
