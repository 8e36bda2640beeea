//! Items, shared inventories, and the bag capability agents collect into.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Identifier pairing a key with the door it opens.
pub type KeyId = u32;

/// A collectable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Item {
    Key(KeyId),
}

/// The bag an agent collects items into.
///
/// Implementations backed by a remote service may fail; errors are fatal
/// for the agent driving the bag.
#[async_trait]
pub trait Bag: Send + Sync {
    /// Whether the bag holds anything.
    async fn has_items(&self) -> Result<bool>;

    /// Move every item of `source` into this bag. Returns how many moved.
    async fn take_all_from(&self, source: &Inventory) -> Result<usize>;
}

/// Shared handle to a list of items (a room's floor or a crawler's bag).
///
/// Clones refer to the same items.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    items: Arc<Mutex<Vec<Item>>>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: impl IntoIterator<Item = Item>) -> Self {
        Self {
            items: Arc::new(Mutex::new(items.into_iter().collect())),
        }
    }

    pub async fn items(&self) -> Vec<Item> {
        self.items.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }

    pub async fn push(&self, item: Item) {
        self.items.lock().await.push(item);
    }

    /// Remove the first item equal to `item`. Returns whether one was found.
    pub async fn remove(&self, item: Item) -> bool {
        let mut items = self.items.lock().await;
        match items.iter().position(|i| *i == item) {
            Some(idx) => {
                items.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Whether both handles point at the same underlying items.
    pub fn same_as(&self, other: &Inventory) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
    }
}

#[async_trait]
impl Bag for Inventory {
    async fn has_items(&self) -> Result<bool> {
        Ok(!self.is_empty().await)
    }

    async fn take_all_from(&self, source: &Inventory) -> Result<usize> {
        if self.same_as(source) {
            return Ok(0);
        }
        // take from the source before touching our own lock so two bags
        // emptying into each other cannot deadlock
        let taken: Vec<Item> = std::mem::take(&mut *source.items.lock().await);
        let count = taken.len();
        self.items.lock().await.extend(taken);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_take_all_moves_items() {
        let bag = Inventory::new();
        let room = Inventory::with_items([Item::Key(1), Item::Key(2)]);

        assert!(!bag.has_items().await.unwrap());
        assert_eq!(bag.take_all_from(&room).await.unwrap(), 2);

        assert!(bag.has_items().await.unwrap());
        assert!(room.is_empty().await);
        assert_eq!(bag.items().await, vec![Item::Key(1), Item::Key(2)]);
    }

    #[tokio::test]
    async fn test_take_from_empty_source() {
        let bag = Inventory::with_items([Item::Key(7)]);
        assert_eq!(bag.take_all_from(&Inventory::new()).await.unwrap(), 0);
        assert_eq!(bag.len().await, 1);
    }

    #[tokio::test]
    async fn test_take_from_self_is_a_no_op() {
        let bag = Inventory::with_items([Item::Key(7)]);
        let alias = bag.clone();
        assert_eq!(bag.take_all_from(&alias).await.unwrap(), 0);
        assert_eq!(bag.len().await, 1);
    }

    #[tokio::test]
    async fn test_remove_single_item() {
        let inv = Inventory::with_items([Item::Key(1), Item::Key(1)]);
        assert!(inv.remove(Item::Key(1)).await);
        assert!(!inv.remove(Item::Key(3)).await);
        assert_eq!(inv.len().await, 1);
    }
}
