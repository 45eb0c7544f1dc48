//! Concurrent table of items currently in the oven.

use crate::core::{Item, ItemId};
use crate::errors::BakeryError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Thread-safe map from item id to item, populated only while the item bakes.
///
/// Every operation is atomic per key. Inserting an id that is already present
/// is rejected rather than overwritten, so the table never holds two bakes of
/// the same id.
#[derive(Debug, Default)]
pub struct TrackingTable {
    entries: DashMap<ItemId, Item>,
}

impl TrackingTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an item under `id`.
    ///
    /// Fails with [`BakeryError::AlreadyBaking`] if the id is already present.
    pub fn put(&self, id: ItemId, item: Item) -> Result<(), BakeryError> {
        match self.entries.entry(id) {
            Entry::Occupied(occupied) => Err(BakeryError::AlreadyBaking {
                id: occupied.key().clone(),
            }),
            Entry::Vacant(vacant) => {
                vacant.insert(item);
                Ok(())
            }
        }
    }

    /// Removes and returns the entry for `id`, if present.
    pub fn take_if_present(&self, id: &ItemId) -> Option<Item> {
        self.entries.remove(id).map(|(_, item)| item)
    }

    /// Removes and returns the entry for `id`.
    ///
    /// An absent entry is an integrity fault reported as
    /// [`BakeryError::TrackingEntryMissing`].
    pub fn take(&self, id: &ItemId) -> Result<Item, BakeryError> {
        self.take_if_present(id)
            .ok_or_else(|| BakeryError::TrackingEntryMissing { id: id.clone() })
    }

    /// Discards the entry for `id`. Removing an absent key is a no-op.
    ///
    /// Returns true if an entry was removed.
    pub fn remove(&self, id: &ItemId) -> bool {
        self.entries.remove(id).is_some()
    }

    /// Returns true if `id` is currently tracked.
    #[must_use]
    pub fn contains(&self, id: &ItemId) -> bool {
        self.entries.contains_key(id)
    }

    /// Returns a copy of the entry for `id`.
    #[must_use]
    pub fn get(&self, id: &ItemId) -> Option<Item> {
        self.entries.get(id).map(|entry| entry.value().clone())
    }

    /// Returns the number of tracked items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the ids currently tracked, sorted.
    #[must_use]
    pub fn in_flight_ids(&self) -> Vec<ItemId> {
        let mut ids: Vec<_> = self.entries.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Clears all entries.
    pub fn clear(&self) {
        self.entries.clear();
    }
}
