// SPDX-License-Identifier: MPL-2.0

//! Keyed store of data items produced while processing a sliding window
//! of frames.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::task::DataType;

/// Type-erased, shareable data produced by a frame or a task.
///
/// `Arc`-backed rather than `Box`-backed: several tasks within the same
/// buffer window may hold and read the same [`DataItem`] concurrently
/// with other, unrelated uses (see the scheduler's concurrency model).
pub type Payload = Arc<dyn Any + Send + Sync>;

/// Wrap any concrete, shareable value as a [`Payload`].
pub fn payload<T: Any + Send + Sync>(value: T) -> Payload {
    Arc::new(value)
}

/// The `(type, frame_id)` pair that identifies a [`DataItem`].
pub type DataKey = (DataType, u64);

/// A single data item held in the cache: a typed, frame-stamped payload
/// with a touch counter used only for dead-item diagnostics.
#[derive(Clone)]
pub struct DataItem {
    type_tag: DataType,
    frame_id: u64,
    payload: Payload,
    touched: u32,
}

impl DataItem {
    #[must_use]
    pub fn new(type_tag: impl Into<DataType>, frame_id: u64, payload: Payload) -> Self {
        Self {
            type_tag: type_tag.into(),
            frame_id,
            payload,
            touched: 0,
        }
    }

    #[must_use]
    pub fn key(&self) -> DataKey {
        (self.type_tag.clone(), self.frame_id)
    }

    #[must_use]
    pub fn type_tag(&self) -> &DataType {
        &self.type_tag
    }

    #[must_use]
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    #[must_use]
    pub fn touched(&self) -> u32 {
        self.touched
    }

    fn touch(&mut self) {
        self.touched += 1;
    }
}

/// Keyed store of [`DataItem`]s.
///
/// Pure data structure: insertion, lookup, touch-counting, and
/// age-based eviction only. It never logs — the scheduler narrates
/// eviction results through `diagnostics`, so this type stays usable
/// (and testable) without pulling in a logging backend.
#[derive(Default)]
pub struct DataCache {
    items: HashMap<DataKey, DataItem>,
}

impl DataCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: HashMap::new(),
        }
    }

    /// Install `item` at its key, replacing any prior occupant.
    ///
    /// Key uniqueness implies a single producer per `(type, frame_id)`
    /// in well-formed workflows; overwrites only occur in ill-formed ones
    /// and are tolerated silently (last-writer-wins).
    pub fn put(&mut self, item: DataItem) {
        self.items.insert(item.key(), item);
    }

    #[must_use]
    pub fn get(&self, key: &DataKey) -> Option<&DataItem> {
        self.items.get(key)
    }

    /// Increment the touch counter of the item at `key`.
    ///
    /// # Panics
    ///
    /// Panics if no item is stored at `key`; callers must only touch keys
    /// they just successfully looked up.
    pub fn touch(&mut self, key: &DataKey) {
        self.items
            .get_mut(key)
            .expect("touch called on a missing key")
            .touch();
    }

    /// Remove every item whose `frame_id < threshold_frame_id`, returning
    /// the evicted items so the caller can log dead-product warnings (an
    /// item with `touched() == 0`).
    pub fn evict_older_than(&mut self, threshold_frame_id: u64) -> Vec<DataItem> {
        let stale_keys: Vec<DataKey> = self
            .items
            .iter()
            .filter(|(_, item)| item.frame_id < threshold_frame_id)
            .map(|(key, _)| key.clone())
            .collect();

        stale_keys
            .into_iter()
            .filter_map(|key| self.items.remove(&key))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
