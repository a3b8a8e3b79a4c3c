use crate::error::{Result, SlotError};
use crate::SlotIndex;

use std::ops::{Index, IndexMut};

/// Sizing parameters for a [`SlotArray`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SlotArrayConfig {
    /// Number of slots allocated up front.
    pub initial_capacity: u32,
    /// Number of free-index entries reserved up front. The pile grows past this as needed.
    pub free_list_capacity: u32,
    /// Capacity multiplier applied when the array is full and no slot can be reused.
    pub growth_factor: u32,
}

impl Default for SlotArrayConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 256,
            free_list_capacity: 64,
            growth_factor: 2,
        }
    }
}

impl SlotArrayConfig {
    #[inline]
    pub fn with_initial_capacity(mut self, initial_capacity: u32) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    #[inline]
    pub fn with_free_list_capacity(mut self, free_list_capacity: u32) -> Self {
        self.free_list_capacity = free_list_capacity;
        self
    }

    #[inline]
    pub fn with_growth_factor(mut self, growth_factor: u32) -> Self {
        self.growth_factor = growth_factor;
        self
    }
}

/// A growable array of optional payloads addressed by stable [`SlotIndex`] handles.
///
/// Removing a payload leaves its slot empty and pushes the index onto a free-index pile. The next [`SlotArray::add`]
/// reuses the most recently freed index before the array grows any further, so handles stay stable and nothing is ever
/// shifted. Capacity never shrinks.
///
/// - add: O(1) amortized
/// - get, remove, pop: O(1)
/// - find: O(capacity)
#[derive(Clone, Debug)]
pub struct SlotArray<T> {
    /// One entry per allocated slot, so `slots.len()` is the capacity.
    slots: Vec<Option<T>>,
    /// Indices of empty slots below `live + free_indices.len()`, most recently freed last.
    free_indices: Vec<SlotIndex>,
    /// Number of occupied slots.
    live: u32,
    growth_factor: u32,
}

impl<T> Default for SlotArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SlotArray<T> {
    /// Creates an empty array using [`SlotArrayConfig::default`].
    pub fn new() -> Self {
        Self::with_config(SlotArrayConfig::default())
    }

    /// Creates an empty array with the given sizing.
    ///
    /// # Panics
    ///
    /// If `config.initial_capacity` is zero or `config.growth_factor` is less than 2.
    pub fn with_config(config: SlotArrayConfig) -> Self {
        assert!(config.initial_capacity > 0, "slot array needs a nonzero initial capacity");
        assert!(config.growth_factor >= 2, "slot array growth factor must be at least 2");

        let mut slots = Vec::with_capacity(config.initial_capacity as usize);
        slots.resize_with(config.initial_capacity as usize, || None);
        Self {
            slots,
            free_indices: Vec::with_capacity(config.free_list_capacity as usize),
            live: 0,
            growth_factor: config.growth_factor,
        }
    }

    /// The number of occupied slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.live as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// The number of allocated slots, occupied or not.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// The number of freed indices waiting to be reused.
    #[inline]
    pub fn free_count(&self) -> usize {
        self.free_indices.len()
    }

    /// Returns true iff `index` refers to an occupied slot.
    #[inline]
    pub fn contains(&self, index: SlotIndex) -> bool {
        matches!(self.slots.get(index as usize), Some(Some(_)))
    }

    /// Stores `payload` and returns the handle it will be reachable by until it is removed or popped.
    pub fn add(&mut self, payload: T) -> SlotIndex {
        let index = if let Some(reused) = self.free_indices.pop() {
            tracing::trace!(index = reused, "reusing freed slot");
            reused
        } else {
            // Without free indices, exactly the slots `0..live` are occupied.
            if self.live as usize == self.slots.len() {
                self.grow();
            }
            self.live
        };

        let slot = &mut self.slots[index as usize];
        debug_assert!(slot.is_none(), "slot {} handed out while occupied", index);
        *slot = Some(payload);
        self.live += 1;
        index
    }

    /// Returns the payload stored at `index`.
    pub fn get(&self, index: SlotIndex) -> Result<&T> {
        match self.slots.get(index as usize) {
            Some(Some(payload)) => Ok(payload),
            Some(None) => Err(SlotError::NotFound { index }),
            None => Err(self.out_of_range(index)),
        }
    }

    pub fn get_mut(&mut self, index: SlotIndex) -> Result<&mut T> {
        let capacity = self.slots.len() as u32;
        match self.slots.get_mut(index as usize) {
            Some(Some(payload)) => Ok(payload),
            Some(None) => Err(SlotError::NotFound { index }),
            None => Err(SlotError::OutOfRange { index, capacity }),
        }
    }

    /// Drops the payload at `index` and frees the slot for reuse.
    ///
    /// Fails with [`SlotError::OutOfRange`] if `index` is at or past the capacity, and with [`SlotError::NotFound`] if the
    /// slot is allocated but already empty, e.g. on a second removal of the same handle.
    #[inline]
    pub fn remove(&mut self, index: SlotIndex) -> Result<()> {
        self.pop(index).map(drop)
    }

    /// Frees the slot at `index`, handing the payload to `destructor` instead of dropping it in place.
    #[inline]
    pub fn remove_with(&mut self, index: SlotIndex, destructor: impl FnOnce(T)) -> Result<()> {
        self.pop(index).map(destructor)
    }

    /// Frees the slot at `index` and transfers its payload to the caller.
    pub fn pop(&mut self, index: SlotIndex) -> Result<T> {
        let capacity = self.slots.len() as u32;
        let slot = self
            .slots
            .get_mut(index as usize)
            .ok_or(SlotError::OutOfRange { index, capacity })?;
        let payload = slot.take().ok_or(SlotError::NotFound { index })?;
        self.live -= 1;
        self.free_indices.push(index);
        Ok(payload)
    }

    /// Returns the lowest-index payload matching `predicate`.
    #[inline]
    pub fn find(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<&T> {
        self.iter()
            .find(|&(_, payload)| predicate(payload))
            .map(|(_, payload)| payload)
    }

    /// Returns the handle of the lowest-index payload matching `predicate`.
    #[inline]
    pub fn find_index(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<SlotIndex> {
        self.iter()
            .find(|&(_, payload)| predicate(payload))
            .map(|(index, _)| index)
    }

    /// Like [`SlotArray::find`], but also removes the match and transfers it to the caller.
    pub fn find_and_pop(&mut self, predicate: impl FnMut(&T) -> bool) -> Option<T> {
        let index = self.find_index(predicate)?;
        self.pop(index).ok()
    }

    /// Iterate over occupied slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotIndex, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|payload| (i as SlotIndex, payload)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (SlotIndex, &mut T)> + '_ {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|payload| (i as SlotIndex, payload)))
    }

    /// Consumes the array, handing every payload to `destructor` in index order.
    ///
    /// Dropping the array is equivalent to passing [`drop`].
    pub fn destroy_all(self, destructor: impl FnMut(T)) {
        tracing::trace!(live = self.live, capacity = self.slots.len(), "destroying slot array");
        self.slots.into_iter().flatten().for_each(destructor);
    }

    fn grow(&mut self) {
        let old_capacity = self.slots.len() as u32;
        let new_capacity = old_capacity.saturating_mul(self.growth_factor);
        if new_capacity == old_capacity {
            tracing::error!(capacity = old_capacity, "slot array handle space exhausted");
            panic!("slot array cannot grow past {} slots", old_capacity);
        }
        tracing::debug!(old_capacity, new_capacity, "growing slot array");
        self.slots.resize_with(new_capacity as usize, || None);
    }

    #[inline]
    fn out_of_range(&self, index: SlotIndex) -> SlotError {
        SlotError::OutOfRange {
            index,
            capacity: self.slots.len() as u32,
        }
    }
}

fn fatal(error: SlotError) -> ! {
    tracing::error!(index = error.index(), %error, "fetched a missing slot");
    panic!("{}", error)
}

/// Fetching by a handle the caller guarantees is live. Panics if it isn't.
impl<T> Index<SlotIndex> for SlotArray<T> {
    type Output = T;

    fn index(&self, index: SlotIndex) -> &T {
        match self.get(index) {
            Ok(payload) => payload,
            Err(error) => fatal(error),
        }
    }
}

impl<T> IndexMut<SlotIndex> for SlotArray<T> {
    fn index_mut(&mut self, index: SlotIndex) -> &mut T {
        match self.get_mut(index) {
            Ok(payload) => payload,
            Err(error) => fatal(error),
        }
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝


#[cfg(all(test, feature = "serde"))]
mod serde_test {
    use super::*;

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let config: SlotArrayConfig = serde_json::from_str(r#"{ "initial_capacity": 32 }"#).unwrap();

        assert_eq!(
            config,
            SlotArrayConfig {
                initial_capacity: 32,
                free_list_capacity: 64,
                growth_factor: 2,
            }
        );
        assert_eq!(SlotArray::<u8>::with_config(config).capacity(), 32);
    }

    #[test]
    fn empty_config_is_default() {
        let config: SlotArrayConfig = serde_json::from_str("{}").unwrap();

        assert_eq!(config, SlotArrayConfig::default());
    }

    #[test]
    fn config_survives_json() {
        let config = SlotArrayConfig::default()
            .with_initial_capacity(1024)
            .with_growth_factor(4);

        let json = serde_json::to_string(&config).unwrap();
        let parsed: SlotArrayConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, config);
    }
}
