//! Table sizing constants and construction-time configuration.

use crate::error::MapError;

/// Bucket count used when the first insertion allocates the table.
pub const DEFAULT_INITIAL_CAPACITY: usize = 16;

/// Largest bucket count the table will grow to.
pub const MAXIMUM_CAPACITY: usize = 1 << 30;

pub const DEFAULT_LOAD_FACTOR: f32 = 0.75;

/// Chain length at which a bucket is converted into a tree bin.
pub const TREEIFY_THRESHOLD: usize = 8;

/// A tree bin this small (or smaller), after a split or a removal, goes
/// back to a plain chain.
pub const UNTREEIFY_THRESHOLD: usize = 6;

/// Below this bucket count a long chain triggers a resize, not a treeify.
pub const MIN_TREEIFY_CAPACITY: usize = 64;

/// Construction parameters for `TreeHashMap`.
///
/// `initial_capacity` set to `Some` allocates the bucket array eagerly;
/// `None` defers allocation to the first insertion.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MapConfig {
    pub initial_capacity: Option<usize>,
    pub load_factor: f32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            initial_capacity: None,
            load_factor: DEFAULT_LOAD_FACTOR,
        }
    }
}

impl MapConfig {
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = Some(capacity);
        self
    }

    pub fn with_load_factor(mut self, load_factor: f32) -> Self {
        self.load_factor = load_factor;
        self
    }

    /// Reject settings that can never produce a working table.
    pub fn validate(&self) -> Result<(), MapError> {
        if self.load_factor.is_nan() || self.load_factor <= 0.0 {
            return Err(MapError::IllegalLoadFactor(self.load_factor));
        }
        Ok(())
    }

    /// Bucket count the table starts with, or 0 for lazy allocation.
    pub(crate) fn pending_capacity(&self) -> usize {
        self.initial_capacity.map(table_size_for).unwrap_or(0)
    }
}

/// Smallest power of two `>= cap`, at least 1 and at most `MAXIMUM_CAPACITY`.
pub(crate) fn table_size_for(cap: usize) -> usize {
    if cap >= MAXIMUM_CAPACITY {
        return MAXIMUM_CAPACITY;
    }
    cap.max(1).next_power_of_two()
}

/// `capacity * load_factor`, saturating once the table cannot grow.
pub(crate) fn threshold_for(capacity: usize, load_factor: f32) -> usize {
    let ft = capacity as f32 * load_factor;
    if capacity < MAXIMUM_CAPACITY && ft < MAXIMUM_CAPACITY as f32 {
        ft as usize
    } else {
        usize::MAX
    }
}
