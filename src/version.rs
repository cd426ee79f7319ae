//! Structural-version guard.
//!
//! Single counter per map, bumped on every structural change (new
//! entry, removal, clear, growth). Cursors keep a `VersionStamp` copy
//! and compare it against the live counter before each step; nothing
//! registers itself with the map. Detection is best effort, not a
//! synchronization mechanism.

use crate::error::MapError;

/// Per-instance structural modification counter.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StructuralVersion {
    count: u64,
}

impl StructuralVersion {
    pub const fn new() -> Self {
        Self { count: 0 }
    }

    /// Record one structural change.
    #[inline]
    pub fn bump(&mut self) {
        self.count = self.count.wrapping_add(1);
    }

    #[inline]
    pub fn current(&self) -> u64 {
        self.count
    }

    /// Capture the current value for later validation.
    #[inline]
    pub fn stamp(&self) -> VersionStamp {
        VersionStamp {
            expected: self.count,
        }
    }
}

/// A captured `StructuralVersion` value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VersionStamp {
    expected: u64,
}

impl VersionStamp {
    pub fn expected(&self) -> u64 {
        self.expected
    }

    /// Fails with `ConcurrentModification` when `live` moved on.
    #[inline]
    pub fn check(&self, live: &StructuralVersion) -> Result<(), MapError> {
        if live.count == self.expected {
            Ok(())
        } else {
            Err(MapError::ConcurrentModification {
                expected: self.expected,
                found: live.count,
            })
        }
    }
}
