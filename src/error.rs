//! Error type shared by construction, cursors and views.

use thiserror::Error;

#[derive(Copy, Clone, Debug, PartialEq, Error)]
pub enum MapError {
    /// Load factor was zero, negative or NaN.
    #[error("illegal load factor: {0}")]
    IllegalLoadFactor(f32),

    /// A cursor saw a structural change it did not make itself.
    #[error("map structurally modified during iteration (expected version {expected}, found {found})")]
    ConcurrentModification { expected: u64, found: u64 },

    /// `Cursor::remove` without a preceding successful `next`.
    #[error("cursor has no current entry to remove")]
    NoCurrentEntry,
}
