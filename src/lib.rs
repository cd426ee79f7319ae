//! treebin-hashmap: a separate-chaining hash map whose crowded buckets
//! turn into red-black trees, with fail-fast cursors and live views.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep lookups O(1) on average and O(log n) per bucket even when
//!   many keys collide, without ever rehashing a key.
//! - Layers:
//!   - `node`: arena-allocated entries (`SlotMap<NodeId, Node>`). A node
//!     carries its cached hash, key, value, chain link and tree links.
//!   - `bucket`: a bin is empty, a singly linked chain, or a tree bin.
//!   - `tree`: red-black tree over the same nodes, ordered by hash, then
//!     by an optional `KeyOrder`, then by insertion sequence.
//!   - `map`: the bucket array, growth, treeify/untreeify policy and the
//!     public operations.
//!   - `iter`, `views`, `entry`: traversal and in-place access layered on
//!     the map.
//!
//! Constraints
//! - Capacity is a power of two, at most `MAXIMUM_CAPACITY`; bucket index
//!   is `hash & (capacity - 1)`.
//! - A chain becomes a tree once it reaches `TREEIFY_THRESHOLD` nodes and
//!   the table has at least `MIN_TREEIFY_CAPACITY` buckets; smaller tables
//!   grow instead. A tree left with `UNTREEIFY_THRESHOLD` nodes or fewer,
//!   by a resize split or by removals, turns back into a chain.
//! - `K: Hash` runs exactly once per inserted key; growth reuses the
//!   stored hash and splits each bucket by one hash bit.
//!
//! Fail-fast traversal
//! - Every map carries a `StructuralVersion` bumped by insertions of new
//!   keys, removals, clears and growth. Overwriting a value is not a
//!   structural change.
//! - Borrowing iterators are protected by the borrow checker. `Cursor`
//!   does not borrow the map and validates a `VersionStamp` on every
//!   step instead; removing through the cursor re-stamps it.
//!
//! Hooks
//! - `EntryHooks` receives post-access, post-insert and post-remove
//!   notifications. Hooks run once the structure is consistent.
//!
//! Notes and non-goals
//! - Not thread-safe; the map is `Send` but shares nothing.
//! - There is no null key. Use `Option<K>` if an absent-key sentinel is
//!   needed; `None` hashes like any other value.
//! - No serialization format.

mod bucket;
pub mod config;
mod entry;
mod error;
mod hashing;
mod hooks;
mod iter;
mod map;
#[cfg(test)]
mod map_proptest;
mod node;
mod order;
mod tree;
mod version;
mod views;

// Public surface
pub use bucket::BinKind;
pub use config::MapConfig;
pub use entry::{Entry, OccupiedEntry, VacantEntry};
pub use error::MapError;
pub use hashbrown::hash_map::DefaultHashBuilder;
pub use hooks::EntryHooks;
pub use iter::{Cursor, IntoIter, Iter, IterMut, Keys, Values, ValuesMut};
pub use map::TreeHashMap;
pub use order::{KeyOrder, NaturalOrder, Unordered};
pub use version::{StructuralVersion, VersionStamp};
pub use views::{EntrySet, KeySet, ValueCollection};
