//! Post-operation callbacks, for access-order bookkeeping and the like.

/// Strategy object notified after the map touches an entry.
///
/// All methods default to no-ops. Hooks observe the entry but cannot
/// reach the map; they run after the structure is consistent again.
pub trait EntryHooks<K, V> {
    /// A lookup or overwrite hit an existing entry.
    fn after_access(&self, _key: &K, _value: &V) {}

    /// A new entry was linked into the table.
    fn after_insert(&self, _key: &K, _value: &V) {}

    /// An entry was unlinked; it is dropped right after this call.
    fn after_remove(&self, _key: &K, _value: &V) {}
}
