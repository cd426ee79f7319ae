//! TreeHashMap: bucket array, growth, and chain-or-tree dispatch.

use crate::bucket::{self, Bin, BinKind, ChainProbe};
use crate::config::{
    table_size_for, threshold_for, MapConfig, DEFAULT_INITIAL_CAPACITY, DEFAULT_LOAD_FACTOR,
    MAXIMUM_CAPACITY, MIN_TREEIFY_CAPACITY, TREEIFY_THRESHOLD,
};
use crate::entry::{Entry, OccupiedEntry, VacantEntry};
use crate::error::MapError;
use crate::hashing::{hash_of, keys_match};
use crate::hooks::EntryHooks;
use crate::iter::{Cursor, IntoIter, Iter, IterMut, Keys, RawCursor, Values, ValuesMut};
use crate::node::{Arena, Node, NodeId};
use crate::order::{KeyOrder, NaturalOrder, Unordered};
use crate::tree::{TreeBin, TreeSlot};
use crate::version::StructuralVersion;
use crate::views::{EntrySet, KeySet, ValueCollection};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::ops::Index;
use hashbrown::hash_map::DefaultHashBuilder;
use slotmap::SlotMap;
use tracing::debug;

/// Hash map with separate chaining whose long chains become red-black
/// trees.
///
/// Entries live in a generational arena; buckets hold ids. Growth doubles
/// the bucket array and splits every bucket in two by one hash bit, so
/// keys are never rehashed. `O` supplies an optional total order used to
/// place colliding keys inside tree bins.
pub struct TreeHashMap<K, V, S = DefaultHashBuilder, O = Unordered> {
    pub(crate) hasher: S,
    pub(crate) order: O,
    pub(crate) table: Vec<Bin>,
    pub(crate) slots: Arena<K, V>,
    threshold: usize,
    load_factor: f32,
    pub(crate) version: StructuralVersion,
    next_seq: u64,
    hooks: Option<Box<dyn EntryHooks<K, V> + Send>>,
}

/// Where a missing key would be linked.
#[derive(Copy, Clone, Debug)]
pub(crate) enum VacantSlot {
    /// Bucket is empty (or the table is not allocated yet).
    EmptyBin,
    ChainTail {
        index: usize,
        tail: NodeId,
        len: usize,
    },
    Tree {
        index: usize,
        slot: TreeSlot,
    },
}

pub(crate) enum Probe {
    Found(NodeId),
    Vacant(VacantSlot),
}

impl<K, V> TreeHashMap<K, V> {
    pub fn new() -> Self {
        Self::with_hasher_and_order(DefaultHashBuilder::default(), Unordered)
    }

    /// Allocate at least `capacity` buckets up front.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }

    pub fn try_with_config(config: MapConfig) -> Result<Self, MapError> {
        Self::try_with_config_hasher_and_order(config, DefaultHashBuilder::default(), Unordered)
    }
}

impl<K: Ord, V> TreeHashMap<K, V, DefaultHashBuilder, NaturalOrder> {
    /// Map whose tree bins order colliding keys with `Ord`.
    pub fn new_ordered() -> Self {
        Self::with_hasher_and_order(DefaultHashBuilder::default(), NaturalOrder)
    }
}

impl<K, V, S> TreeHashMap<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_hasher_and_order(hasher, Unordered)
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self::from_parts(hasher, Unordered, DEFAULT_LOAD_FACTOR, table_size_for(capacity))
    }
}

impl<K, V> Default for TreeHashMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

// Operations that never hash or compare keys.
impl<K, V, S, O> TreeHashMap<K, V, S, O> {
    pub fn with_hasher_and_order(hasher: S, order: O) -> Self {
        Self::from_parts(hasher, order, DEFAULT_LOAD_FACTOR, 0)
    }

    /// Validate `config` and build the map; fails before allocating.
    pub fn try_with_config_hasher_and_order(
        config: MapConfig,
        hasher: S,
        order: O,
    ) -> Result<Self, MapError> {
        config.validate()?;
        Ok(Self::from_parts(
            hasher,
            order,
            config.load_factor,
            config.pending_capacity(),
        ))
    }

    fn from_parts(hasher: S, order: O, load_factor: f32, capacity: usize) -> Self {
        let mut map = Self {
            hasher,
            order,
            table: Vec::new(),
            slots: SlotMap::with_key(),
            threshold: 0,
            load_factor,
            version: StructuralVersion::new(),
            next_seq: 0,
            hooks: None,
        };
        if capacity > 0 {
            map.allocate(capacity);
        }
        map
    }

    fn allocate(&mut self, capacity: usize) {
        debug_assert!(self.table.is_empty() && capacity.is_power_of_two());
        self.table = vec![Bin::Empty; capacity];
        self.threshold = threshold_for(capacity, self.load_factor);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of buckets; 0 until the first insertion.
    pub fn capacity(&self) -> usize {
        self.table.len()
    }

    /// Entry count above which the next insertion grows the table.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn load_factor(&self) -> f32 {
        self.load_factor
    }

    /// Current structural version; changes on every insertion of a new
    /// key, removal, clear and growth, never on value overwrites.
    pub fn version(&self) -> u64 {
        self.version.current()
    }

    pub fn set_hooks(&mut self, hooks: Box<dyn EntryHooks<K, V> + Send>) {
        self.hooks = Some(hooks);
    }

    pub fn take_hooks(&mut self) -> Option<Box<dyn EntryHooks<K, V> + Send>> {
        self.hooks.take()
    }

    /// Remove every entry; the bucket array keeps its size.
    pub fn clear(&mut self) {
        self.version.bump();
        if self.slots.is_empty() {
            return;
        }
        self.slots.clear();
        self.table.fill(Bin::Empty);
    }

    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.slots.values().any(|n| n.value == *value)
    }

    /// Keep only the entries for which `f` returns `true`.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let mut raw = RawCursor::new(&self.table);
        while let Some(id) = raw.advance(&self.table, &self.slots) {
            let n = &mut self.slots[id];
            if !f(&n.key, &mut n.value) {
                self.remove_node(id, false);
            }
        }
    }

    /// Entries in bucket order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.table, &self.slots)
    }

    /// Mutable entries in arbitrary order.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(&mut self.slots)
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys::new(self.iter())
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values::new(self.iter())
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut::new(&mut self.slots)
    }

    /// Detached fail-fast cursor; see [`Cursor`].
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self)
    }

    pub fn key_set(&self) -> KeySet<&Self> {
        KeySet::new(self)
    }

    pub fn key_set_mut(&mut self) -> KeySet<&mut Self> {
        KeySet::new(self)
    }

    pub fn value_collection(&self) -> ValueCollection<&Self> {
        ValueCollection::new(self)
    }

    pub fn value_collection_mut(&mut self) -> ValueCollection<&mut Self> {
        ValueCollection::new(self)
    }

    pub fn entry_set(&self) -> EntrySet<&Self> {
        EntrySet::new(self)
    }

    pub fn entry_set_mut(&mut self) -> EntrySet<&mut Self> {
        EntrySet::new(self)
    }

    pub(crate) fn notify_access(&self, id: NodeId) {
        if let Some(h) = &self.hooks {
            let n = &self.slots[id];
            h.after_access(&n.key, &n.value);
        }
    }

    /// Unlink `id` from its bucket and reclaim it.
    ///
    /// `movable == false` keeps the bucket's linear order intact for a
    /// cursor walking it.
    pub(crate) fn remove_node(&mut self, id: NodeId, movable: bool) -> Option<(K, V)> {
        let hash = self.slots.get(id)?.hash;
        let index = hash as usize & (self.table.len() - 1);
        let bin = self.table[index];
        self.table[index] = match bin {
            Bin::Empty => return None,
            Bin::Chain(head) => Bin::from_head(bucket::unlink(&mut self.slots, head, id)),
            Bin::Tree(t) => t.remove(&mut self.slots, id, movable),
        };
        let node = self.slots.remove(id)?;
        self.version.bump();
        if let Some(h) = &self.hooks {
            h.after_remove(&node.key, &node.value);
        }
        Some((node.key, node.value))
    }

    /// Walk every bucket and verify placement, tree shape and counts.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) -> Result<(), String> {
        let mask = self.table.len().wrapping_sub(1);
        let mut seen = 0;
        for (i, bin) in self.table.iter().enumerate() {
            if let Bin::Tree(t) = bin {
                t.check_invariants(&self.slots)
                    .map_err(|e| format!("bucket {i}: {e}"))?;
                let len = t.len(&self.slots);
                if len <= crate::config::UNTREEIFY_THRESHOLD {
                    return Err(format!("tree bin in bucket {i} holds only {len} nodes"));
                }
            }
            let mut cur = bin.first();
            while let Some(id) = cur {
                let n = &self.slots[id];
                if n.hash as usize & mask != i {
                    return Err(format!("node with hash {:#x} in bucket {i}", n.hash));
                }
                if let Bin::Chain(_) = bin {
                    if n.tree != crate::node::TreeLinks::default() {
                        return Err(format!("chain node in bucket {i} has tree links"));
                    }
                }
                seen += 1;
                cur = n.next;
            }
        }
        if seen != self.slots.len() {
            return Err(format!("buckets hold {seen} nodes, arena {}", self.slots.len()));
        }
        Ok(())
    }
}

// Growth and linking; needs the order to rebuild split tree bins.
impl<K, V, S, O> TreeHashMap<K, V, S, O>
where
    O: KeyOrder<K>,
{
    /// Double the bucket array (or allocate the default one) and split
    /// every bucket between index `j` and `j + old_capacity`.
    fn resize(&mut self) {
        let old_cap = self.table.len();
        let (new_cap, new_thr) = if old_cap == 0 {
            (
                DEFAULT_INITIAL_CAPACITY,
                threshold_for(DEFAULT_INITIAL_CAPACITY, self.load_factor),
            )
        } else if old_cap >= MAXIMUM_CAPACITY {
            self.threshold = usize::MAX;
            return;
        } else {
            let new_cap = old_cap << 1;
            let doubled = if new_cap < MAXIMUM_CAPACITY && old_cap >= DEFAULT_INITIAL_CAPACITY {
                self.threshold.saturating_mul(2)
            } else {
                0
            };
            // Small load factors round the threshold down to zero; zero
            // never doubles, so recompute from the new capacity.
            let new_thr = if doubled == 0 {
                threshold_for(new_cap, self.load_factor)
            } else {
                doubled
            };
            (new_cap, new_thr)
        };

        let old = core::mem::replace(&mut self.table, vec![Bin::Empty; new_cap]);
        self.threshold = new_thr;
        for (j, bin) in old.into_iter().enumerate() {
            match bin {
                Bin::Empty => {}
                Bin::Chain(head) if self.slots[head].next.is_none() => {
                    let i = self.slots[head].hash as usize & (new_cap - 1);
                    self.table[i] = Bin::Chain(head);
                }
                Bin::Chain(head) => {
                    let (lo, hi) = bucket::split(&mut self.slots, head, old_cap);
                    self.table[j] = Bin::from_head(lo);
                    self.table[j + old_cap] = Bin::from_head(hi);
                }
                Bin::Tree(t) => {
                    let (lo, hi) = t.split(&mut self.slots, old_cap, &self.order);
                    self.table[j] = lo;
                    self.table[j + old_cap] = hi;
                }
            }
        }
        debug!(
            old_capacity = old_cap,
            new_capacity = new_cap,
            threshold = new_thr,
            len = self.slots.len(),
            "resized bucket array"
        );
    }

    /// Convert the chain at `index` into a tree bin, or grow instead
    /// while the table is small.
    fn treeify_bin(&mut self, index: usize) {
        if self.table.len() < MIN_TREEIFY_CAPACITY {
            self.resize();
            return;
        }
        let bin = self.table[index];
        if let Bin::Chain(head) = bin {
            let t = TreeBin::treeify(&mut self.slots, head, &self.order);
            self.table[index] = Bin::Tree(t);
            debug!(index, len = t.len(&self.slots), "converted chain to tree bin");
        }
    }

    /// Link a new node at `slot`; bumps the version and may grow or
    /// treeify. The returned id stays valid across both.
    pub(crate) fn insert_vacant(&mut self, slot: VacantSlot, hash: u32, key: K, value: V) -> NodeId {
        let seq = self.next_seq;
        self.next_seq += 1;
        let id = self.slots.insert(Node::new(hash, key, value, seq));
        match slot {
            VacantSlot::EmptyBin => {
                if self.table.is_empty() {
                    self.resize();
                }
                let index = hash as usize & (self.table.len() - 1);
                debug_assert_eq!(self.table[index], Bin::Empty);
                self.table[index] = Bin::Chain(id);
            }
            VacantSlot::ChainTail { index, tail, len } => {
                bucket::append(&mut self.slots, tail, id);
                if len + 1 >= TREEIFY_THRESHOLD {
                    self.treeify_bin(index);
                }
            }
            VacantSlot::Tree { index, slot } => {
                if let Bin::Tree(t) = &mut self.table[index] {
                    t.insert_at(&mut self.slots, slot, id);
                }
            }
        }
        self.version.bump();
        if self.slots.len() > self.threshold {
            self.resize();
        }
        if let Some(h) = &self.hooks {
            let n = &self.slots[id];
            h.after_insert(&n.key, &n.value);
        }
        id
    }

    /// Make room for `additional` more entries without intermediate
    /// growth steps.
    pub fn reserve(&mut self, additional: usize) {
        let needed = self.slots.len().saturating_add(additional);
        if needed == 0 {
            return;
        }
        if self.table.is_empty() {
            let wanted = (needed as f32 / self.load_factor + 1.0) as usize;
            self.allocate(table_size_for(wanted));
            self.version.bump();
            return;
        }
        let mut grew = false;
        while needed > self.threshold && self.table.len() < MAXIMUM_CAPACITY {
            self.resize();
            grew = true;
        }
        if grew {
            self.version.bump();
        }
    }
}

impl<K, V, S, O> TreeHashMap<K, V, S, O>
where
    K: Eq + Hash,
    S: BuildHasher,
    O: KeyOrder<K>,
{
    fn find_node<Q>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        O: KeyOrder<Q>,
    {
        if self.table.is_empty() {
            return None;
        }
        let hash = hash_of(&self.hasher, key);
        let bin = self.table[hash as usize & (self.table.len() - 1)];
        let first = bin.first()?;
        let n = &self.slots[first];
        if n.hash == hash && keys_match(&n.key, key) {
            return Some(first);
        }
        match bin {
            Bin::Chain(_) => n.next.and_then(|next| bucket::find(&self.slots, next, hash, key)),
            Bin::Tree(t) => t.find(&self.slots, hash, key, &self.order),
            Bin::Empty => None,
        }
    }

    /// Find `key` or the slot it would be linked into.
    fn probe(&self, hash: u32, key: &K) -> Probe {
        if self.table.is_empty() {
            return Probe::Vacant(VacantSlot::EmptyBin);
        }
        let index = hash as usize & (self.table.len() - 1);
        match self.table[index] {
            Bin::Empty => Probe::Vacant(VacantSlot::EmptyBin),
            Bin::Chain(head) => match bucket::probe(&self.slots, head, hash, key) {
                ChainProbe::Found(id) => Probe::Found(id),
                ChainProbe::Tail { tail, len } => {
                    Probe::Vacant(VacantSlot::ChainTail { index, tail, len })
                }
            },
            Bin::Tree(t) => {
                let first = &self.slots[t.first];
                if first.hash == hash && keys_match(&first.key, key) {
                    return Probe::Found(t.first);
                }
                match t.probe(&self.slots, hash, key, self.next_seq, &self.order) {
                    Ok(id) => Probe::Found(id),
                    Err(slot) => Probe::Vacant(VacantSlot::Tree { index, slot }),
                }
            }
        }
    }

    /// Occupied or vacant view of the slot for `key`.
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, S, O> {
        let hash = hash_of(&self.hasher, &key);
        match self.probe(hash, &key) {
            Probe::Found(id) => {
                self.notify_access(id);
                Entry::Occupied(OccupiedEntry::new(self, id))
            }
            Probe::Vacant(slot) => Entry::Vacant(VacantEntry::new(self, hash, key, slot)),
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        O: KeyOrder<Q>,
    {
        let id = self.find_node(key)?;
        self.notify_access(id);
        Some(&self.slots[id].value)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        O: KeyOrder<Q>,
    {
        let id = self.find_node(key)?;
        self.notify_access(id);
        let n = &self.slots[id];
        Some((&n.key, &n.value))
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        O: KeyOrder<Q>,
    {
        let id = self.find_node(key)?;
        self.notify_access(id);
        Some(&mut self.slots[id].value)
    }

    /// Value for `key`, or `default` when absent.
    pub fn get_or<'a, Q>(&'a self, key: &Q, default: &'a V) -> &'a V
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        O: KeyOrder<Q>,
    {
        self.get(key).unwrap_or(default)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        O: KeyOrder<Q>,
    {
        self.find_node(key).is_some()
    }

    /// Representation of the bucket `key` hashes to, if it is non-empty.
    pub fn bin_kind<Q>(&self, key: &Q) -> Option<BinKind>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash,
    {
        if self.table.is_empty() {
            return None;
        }
        let hash = hash_of(&self.hasher, key);
        self.table[hash as usize & (self.table.len() - 1)].kind()
    }

    /// Insert or overwrite; returns the previous value. Overwriting keeps
    /// the stored key and does not change the structural version.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.entry(key) {
            Entry::Occupied(mut e) => Some(e.insert(value)),
            Entry::Vacant(e) => {
                e.insert(value);
                None
            }
        }
    }

    /// Insert only when `key` is absent; otherwise return the existing
    /// value and drop `value`.
    pub fn put_if_absent(&mut self, key: K, value: V) -> Option<&V> {
        match self.entry(key) {
            Entry::Occupied(e) => Some(&*e.into_mut()),
            Entry::Vacant(e) => {
                e.insert(value);
                None
            }
        }
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        O: KeyOrder<Q>,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        O: KeyOrder<Q>,
    {
        let id = self.find_node(key)?;
        self.remove_node(id, true)
    }

    /// Remove `key` only while it maps to `value`.
    pub fn remove_if_eq<Q>(&mut self, key: &Q, value: &V) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        O: KeyOrder<Q>,
        V: PartialEq,
    {
        match self.find_node(key) {
            Some(id) if self.slots[id].value == *value => self.remove_node(id, true).is_some(),
            _ => false,
        }
    }

    /// Overwrite the value of an existing key; absent keys stay absent.
    pub fn replace<Q>(&mut self, key: &Q, value: V) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        O: KeyOrder<Q>,
    {
        let id = self.find_node(key)?;
        let old = core::mem::replace(&mut self.slots[id].value, value);
        self.notify_access(id);
        Some(old)
    }

    pub fn replace_if_eq<Q>(&mut self, key: &Q, old: &V, new: V) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        O: KeyOrder<Q>,
        V: PartialEq,
    {
        match self.find_node(key) {
            Some(id) if self.slots[id].value == *old => {
                self.slots[id].value = new;
                self.notify_access(id);
                true
            }
            _ => false,
        }
    }

    /// Value for `key`, computing and inserting it when absent. `f`
    /// returning `None` leaves the map unchanged.
    pub fn compute_if_absent<F>(&mut self, key: K, f: F) -> Option<&mut V>
    where
        F: FnOnce(&K) -> Option<V>,
    {
        match self.entry(key) {
            Entry::Occupied(e) => Some(e.into_mut()),
            Entry::Vacant(e) => {
                let value = f(e.key())?;
                Some(e.insert(value))
            }
        }
    }

    /// Recompute the value of a present key; `None` removes the entry.
    pub fn compute_if_present<Q, F>(&mut self, key: &Q, f: F) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        O: KeyOrder<Q>,
        F: FnOnce(&K, &V) -> Option<V>,
    {
        let id = self.find_node(key)?;
        let n = &self.slots[id];
        match f(&n.key, &n.value) {
            Some(value) => {
                self.slots[id].value = value;
                self.notify_access(id);
                Some(&mut self.slots[id].value)
            }
            None => {
                self.remove_node(id, true);
                None
            }
        }
    }

    /// Compute a new mapping from the current one (if any). `None`
    /// removes an existing entry or leaves an absent key absent.
    pub fn compute<F>(&mut self, key: K, f: F) -> Option<&mut V>
    where
        F: FnOnce(&K, Option<&V>) -> Option<V>,
    {
        match self.entry(key) {
            Entry::Occupied(mut e) => match f(e.key(), Some(e.get())) {
                Some(value) => {
                    e.insert(value);
                    Some(e.into_mut())
                }
                None => {
                    e.remove();
                    None
                }
            },
            Entry::Vacant(e) => {
                let value = f(e.key(), None)?;
                Some(e.insert(value))
            }
        }
    }

    /// Insert `value` if absent, else combine it with the current value
    /// through `f`; `f` returning `None` removes the entry.
    pub fn merge<F>(&mut self, key: K, value: V, f: F) -> Option<&mut V>
    where
        F: FnOnce(&V, V) -> Option<V>,
    {
        match self.entry(key) {
            Entry::Occupied(mut e) => match f(e.get(), value) {
                Some(merged) => {
                    e.insert(merged);
                    Some(e.into_mut())
                }
                None => {
                    e.remove();
                    None
                }
            },
            Entry::Vacant(e) => Some(e.insert(value)),
        }
    }
}

impl<K, V, S, O> Clone for TreeHashMap<K, V, S, O>
where
    K: Clone,
    V: Clone,
    S: Clone,
    O: Clone,
{
    /// Hooks are not cloned.
    fn clone(&self) -> Self {
        Self {
            hasher: self.hasher.clone(),
            order: self.order.clone(),
            table: self.table.clone(),
            slots: self.slots.clone(),
            threshold: self.threshold,
            load_factor: self.load_factor,
            version: StructuralVersion::new(),
            next_seq: self.next_seq,
            hooks: None,
        }
    }
}

impl<K, V, S, O> fmt::Debug for TreeHashMap<K, V, S, O>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S, O> PartialEq for TreeHashMap<K, V, S, O>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
    O: KeyOrder<K>,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, S, O> Eq for TreeHashMap<K, V, S, O>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
    O: KeyOrder<K>,
{
}

impl<K, Q, V, S, O> Index<&Q> for TreeHashMap<K, V, S, O>
where
    K: Eq + Hash + Borrow<Q>,
    Q: ?Sized + Hash + Eq,
    S: BuildHasher,
    O: KeyOrder<K> + KeyOrder<Q>,
{
    type Output = V;

    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<K, V, S, O> Extend<(K, V)> for TreeHashMap<K, V, S, O>
where
    K: Eq + Hash,
    S: BuildHasher,
    O: KeyOrder<K>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        self.reserve(lower);
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S, O> FromIterator<(K, V)> for TreeHashMap<K, V, S, O>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
    O: KeyOrder<K> + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::with_hasher_and_order(S::default(), O::default());
        map.extend(iter);
        map
    }
}

impl<'a, K, V, S, O> IntoIterator for &'a TreeHashMap<K, V, S, O> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S, O> IntoIterator for &'a mut TreeHashMap<K, V, S, O> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, S, O> IntoIterator for TreeHashMap<K, V, S, O> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self.slots)
    }
}
