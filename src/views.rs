//! Live key, value and entry collections backed by a map.
//!
//! A view wraps either `&TreeHashMap` or `&mut TreeHashMap`. Read
//! operations are available on both; removal is available only through
//! the mutable form and goes straight to the map. None of the views can
//! add entries.

use crate::iter::{Cursor, Iter, Keys, RawCursor, Values, ValuesMut};
use crate::map::TreeHashMap;
use crate::order::KeyOrder;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use core::ops::{Deref, DerefMut};

/// The map's keys.
pub struct KeySet<M> {
    map: M,
}

/// The map's values, duplicates included.
pub struct ValueCollection<M> {
    map: M,
}

/// The map's key-value pairs.
pub struct EntrySet<M> {
    map: M,
}

impl<M> KeySet<M> {
    pub(crate) fn new(map: M) -> Self {
        Self { map }
    }
}

impl<M> ValueCollection<M> {
    pub(crate) fn new(map: M) -> Self {
        Self { map }
    }
}

impl<M> EntrySet<M> {
    pub(crate) fn new(map: M) -> Self {
        Self { map }
    }
}

impl<M, K, V, S, O> KeySet<M>
where
    M: Deref<Target = TreeHashMap<K, V, S, O>>,
{
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter<'a>(&'a self) -> Keys<'a, K, V>
    where
        S: 'a,
        O: 'a,
    {
        self.map.keys()
    }

    pub fn cursor(&self) -> Cursor {
        self.map.cursor()
    }
}

impl<M, K, V, S, O> KeySet<M>
where
    M: Deref<Target = TreeHashMap<K, V, S, O>>,
    K: Eq + Hash,
    S: BuildHasher,
    O: KeyOrder<K>,
{
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        O: KeyOrder<Q>,
    {
        self.map.contains_key(key)
    }
}

impl<M, K, V, S, O> KeySet<M>
where
    M: DerefMut<Target = TreeHashMap<K, V, S, O>>,
    K: Eq + Hash,
    S: BuildHasher,
    O: KeyOrder<K>,
{
    /// Remove `key` and its value; `true` if it was present.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        O: KeyOrder<Q>,
    {
        self.map.remove_entry(key).is_some()
    }
}

impl<M, K, V, S, O> KeySet<M>
where
    M: DerefMut<Target = TreeHashMap<K, V, S, O>>,
{
    pub fn retain<F: FnMut(&K) -> bool>(&mut self, mut f: F) {
        self.map.retain(|k, _| f(k));
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }
}

impl<M, K, V, S, O> ValueCollection<M>
where
    M: Deref<Target = TreeHashMap<K, V, S, O>>,
{
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter<'a>(&'a self) -> Values<'a, K, V>
    where
        S: 'a,
        O: 'a,
    {
        self.map.values()
    }

    pub fn cursor(&self) -> Cursor {
        self.map.cursor()
    }

    /// Linear scan.
    pub fn contains(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.map.contains_value(value)
    }
}

impl<M, K, V, S, O> ValueCollection<M>
where
    M: DerefMut<Target = TreeHashMap<K, V, S, O>>,
{
    pub fn iter_mut<'a>(&'a mut self) -> ValuesMut<'a, K, V>
    where
        S: 'a,
        O: 'a,
    {
        self.map.values_mut()
    }

    /// Remove the first entry, in iteration order, holding `value`.
    pub fn remove(&mut self, value: &V) -> bool
    where
        V: PartialEq,
    {
        let map = &mut *self.map;
        let mut raw = RawCursor::new(&map.table);
        while let Some(id) = raw.advance(&map.table, &map.slots) {
            if map.slots[id].value == *value {
                return map.remove_node(id, true).is_some();
            }
        }
        false
    }

    pub fn retain<F: FnMut(&V) -> bool>(&mut self, mut f: F) {
        self.map.retain(|_, v| f(v));
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }
}

impl<M, K, V, S, O> EntrySet<M>
where
    M: Deref<Target = TreeHashMap<K, V, S, O>>,
{
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter<'a>(&'a self) -> Iter<'a, K, V>
    where
        S: 'a,
        O: 'a,
    {
        self.map.iter()
    }

    pub fn cursor(&self) -> Cursor {
        self.map.cursor()
    }
}

impl<M, K, V, S, O> EntrySet<M>
where
    M: Deref<Target = TreeHashMap<K, V, S, O>>,
    K: Eq + Hash,
    S: BuildHasher,
    O: KeyOrder<K>,
{
    /// Whether `key` is present and maps to `value`.
    pub fn contains<Q>(&self, key: &Q, value: &V) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        O: KeyOrder<Q>,
        V: PartialEq,
    {
        self.map.get(key) == Some(value)
    }
}

impl<M, K, V, S, O> EntrySet<M>
where
    M: DerefMut<Target = TreeHashMap<K, V, S, O>>,
    K: Eq + Hash,
    S: BuildHasher,
    O: KeyOrder<K>,
{
    /// Remove the pair only if `key` currently maps to `value`.
    pub fn remove<Q>(&mut self, key: &Q, value: &V) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        O: KeyOrder<Q>,
        V: PartialEq,
    {
        self.map.remove_if_eq(key, value)
    }
}

impl<M, K, V, S, O> EntrySet<M>
where
    M: DerefMut<Target = TreeHashMap<K, V, S, O>>,
{
    pub fn retain<F: FnMut(&K, &mut V) -> bool>(&mut self, f: F) {
        self.map.retain(f);
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }
}
