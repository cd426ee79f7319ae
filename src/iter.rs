//! Traversal: borrowing iterators and the detached fail-fast `Cursor`.
//!
//! Borrowing iterators hold `&map` or `&mut map`, so the borrow checker
//! already rules out structural changes while they live. `Cursor` holds
//! no borrow; it takes the map on every call and validates a
//! `VersionStamp` instead.

use crate::bucket::Bin;
use crate::error::MapError;
use crate::map::TreeHashMap;
use crate::node::{Arena, Node, NodeId};
use crate::version::VersionStamp;
use core::iter::FusedIterator;

/// Position in bucket order: the node to yield next and the bucket index
/// to resume scanning from once its chain runs out.
#[derive(Copy, Clone, Debug)]
pub(crate) struct RawCursor {
    next: Option<NodeId>,
    index: usize,
}

impl RawCursor {
    pub(crate) fn new(table: &[Bin]) -> Self {
        let mut raw = Self {
            next: None,
            index: 0,
        };
        raw.seek(table);
        raw
    }

    fn seek(&mut self, table: &[Bin]) {
        while let Some(bin) = table.get(self.index) {
            self.index += 1;
            if let Some(first) = bin.first() {
                self.next = Some(first);
                return;
            }
        }
        self.next = None;
    }

    pub(crate) fn peek(&self) -> Option<NodeId> {
        self.next
    }

    /// Yield the pending node and look one step ahead. The yielded node
    /// may be removed before the next call as long as the bucket keeps
    /// its linear order.
    pub(crate) fn advance<K, V>(&mut self, table: &[Bin], arena: &Arena<K, V>) -> Option<NodeId> {
        let id = self.next?;
        self.next = arena.get(id).and_then(|n| n.next);
        if self.next.is_none() {
            self.seek(table);
        }
        Some(id)
    }
}

/// Fail-fast cursor that borrows the map only for the duration of each
/// call.
///
/// Any structural change made to the map other than through
/// [`Cursor::remove`] makes the next step fail with
/// [`MapError::ConcurrentModification`]. Value overwrites are not
/// structural and go unnoticed.
#[derive(Clone, Debug)]
pub struct Cursor {
    raw: RawCursor,
    current: Option<NodeId>,
    stamp: VersionStamp,
}

impl Cursor {
    pub(crate) fn new<K, V, S, O>(map: &TreeHashMap<K, V, S, O>) -> Self {
        Self {
            raw: RawCursor::new(&map.table),
            current: None,
            stamp: map.version.stamp(),
        }
    }

    /// Whether another entry was pending when last checked. Does not
    /// validate the version.
    pub fn has_next(&self) -> bool {
        self.raw.peek().is_some()
    }

    /// The version this cursor expects the map to be at.
    pub fn stamp(&self) -> VersionStamp {
        self.stamp
    }

    pub fn next<'m, K, V, S, O>(
        &mut self,
        map: &'m TreeHashMap<K, V, S, O>,
    ) -> Result<Option<(&'m K, &'m V)>, MapError> {
        self.stamp.check(&map.version)?;
        let Some(id) = self.raw.advance(&map.table, &map.slots) else {
            self.current = None;
            return Ok(None);
        };
        // A stamp can only match a foreign map by accident.
        let n = map.slots.get(id).ok_or(MapError::ConcurrentModification {
            expected: self.stamp.expected(),
            found: map.version(),
        })?;
        self.current = Some(id);
        Ok(Some((&n.key, &n.value)))
    }

    pub fn next_key<'m, K, V, S, O>(
        &mut self,
        map: &'m TreeHashMap<K, V, S, O>,
    ) -> Result<Option<&'m K>, MapError> {
        Ok(self.next(map)?.map(|(k, _)| k))
    }

    pub fn next_value<'m, K, V, S, O>(
        &mut self,
        map: &'m TreeHashMap<K, V, S, O>,
    ) -> Result<Option<&'m V>, MapError> {
        Ok(self.next(map)?.map(|(_, v)| v))
    }

    /// Remove the entry last returned by `next`. The cursor stays valid
    /// and continues with the entry that followed it.
    pub fn remove<K, V, S, O>(&mut self, map: &mut TreeHashMap<K, V, S, O>) -> Result<(K, V), MapError> {
        let id = self.current.ok_or(MapError::NoCurrentEntry)?;
        self.stamp.check(&map.version)?;
        self.current = None;
        let removed = map.remove_node(id, false).ok_or(MapError::NoCurrentEntry)?;
        self.stamp = map.version.stamp();
        Ok(removed)
    }
}

/// Entries in bucket order.
pub struct Iter<'a, K, V> {
    raw: RawCursor,
    table: &'a [Bin],
    slots: &'a Arena<K, V>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(table: &'a [Bin], slots: &'a Arena<K, V>) -> Self {
        Self {
            raw: RawCursor::new(table),
            table,
            slots,
            remaining: slots.len(),
        }
    }
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self { ..*self }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let id = self.raw.advance(self.table, self.slots)?;
        self.remaining -= 1;
        let n = &self.slots[id];
        Some((&n.key, &n.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Keys<'a, K, V> {
    pub(crate) fn new(inner: Iter<'a, K, V>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Values<'a, K, V> {
    pub(crate) fn new(inner: Iter<'a, K, V>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

/// Mutable entries in arena order.
pub struct IterMut<'a, K, V> {
    it: slotmap::basic::IterMut<'a, NodeId, Node<K, V>>,
}

impl<'a, K, V> IterMut<'a, K, V> {
    pub(crate) fn new(slots: &'a mut Arena<K, V>) -> Self {
        Self { it: slots.iter_mut() }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, n)| (&n.key, &mut n.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

pub struct ValuesMut<'a, K, V> {
    it: slotmap::basic::IterMut<'a, NodeId, Node<K, V>>,
}

impl<'a, K, V> ValuesMut<'a, K, V> {
    pub(crate) fn new(slots: &'a mut Arena<K, V>) -> Self {
        Self { it: slots.iter_mut() }
    }
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, n)| &mut n.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

/// Owning iterator; drains the arena directly.
pub struct IntoIter<K, V> {
    it: slotmap::basic::IntoIter<NodeId, Node<K, V>>,
}

impl<K, V> IntoIter<K, V> {
    pub(crate) fn new(slots: Arena<K, V>) -> Self {
        Self { it: slots.into_iter() }
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, n)| (n.key, n.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}
