//! In-place access to a single slot of a `TreeHashMap`.

use crate::map::{TreeHashMap, VacantSlot};
use crate::node::NodeId;
use crate::order::KeyOrder;
use core::fmt;

/// A view into a single slot, obtained from [`TreeHashMap::entry`].
pub enum Entry<'a, K, V, S, O> {
    Occupied(OccupiedEntry<'a, K, V, S, O>),
    Vacant(VacantEntry<'a, K, V, S, O>),
}

pub struct OccupiedEntry<'a, K, V, S, O> {
    map: &'a mut TreeHashMap<K, V, S, O>,
    id: NodeId,
}

pub struct VacantEntry<'a, K, V, S, O> {
    map: &'a mut TreeHashMap<K, V, S, O>,
    hash: u32,
    key: K,
    slot: VacantSlot,
}

impl<'a, K, V, S, O> Entry<'a, K, V, S, O>
where
    O: KeyOrder<K>,
{
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => e.insert(default),
        }
    }

    pub fn or_insert_with<F: FnOnce() -> V>(self, default: F) -> &'a mut V {
        match self {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => e.insert(default()),
        }
    }

    pub fn or_insert_with_key<F: FnOnce(&K) -> V>(self, default: F) -> &'a mut V {
        match self {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                let value = default(&e.key);
                e.insert(value)
            }
        }
    }

    pub fn or_default(self) -> &'a mut V
    where
        V: Default,
    {
        self.or_insert_with(V::default)
    }

    pub fn and_modify<F: FnOnce(&mut V)>(mut self, f: F) -> Self {
        if let Entry::Occupied(e) = &mut self {
            f(e.get_mut());
        }
        self
    }

    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(e) => e.key(),
            Entry::Vacant(e) => e.key(),
        }
    }
}

impl<'a, K, V, S, O> OccupiedEntry<'a, K, V, S, O> {
    pub(crate) fn new(map: &'a mut TreeHashMap<K, V, S, O>, id: NodeId) -> Self {
        Self { map, id }
    }

    /// The key stored in the map, not the one used for the lookup.
    pub fn key(&self) -> &K {
        &self.map.slots[self.id].key
    }

    pub fn get(&self) -> &V {
        &self.map.slots[self.id].value
    }

    pub fn get_mut(&mut self) -> &mut V {
        &mut self.map.slots[self.id].value
    }

    pub fn into_mut(self) -> &'a mut V {
        &mut self.map.slots[self.id].value
    }

    /// Overwrite the value; not a structural change.
    pub fn insert(&mut self, value: V) -> V {
        core::mem::replace(self.get_mut(), value)
    }

    pub fn remove(self) -> V {
        self.remove_entry().1
    }

    pub fn remove_entry(self) -> (K, V) {
        match self.map.remove_node(self.id, true) {
            Some(kv) => kv,
            None => unreachable!("occupied entry points at a live node"),
        }
    }
}

impl<'a, K, V, S, O> VacantEntry<'a, K, V, S, O> {
    pub(crate) fn new(
        map: &'a mut TreeHashMap<K, V, S, O>,
        hash: u32,
        key: K,
        slot: VacantSlot,
    ) -> Self {
        Self {
            map,
            hash,
            key,
            slot,
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn into_key(self) -> K {
        self.key
    }
}

impl<'a, K, V, S, O> VacantEntry<'a, K, V, S, O>
where
    O: KeyOrder<K>,
{
    /// Link the key with `value`; may grow the table or treeify the bin.
    pub fn insert(self, value: V) -> &'a mut V {
        let id = self.map.insert_vacant(self.slot, self.hash, self.key, value);
        &mut self.map.slots[id].value
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S, O> fmt::Debug for Entry<'_, K, V, S, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Occupied(e) => f.debug_tuple("Entry").field(e).finish(),
            Entry::Vacant(e) => f.debug_tuple("Entry").field(e).finish(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S, O> fmt::Debug for OccupiedEntry<'_, K, V, S, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OccupiedEntry")
            .field("key", self.key())
            .field("value", self.get())
            .finish()
    }
}

impl<K: fmt::Debug, V, S, O> fmt::Debug for VacantEntry<'_, K, V, S, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VacantEntry").field(self.key()).finish()
    }
}
