//! Entries and the arena that owns them.
//!
//! Every entry lives in one `SlotMap` owned by the map. Buckets, chain
//! links and tree links are all `NodeId`s into that arena, so resizing,
//! treeifying and rotating only rewrite ids; entries never move.

use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Generational id of an entry inside a map's arena.
    pub(crate) struct NodeId;
}

pub(crate) type Arena<K, V> = SlotMap<NodeId, Node<K, V>>;

/// Links used only while a node belongs to a tree bin.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct TreeLinks {
    pub parent: Option<NodeId>,
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
    pub prev: Option<NodeId>,
    pub red: bool,
}

#[derive(Clone, Debug)]
pub(crate) struct Node<K, V> {
    /// Spread hash, computed once at insertion.
    pub hash: u32,
    pub key: K,
    pub value: V,
    /// Next entry in the bucket's linear order (chain or tree bin).
    pub next: Option<NodeId>,
    /// Insertion sequence number; tree tie-break for colliding keys.
    pub seq: u64,
    pub tree: TreeLinks,
}

impl<K, V> Node<K, V> {
    pub fn new(hash: u32, key: K, value: V, seq: u64) -> Self {
        Self {
            hash,
            key,
            value,
            next: None,
            seq,
            tree: TreeLinks::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_node_is_unlinked() {
        let mut arena: Arena<&str, i32> = SlotMap::with_key();
        let id = arena.insert(Node::new(7, "k", 1, 0));
        let n = &arena[id];
        assert_eq!(n.hash, 7);
        assert!(n.next.is_none());
        assert_eq!(n.tree, TreeLinks::default());
        assert!(!n.tree.red);
    }

    /// Ids are generational: a removed id never resolves to a later entry.
    #[test]
    fn stale_ids_do_not_alias() {
        let mut arena: Arena<&str, i32> = SlotMap::with_key();
        let a = arena.insert(Node::new(1, "a", 1, 0));
        arena.remove(a);
        let b = arena.insert(Node::new(2, "b", 2, 1));
        assert_ne!(a, b);
        assert!(arena.get(a).is_none());
    }
}
