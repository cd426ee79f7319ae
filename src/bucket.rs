//! Bucket slots and the singly linked chains stored in them.

use crate::hashing::keys_match;
use crate::node::{Arena, NodeId};
use crate::tree::TreeBin;
use core::borrow::Borrow;

/// One slot of the bucket array.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum Bin {
    #[default]
    Empty,
    /// Head of a singly linked chain.
    Chain(NodeId),
    Tree(TreeBin),
}

/// Representation of a non-empty bucket, for diagnostics and tests.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinKind {
    Chain,
    Tree,
}

impl Bin {
    /// First node in the bucket's linear order.
    #[inline]
    pub fn first(&self) -> Option<NodeId> {
        match *self {
            Bin::Empty => None,
            Bin::Chain(head) => Some(head),
            Bin::Tree(t) => Some(t.first),
        }
    }

    pub fn kind(&self) -> Option<BinKind> {
        match self {
            Bin::Empty => None,
            Bin::Chain(_) => Some(BinKind::Chain),
            Bin::Tree(_) => Some(BinKind::Tree),
        }
    }

    pub fn from_head(head: Option<NodeId>) -> Self {
        head.map_or(Bin::Empty, Bin::Chain)
    }
}

/// Outcome of walking a chain for an insertion.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum ChainProbe {
    Found(NodeId),
    /// No match; `len` nodes precede the append position.
    Tail { tail: NodeId, len: usize },
}

pub(crate) fn find<K, V, Q>(arena: &Arena<K, V>, head: NodeId, hash: u32, key: &Q) -> Option<NodeId>
where
    K: Borrow<Q>,
    Q: ?Sized + Eq,
{
    let mut cur = Some(head);
    while let Some(id) = cur {
        let n = &arena[id];
        if n.hash == hash && keys_match(&n.key, key) {
            return Some(id);
        }
        cur = n.next;
    }
    None
}

pub(crate) fn probe<K, V, Q>(arena: &Arena<K, V>, head: NodeId, hash: u32, key: &Q) -> ChainProbe
where
    K: Borrow<Q>,
    Q: ?Sized + Eq,
{
    let mut id = head;
    let mut len = 1;
    loop {
        let n = &arena[id];
        if n.hash == hash && keys_match(&n.key, key) {
            return ChainProbe::Found(id);
        }
        match n.next {
            Some(next) => {
                id = next;
                len += 1;
            }
            None => return ChainProbe::Tail { tail: id, len },
        }
    }
}

#[inline]
pub(crate) fn append<K, V>(arena: &mut Arena<K, V>, tail: NodeId, id: NodeId) {
    debug_assert!(arena[tail].next.is_none());
    arena[tail].next = Some(id);
}

/// Unlink `target` and return the chain's new head.
pub(crate) fn unlink<K, V>(arena: &mut Arena<K, V>, head: NodeId, target: NodeId) -> Option<NodeId> {
    let after = arena[target].next.take();
    if head == target {
        return after;
    }
    let mut prev = head;
    while let Some(next) = arena[prev].next {
        if next == target {
            arena[prev].next = after;
            break;
        }
        prev = next;
    }
    Some(head)
}

pub(crate) fn len<K, V>(arena: &Arena<K, V>, head: NodeId) -> usize {
    let mut n = 0;
    let mut cur = Some(head);
    while let Some(id) = cur {
        n += 1;
        cur = arena[id].next;
    }
    n
}

/// Partition a chain by `hash & bit` into (low, high) chains, keeping
/// relative order in both.
pub(crate) fn split<K, V>(
    arena: &mut Arena<K, V>,
    head: NodeId,
    bit: usize,
) -> (Option<NodeId>, Option<NodeId>) {
    let (mut lo_head, mut lo_tail) = (None, None);
    let (mut hi_head, mut hi_tail) = (None::<NodeId>, None::<NodeId>);
    let mut cur = Some(head);
    while let Some(id) = cur {
        cur = arena[id].next.take();
        let (h, t) = if arena[id].hash as usize & bit == 0 {
            (&mut lo_head, &mut lo_tail)
        } else {
            (&mut hi_head, &mut hi_tail)
        };
        match *t {
            None => *h = Some(id),
            Some(tail) => arena[tail].next = Some(id),
        }
        *t = Some(id);
    }
    (lo_head, hi_head)
}
