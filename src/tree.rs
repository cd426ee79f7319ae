//! Red-black tree bins.
//!
//! A bucket whose chain grows long is rebuilt as a red-black tree over
//! the same arena nodes. Nodes are ordered by hash, then by the map's
//! `KeyOrder` when it decides, then by insertion sequence number. The
//! tree also keeps its nodes on a linear `prev`/`next` list, with the
//! root first whenever the bin is allowed to reorder, so converting back
//! to a chain is just clearing the tree links.
//!
//! Rotations and fix-ups are the classic CLR algorithms expressed as
//! `NodeId` reassignment inside the arena.

use crate::bucket::Bin;
use crate::config::UNTREEIFY_THRESHOLD;
use crate::hashing::keys_match;
use crate::node::{Arena, NodeId, TreeLinks};
use crate::order::KeyOrder;
use core::borrow::Borrow;
use core::cmp::Ordering;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct TreeBin {
    pub root: NodeId,
    /// Head of the linear list; equals `root` except after a
    /// non-movable removal.
    pub first: NodeId,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

/// Empty child position found by `TreeBin::probe`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct TreeSlot {
    parent: NodeId,
    side: Side,
}

/// Smaller sequence numbers go left; never `Equal` for distinct nodes.
#[inline]
fn tie_break(a: u64, b: u64) -> Side {
    if a <= b {
        Side::Left
    } else {
        Side::Right
    }
}

#[inline]
fn is_red<K, V>(arena: &Arena<K, V>, id: Option<NodeId>) -> bool {
    id.map_or(false, |x| arena[x].tree.red)
}

#[inline]
fn child<K, V>(arena: &Arena<K, V>, id: NodeId, side: Side) -> Option<NodeId> {
    match side {
        Side::Left => arena[id].tree.left,
        Side::Right => arena[id].tree.right,
    }
}

#[inline]
fn set_child<K, V>(arena: &mut Arena<K, V>, id: NodeId, side: Side, c: Option<NodeId>) {
    match side {
        Side::Left => arena[id].tree.left = c,
        Side::Right => arena[id].tree.right = c,
    }
}

/// Point `parent`'s link that referenced `old` at `new`.
#[inline]
fn replace_child<K, V>(arena: &mut Arena<K, V>, parent: NodeId, old: NodeId, new: Option<NodeId>) {
    if arena[parent].tree.left == Some(old) {
        arena[parent].tree.left = new;
    } else {
        arena[parent].tree.right = new;
    }
}

/// Side of `p` on which stored node `x` belongs.
fn side_of<K, V, O>(arena: &Arena<K, V>, x: NodeId, p: NodeId, order: &O) -> Side
where
    O: KeyOrder<K>,
{
    let (xn, pn) = (&arena[x], &arena[p]);
    match pn.hash.cmp(&xn.hash) {
        Ordering::Greater => Side::Left,
        Ordering::Less => Side::Right,
        Ordering::Equal => match order.compare(&xn.key, &pn.key) {
            Some(Ordering::Less) => Side::Left,
            Some(Ordering::Greater) => Side::Right,
            _ => tie_break(xn.seq, pn.seq),
        },
    }
}

/// Search the subtree rooted at `start`.
///
/// Equal hashes that the order cannot separate may sit on either side,
/// so those force a recursive search of the right subtree before
/// continuing left.
pub(crate) fn find_from<K, V, Q, O>(
    arena: &Arena<K, V>,
    start: NodeId,
    hash: u32,
    key: &Q,
    order: &O,
) -> Option<NodeId>
where
    K: Borrow<Q>,
    Q: ?Sized + Eq,
    O: KeyOrder<Q>,
{
    let mut p = Some(start);
    while let Some(id) = p {
        let n = &arena[id];
        let (pl, pr) = (n.tree.left, n.tree.right);
        if n.hash > hash {
            p = pl;
        } else if n.hash < hash {
            p = pr;
        } else if keys_match(&n.key, key) {
            return Some(id);
        } else {
            match (pl, pr) {
                (None, _) => p = pr,
                (_, None) => p = pl,
                (Some(l), Some(r)) => match order.compare(key, n.key.borrow()) {
                    Some(Ordering::Less) => p = Some(l),
                    Some(Ordering::Greater) => p = Some(r),
                    _ => {
                        if let Some(q) = find_from(arena, r, hash, key, order) {
                            return Some(q);
                        }
                        p = Some(l);
                    }
                },
            }
        }
    }
    None
}

fn rotate_left<K, V>(arena: &mut Arena<K, V>, mut root: NodeId, p: NodeId) -> NodeId {
    if let Some(r) = arena[p].tree.right {
        let rl = arena[r].tree.left;
        arena[p].tree.right = rl;
        if let Some(rl) = rl {
            arena[rl].tree.parent = Some(p);
        }
        let pp = arena[p].tree.parent;
        arena[r].tree.parent = pp;
        match pp {
            None => {
                root = r;
                arena[r].tree.red = false;
            }
            Some(pp) => replace_child(arena, pp, p, Some(r)),
        }
        arena[r].tree.left = Some(p);
        arena[p].tree.parent = Some(r);
    }
    root
}

fn rotate_right<K, V>(arena: &mut Arena<K, V>, mut root: NodeId, p: NodeId) -> NodeId {
    if let Some(l) = arena[p].tree.left {
        let lr = arena[l].tree.right;
        arena[p].tree.left = lr;
        if let Some(lr) = lr {
            arena[lr].tree.parent = Some(p);
        }
        let pp = arena[p].tree.parent;
        arena[l].tree.parent = pp;
        match pp {
            None => {
                root = l;
                arena[l].tree.red = false;
            }
            Some(pp) => replace_child(arena, pp, p, Some(l)),
        }
        arena[l].tree.right = Some(p);
        arena[p].tree.parent = Some(l);
    }
    root
}

/// Insertion fix-up for the freshly linked leaf `x`; returns the root.
fn balance_insertion<K, V>(arena: &mut Arena<K, V>, mut root: NodeId, mut x: NodeId) -> NodeId {
    arena[x].tree.red = true;
    loop {
        let parent = match arena[x].tree.parent {
            None => {
                arena[x].tree.red = false;
                return x;
            }
            Some(p) => p,
        };
        if !arena[parent].tree.red {
            return root;
        }
        let grand = match arena[parent].tree.parent {
            None => return root,
            Some(g) => g,
        };
        let parent_side = if arena[grand].tree.left == Some(parent) {
            Side::Left
        } else {
            Side::Right
        };
        let uncle_side = match parent_side {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        };
        match child(arena, grand, uncle_side) {
            Some(uncle) if arena[uncle].tree.red => {
                arena[uncle].tree.red = false;
                arena[parent].tree.red = false;
                arena[grand].tree.red = true;
                x = grand;
            }
            _ => {
                let (mut xp, mut xpp) = (Some(parent), Some(grand));
                // Inner grandchild: rotate it outward first.
                if child(arena, parent, uncle_side) == Some(x) {
                    x = parent;
                    root = match parent_side {
                        Side::Left => rotate_left(arena, root, x),
                        Side::Right => rotate_right(arena, root, x),
                    };
                    xp = arena[x].tree.parent;
                    xpp = xp.and_then(|p| arena[p].tree.parent);
                }
                if let Some(p) = xp {
                    arena[p].tree.red = false;
                    if let Some(g) = xpp {
                        arena[g].tree.red = true;
                        root = match parent_side {
                            Side::Left => rotate_right(arena, root, g),
                            Side::Right => rotate_left(arena, root, g),
                        };
                    }
                }
            }
        }
    }
}

/// Deletion fix-up starting at the node that took the removed node's
/// place (or the removed node itself while it is still linked).
fn balance_deletion<K, V>(arena: &mut Arena<K, V>, mut root: NodeId, mut x: NodeId) -> NodeId {
    loop {
        if x == root {
            return root;
        }
        let parent = match arena[x].tree.parent {
            None => {
                arena[x].tree.red = false;
                return x;
            }
            Some(p) => p,
        };
        if arena[x].tree.red {
            arena[x].tree.red = false;
            return root;
        }
        let mut xp = Some(parent);
        if arena[parent].tree.left == Some(x) {
            let mut sib = arena[parent].tree.right;
            if let Some(s) = sib.filter(|&s| arena[s].tree.red) {
                arena[s].tree.red = false;
                arena[parent].tree.red = true;
                root = rotate_left(arena, root, parent);
                xp = arena[x].tree.parent;
                sib = xp.and_then(|p| arena[p].tree.right);
            }
            match sib {
                None => match xp {
                    Some(p) => x = p,
                    None => return root,
                },
                Some(s) => {
                    let (sl, sr) = (arena[s].tree.left, arena[s].tree.right);
                    if !is_red(arena, sr) && !is_red(arena, sl) {
                        arena[s].tree.red = true;
                        match xp {
                            Some(p) => x = p,
                            None => return root,
                        }
                    } else {
                        let mut sib = Some(s);
                        if !is_red(arena, sr) {
                            if let Some(sl) = sl {
                                arena[sl].tree.red = false;
                            }
                            arena[s].tree.red = true;
                            root = rotate_right(arena, root, s);
                            xp = arena[x].tree.parent;
                            sib = xp.and_then(|p| arena[p].tree.right);
                        }
                        if let Some(s) = sib {
                            let parent_red = is_red(arena, xp);
                            arena[s].tree.red = parent_red;
                            if let Some(sr) = arena[s].tree.right {
                                arena[sr].tree.red = false;
                            }
                        }
                        if let Some(p) = xp {
                            arena[p].tree.red = false;
                            root = rotate_left(arena, root, p);
                        }
                        x = root;
                    }
                }
            }
        } else {
            let mut sib = arena[parent].tree.left;
            if let Some(s) = sib.filter(|&s| arena[s].tree.red) {
                arena[s].tree.red = false;
                arena[parent].tree.red = true;
                root = rotate_right(arena, root, parent);
                xp = arena[x].tree.parent;
                sib = xp.and_then(|p| arena[p].tree.left);
            }
            match sib {
                None => match xp {
                    Some(p) => x = p,
                    None => return root,
                },
                Some(s) => {
                    let (sl, sr) = (arena[s].tree.left, arena[s].tree.right);
                    if !is_red(arena, sl) && !is_red(arena, sr) {
                        arena[s].tree.red = true;
                        match xp {
                            Some(p) => x = p,
                            None => return root,
                        }
                    } else {
                        let mut sib = Some(s);
                        if !is_red(arena, sl) {
                            if let Some(sr) = sr {
                                arena[sr].tree.red = false;
                            }
                            arena[s].tree.red = true;
                            root = rotate_left(arena, root, s);
                            xp = arena[x].tree.parent;
                            sib = xp.and_then(|p| arena[p].tree.left);
                        }
                        if let Some(s) = sib {
                            let parent_red = is_red(arena, xp);
                            arena[s].tree.red = parent_red;
                            if let Some(sl) = arena[s].tree.left {
                                arena[sl].tree.red = false;
                            }
                        }
                        if let Some(p) = xp {
                            arena[p].tree.red = false;
                            root = rotate_right(arena, root, p);
                        }
                        x = root;
                    }
                }
            }
        }
    }
}

/// Clear tree links along a linear list, turning it into a plain chain.
pub(crate) fn untreeify_list<K, V>(arena: &mut Arena<K, V>, head: NodeId) -> NodeId {
    let mut cur = Some(head);
    while let Some(id) = cur {
        arena[id].tree = TreeLinks::default();
        cur = arena[id].next;
    }
    head
}

impl TreeBin {
    /// Build a tree over the chain starting at `head`, keeping the
    /// chain's order on the linear list except for the root moving first.
    pub(crate) fn treeify<K, V, O>(arena: &mut Arena<K, V>, head: NodeId, order: &O) -> TreeBin
    where
        O: KeyOrder<K>,
    {
        let mut root = head;
        let mut prev = None;
        let mut cur = Some(head);
        while let Some(x) = cur {
            cur = arena[x].next;
            arena[x].tree = TreeLinks {
                prev,
                ..TreeLinks::default()
            };
            prev = Some(x);
            if x == head {
                continue;
            }
            let mut p = root;
            loop {
                let side = side_of(arena, x, p, order);
                match child(arena, p, side) {
                    Some(c) => p = c,
                    None => {
                        arena[x].tree.parent = Some(p);
                        set_child(arena, p, side, Some(x));
                        root = balance_insertion(arena, root, x);
                        break;
                    }
                }
            }
        }
        let mut bin = TreeBin { root, first: head };
        bin.move_root_to_front(arena);
        debug_assert_eq!(bin.check_invariants(arena), Ok(()));
        bin
    }

    pub(crate) fn len<K, V>(&self, arena: &Arena<K, V>) -> usize {
        crate::bucket::len(arena, self.first)
    }

    pub(crate) fn find<K, V, Q, O>(&self, arena: &Arena<K, V>, hash: u32, key: &Q, order: &O) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
        O: KeyOrder<Q>,
    {
        find_from(arena, self.root, hash, key, order)
    }

    /// Locate `key` or the empty child slot a new node would occupy.
    ///
    /// `seq` is the sequence number the new node will carry; it decides
    /// ties the order leaves open. Both subtrees of the first undecided
    /// node are searched once so a match is never missed.
    pub(crate) fn probe<K, V, Q, O>(
        &self,
        arena: &Arena<K, V>,
        hash: u32,
        key: &Q,
        seq: u64,
        order: &O,
    ) -> Result<NodeId, TreeSlot>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
        O: KeyOrder<Q>,
    {
        let mut searched = false;
        let mut p = self.root;
        loop {
            let n = &arena[p];
            let side = if n.hash > hash {
                Side::Left
            } else if n.hash < hash {
                Side::Right
            } else if keys_match(&n.key, key) {
                return Ok(p);
            } else {
                match order.compare(key, n.key.borrow()) {
                    Some(Ordering::Less) => Side::Left,
                    Some(Ordering::Greater) => Side::Right,
                    _ => {
                        if !searched {
                            searched = true;
                            for c in [n.tree.left, n.tree.right].into_iter().flatten() {
                                if let Some(q) = find_from(arena, c, hash, key, order) {
                                    return Ok(q);
                                }
                            }
                        }
                        tie_break(seq, n.seq)
                    }
                }
            };
            match child(arena, p, side) {
                Some(c) => p = c,
                None => return Err(TreeSlot { parent: p, side }),
            }
        }
    }

    /// Link the unattached node `x` at `slot`, rebalance and move the
    /// root to the front.
    pub(crate) fn insert_at<K, V>(&mut self, arena: &mut Arena<K, V>, slot: TreeSlot, x: NodeId) {
        let xp = slot.parent;
        let xpn = arena[xp].next;
        set_child(arena, xp, slot.side, Some(x));
        arena[x].next = xpn;
        arena[x].tree = TreeLinks {
            parent: Some(xp),
            prev: Some(xp),
            ..TreeLinks::default()
        };
        arena[xp].next = Some(x);
        if let Some(n) = xpn {
            arena[n].tree.prev = Some(x);
        }
        self.root = balance_insertion(arena, self.root, x);
        self.move_root_to_front(arena);
        debug_assert_eq!(self.check_invariants(arena), Ok(()));
    }

    /// Unlink `p` from this bin and return what the bucket holds now.
    ///
    /// The node stays in the arena; the caller reclaims it. A bin left
    /// with `UNTREEIFY_THRESHOLD` nodes or fewer becomes a chain in its
    /// current linear order. With `movable == false` the linear order of
    /// the surviving nodes is left untouched, which cursors rely on.
    pub(crate) fn remove<K, V>(self, arena: &mut Arena<K, V>, p: NodeId, movable: bool) -> Bin {
        let succ = arena[p].next;
        let pred = arena[p].tree.prev;
        let mut first = Some(self.first);
        match pred {
            None => first = succ,
            Some(pr) => arena[pr].next = succ,
        }
        if let Some(s) = succ {
            arena[s].tree.prev = pred;
        }
        let first = match first {
            None => return Bin::Empty,
            Some(f) => f,
        };

        let mut survivors = 0;
        let mut cur = Some(first);
        while let Some(id) = cur {
            survivors += 1;
            if survivors > UNTREEIFY_THRESHOLD {
                break;
            }
            cur = arena[id].next;
        }
        if survivors <= UNTREEIFY_THRESHOLD {
            tracing::trace!(len = survivors, "tree bin shrank by removal; reverting to chain");
            return Bin::Chain(untreeify_list(arena, first));
        }

        let mut root = self.root;

        let (pl, pr) = (arena[p].tree.left, arena[p].tree.right);
        let replacement = match (pl, pr) {
            (Some(pl), Some(pr)) => {
                let mut s = pr;
                while let Some(sl) = arena[s].tree.left {
                    s = sl;
                }
                let c = arena[s].tree.red;
                arena[s].tree.red = arena[p].tree.red;
                arena[p].tree.red = c;
                let sr = arena[s].tree.right;
                let pp = arena[p].tree.parent;
                if s == pr {
                    arena[p].tree.parent = Some(s);
                    arena[s].tree.right = Some(p);
                } else {
                    let sp = arena[s].tree.parent;
                    arena[p].tree.parent = sp;
                    if let Some(sp) = sp {
                        replace_child(arena, sp, s, Some(p));
                    }
                    arena[s].tree.right = Some(pr);
                    arena[pr].tree.parent = Some(s);
                }
                arena[p].tree.left = None;
                arena[p].tree.right = sr;
                if let Some(sr) = sr {
                    arena[sr].tree.parent = Some(p);
                }
                arena[s].tree.left = Some(pl);
                arena[pl].tree.parent = Some(s);
                arena[s].tree.parent = pp;
                match pp {
                    None => root = s,
                    Some(pp) => replace_child(arena, pp, p, Some(s)),
                }
                sr.unwrap_or(p)
            }
            (Some(pl), None) => pl,
            (None, Some(pr)) => pr,
            (None, None) => p,
        };

        if replacement != p {
            let pp = arena[p].tree.parent;
            arena[replacement].tree.parent = pp;
            match pp {
                None => root = replacement,
                Some(pp) => replace_child(arena, pp, p, Some(replacement)),
            }
            arena[p].tree.left = None;
            arena[p].tree.right = None;
            arena[p].tree.parent = None;
        }

        let root = if arena[p].tree.red {
            root
        } else {
            balance_deletion(arena, root, replacement)
        };

        if replacement == p {
            if let Some(pp) = arena[p].tree.parent.take() {
                if arena[pp].tree.left == Some(p) {
                    arena[pp].tree.left = None;
                } else if arena[pp].tree.right == Some(p) {
                    arena[pp].tree.right = None;
                }
            }
        }
        arena[p].tree = TreeLinks::default();
        arena[p].next = None;

        let mut bin = TreeBin { root, first };
        if movable {
            bin.move_root_to_front(arena);
        }
        debug_assert_eq!(bin.check_invariants(arena), Ok(()));
        Bin::Tree(bin)
    }

    /// Partition by `hash & bit` into the (low, high) bins of a doubled
    /// table. Small halves become chains; a half holding every node keeps
    /// the existing tree.
    pub(crate) fn split<K, V, O>(self, arena: &mut Arena<K, V>, bit: usize, order: &O) -> (Bin, Bin)
    where
        O: KeyOrder<K>,
    {
        // (head, tail, count)
        let mut lo: (Option<NodeId>, Option<NodeId>, usize) = (None, None, 0);
        let mut hi: (Option<NodeId>, Option<NodeId>, usize) = (None, None, 0);
        let mut cur = Some(self.first);
        while let Some(e) = cur {
            cur = arena[e].next.take();
            let half = if arena[e].hash as usize & bit == 0 {
                &mut lo
            } else {
                &mut hi
            };
            arena[e].tree.prev = half.1;
            match half.1 {
                None => half.0 = Some(e),
                Some(t) => arena[t].next = Some(e),
            }
            half.1 = Some(e);
            half.2 += 1;
        }

        let rebuild = |arena: &mut Arena<K, V>, half: (Option<NodeId>, Option<NodeId>, usize), other_empty: bool| {
            match half.0 {
                None => Bin::Empty,
                Some(h) if half.2 <= UNTREEIFY_THRESHOLD => {
                    tracing::trace!(len = half.2, "split half reverted to chain");
                    Bin::Chain(untreeify_list(arena, h))
                }
                Some(h) if other_empty => Bin::Tree(TreeBin {
                    root: self.root,
                    first: h,
                }),
                Some(h) => Bin::Tree(TreeBin::treeify(arena, h, order)),
            }
        };
        let lo_bin = rebuild(arena, lo, hi.0.is_none());
        let hi_bin = rebuild(arena, hi, lo.0.is_none());
        (lo_bin, hi_bin)
    }

    /// Make the root the head of the linear list.
    fn move_root_to_front<K, V>(&mut self, arena: &mut Arena<K, V>) {
        let (root, first) = (self.root, self.first);
        if root == first {
            return;
        }
        let rn = arena[root].next;
        let rp = arena[root].tree.prev;
        if let Some(rn) = rn {
            arena[rn].tree.prev = rp;
        }
        if let Some(rp) = rp {
            arena[rp].next = rn;
        }
        arena[first].tree.prev = Some(root);
        arena[root].next = Some(first);
        arena[root].tree.prev = None;
        self.first = root;
    }

    /// Verify links, hash ordering and the red-black properties.
    pub(crate) fn check_invariants<K, V>(&self, arena: &Arena<K, V>) -> Result<(), String> {
        let root = &arena[self.root];
        if root.tree.parent.is_some() {
            return Err("root has a parent".into());
        }
        if root.tree.red {
            return Err("root is red".into());
        }
        if arena[self.first].tree.prev.is_some() {
            return Err("first node has a predecessor".into());
        }
        let mut tree_nodes = 0;
        check_subtree(arena, self.root, &mut tree_nodes)?;
        let listed = self.len(arena);
        if listed != tree_nodes {
            return Err(format!("linear list has {listed} nodes, tree has {tree_nodes}"));
        }
        Ok(())
    }
}

/// Returns the black height of the subtree rooted at `t`.
fn check_subtree<K, V>(arena: &Arena<K, V>, t: NodeId, count: &mut usize) -> Result<usize, String> {
    *count += 1;
    let n = &arena[t];
    let TreeLinks {
        parent,
        left,
        right,
        prev,
        red,
    } = n.tree;
    if let Some(b) = prev {
        if arena[b].next != Some(t) {
            return Err("prev.next does not point back".into());
        }
    }
    if let Some(nx) = n.next {
        if arena[nx].tree.prev != Some(t) {
            return Err("next.prev does not point back".into());
        }
    }
    if let Some(p) = parent {
        if arena[p].tree.left != Some(t) && arena[p].tree.right != Some(t) {
            return Err("parent does not link to child".into());
        }
    }
    for (c, is_left) in [(left, true), (right, false)] {
        if let Some(c) = c {
            let cn = &arena[c];
            if cn.tree.parent != Some(t) {
                return Err("child does not link to parent".into());
            }
            if (is_left && cn.hash > n.hash) || (!is_left && cn.hash < n.hash) {
                return Err("hash order violated".into());
            }
            if red && cn.tree.red {
                return Err("red node has a red child".into());
            }
        }
    }
    let lh = match left {
        Some(l) => check_subtree(arena, l, count)?,
        None => 1,
    };
    let rh = match right {
        Some(r) => check_subtree(arena, r, count)?,
        None => 1,
    };
    if lh != rh {
        return Err(format!("black height mismatch: {lh} vs {rh}"));
    }
    Ok(lh + usize::from(!red))
}
