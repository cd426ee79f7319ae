//! Optional total order over keys, consulted only when two keys in a
//! tree bin share a hash.

use core::cmp::Ordering;

/// Ordering capability for keys (or their borrowed forms).
///
/// Returning `None`, or `Some(Equal)` for keys that are not `==`, makes
/// the tree fall back to its insertion-order tie-break and to searching
/// both subtrees on lookup.
pub trait KeyOrder<Q: ?Sized> {
    fn compare(&self, a: &Q, b: &Q) -> Option<Ordering>;
}

/// Never orders keys; colliding keys are placed by tie-break only.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Unordered;

impl<Q: ?Sized> KeyOrder<Q> for Unordered {
    #[inline]
    fn compare(&self, _a: &Q, _b: &Q) -> Option<Ordering> {
        None
    }
}

/// Orders keys by their `Ord` implementation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct NaturalOrder;

impl<Q: ?Sized + Ord> KeyOrder<Q> for NaturalOrder {
    #[inline]
    fn compare(&self, a: &Q, b: &Q) -> Option<Ordering> {
        Some(a.cmp(b))
    }
}
