//! Hash mixing and key comparison used by every bucket lookup.

use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};

/// Fold high-order bits into the low ones, which are the only bits a
/// power-of-two bucket mask looks at.
#[inline]
pub(crate) fn spread(raw: u32) -> u32 {
    raw ^ (raw >> 16)
}

/// Collapse a 64-bit hasher output into the 32-bit raw hash.
#[inline]
pub(crate) fn fold(h: u64) -> u32 {
    (h ^ (h >> 32)) as u32
}

#[inline]
pub(crate) fn hash_of<S, Q>(hasher: &S, key: &Q) -> u32
where
    S: BuildHasher,
    Q: ?Sized + Hash,
{
    spread(fold(hasher.hash_one(key)))
}

/// Identity first, then `Eq`. A key that is not equal to itself still
/// matches when the caller passes a reference to the stored key.
#[inline]
pub(crate) fn keys_match<K, Q>(stored: &K, query: &Q) -> bool
where
    K: Borrow<Q>,
    Q: ?Sized + Eq,
{
    let stored = stored.borrow();
    core::ptr::eq(stored, query) || stored == query
}
