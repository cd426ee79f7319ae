#![cfg(test)]

// Property tests for TreeHashMap kept inside the crate so they can check
// bucket placement and tree shape after every step.

use crate::map::TreeHashMap;
use crate::order::{KeyOrder, NaturalOrder, Unordered};
use crate::DefaultHashBuilder;
use hashbrown::HashMap;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{BuildHasher, Hash, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations to improve shrinking.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    PutIfAbsent(usize, i32),
    Remove(usize),
    RemoveIfEq(usize, i32),
    Get(usize),
    Contains(String),
    Merge(usize, i32),
    ComputeIfPresent(usize),
    RetainEven,
    CursorRemoveEvery(usize),
    Reserve(usize),
    Iterate,
    Clear,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=48).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            8 => (idx.clone(), -4i32..4).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => (idx.clone(), -4i32..4).prop_map(|(i, v)| OpI::PutIfAbsent(i, v)),
            4 => idx.clone().prop_map(OpI::Remove),
            1 => (idx.clone(), -4i32..4).prop_map(|(i, v)| OpI::RemoveIfEq(i, v)),
            3 => idx.clone().prop_map(OpI::Get),
            1 => "[a-z]{0,4}".prop_map(OpI::Contains),
            2 => (idx.clone(), -4i32..4).prop_map(|(i, v)| OpI::Merge(i, v)),
            1 => idx.clone().prop_map(OpI::ComputeIfPresent),
            1 => Just(OpI::RetainEven),
            1 => (2usize..5).prop_map(OpI::CursorRemoveEvery),
            1 => (0usize..200).prop_map(OpI::Reserve),
            1 => Just(OpI::Iterate),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Collision variant using a constant hasher so every key lands in one
// bucket and the tree code carries the whole load.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Few distinct hashes: keys share buckets and tree nodes share hashes,
// but growth still has bits to split on.
#[derive(Clone, Default)]
struct LowBitsBuildHasher;
struct LowBitsHasher(u64);
impl BuildHasher for LowBitsBuildHasher {
    type Hasher = LowBitsHasher;
    fn build_hasher(&self) -> Self::Hasher {
        LowBitsHasher(0)
    }
}
impl Hasher for LowBitsHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = self.0.wrapping_mul(31).wrapping_add(u64::from(b));
        }
    }
    fn finish(&self) -> u64 {
        (self.0 % 7) << 6
    }
}

// Property: state-machine equivalence against hashbrown::HashMap.
// Invariants exercised across random operation sequences:
// - Every query agrees with the model; removals return the model's value.
// - Cursor removal and retain drop exactly the selected entries.
// - After each op every node sits in the bucket its hash selects, every
//   tree bin is a valid red-black tree, and the arena holds no strays.
// - Value overwrites never move the structural version.
fn run_scenario<S, O>(
    mut sut: TreeHashMap<Key, i32, S, O>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError>
where
    S: BuildHasher,
    O: KeyOrder<Key> + KeyOrder<str>,
{
    let mut model: HashMap<Key, i32> = HashMap::new();
    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(pool, i);
                let before = sut.version();
                let present = model.contains_key(&k);
                prop_assert_eq!(sut.insert(k.clone(), v), model.insert(k, v));
                if present {
                    prop_assert_eq!(sut.version(), before, "overwrite is not structural");
                }
            }
            OpI::PutIfAbsent(i, v) => {
                let k = key_from(pool, i);
                let expected = model.get(&k).copied();
                prop_assert_eq!(sut.put_if_absent(k.clone(), v).copied(), expected);
                model.entry(k).or_insert(v);
            }
            OpI::Remove(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.remove(k.0.as_str()), model.remove(&k));
            }
            OpI::RemoveIfEq(i, v) => {
                let k = key_from(pool, i);
                let matches = model.get(&k) == Some(&v);
                prop_assert_eq!(sut.remove_if_eq(&k, &v), matches);
                if matches {
                    model.remove(&k);
                }
            }
            OpI::Get(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.get(&k), model.get(&k));
            }
            OpI::Contains(s) => {
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(sut.contains_key(s.as_str()), has_model);
            }
            OpI::Merge(i, v) => {
                let k = key_from(pool, i);
                let merged = sut.merge(k.clone(), v, |old, new| {
                    let sum = old + new;
                    (sum != 0).then_some(sum)
                });
                let expected = match model.get(&k).copied() {
                    None => Some(v),
                    Some(old) if old + v == 0 => None,
                    Some(old) => Some(old + v),
                };
                prop_assert_eq!(merged.copied(), expected);
                match expected {
                    Some(x) => {
                        model.insert(k, x);
                    }
                    None => {
                        model.remove(&k);
                    }
                }
            }
            OpI::ComputeIfPresent(i) => {
                let k = key_from(pool, i);
                let got = sut.compute_if_present(&k, |_, v| (*v > 0).then_some(v - 1));
                let expected = match model.get(&k).copied() {
                    None => None,
                    Some(v) if v > 0 => Some(v - 1),
                    Some(_) => None,
                };
                prop_assert_eq!(got.copied(), expected);
                match expected {
                    Some(x) => {
                        model.insert(k, x);
                    }
                    None => {
                        model.remove(&k);
                    }
                }
            }
            OpI::RetainEven => {
                sut.retain(|_, v| *v % 2 == 0);
                model.retain(|_, v| *v % 2 == 0);
            }
            OpI::CursorRemoveEvery(n) => {
                let mut c = sut.cursor();
                let mut step = 0usize;
                while let Some(k) = c.next_key(&sut).map_err(|e| TestCaseError::fail(e.to_string()))? {
                    let k = k.clone();
                    step += 1;
                    if step % n == 0 {
                        let (rk, rv) = c
                            .remove(&mut sut)
                            .map_err(|e| TestCaseError::fail(e.to_string()))?;
                        prop_assert_eq!(&rk, &k);
                        prop_assert_eq!(model.remove(&k), Some(rv));
                    }
                }
            }
            OpI::Reserve(n) => {
                sut.reserve(n);
                let room = sut.threshold() >= sut.len() + n;
                prop_assert!(room || sut.capacity() == crate::config::MAXIMUM_CAPACITY);
            }
            OpI::Iterate => {
                let s_keys: BTreeSet<_> = sut.keys().cloned().collect();
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(s_keys, m_keys);
                prop_assert_eq!(sut.iter().len(), model.len());
            }
            OpI::Clear => {
                let cap = sut.capacity();
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.capacity(), cap);
            }
        }

        // Post-conditions after each op
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        if let Err(e) = sut.check_invariants() {
            return Err(TestCaseError::fail(e));
        }
    }
    for (k, v) in &model {
        prop_assert_eq!(sut.get(k), Some(v));
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let sut: TreeHashMap<Key, i32, DefaultHashBuilder, Unordered> = TreeHashMap::with_hasher(DefaultHashBuilder::default());
        run_scenario(sut, &pool, ops)?;
    }

    #[test]
    fn prop_state_machine_all_collide((pool, ops) in arb_scenario()) {
        let sut: TreeHashMap<Key, i32, ConstBuildHasher> = TreeHashMap::with_hasher(ConstBuildHasher);
        run_scenario(sut, &pool, ops)?;
    }

    #[test]
    fn prop_state_machine_all_collide_ordered((pool, ops) in arb_scenario()) {
        let sut = TreeHashMap::with_hasher_and_order(ConstBuildHasher, NaturalOrder);
        run_scenario(sut, &pool, ops)?;
    }

    #[test]
    fn prop_state_machine_few_hashes_ordered((pool, ops) in arb_scenario()) {
        let sut = TreeHashMap::with_hasher_and_order(LowBitsBuildHasher, NaturalOrder);
        run_scenario(sut, &pool, ops)?;
    }
}

// Property: a cursor fails fast once the map changes structurally behind
// its back, and keeps working across its own removals.
proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn prop_cursor_detects_outside_changes(n in 1u32..80, at in 0u32..80, fresh in 1000u32..2000) {
        let mut m: TreeHashMap<u32, u32, ConstBuildHasher> = TreeHashMap::with_hasher(ConstBuildHasher);
        for k in 0..n {
            m.insert(k, k);
        }
        let at = at % n;
        let mut c = m.cursor();
        for _ in 0..=at {
            prop_assert!(c.next(&m).is_ok());
        }
        m.insert(fresh, 0);
        prop_assert!(c.next(&m).is_err());
        prop_assert!(c.remove(&mut m).is_err());
    }
}

#[test]
fn key_hash_is_stable_for_borrowed_lookup() {
    // Key and str must hash identically for Borrow<str> lookups.
    let b = DefaultHashBuilder::default();
    let k = Key("abc".into());
    let mut h1 = b.build_hasher();
    k.hash(&mut h1);
    let mut h2 = b.build_hasher();
    "abc".hash(&mut h2);
    assert_eq!(h1.finish(), h2.finish());
}
