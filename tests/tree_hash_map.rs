// TreeHashMap behavior suite.
//
// Each test documents what behavior is being verified. The core
// invariants exercised:
// - Uniqueness: at most one entry per key; insert overwrites and returns
//   the previous value.
// - Growth: the table doubles once the entry count exceeds
//   capacity * load_factor, and every entry stays reachable.
// - Tree bins: colliding keys convert to a tree at the configured
//   thresholds and back to a chain when removals shrink the tree.
// - Hooks observe accesses, insertions and removals after the fact.
use std::hash::{BuildHasher, Hasher};
use std::sync::{Arc, Mutex};
use treebin_hashmap::config::DEFAULT_INITIAL_CAPACITY;
use treebin_hashmap::{BinKind, EntryHooks, MapConfig, MapError, TreeHashMap, Unordered};

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
        7
    }
}

/// Integer keys hash to themselves.
#[derive(Clone, Default)]
struct IdentityBuildHasher;
struct IdentityHasher(u64);
impl BuildHasher for IdentityBuildHasher {
    type Hasher = IdentityHasher;
    fn build_hasher(&self) -> Self::Hasher {
        IdentityHasher(0)
    }
}
impl Hasher for IdentityHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = (self.0 << 8) | u64::from(b);
        }
    }
    fn write_u32(&mut self, n: u32) {
        self.0 = u64::from(n);
    }
    fn finish(&self) -> u64 {
        self.0
    }
}

// Test: basic insert/get/overwrite/remove.
// Verifies: insert returns the previous value; len counts keys once.
#[test]
fn insert_get_overwrite_remove() {
    let mut m = TreeHashMap::new();
    assert_eq!(m.insert("a".to_string(), 1), None);
    assert_eq!(m.insert("b".to_string(), 2), None);
    assert_eq!(m.insert("a".to_string(), 3), Some(1));
    assert_eq!(m.len(), 2);
    assert_eq!(m.get("a"), Some(&3));
    assert_eq!(m.get_key_value("b"), Some((&"b".to_string(), &2)));
    assert_eq!(m.remove("a"), Some(3));
    assert_eq!(m.remove("a"), None);
    assert_eq!(m.len(), 1);
    assert!(!m.contains_key("a"));
    assert!(m.contains_value(&2));
    assert!(!m.contains_value(&3));
}

// Test: lookups on a never-allocated table.
// Verifies: queries succeed without allocating.
#[test]
fn empty_map_queries() {
    let mut m: TreeHashMap<u32, u32> = TreeHashMap::new();
    assert_eq!(m.get(&1), None);
    assert_eq!(m.remove(&1), None);
    assert_eq!(m.get_or(&1, &9), &9);
    assert_eq!(m.bin_kind(&1), None);
    assert_eq!(m.iter().count(), 0);
    assert_eq!(m.capacity(), 0);
}

// Test: growth schedule with the default load factor.
// Verifies: 13 keys on a 16-bucket table trigger exactly one doubling to
// 32 buckets with threshold 24.
#[test]
fn thirteen_keys_double_default_table() {
    let mut m: TreeHashMap<u32, u32, IdentityBuildHasher> = TreeHashMap::with_hasher(IdentityBuildHasher);
    for k in 0..12 {
        m.insert(k, k);
    }
    assert_eq!(m.capacity(), DEFAULT_INITIAL_CAPACITY);
    assert_eq!(m.threshold(), 12);
    m.insert(12, 12);
    assert_eq!(m.capacity(), 32);
    assert_eq!(m.threshold(), 24);
    for k in 0..13 {
        assert_eq!(m[&k], k);
    }
}

// Test: many keys across several doublings.
// Verifies: every key remains reachable and len is exact.
#[test]
fn large_growth_keeps_every_entry() {
    let mut m = TreeHashMap::new();
    for k in 0..10_000u64 {
        m.insert(k, k * 3);
    }
    assert_eq!(m.len(), 10_000);
    assert!(m.capacity() >= 10_000);
    assert!(m.capacity().is_power_of_two());
    for k in 0..10_000u64 {
        assert_eq!(m.get(&k), Some(&(k * 3)));
    }
}

// Test: treeify thresholds on a table already large enough.
// Verifies: seven colliding keys stay a chain, the eighth converts the
// bucket to a tree, and lookups still find every key.
#[test]
fn colliding_keys_treeify_at_eight() {
    let mut m: TreeHashMap<u32, u32, ConstBuildHasher> =
        TreeHashMap::with_capacity_and_hasher(64, ConstBuildHasher);
    for k in 0..7 {
        m.insert(k, k);
    }
    assert_eq!(m.bin_kind(&0), Some(BinKind::Chain));
    m.insert(7, 7);
    assert_eq!(m.bin_kind(&0), Some(BinKind::Tree));
    assert_eq!(m.capacity(), 64);
    for k in 0..8 {
        assert_eq!(m.get(&k), Some(&k));
    }
    assert_eq!(m.get(&100), None);
}

// Test: long collision chains on a small table.
// Verifies: the table grows to the minimum tree capacity before any
// bucket is converted.
#[test]
fn small_table_grows_before_treeifying() {
    let mut m: TreeHashMap<u32, u32, ConstBuildHasher> = TreeHashMap::with_hasher(ConstBuildHasher);
    for k in 0..20 {
        m.insert(k, k);
    }
    assert_eq!(m.capacity(), 64);
    assert_eq!(m.bin_kind(&0), Some(BinKind::Tree));
    for k in 0..20 {
        assert_eq!(m.get(&k), Some(&k));
    }
}

// Test: shrinking a tree bin by removal.
// Verifies: the bucket stays a tree while seven colliding keys remain and
// becomes a chain as soon as six remain; the survivors stay reachable.
#[test]
fn removals_revert_tree_to_chain_at_six() {
    let mut m: TreeHashMap<u32, u32, ConstBuildHasher> =
        TreeHashMap::with_capacity_and_hasher(64, ConstBuildHasher);
    for k in 0..32 {
        m.insert(k, k);
    }
    assert_eq!(m.bin_kind(&0), Some(BinKind::Tree));
    for k in 7..32 {
        assert_eq!(m.remove(&k), Some(k));
    }
    assert_eq!(m.len(), 7);
    assert_eq!(m.bin_kind(&0), Some(BinKind::Tree));
    assert_eq!(m.remove(&6), Some(6));
    assert_eq!(m.len(), 6);
    assert_eq!(m.bin_kind(&0), Some(BinKind::Chain));
    for k in 0..6 {
        assert_eq!(m.get(&k), Some(&k));
    }
    assert_eq!(m.capacity(), 64);
}

// Test: cursor removal across the untreeify boundary.
// Verifies: a cursor draining a tree bin keeps visiting every remaining
// key after the bucket turns back into a chain.
#[test]
fn cursor_drains_tree_bin_through_untreeify() {
    let mut m: TreeHashMap<u32, u32, ConstBuildHasher> =
        TreeHashMap::with_capacity_and_hasher(64, ConstBuildHasher);
    for k in 0..10 {
        m.insert(k, k);
    }
    assert_eq!(m.bin_kind(&0), Some(BinKind::Tree));
    let mut seen = Vec::new();
    let mut c = m.cursor();
    while let Some(k) = c.next_key(&m).unwrap() {
        seen.push(*k);
        c.remove(&mut m).unwrap();
    }
    seen.sort_unstable();
    assert_eq!(seen, (0..10).collect::<Vec<_>>());
    assert!(m.is_empty());
    assert_eq!(m.bin_kind(&0), None);
}

// Test: growth with a load factor below 1/16.
// Verifies: the zero threshold of the default table is recomputed on
// growth, so the table grows geometrically with the entry count.
#[test]
fn tiny_load_factor_grows_with_entry_count() {
    let lf = 0.05f32;
    let mut m: TreeHashMap<u32, u32, IdentityBuildHasher> = TreeHashMap::try_with_config_hasher_and_order(
        MapConfig::default().with_load_factor(lf),
        IdentityBuildHasher,
        Unordered,
    )
    .unwrap();
    for k in 0..200 {
        m.insert(k, k);
        let ideal = m.capacity() as f32 * lf;
        assert!(m.len() <= m.threshold());
        assert!(m.threshold() as f32 <= ideal);
        assert!(m.threshold() as f32 * 2.0 > ideal);
    }
    assert_eq!(m.capacity(), 8192);
    for k in 0..200 {
        assert_eq!(m.get(&k), Some(&k));
    }
}

// Test: growth with a load factor above 1.
// Verifies: buckets hold several entries before growth, and after every
// resize the threshold is exactly capacity * load_factor.
#[test]
fn large_load_factor_threshold_tracks_capacity() {
    let lf = 4.0f32;
    let mut m: TreeHashMap<u32, u32, IdentityBuildHasher> = TreeHashMap::try_with_config_hasher_and_order(
        MapConfig::default().with_load_factor(lf),
        IdentityBuildHasher,
        Unordered,
    )
    .unwrap();
    let mut resizes = 0;
    let mut cap = 0;
    for k in 0..2000 {
        m.insert(k, k);
        if m.capacity() != cap {
            cap = m.capacity();
            resizes += 1;
        }
        assert_eq!(m.threshold(), m.capacity() * 4);
        assert!(m.len() <= m.threshold());
    }
    assert_eq!(m.capacity(), 512);
    assert_eq!(resizes, 6);
    assert_eq!(m.bin_kind(&0), Some(BinKind::Chain));
    for k in 0..2000 {
        assert_eq!(m.get(&k), Some(&k));
    }
}

// Test: ordered tree bins.
// Verifies: NaturalOrder keys that all collide are found through the
// ordered path, including borrowed lookups.
#[test]
fn ordered_tree_bin_lookups() {
    let mut m = TreeHashMap::with_hasher_and_order(ConstBuildHasher, treebin_hashmap::NaturalOrder);
    for k in 0..100u32 {
        m.insert(format!("key{k:03}"), k);
    }
    assert_eq!(m.bin_kind("key000"), Some(BinKind::Tree));
    for k in 0..100u32 {
        assert_eq!(m.get(format!("key{k:03}").as_str()), Some(&k));
    }
    assert_eq!(m.get("key100"), None);
    for k in (0..100u32).step_by(2) {
        assert_eq!(m.remove(format!("key{k:03}").as_str()), Some(k));
    }
    assert_eq!(m.len(), 50);
    for k in 0..100u32 {
        assert_eq!(m.contains_key(format!("key{k:03}").as_str()), k % 2 == 1);
    }
}

// Test: conditional operations.
// Verifies: put_if_absent, replace and the *_if_eq forms act only when
// their precondition holds.
#[test]
fn conditional_operations() {
    let mut m: TreeHashMap<&str, i32> = TreeHashMap::new();
    assert_eq!(m.put_if_absent("k", 1), None);
    assert_eq!(m.put_if_absent("k", 2), Some(&1));
    assert_eq!(m.replace("k", 3), Some(1));
    assert_eq!(m.replace("missing", 3), None);
    assert!(!m.contains_key("missing"));
    assert!(!m.replace_if_eq("k", &1, 4));
    assert!(m.replace_if_eq("k", &3, 4));
    assert!(!m.remove_if_eq("k", &3));
    assert!(m.remove_if_eq("k", &4));
    assert!(m.is_empty());
}

// Test: compute family.
// Verifies: None results remove (or skip inserting) and Some results
// store the new value.
#[test]
fn compute_family() {
    let mut m: TreeHashMap<String, usize> = TreeHashMap::new();
    assert_eq!(m.compute_if_absent("abc".into(), |k| Some(k.len())), Some(&mut 3));
    assert_eq!(m.compute_if_absent("abc".into(), |_| Some(99)), Some(&mut 3));
    assert_eq!(m.compute_if_absent("zz".into(), |_| None), None);
    assert!(!m.contains_key("zz"));

    assert_eq!(m.compute_if_present("abc", |_, v| Some(v * 10)), Some(&mut 30));
    assert_eq!(m.compute_if_present("nope", |_, v| Some(*v)), None);

    assert_eq!(m.compute("abc".into(), |_, v| v.map(|v| v + 1)), Some(&mut 31));
    assert_eq!(m.compute("new".into(), |_, v| Some(v.copied().unwrap_or(0) + 5)), Some(&mut 5));
    assert_eq!(m.compute("new".into(), |_, _| None), None);
    assert!(!m.contains_key("new"));

    assert_eq!(m.merge("abc".into(), 1, |a, b| Some(a + b)), Some(&mut 32));
    assert_eq!(m.merge("m".into(), 7, |a, b| Some(a + b)), Some(&mut 7));
    assert_eq!(m.merge("m".into(), 7, |_, _| None), None);
    assert_eq!(m.compute_if_present("abc", |_, _| None), None);
    assert!(m.is_empty());
}

// Test: configuration validation.
// Verifies: bad load factors are rejected; capacity hints round up.
#[test]
fn config_validation() {
    let bad = TreeHashMap::<u32, u32>::try_with_config(MapConfig::default().with_load_factor(0.0));
    assert!(matches!(bad, Err(MapError::IllegalLoadFactor(_))));
    let nan = TreeHashMap::<u32, u32>::try_with_config(MapConfig::default().with_load_factor(f32::NAN));
    assert!(nan.is_err());

    let m = TreeHashMap::<u32, u32>::try_with_config(
        MapConfig::default().with_initial_capacity(33).with_load_factor(0.5),
    )
    .unwrap();
    assert_eq!(m.capacity(), 64);
    assert_eq!(m.threshold(), 32);
    assert_eq!(m.load_factor(), 0.5);

    // Lazy: nothing is allocated until the first insert.
    let mut lazy = TreeHashMap::<u32, u32>::try_with_config(MapConfig::default().with_load_factor(0.5)).unwrap();
    assert_eq!(lazy.capacity(), 0);
    lazy.insert(1, 1);
    assert_eq!((lazy.capacity(), lazy.threshold()), (DEFAULT_INITIAL_CAPACITY, 8));
}

// Test: a load factor above one packs more entries per bucket.
// Verifies: growth waits for capacity * load_factor entries.
#[test]
fn high_load_factor_delays_growth() {
    let config = MapConfig::default().with_initial_capacity(16).with_load_factor(4.0);
    let mut m: TreeHashMap<u32, u32, IdentityBuildHasher> =
        TreeHashMap::try_with_config_hasher_and_order(config, IdentityBuildHasher, Unordered).unwrap();
    // Four keys per bucket; no chain gets long enough to matter.
    for k in 0..64 {
        m.insert(k, k);
    }
    assert_eq!(m.capacity(), 16);
    m.insert(64, 64);
    assert_eq!(m.capacity(), 32);
}

#[derive(Default)]
struct Recorder {
    log: Arc<Mutex<Vec<String>>>,
}

impl EntryHooks<String, i32> for Recorder {
    fn after_access(&self, key: &String, _value: &i32) {
        self.log.lock().unwrap().push(format!("access {key}"));
    }
    fn after_insert(&self, key: &String, value: &i32) {
        self.log.lock().unwrap().push(format!("insert {key}={value}"));
    }
    fn after_remove(&self, key: &String, value: &i32) {
        self.log.lock().unwrap().push(format!("remove {key}={value}"));
    }
}

// Test: post-operation hooks.
// Verifies: each operation reports exactly once, after the fact; clones
// do not inherit hooks.
#[test]
fn hooks_observe_operations() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut m: TreeHashMap<String, i32> = TreeHashMap::new();
    m.set_hooks(Box::new(Recorder { log: log.clone() }));
    m.insert("a".into(), 1);
    m.insert("a".into(), 2);
    m.get("a");
    m.get("missing");
    let copy = m.clone();
    copy.get("a");
    m.remove("a");
    assert_eq!(
        *log.lock().unwrap(),
        vec!["insert a=1", "access a", "access a", "remove a=2"]
    );
    assert!(m.take_hooks().is_some());
    m.insert("b".into(), 3);
    assert_eq!(log.lock().unwrap().len(), 4);
}

// Test: equality, collection and extension.
// Verifies: maps compare by contents regardless of insertion order.
#[test]
fn equality_and_collect() {
    let a: TreeHashMap<u32, u32> = (0..100).map(|k| (k, k)).collect();
    let mut b: TreeHashMap<u32, u32> = TreeHashMap::with_capacity(4);
    b.extend((0..100).rev().map(|k| (k, k)));
    assert_eq!(a, b);
    b.insert(0, 1);
    assert_ne!(a, b);
}

// Test: Option keys stand in for a null key.
// Verifies: None is stored and found like any other key.
#[test]
fn option_key_acts_as_null_key() {
    let mut m: TreeHashMap<Option<u32>, &str> = TreeHashMap::new();
    m.insert(None, "none");
    m.insert(Some(0), "zero");
    assert_eq!(m.get(&None), Some(&"none"));
    assert_eq!(m.remove(&None), Some("none"));
    assert_eq!(m.get(&Some(0)), Some(&"zero"));
}

// Test: reserve pre-sizes the table.
// Verifies: no growth happens while inserting the reserved count.
#[test]
fn reserve_prevents_intermediate_growth() {
    let mut m: TreeHashMap<u32, u32> = TreeHashMap::new();
    m.reserve(1000);
    let cap = m.capacity();
    assert!(m.threshold() >= 1000);
    for k in 0..1000 {
        m.insert(k, k);
    }
    assert_eq!(m.capacity(), cap);
}
