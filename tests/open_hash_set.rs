// OpenHashSet public-API suite.
//
// The set is the sentinel-free engine with unit values; these tests pin
// the set-facing contract: boolean insert/remove, membership round-trips
// against a std model, container-driven removal, and equality.
use probe_collections::{KeyStrategy, OpenHashSet};
use std::collections::HashSet;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

// Test: the concrete round-trip scenario.
// Assumes: insert/remove report whether the set changed.
// Verifies: insert(1) true, insert(1) false, size 1; remove(1) true,
// remove(1) false, size 0.
#[test]
fn concrete_roundtrip_scenario() {
    let mut s: OpenHashSet<i64> = OpenHashSet::new();
    assert!(s.insert(1));
    assert!(!s.insert(1));
    assert_eq!(s.len(), 1);
    assert!(s.remove(1));
    assert!(!s.remove(1));
    assert_eq!(s.len(), 0);
}

// Test: randomized insert/remove round-trip against std::HashSet.
// Assumes: the model is correct.
// Verifies: after each step, size parity; at the end, exact membership
// parity including keys that were never inserted.
#[test]
fn randomized_roundtrip_against_model() {
    let mut sut: OpenHashSet<u64> = OpenHashSet::new();
    let mut model: HashSet<u64> = HashSet::new();

    // Interleave inserts and removes over a small key universe so both
    // paths are exercised, zero key included.
    for (i, x) in lcg(42).take(4_000).enumerate() {
        let k = x % 64;
        if i % 3 == 0 {
            assert_eq!(sut.remove(k), model.remove(&k), "remove({})", k);
        } else {
            assert_eq!(sut.insert(k), model.insert(k), "insert({})", k);
        }
        assert_eq!(sut.len(), model.len());
    }
    for k in 0..128u64 {
        assert_eq!(sut.contains(k), model.contains(&k), "contains({})", k);
    }
}

// Test: removal driven by another container.
// Assumes: remove_all_in probes the other set under its own strategy.
// Verifies: the difference remains; the removed count is exact.
#[test]
fn remove_all_in_container() {
    let mut s: OpenHashSet<u64> = (0..100u64).collect();
    let evens: OpenHashSet<u64> = (0..200u64).filter(|k| k % 2 == 0).collect();
    let removed = s.remove_all_in(&evens);
    assert_eq!(removed, 50);
    assert_eq!(s.len(), 50);
    for k in 0..100u64 {
        assert_eq!(s.contains(k), k % 2 == 1);
    }
}

// Test: predicate removal and retention are complements.
// Assumes: retain_all(p) == remove_all(!p).
// Verifies: counts and final membership agree.
#[test]
fn remove_all_retain_all_complement() {
    let mut a: OpenHashSet<u64> = (0..60u64).collect();
    let mut b = a.clone();
    let removed_a = a.remove_all(|k| k % 5 == 0);
    let removed_b = b.retain_all(|k| k % 5 != 0);
    assert_eq!(removed_a, removed_b);
    assert_eq!(a, b);
}

// Test: set equality and hashing ignore insertion order and capacity.
// Assumes: the engine's order-independent hash.
// Verifies: equal membership => equal containers; std::Hash agrees.
#[test]
fn equality_and_hash_order_independent() {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let a: OpenHashSet<u64> = (0..64u64).collect();
    let mut b: OpenHashSet<u64> = OpenHashSet::with_capacity(512);
    for k in (0..64u64).rev() {
        b.insert(k);
    }
    assert_eq!(a, b);

    let mut ha = DefaultHasher::new();
    a.hash(&mut ha);
    let mut hb = DefaultHasher::new();
    b.hash(&mut hb);
    assert_eq!(ha.finish(), hb.finish());
}

// Test: a colliding strategy still yields correct set semantics.
// Assumes: probing resolves membership by strategy equality.
// Verifies: chain length, membership, and removal under full collision.
#[test]
fn collision_chain_set_semantics() {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    struct Colliding;
    impl KeyStrategy<u64> for Colliding {
        fn hash(&self, _key: &u64) -> u64 {
            0
        }
        fn equals(&self, a: &u64, b: &u64) -> bool {
            a == b
        }
    }

    let mut s: OpenHashSet<u64, Colliding> =
        OpenHashSet::with_capacity_and_strategy(64, 0.75, Colliding);
    for k in 1..=12u64 {
        assert!(s.insert(k));
    }
    assert_eq!(s.len(), 12);
    for k in [6u64, 12, 1] {
        assert!(s.remove(k));
    }
    for k in 1..=12u64 {
        assert_eq!(s.contains(k), !matches!(k, 6 | 12 | 1));
    }
}

// Test: lkey/lslot work through the set facade.
// Assumes: the last-match cache is shared with the underlying map.
// Verifies: a zero-key hit reports the reserved pseudo-slot.
#[test]
fn last_match_through_set() {
    let mut s: OpenHashSet<u64> = OpenHashSet::new();
    s.insert(0);
    s.insert(9);
    assert!(s.contains(9));
    assert_eq!(s.lkey(), 9);
    assert!(s.lslot() < s.capacity());
    assert!(s.contains(0));
    assert_eq!(s.lslot(), s.capacity());
    assert_eq!(s.lkey(), 0);
}
