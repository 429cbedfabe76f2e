// Pooled-iterator lifecycle suite (consolidated).
//
// Each test documents what behavior is being verified and which
// invariants are assumed or asserted. The core invariants exercised:
// - Auto-return: exhausting an iterator is the only automatic release.
// - Leak tolerance: an abandoned iterator is not reclaimed; the pool is
//   short by exactly the un-released cursors, never by more than the cap.
// - Manual release() restores the pool and is idempotent.
// - for_each/for_each_while always return their borrow, even on early
//   stop; a panicking procedure forfeits it like any abandoned walk.
// - Counter identity: len() + borrowed() == allocated() at all times.
use probe_collections::{OpenHashMap, OpenHashSet, RobinHoodSet};

fn sample_map() -> OpenHashMap<u64, u32> {
    let mut m = OpenHashMap::new();
    for k in 0..32u64 {
        m.insert(k, k as u32);
    }
    m
}

fn check_counters(m: &OpenHashMap<u64, u32>) {
    let pool = m.iterator_pool();
    assert_eq!(pool.len() + pool.borrowed(), pool.allocated());
    assert!(pool.len() <= pool.capacity());
}

// Test: invariant (a): a fully-consumed loop returns the pool to its
// pre-loop size.
// Assumes: exhaustion auto-releases the cursor.
// Verifies: pool size and borrowed count before/after a complete loop.
#[test]
fn full_consumption_restores_pool() {
    let m = sample_map();
    // Warm the pool with one complete traversal.
    let mut n = 0;
    for (_k, _v) in &m {
        n += 1;
    }
    assert_eq!(n, m.len());
    let before = m.iterator_pool().len();
    assert_eq!(before, 1);

    for (_k, _v) in &m {}
    assert_eq!(m.iterator_pool().len(), before);
    assert_eq!(m.iterator_pool().borrowed(), 0);
    check_counters(&m);
}

// Test: invariant (b): a loop broken early leaves the pool short by
// exactly the number of un-released iterators.
// Assumes: there is no Drop-based reclamation.
// Verifies: borrowed count tracks each abandoned iterator.
#[test]
fn early_break_leaks_exactly_one() {
    let m = sample_map();
    for (_k, _v) in &m {}
    let before = m.iterator_pool().len();

    let mut it = m.iter();
    let _ = it.next();
    drop(it); // abandoned mid-walk

    assert_eq!(m.iterator_pool().len(), before - 1);
    assert_eq!(m.iterator_pool().borrowed(), 1);
    check_counters(&m);
}

// Test: invariant (c): manually calling release() after a break restores
// the pre-loop pool size.
// Assumes: release() returns the cursor exactly once.
// Verifies: pool size round-trips through break-then-release.
#[test]
fn manual_release_restores_pool() {
    let m = sample_map();
    for (_k, _v) in &m {}
    let before = m.iterator_pool().len();

    let mut it = m.iter();
    let _ = it.next();
    it.release();

    assert_eq!(m.iterator_pool().len(), before);
    assert_eq!(m.iterator_pool().borrowed(), 0);
    check_counters(&m);
}

// Test: invariant (d): release() is idempotent, including after the
// exhaustion auto-release.
// Assumes: a released cursor cannot be returned twice.
// Verifies: second and later release() calls change nothing.
#[test]
fn release_is_idempotent() {
    let m = sample_map();

    let mut it = m.iter();
    let _ = it.next();
    it.release();
    let len = m.iterator_pool().len();
    let borrowed = m.iterator_pool().borrowed();
    it.release();
    it.release();
    assert_eq!(m.iterator_pool().len(), len);
    assert_eq!(m.iterator_pool().borrowed(), borrowed);

    // Exhausted iterator: auto-released; manual release is a no-op.
    let mut it = m.iter();
    while it.next().is_some() {}
    let len = m.iterator_pool().len();
    it.release();
    assert_eq!(m.iterator_pool().len(), len);
    check_counters(&m);
}

// Test: the leak is bounded: retention never exceeds the pool cap no
// matter how many iterators are abandoned and later replaced.
// Assumes: releases beyond the cap discard cursors.
// Verifies: len() <= capacity() under heavy leak-and-replace pressure.
#[test]
fn leak_pressure_is_bounded_by_cap() {
    let m = sample_map();
    let cap = m.iterator_pool().capacity();

    for _ in 0..cap + 5 {
        let mut it = m.iter();
        let _ = it.next();
        drop(it); // leak
    }
    assert_eq!(m.iterator_pool().borrowed(), cap + 5);

    // Fresh traversals allocate replacements; full consumption releases
    // them, but retention stays capped.
    for _ in 0..cap + 5 {
        for (_k, _v) in &m {}
    }
    assert!(m.iterator_pool().len() <= cap);
    check_counters(&m);
}

// Test: for_each and for_each_while own their borrow and always return
// it, including on predicate-driven early stop.
// Assumes: internal iteration controls the loop.
// Verifies: no borrowed cursors remain after either form.
#[test]
fn internal_iteration_never_leaks() {
    let m = sample_map();
    let mut seen = 0;
    m.for_each(|_, _| seen += 1);
    assert_eq!(seen, m.len());
    assert_eq!(m.iterator_pool().borrowed(), 0);

    let mut first = None;
    m.for_each_while(|k, _| {
        first = Some(k);
        false // stop immediately
    });
    assert!(first.is_some());
    assert_eq!(m.iterator_pool().borrowed(), 0);
    check_counters(&m);
}

// Test: nested internal iteration borrows a second cursor and returns
// both.
// Assumes: the pool issues freely while cursors are outstanding.
// Verifies: borrowed() peaks at two and settles at zero.
#[test]
fn nested_iteration_uses_two_cursors() {
    let m = sample_map();
    let mut peak = 0;
    m.for_each(|_, _| {
        m.for_each_while(|_, _| {
            peak = peak.max(m.iterator_pool().borrowed());
            false
        });
    });
    assert_eq!(peak, 2);
    assert_eq!(m.iterator_pool().borrowed(), 0);
    check_counters(&m);
}

// Test: a panicking procedure propagates and forfeits the cursor, which
// counts as borrowed until the program ends (bounded leak).
// Assumes: for_each does not catch panics.
// Verifies: the panic escapes; the cursor is not returned.
#[test]
fn procedure_panic_forfeits_cursor() {
    let m = sample_map();
    let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        m.for_each(|_, _| panic!("procedure failure"));
    }));
    assert!(res.is_err());
    assert_eq!(m.iterator_pool().borrowed(), 1);
    check_counters(&m);

    // The container itself remains fully usable.
    let collected: Vec<_> = m.iter().collect();
    assert_eq!(collected.len(), m.len());
    assert_eq!(m.iterator_pool().borrowed(), 1, "only the forfeited cursor");
}

// Test: the same lifecycle applies to sets and to the Robin Hood
// containers through their shared pool design.
// Assumes: wrappers delegate to the map's pool.
// Verifies: invariants (a) and (c) on OpenHashSet and RobinHoodSet.
#[test]
fn set_iterators_share_the_contract() {
    let s: OpenHashSet<u64> = (0..16u64).collect();
    for _k in &s {}
    let before = s.iterator_pool().len();
    let mut it = s.iter();
    let _ = it.next();
    it.release();
    assert_eq!(s.iterator_pool().len(), before);

    let r: RobinHoodSet<u64> = (0..16u64).collect();
    let total = r.iter().count();
    assert_eq!(total, 16);
    assert_eq!(r.iterator_pool().borrowed(), 0);
    let mut it = r.iter();
    let _ = it.next();
    drop(it);
    assert_eq!(r.iterator_pool().borrowed(), 1);
}

// Test: view iterators (keys/values) draw from the same pool as entry
// iterators and follow the same return discipline.
// Assumes: views wrap the map's pooled iterator.
// Verifies: exhaustion and manual release both restore the pool.
#[test]
fn view_iterators_follow_the_contract() {
    let m = sample_map();
    let keys: Vec<u64> = m.keys().iter().collect();
    assert_eq!(keys.len(), m.len());
    assert_eq!(m.iterator_pool().borrowed(), 0);

    let mut vi = m.values().iter();
    let _ = vi.next();
    vi.release();
    vi.release();
    assert_eq!(m.iterator_pool().borrowed(), 0);
    check_counters(&m);
}
