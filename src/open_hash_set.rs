//! OpenHashSet: sentinel-free open-addressing set for primitive keys.
//!
//! A set is the map with the unit value type; monomorphization erases the
//! value array accesses, so the wrapper adds no cost over a standalone
//! set. Everything structural (probing, the zero-key flag, backward
//! shift, growth, pooled iteration) lives in `OpenHashMap`.

use core::fmt;
use core::hash::{Hash, Hasher};

use crate::hashing;
use crate::key::PrimKey;
use crate::open_hash_map::{self, OpenHashMap};
use crate::pool::IteratorPool;
use crate::strategy::{Intrinsic, KeyStrategy};

pub struct OpenHashSet<K, S = Intrinsic> {
    map: OpenHashMap<K, (), S>,
}

impl<K> OpenHashSet<K>
where
    K: PrimKey,
{
    pub fn new() -> Self {
        Self::with_capacity(hashing::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_strategy(capacity, hashing::DEFAULT_LOAD_FACTOR, Intrinsic)
    }
}

impl<K> Default for OpenHashSet<K>
where
    K: PrimKey,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, S> OpenHashSet<K, S>
where
    K: PrimKey,
    S: KeyStrategy<K>,
{
    /// Construct with an explicit capacity (rounded up to a power of two),
    /// load factor, and hashing strategy. Panics on malformed arguments.
    pub fn with_capacity_and_strategy(capacity: usize, load_factor: f64, strategy: S) -> Self {
        Self {
            map: OpenHashMap::with_capacity_and_strategy(capacity, load_factor, strategy),
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.map.capacity()
    }

    pub fn load_factor(&self) -> f64 {
        self.map.load_factor()
    }

    pub fn iterator_pool(&self) -> &IteratorPool {
        self.map.iterator_pool()
    }

    /// True if the set was changed (the key was not already present).
    pub fn insert(&mut self, key: K) -> bool {
        self.map.insert(key, ())
    }

    /// True if the key was present and has been removed.
    pub fn remove(&mut self, key: K) -> bool {
        self.map.remove_entry(key).is_some()
    }

    pub fn contains(&self, key: K) -> bool {
        self.map.contains(key)
    }

    /// Slot of the most recent successful lookup; panics without one.
    pub fn lslot(&self) -> usize {
        self.map.lslot()
    }

    /// Key matched by the most recent successful lookup.
    pub fn lkey(&self) -> K {
        self.map.lkey()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn ensure_capacity(&mut self, capacity: usize) {
        self.map.ensure_capacity(capacity);
    }

    /// Remove every key matching `predicate`; returns how many were
    /// removed. Panic semantics follow `OpenHashMap::remove_all`.
    pub fn remove_all(&mut self, mut predicate: impl FnMut(K) -> bool) -> usize {
        self.map.remove_all(|k, _| predicate(k))
    }

    /// Keep only keys matching `predicate`; returns how many were removed.
    pub fn retain_all(&mut self, mut predicate: impl FnMut(K) -> bool) -> usize {
        self.map.retain_all(|k, _| predicate(k))
    }

    /// Remove every key present in `other`; returns how many were removed.
    /// Each side probes under its own strategy.
    pub fn remove_all_in<S2>(&mut self, other: &OpenHashSet<K, S2>) -> usize
    where
        S2: KeyStrategy<K>,
    {
        self.map.remove_all_in(other)
    }

    /// Order-independent hash over the stored keys.
    pub fn hash_code(&self) -> u64 {
        self.map.hash_code()
    }

    /// Pooled iterator over the stored keys; same lifecycle as the map's.
    pub fn iter(&self) -> Iter<'_, K, S> {
        Iter {
            inner: self.map.iter(),
        }
    }

    pub fn for_each(&self, mut procedure: impl FnMut(K)) {
        self.map.for_each(|k, _| procedure(k));
    }

    pub fn for_each_while(&self, mut predicate: impl FnMut(K) -> bool) {
        self.map.for_each_while(|k, _| predicate(k));
    }
}

impl<K, S> PartialEq for OpenHashSet<K, S>
where
    K: PrimKey,
    S: KeyStrategy<K> + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

impl<K, S> Hash for OpenHashSet<K, S>
where
    K: PrimKey,
    S: KeyStrategy<K>,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl<K, S> Clone for OpenHashSet<K, S>
where
    K: PrimKey,
    S: KeyStrategy<K> + Clone,
{
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
        }
    }
}

impl<K, S> fmt::Debug for OpenHashSet<K, S>
where
    K: PrimKey + fmt::Debug,
    S: KeyStrategy<K>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Raw slot walk: Debug must not touch the iterator pool.
        f.debug_set().entries(self.map.raw_keys()).finish()
    }
}

impl<K> FromIterator<K> for OpenHashSet<K>
where
    K: PrimKey,
{
    fn from_iter<T: IntoIterator<Item = K>>(iter: T) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<K, S> Extend<K> for OpenHashSet<K, S>
where
    K: PrimKey,
    S: KeyStrategy<K>,
{
    fn extend<T: IntoIterator<Item = K>>(&mut self, iter: T) {
        for k in iter {
            self.insert(k);
        }
    }
}

impl<'a, K, S> IntoIterator for &'a OpenHashSet<K, S>
where
    K: PrimKey,
    S: KeyStrategy<K>,
{
    type Item = K;
    type IntoIter = Iter<'a, K, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Pooled iterator over a set's keys. Same lifecycle contract as the
/// map's iterator: auto-release on exhaustion only.
pub struct Iter<'a, K, S> {
    inner: open_hash_map::Iter<'a, K, (), S>,
}

impl<'a, K, S> Iter<'a, K, S>
where
    K: PrimKey,
    S: KeyStrategy<K>,
{
    /// Return the cursor to the pool; idempotent.
    pub fn release(&mut self) {
        self.inner.release();
    }
}

impl<'a, K, S> Iterator for Iter<'a, K, S>
where
    K: PrimKey,
    S: KeyStrategy<K>,
{
    type Item = K;

    fn next(&mut self) -> Option<K> {
        self.inner.next().map(|(k, ())| k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: duplicate insert and duplicate remove report false, and
    /// size tracks live keys.
    #[test]
    fn insert_remove_roundtrip() {
        let mut s: OpenHashSet<i32> = OpenHashSet::new();
        assert!(s.insert(1));
        assert!(!s.insert(1));
        assert_eq!(s.len(), 1);
        assert!(s.remove(1));
        assert!(!s.remove(1));
        assert_eq!(s.len(), 0);
    }

    /// Invariant: removing all keys of another set leaves exactly the
    /// difference, regardless of the other set's strategy.
    #[test]
    fn remove_all_in_other_set() {
        let mut s: OpenHashSet<u64> = (0..20u64).collect();
        let other: OpenHashSet<u64> = (10..30u64).collect();
        let removed = s.remove_all_in(&other);
        assert_eq!(removed, 10);
        assert_eq!(s.len(), 10);
        for k in 0..10u64 {
            assert!(s.contains(k));
        }
        for k in 10..20u64 {
            assert!(!s.contains(k));
        }
    }

    /// Invariant: set equality and hash mirror the underlying map's
    /// order-independent semantics.
    #[test]
    fn set_equality_and_hash() {
        let a: OpenHashSet<u64> = (0..32u64).collect();
        let b: OpenHashSet<u64> = (0..32u64).rev().collect();
        assert_eq!(a, b);
        assert_eq!(a.hash_code(), b.hash_code());

        let c: OpenHashSet<u64> = (0..31u64).collect();
        assert_ne!(a, c);
    }

    /// Invariant: the zero key behaves like any other set member.
    #[test]
    fn zero_key_membership() {
        let mut s: OpenHashSet<u64> = OpenHashSet::new();
        assert!(!s.contains(0));
        assert!(s.insert(0));
        assert!(s.contains(0));
        assert_eq!(s.len(), 1);
        assert!(s.remove(0));
        assert!(s.is_empty());
    }
}
