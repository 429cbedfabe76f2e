//! RobinHoodSet: displacement-balanced open-addressing set.
//!
//! The set is the Robin Hood map with the unit value type, exactly as
//! `OpenHashSet` wraps `OpenHashMap`. The explicit occupancy array means
//! any key value is storable without sentinel bookkeeping.

use core::fmt;
use core::hash::{Hash, Hasher};

use crate::hashing;
use crate::key::PrimKey;
use crate::pool::IteratorPool;
use crate::robin_hood_map::{self, RobinHoodMap};
use crate::strategy::{Intrinsic, KeyStrategy};

pub struct RobinHoodSet<K, S = Intrinsic> {
    map: RobinHoodMap<K, (), S>,
}

impl<K> RobinHoodSet<K>
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

impl<K> Default for RobinHoodSet<K>
where
    K: PrimKey,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, S> RobinHoodSet<K, S>
where
    K: PrimKey,
    S: KeyStrategy<K>,
{
    /// Construct with an explicit capacity (rounded up to a power of two),
    /// load factor, and hashing strategy. Panics on malformed arguments.
    pub fn with_capacity_and_strategy(capacity: usize, load_factor: f64, strategy: S) -> Self {
        Self {
            map: RobinHoodMap::with_capacity_and_strategy(capacity, load_factor, strategy),
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

    /// Ideal slot for `key` under the current capacity and strategy.
    pub fn ideal_slot(&self, key: &K) -> usize {
        self.map.ideal_slot(key)
    }

    /// Ideal slot recorded for the entry at `slot`, or None when free.
    pub fn slot_origin(&self, slot: usize) -> Option<usize> {
        self.map.slot_origin(slot)
    }

    /// Key stored at `slot`, or None when free.
    pub fn stored_key(&self, slot: usize) -> Option<K> {
        self.map.stored_key(slot)
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
    /// removed. Panic semantics follow `RobinHoodMap::remove_all`.
    pub fn remove_all(&mut self, mut predicate: impl FnMut(K) -> bool) -> usize {
        self.map.remove_all(|k, _| predicate(k))
    }

    /// Keep only keys matching `predicate`; returns how many were removed.
    pub fn retain_all(&mut self, mut predicate: impl FnMut(K) -> bool) -> usize {
        self.map.retain_all(|k, _| predicate(k))
    }

    /// Remove every key present in `other`; returns how many were removed.
    pub fn remove_all_in<S2>(&mut self, other: &RobinHoodSet<K, S2>) -> usize
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

impl<K, S> PartialEq for RobinHoodSet<K, S>
where
    K: PrimKey,
    S: KeyStrategy<K> + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

impl<K, S> Hash for RobinHoodSet<K, S>
where
    K: PrimKey,
    S: KeyStrategy<K>,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl<K, S> Clone for RobinHoodSet<K, S>
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

impl<K, S> fmt::Debug for RobinHoodSet<K, S>
where
    K: PrimKey + fmt::Debug,
    S: KeyStrategy<K>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Raw slot walk: Debug must not touch the iterator pool.
        f.debug_set().entries(self.map.raw_keys()).finish()
    }
}

impl<K> FromIterator<K> for RobinHoodSet<K>
where
    K: PrimKey,
{
    fn from_iter<T: IntoIterator<Item = K>>(iter: T) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<K, S> Extend<K> for RobinHoodSet<K, S>
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

impl<'a, K, S> IntoIterator for &'a RobinHoodSet<K, S>
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

/// Pooled iterator over a set's keys; auto-releases on exhaustion only.
pub struct Iter<'a, K, S> {
    inner: robin_hood_map::Iter<'a, K, (), S>,
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
