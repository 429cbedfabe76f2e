//! RobinHoodMap: open-addressing map with displacement-balanced probing.
//!
//! Occupancy is explicit: `origins[i]` records the ideal slot of the
//! entry stored at `i` (the slot it would occupy at zero displacement),
//! or `EMPTY_ORIGIN` when `i` is free. That makes every key value
//! storable (including `K::ZERO`) and gives insertion and removal the
//! displacement information Robin Hood balancing needs: an insert parks
//! its entry at the first slot whose resident is closer to home than the
//! carried entry is, and re-probes the displaced resident; a removal
//! shifts successors back while they sit away from their ideal slot.
//! Lookups stop early once a resident's displacement drops below the
//! query's, bounding miss probes.
//!
//! Slot consistency invariant: for every occupied slot `i`,
//! `origins[i] == mix64(hash(keys[i]) ^ perturbation) & mask`.

use core::cell::Cell;
use core::fmt;
use core::hash::{Hash, Hasher};

use crate::guard::MutationGuard;
use crate::hashing::{self, mix64, perturbation_for, NO_SLOT};
use crate::key::{PrimKey, PrimValue};
use crate::pool::{Cursor, IteratorPool};
use crate::strategy::{Intrinsic, KeyStrategy};

/// Occupancy sentinel: no entry lives in this slot.
pub const EMPTY_ORIGIN: usize = usize::MAX;

pub struct RobinHoodMap<K, V, S = Intrinsic> {
    keys: Vec<K>,
    values: Vec<V>,
    origins: Vec<usize>,
    assigned: usize,
    mask: usize,
    resize_at: usize,
    load_factor: f64,
    perturbation: u64,
    strategy: S,
    last_slot: Cell<usize>,
    pool: IteratorPool,
    guard: MutationGuard,
}

impl<K, V> RobinHoodMap<K, V>
where
    K: PrimKey,
    V: PrimValue,
{
    pub fn new() -> Self {
        Self::with_capacity(hashing::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_strategy(capacity, hashing::DEFAULT_LOAD_FACTOR, Intrinsic)
    }
}

impl<K, V> Default for RobinHoodMap<K, V>
where
    K: PrimKey,
    V: PrimValue,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> RobinHoodMap<K, V, S>
where
    K: PrimKey,
    V: PrimValue,
    S: KeyStrategy<K>,
{
    /// Construct with an explicit capacity (rounded up to a power of two),
    /// load factor, and hashing strategy. Panics on malformed arguments.
    pub fn with_capacity_and_strategy(capacity: usize, load_factor: f64, strategy: S) -> Self {
        let capacity = hashing::round_capacity(capacity);
        let load_factor = hashing::verify_load_factor(load_factor);
        Self {
            keys: vec![K::ZERO; capacity],
            values: vec![V::default(); capacity],
            origins: vec![EMPTY_ORIGIN; capacity],
            assigned: 0,
            mask: capacity - 1,
            resize_at: hashing::expand_at(capacity, load_factor),
            load_factor,
            perturbation: perturbation_for(capacity),
            strategy,
            last_slot: Cell::new(NO_SLOT),
            pool: IteratorPool::new(),
            guard: MutationGuard::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.assigned
    }

    pub fn is_empty(&self) -> bool {
        self.assigned == 0
    }

    /// Backing-array length. Always a power of two.
    pub fn capacity(&self) -> usize {
        self.keys.len()
    }

    pub fn load_factor(&self) -> f64 {
        self.load_factor
    }

    /// Pool statistics for this container's iterators.
    pub fn iterator_pool(&self) -> &IteratorPool {
        &self.pool
    }

    /// Ideal slot for `key` under the current capacity and strategy.
    #[inline]
    pub fn ideal_slot(&self, key: &K) -> usize {
        mix64(self.strategy.hash(key) ^ self.perturbation) as usize & self.mask
    }

    /// Ideal slot recorded for the entry at `slot`, or None when free.
    pub fn slot_origin(&self, slot: usize) -> Option<usize> {
        let origin = self.origins[slot];
        (origin != EMPTY_ORIGIN).then_some(origin)
    }

    /// Key stored at `slot`, or None when free.
    pub fn stored_key(&self, slot: usize) -> Option<K> {
        (self.origins[slot] != EMPTY_ORIGIN).then_some(self.keys[slot])
    }

    #[inline]
    fn displacement(&self, slot: usize, origin: usize) -> usize {
        slot.wrapping_sub(origin) & self.mask
    }

    fn find_slot(&self, key: &K) -> Option<usize> {
        let mut slot = self.ideal_slot(key);
        let mut dist = 0;
        loop {
            let resident_origin = self.origins[slot];
            if resident_origin == EMPTY_ORIGIN {
                return None;
            }
            // A resident closer to home than the query's distance proves
            // the key absent: insertion would have parked it here.
            if self.displacement(slot, resident_origin) < dist {
                return None;
            }
            if self.strategy.equals(&self.keys[slot], key) {
                return Some(slot);
            }
            slot = (slot + 1) & self.mask;
            dist += 1;
        }
    }

    /// True if `key` is stored. On a hit, records the slot for
    /// `lslot`/`lkey`/`lget`.
    pub fn contains(&self, key: K) -> bool {
        match self.find_slot(&key) {
            Some(slot) => {
                self.last_slot.set(slot);
                true
            }
            None => {
                self.last_slot.set(NO_SLOT);
                false
            }
        }
    }

    /// Value stored for `key`, or `V::default()` when absent.
    pub fn get(&self, key: K) -> V {
        if self.contains(key) {
            self.values[self.last_slot.get()]
        } else {
            V::default()
        }
    }

    /// Slot of the most recent successful lookup. Panics if no lookup has
    /// succeeded; stale after any structural mutation.
    pub fn lslot(&self) -> usize {
        let slot = self.last_slot.get();
        assert!(
            slot != NO_SLOT,
            "no successful lookup on record; call contains or get first"
        );
        slot
    }

    /// Key matched by the most recent successful lookup.
    pub fn lkey(&self) -> K {
        self.keys[self.lslot()]
    }

    /// Value matched by the most recent successful lookup.
    pub fn lget(&self) -> V {
        self.values[self.lslot()]
    }

    /// Insert or overwrite. Returns true if the key was newly inserted,
    /// false if it was already present (value replaced; never grows).
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let _m = self.guard.enter_mut();
        // Decide overwrite-vs-new without mutating. A resident closer to
        // home than the carried distance ends the search: the key is new,
        // and insertion would displace from that point.
        let mut slot = self.ideal_slot(&key);
        let mut dist = 0;
        loop {
            let resident_origin = self.origins[slot];
            if resident_origin == EMPTY_ORIGIN {
                break;
            }
            if self.strategy.equals(&self.keys[slot], &key) {
                self.values[slot] = value;
                return false;
            }
            if self.displacement(slot, resident_origin) < dist {
                break;
            }
            slot = (slot + 1) & self.mask;
            dist += 1;
        }
        if self.assigned >= self.resize_at {
            self.grow();
        }
        self.place(key, value);
        self.assigned += 1;
        true
    }

    // Robin Hood displacement insert of a known-absent key into a table
    // with at least one free slot.
    fn place(&mut self, key: K, value: V) {
        let mut carried_key = key;
        let mut carried_value = value;
        let mut carried_origin = self.ideal_slot(&carried_key);
        let mut slot = carried_origin;
        let mut dist = 0;
        loop {
            let resident_origin = self.origins[slot];
            if resident_origin == EMPTY_ORIGIN {
                self.keys[slot] = carried_key;
                self.values[slot] = carried_value;
                self.origins[slot] = carried_origin;
                return;
            }
            let resident_dist = self.displacement(slot, resident_origin);
            if resident_dist < dist {
                // Park the carried entry here; the displaced resident
                // continues probing from its own displacement.
                core::mem::swap(&mut self.keys[slot], &mut carried_key);
                core::mem::swap(&mut self.values[slot], &mut carried_value);
                let displaced_origin = resident_origin;
                self.origins[slot] = carried_origin;
                carried_origin = displaced_origin;
                dist = resident_dist;
            }
            slot = (slot + 1) & self.mask;
            dist += 1;
        }
    }

    fn grow(&mut self) {
        let mut new_capacity = self.capacity() << 1;
        while hashing::expand_at(new_capacity, self.load_factor) <= self.assigned {
            new_capacity <<= 1;
        }
        assert!(
            new_capacity <= hashing::MAX_CAPACITY,
            "hash container exceeded maximum capacity {}",
            hashing::MAX_CAPACITY
        );
        self.rehash(new_capacity);
    }

    // Allocate fresh arrays, recompute the perturbation, and replay every
    // occupied entry through the Robin Hood insertion path.
    fn rehash(&mut self, new_capacity: usize) {
        let old_keys = std::mem::replace(&mut self.keys, vec![K::ZERO; new_capacity]);
        let old_values = std::mem::replace(&mut self.values, vec![V::default(); new_capacity]);
        let old_origins = std::mem::replace(&mut self.origins, vec![EMPTY_ORIGIN; new_capacity]);
        self.mask = new_capacity - 1;
        self.resize_at = hashing::expand_at(new_capacity, self.load_factor);
        self.perturbation = perturbation_for(new_capacity);
        for (i, &origin) in old_origins.iter().enumerate() {
            if origin != EMPTY_ORIGIN {
                self.place(old_keys[i], old_values[i]);
            }
        }
        self.last_slot.set(NO_SLOT);
    }

    /// Grow the backing arrays to hold at least `capacity` slots without a
    /// further rehash. Never shrinks.
    pub fn ensure_capacity(&mut self, capacity: usize) {
        let _m = self.guard.enter_mut();
        let rounded = hashing::round_capacity(capacity);
        if rounded > self.capacity() {
            self.rehash(rounded);
        }
    }

    /// Remove `key`, returning its value, or `V::default()` when absent.
    pub fn remove(&mut self, key: K) -> V {
        self.remove_entry(key).unwrap_or_default()
    }

    pub(crate) fn remove_entry(&mut self, key: K) -> Option<V> {
        let _m = self.guard.enter_mut();
        let slot = self.find_slot(&key)?;
        let previous = self.values[slot];
        self.shift_back(slot);
        self.last_slot.set(NO_SLOT);
        Some(previous)
    }

    // Displacement-driven backward shift: successors move one slot closer
    // to home until one is already at its ideal slot (or the chain ends).
    fn shift_back(&mut self, mut gap: usize) {
        loop {
            let next = (gap + 1) & self.mask;
            let next_origin = self.origins[next];
            if next_origin == EMPTY_ORIGIN || self.displacement(next, next_origin) == 0 {
                break;
            }
            self.keys[gap] = self.keys[next];
            self.values[gap] = self.values[next];
            self.origins[gap] = next_origin;
            gap = next;
        }
        self.keys[gap] = K::ZERO;
        self.values[gap] = V::default();
        self.origins[gap] = EMPTY_ORIGIN;
        self.assigned -= 1;
    }

    /// Reset occupancy and counts; backing arrays keep their capacity.
    pub fn clear(&mut self) {
        let _m = self.guard.enter_mut();
        self.assigned = 0;
        self.keys.fill(K::ZERO);
        self.values.fill(V::default());
        self.origins.fill(EMPTY_ORIGIN);
        self.last_slot.set(NO_SLOT);
    }

    /// Remove every entry matching `predicate`; returns how many were
    /// removed. A panicking predicate propagates; entries already visited
    /// stay removed and the container remains fully consistent.
    pub fn remove_all(&mut self, mut predicate: impl FnMut(K, V) -> bool) -> usize {
        let _m = self.guard.enter_mut();
        let before = self.assigned;
        let mut slot = 0;
        while slot < self.keys.len() {
            if self.origins[slot] != EMPTY_ORIGIN && predicate(self.keys[slot], self.values[slot]) {
                // The shift may pull a successor into this slot;
                // re-examine it before moving on.
                self.shift_back(slot);
            } else {
                slot += 1;
            }
        }
        self.last_slot.set(NO_SLOT);
        before - self.assigned
    }

    /// Keep only entries matching `predicate`; returns how many were
    /// removed. Same panic semantics as `remove_all`.
    pub fn retain_all(&mut self, mut predicate: impl FnMut(K, V) -> bool) -> usize {
        self.remove_all(move |k, v| !predicate(k, v))
    }

    /// Remove every entry whose key is present in `keys`; returns how
    /// many were removed. Each side probes under its own strategy.
    pub fn remove_all_in<S2>(&mut self, keys: &crate::robin_hood_set::RobinHoodSet<K, S2>) -> usize
    where
        S2: KeyStrategy<K>,
    {
        self.remove_all(|k, _| keys.contains(k))
    }

    /// Order-independent hash over all entries, honoring the strategy.
    pub fn hash_code(&self) -> u64 {
        let mut h = 0u64;
        for slot in 0..self.keys.len() {
            if self.origins[slot] != EMPTY_ORIGIN {
                h = h.wrapping_add(
                    mix64(self.strategy.hash(&self.keys[slot])) ^ mix64(self.values[slot].bits()),
                );
            }
        }
        h
    }

    /// Pooled iterator over `(key, value)` entries; auto-releases on
    /// exhaustion only.
    pub fn iter(&self) -> Iter<'_, K, V, S> {
        Iter {
            map: self,
            cursor: Some(self.pool.borrow_cursor()),
        }
    }

    /// Internal iteration; the borrow is owned by this call and always
    /// returned.
    pub fn for_each(&self, mut procedure: impl FnMut(K, V)) {
        let mut it = self.iter();
        while let Some((k, v)) = it.next() {
            procedure(k, v);
        }
    }

    /// Internal iteration with early stop on a false predicate; the
    /// borrowed cursor is returned either way.
    pub fn for_each_while(&self, mut predicate: impl FnMut(K, V) -> bool) {
        let mut it = self.iter();
        while let Some((k, v)) = it.next() {
            if !predicate(k, v) {
                it.release();
                return;
            }
        }
    }

    // Pool-free slot walk for Debug and other non-contractual readers.
    pub(crate) fn raw_keys(&self) -> impl Iterator<Item = K> + '_ {
        self.origins
            .iter()
            .enumerate()
            .filter(|(_, &origin)| origin != EMPTY_ORIGIN)
            .map(|(slot, _)| self.keys[slot])
    }

    /// Read view over this map's keys.
    pub fn keys(&self) -> Keys<'_, K, V, S> {
        Keys { map: self }
    }

    /// Read view over this map's values.
    pub fn values(&self) -> Values<'_, K, V, S> {
        Values { map: self }
    }
}

impl<K, V, S> PartialEq for RobinHoodMap<K, V, S>
where
    K: PrimKey,
    V: PrimValue,
    S: KeyStrategy<K> + PartialEq,
{
    /// Equal iff the strategies compare equal, the sizes match, and every
    /// entry of one is present with an equal value in the other.
    fn eq(&self, other: &Self) -> bool {
        if self.strategy != other.strategy || self.assigned != other.assigned {
            return false;
        }
        for slot in 0..self.keys.len() {
            if self.origins[slot] != EMPTY_ORIGIN {
                let key = self.keys[slot];
                if !(other.contains(key) && other.lget() == self.values[slot]) {
                    return false;
                }
            }
        }
        true
    }
}

impl<K, V, S> Hash for RobinHoodMap<K, V, S>
where
    K: PrimKey,
    V: PrimValue,
    S: KeyStrategy<K>,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl<K, V, S> Clone for RobinHoodMap<K, V, S>
where
    K: PrimKey,
    V: PrimValue,
    S: KeyStrategy<K> + Clone,
{
    /// The clone gets its own fresh iterator pool and an empty last-match
    /// cache; stored entries and configuration are copied.
    fn clone(&self) -> Self {
        Self {
            keys: self.keys.clone(),
            values: self.values.clone(),
            origins: self.origins.clone(),
            assigned: self.assigned,
            mask: self.mask,
            resize_at: self.resize_at,
            load_factor: self.load_factor,
            perturbation: self.perturbation,
            strategy: self.strategy.clone(),
            last_slot: Cell::new(NO_SLOT),
            pool: IteratorPool::new(),
            guard: MutationGuard::new(),
        }
    }
}

impl<K, V, S> fmt::Debug for RobinHoodMap<K, V, S>
where
    K: PrimKey + fmt::Debug,
    V: PrimValue + fmt::Debug,
    S: KeyStrategy<K>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Raw slot walk: Debug must not touch the iterator pool.
        let mut map = f.debug_map();
        for slot in 0..self.keys.len() {
            if self.origins[slot] != EMPTY_ORIGIN {
                map.entry(&self.keys[slot], &self.values[slot]);
            }
        }
        map.finish()
    }
}

impl<K, V> FromIterator<(K, V)> for RobinHoodMap<K, V>
where
    K: PrimKey,
    V: PrimValue,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K, V, S> Extend<(K, V)> for RobinHoodMap<K, V, S>
where
    K: PrimKey,
    V: PrimValue,
    S: KeyStrategy<K>,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a RobinHoodMap<K, V, S>
where
    K: PrimKey,
    V: PrimValue,
    S: KeyStrategy<K>,
{
    type Item = (K, V);
    type IntoIter = Iter<'a, K, V, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Pooled iterator over a Robin Hood map's entries. Auto-releases on
/// exhaustion only; see `OpenHashMap`'s iterator for the full lifecycle
/// contract.
pub struct Iter<'a, K, V, S> {
    map: &'a RobinHoodMap<K, V, S>,
    cursor: Option<Cursor>,
}

impl<'a, K, V, S> Iter<'a, K, V, S>
where
    K: PrimKey,
    V: PrimValue,
    S: KeyStrategy<K>,
{
    /// Return the cursor to the pool; idempotent.
    pub fn release(&mut self) {
        if let Some(cursor) = self.cursor.take() {
            self.map.pool.release_cursor(cursor);
        }
    }
}

impl<'a, K, V, S> Iterator for Iter<'a, K, V, S>
where
    K: PrimKey,
    V: PrimValue,
    S: KeyStrategy<K>,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        let cursor = self.cursor.as_mut()?;
        let cap = self.map.capacity();
        while cursor.slot < cap {
            let slot = cursor.slot;
            cursor.slot += 1;
            if self.map.origins[slot] != EMPTY_ORIGIN {
                return Some((self.map.keys[slot], self.map.values[slot]));
            }
        }
        let cursor = self.cursor.take().expect("cursor present at exhaustion");
        self.map.pool.release_cursor(cursor);
        None
    }
}

/// Read view over a Robin Hood map's keys.
pub struct Keys<'a, K, V, S> {
    map: &'a RobinHoodMap<K, V, S>,
}

impl<'a, K, V, S> Keys<'a, K, V, S>
where
    K: PrimKey,
    V: PrimValue,
    S: KeyStrategy<K>,
{
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn contains(&self, key: K) -> bool {
        self.map.contains(key)
    }

    pub fn iter(&self) -> KeysIter<'a, K, V, S> {
        KeysIter {
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

/// Pooled iterator over keys; shares the owning map's pool.
pub struct KeysIter<'a, K, V, S> {
    inner: Iter<'a, K, V, S>,
}

impl<'a, K, V, S> KeysIter<'a, K, V, S>
where
    K: PrimKey,
    V: PrimValue,
    S: KeyStrategy<K>,
{
    pub fn release(&mut self) {
        self.inner.release();
    }
}

impl<'a, K, V, S> Iterator for KeysIter<'a, K, V, S>
where
    K: PrimKey,
    V: PrimValue,
    S: KeyStrategy<K>,
{
    type Item = K;

    fn next(&mut self) -> Option<K> {
        self.inner.next().map(|(k, _)| k)
    }
}

/// Read view over a Robin Hood map's values.
pub struct Values<'a, K, V, S> {
    map: &'a RobinHoodMap<K, V, S>,
}

impl<'a, K, V, S> Values<'a, K, V, S>
where
    K: PrimKey,
    V: PrimValue,
    S: KeyStrategy<K>,
{
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Linear scan; values are not indexed.
    pub fn contains(&self, value: V) -> bool {
        let mut found = false;
        self.map.for_each_while(|_, v| {
            if v == value {
                found = true;
                false
            } else {
                true
            }
        });
        found
    }

    pub fn iter(&self) -> ValuesIter<'a, K, V, S> {
        ValuesIter {
            inner: self.map.iter(),
        }
    }

    pub fn for_each(&self, mut procedure: impl FnMut(V)) {
        self.map.for_each(|_, v| procedure(v));
    }

    pub fn for_each_while(&self, mut predicate: impl FnMut(V) -> bool) {
        self.map.for_each_while(|_, v| predicate(v));
    }
}

/// Pooled iterator over values; shares the owning map's pool.
pub struct ValuesIter<'a, K, V, S> {
    inner: Iter<'a, K, V, S>,
}

impl<'a, K, V, S> ValuesIter<'a, K, V, S>
where
    K: PrimKey,
    V: PrimValue,
    S: KeyStrategy<K>,
{
    pub fn release(&mut self) {
        self.inner.release();
    }
}

impl<'a, K, V, S> Iterator for ValuesIter<'a, K, V, S>
where
    K: PrimKey,
    V: PrimValue,
    S: KeyStrategy<K>,
{
    type Item = V;

    fn next(&mut self) -> Option<V> {
        self.inner.next().map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_slot_consistency<K, V, S>(map: &RobinHoodMap<K, V, S>)
    where
        K: PrimKey,
        V: PrimValue,
        S: KeyStrategy<K>,
    {
        for slot in 0..map.capacity() {
            if let Some(origin) = map.slot_origin(slot) {
                let key = map.stored_key(slot).expect("occupied slot has a key");
                assert_eq!(
                    origin,
                    map.ideal_slot(&key),
                    "slot {} origin out of sync",
                    slot
                );
            }
        }
    }

    // Forces every key into one probe chain; equality stays intrinsic.
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

    /// Invariant: insert/overwrite/remove round-trip with the occupancy
    /// array staying consistent after every mutation.
    #[test]
    fn roundtrip_keeps_slots_consistent() {
        let mut m: RobinHoodMap<u64, u32> = RobinHoodMap::with_capacity(8);
        for k in 0..200u64 {
            assert!(m.insert(k, k as u32));
            assert_slot_consistency(&m);
        }
        assert_eq!(m.len(), 200);
        for k in 0..200u64 {
            assert_eq!(m.get(k), k as u32);
        }
        for k in (0..200u64).step_by(3) {
            assert_eq!(m.remove(k), k as u32);
            assert_slot_consistency(&m);
        }
        for k in 0..200u64 {
            assert_eq!(m.contains(k), k % 3 != 0);
        }
    }

    /// Invariant: the zero key needs no special casing; explicit
    /// occupancy makes it an ordinary entry.
    #[test]
    fn zero_key_is_ordinary() {
        let mut m: RobinHoodMap<u64, u32> = RobinHoodMap::new();
        assert!(!m.contains(0));
        assert!(m.insert(0, 5));
        assert!(m.contains(0));
        assert_eq!(m.get(0), 5);
        assert!(!m.insert(0, 6));
        assert_eq!(m.remove(0), 6);
        assert!(m.is_empty());
    }

    /// Invariant: a full-collision chain keeps displacements in probe
    /// order (0, 1, 2, ...) and every key reachable as others leave.
    #[test]
    fn collision_chain_displacements() {
        let mut m: RobinHoodMap<u64, u32, Colliding> =
            RobinHoodMap::with_capacity_and_strategy(64, 0.75, Colliding);
        for k in 1..=12u64 {
            assert!(m.insert(k, 0));
        }
        assert_eq!(m.len(), 12);
        assert_slot_consistency(&m);

        // All keys share one origin; the chain occupies 12 consecutive
        // slots with displacements 0..12.
        let origin = m.ideal_slot(&1);
        for d in 0..12 {
            let slot = (origin + d) & (m.capacity() - 1);
            assert_eq!(m.slot_origin(slot), Some(origin));
        }

        for &k in &[6, 1, 12, 7] {
            assert!(m.contains(k));
            assert_eq!(m.remove(k), 0);
            assert_slot_consistency(&m);
        }
        for k in 1..=12u64 {
            assert_eq!(m.contains(k), !matches!(k, 6 | 1 | 12 | 7));
        }
    }

    /// Invariant: growth replays entries through Robin Hood placement and
    /// preserves contents and slot consistency.
    #[test]
    fn growth_preserves_entries() {
        let mut m: RobinHoodMap<u64, u64> = RobinHoodMap::with_capacity(4);
        for k in 0..300u64 {
            m.insert(k, k * 7);
        }
        assert_eq!(m.len(), 300);
        assert!(m.capacity() >= 512);
        assert_slot_consistency(&m);
        for k in 0..300u64 {
            assert_eq!(m.get(k), k * 7);
        }
    }

    /// Invariant: the resize threshold is exact, as in the sentinel-free
    /// engine.
    #[test]
    fn resize_boundary_exact() {
        let mut m: RobinHoodMap<u64, u32> =
            RobinHoodMap::with_capacity_and_strategy(128, 0.75, Intrinsic);
        for k in 0..96u64 {
            m.insert(k, 0);
        }
        assert_eq!(m.capacity(), 128);
        m.insert(96, 0);
        assert_eq!(m.capacity(), 256);
    }

    /// Invariant: remove_all under collisions visits every entry and
    /// leaves a consistent, re-probable table.
    #[test]
    fn remove_all_under_collisions() {
        let mut m: RobinHoodMap<u64, u64, Colliding> =
            RobinHoodMap::with_capacity_and_strategy(64, 0.75, Colliding);
        for k in 1..=20u64 {
            m.insert(k, k);
        }
        let removed = m.remove_all(|k, _| k % 2 == 0);
        assert_eq!(removed, 10);
        assert_slot_consistency(&m);
        for k in 1..=20u64 {
            assert_eq!(m.contains(k), k % 2 == 1);
        }
    }

    /// Invariant: equality and hash are order-independent and match the
    /// sentinel-free engine's contract.
    #[test]
    fn hash_eq_order_independent() {
        let mut a: RobinHoodMap<u64, u32> = RobinHoodMap::new();
        let mut b: RobinHoodMap<u64, u32> = RobinHoodMap::with_capacity(512);
        for k in 0..50u64 {
            a.insert(k, 1);
        }
        for k in (0..50u64).rev() {
            b.insert(k, 1);
        }
        assert_eq!(a, b);
        assert_eq!(a.hash_code(), b.hash_code());
        b.insert(3, 2);
        assert_ne!(a, b);
    }

    /// Invariant: clear empties the table without shrinking it.
    #[test]
    fn clear_keeps_capacity() {
        let mut m: RobinHoodMap<u64, u32> = RobinHoodMap::new();
        for k in 0..100u64 {
            m.insert(k, 1);
        }
        let cap = m.capacity();
        m.clear();
        assert_eq!(m.len(), 0);
        assert_eq!(m.capacity(), cap);
        assert!(!m.contains(0));
        assert!(m.insert(0, 1));
        assert_slot_consistency(&m);
    }
}
