//! OpenHashMap: sentinel-free open-addressing map for primitive keys.
//!
//! All entries live directly in power-of-two backing arrays and are found
//! by forward linear probing from the key's perturbed hash. `K::ZERO`
//! marks empty slots; a stored zero key is tracked by an out-of-band flag
//! and one reserved value slot past the probing region, so no per-slot
//! occupancy array is needed. Removal is backward-shift (no tombstones):
//! entries behind the gap move up while they remain reachable from their
//! own ideal slot.

use core::cell::Cell;
use core::fmt;
use core::hash::{Hash, Hasher};

use crate::guard::MutationGuard;
use crate::hashing::{self, mix64, perturbation_for, NO_SLOT};
use crate::key::{PrimKey, PrimValue};
use crate::pool::{Cursor, IteratorPool};
use crate::strategy::{Intrinsic, KeyStrategy};

pub struct OpenHashMap<K, V, S = Intrinsic> {
    keys: Vec<K>,
    // One slot longer than `keys`: the final cell holds the zero key's value.
    values: Vec<V>,
    has_zero_key: bool,
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

impl<K, V> OpenHashMap<K, V>
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

impl<K, V> Default for OpenHashMap<K, V>
where
    K: PrimKey,
    V: PrimValue,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> OpenHashMap<K, V, S>
where
    K: PrimKey,
    V: PrimValue,
    S: KeyStrategy<K>,
{
    /// Construct with an explicit capacity (rounded up to a power of two),
    /// load factor, and hashing strategy. Panics on a capacity above the
    /// implementation maximum or a load factor outside the accepted range.
    pub fn with_capacity_and_strategy(capacity: usize, load_factor: f64, strategy: S) -> Self {
        let capacity = hashing::round_capacity(capacity);
        let load_factor = hashing::verify_load_factor(load_factor);
        Self {
            keys: vec![K::ZERO; capacity],
            values: vec![V::default(); capacity + 1],
            has_zero_key: false,
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

    /// Number of stored entries, counting a stored zero key.
    pub fn len(&self) -> usize {
        self.assigned + self.has_zero_key as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
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

    #[inline]
    fn slot_of(&self, key: &K) -> usize {
        mix64(self.strategy.hash(key) ^ self.perturbation) as usize & self.mask
    }

    /// True if `key` is stored. On a hit, records the slot for
    /// `lslot`/`lkey`/`lget`.
    pub fn contains(&self, key: K) -> bool {
        if key == K::ZERO {
            if self.has_zero_key {
                self.last_slot.set(self.capacity());
                return true;
            }
            self.last_slot.set(NO_SLOT);
            return false;
        }
        let mut slot = self.slot_of(&key);
        loop {
            let existing = self.keys[slot];
            if existing == K::ZERO {
                self.last_slot.set(NO_SLOT);
                return false;
            }
            if self.strategy.equals(&existing, &key) {
                self.last_slot.set(slot);
                return true;
            }
            slot = (slot + 1) & self.mask;
        }
    }

    /// Value stored for `key`, or `V::default()` when absent. Use
    /// `contains` (or `lget` after it) to distinguish a stored default
    /// from an absent key.
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
        let slot = self.lslot();
        if slot == self.capacity() {
            K::ZERO
        } else {
            self.keys[slot]
        }
    }

    /// Value matched by the most recent successful lookup.
    pub fn lget(&self) -> V {
        self.values[self.lslot()]
    }

    /// Insert or overwrite. Returns true if the key was newly inserted,
    /// false if it was already present (value replaced; never grows).
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let _m = self.guard.enter_mut();
        if key == K::ZERO {
            let resident = self.has_zero_key;
            self.has_zero_key = true;
            let cap = self.capacity();
            self.values[cap] = value;
            return !resident;
        }
        let mut slot = self.slot_of(&key);
        loop {
            let existing = self.keys[slot];
            if existing == K::ZERO {
                break;
            }
            if self.strategy.equals(&existing, &key) {
                self.values[slot] = value;
                return false;
            }
            slot = (slot + 1) & self.mask;
        }
        if self.assigned >= self.resize_at {
            self.grow_and_insert(slot, key, value);
        } else {
            self.keys[slot] = key;
            self.values[slot] = value;
        }
        self.assigned += 1;
        true
    }

    // The probe found an empty slot but the table is at its threshold.
    // Place the pending entry in the old arrays (the empty slot proves
    // there is room), then replay everything into doubled storage, so the
    // new entry goes through the same rehash as every resident one.
    fn grow_and_insert(&mut self, slot: usize, key: K, value: V) {
        self.keys[slot] = key;
        self.values[slot] = value;
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

    // Allocate fresh arrays at `new_capacity`, recompute the perturbation,
    // and re-insert every occupied entry through the new probe sequence.
    fn rehash(&mut self, new_capacity: usize) {
        let old_keys = std::mem::replace(&mut self.keys, vec![K::ZERO; new_capacity]);
        let old_values = std::mem::replace(&mut self.values, vec![V::default(); new_capacity + 1]);
        self.mask = new_capacity - 1;
        self.resize_at = hashing::expand_at(new_capacity, self.load_factor);
        self.perturbation = perturbation_for(new_capacity);
        for (i, &key) in old_keys.iter().enumerate() {
            if key != K::ZERO {
                let mut slot = self.slot_of(&key);
                while self.keys[slot] != K::ZERO {
                    slot = (slot + 1) & self.mask;
                }
                self.keys[slot] = key;
                self.values[slot] = old_values[i];
            }
        }
        if self.has_zero_key {
            self.values[new_capacity] = old_values[old_keys.len()];
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
        if key == K::ZERO {
            if !self.has_zero_key {
                return None;
            }
            self.has_zero_key = false;
            let cap = self.capacity();
            let previous = self.values[cap];
            self.values[cap] = V::default();
            self.last_slot.set(NO_SLOT);
            return Some(previous);
        }
        let mut slot = self.slot_of(&key);
        loop {
            let existing = self.keys[slot];
            if existing == K::ZERO {
                return None;
            }
            if self.strategy.equals(&existing, &key) {
                let previous = self.values[slot];
                self.shift_conflicting_keys(slot);
                self.last_slot.set(NO_SLOT);
                return Some(previous);
            }
            slot = (slot + 1) & self.mask;
        }
    }

    // Backward-shift deletion. Walk the probe chain behind the gap; an
    // entry moves into the gap iff its wrapped distance from its ideal
    // slot spans the gap, i.e. it would still be reachable afterwards.
    fn shift_conflicting_keys(&mut self, mut gap: usize) {
        let mask = self.mask;
        let mut distance = 0;
        loop {
            distance += 1;
            let slot = (gap + distance) & mask;
            let existing = self.keys[slot];
            if existing == K::ZERO {
                break;
            }
            let ideal = self.slot_of(&existing);
            if (slot.wrapping_sub(ideal) & mask) >= distance {
                self.keys[gap] = existing;
                self.values[gap] = self.values[slot];
                gap = slot;
                distance = 0;
            }
        }
        self.keys[gap] = K::ZERO;
        self.values[gap] = V::default();
        self.assigned -= 1;
    }

    /// Reset occupancy and counts; backing arrays keep their capacity.
    pub fn clear(&mut self) {
        let _m = self.guard.enter_mut();
        self.assigned = 0;
        self.has_zero_key = false;
        self.keys.fill(K::ZERO);
        let cap = self.capacity();
        self.values[cap] = V::default();
        self.last_slot.set(NO_SLOT);
    }

    /// Remove every entry matching `predicate`; returns how many were
    /// removed. A panicking predicate propagates; entries already visited
    /// stay removed and the container remains fully consistent.
    pub fn remove_all(&mut self, mut predicate: impl FnMut(K, V) -> bool) -> usize {
        let _m = self.guard.enter_mut();
        let before = self.len();
        if self.has_zero_key {
            let cap = self.capacity();
            if predicate(K::ZERO, self.values[cap]) {
                self.has_zero_key = false;
                self.values[cap] = V::default();
            }
        }
        let mut slot = 0;
        while slot < self.keys.len() {
            let existing = self.keys[slot];
            if existing != K::ZERO && predicate(existing, self.values[slot]) {
                // The shift may pull a later entry into this slot;
                // re-examine it before moving on.
                self.shift_conflicting_keys(slot);
            } else {
                slot += 1;
            }
        }
        self.last_slot.set(NO_SLOT);
        before - self.len()
    }

    /// Keep only entries matching `predicate`; returns how many were
    /// removed. Same panic semantics as `remove_all`.
    pub fn retain_all(&mut self, mut predicate: impl FnMut(K, V) -> bool) -> usize {
        self.remove_all(move |k, v| !predicate(k, v))
    }

    /// Remove every entry whose key is present in `keys`; returns how
    /// many were removed. Each side probes under its own strategy.
    pub fn remove_all_in<S2>(&mut self, keys: &crate::open_hash_set::OpenHashSet<K, S2>) -> usize
    where
        S2: KeyStrategy<K>,
    {
        self.remove_all(|k, _| keys.contains(k))
    }

    /// Order-independent hash over all entries, honoring the strategy.
    pub fn hash_code(&self) -> u64 {
        let mut h = 0u64;
        if self.has_zero_key {
            let zero_value = self.values[self.capacity()];
            h = h.wrapping_add(mix64(self.strategy.hash(&K::ZERO)) ^ mix64(zero_value.bits()));
        }
        for slot in 0..self.keys.len() {
            let key = self.keys[slot];
            if key != K::ZERO {
                h = h.wrapping_add(mix64(self.strategy.hash(&key)) ^ mix64(self.values[slot].bits()));
            }
        }
        h
    }

    /// Pooled iterator over `(key, value)` entries. Exhausting it returns
    /// its cursor to the pool automatically; abandoning it mid-walk does
    /// not; call `release` or accept a bounded leak.
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

    /// Internal iteration with early stop: the walk ends when `predicate`
    /// returns false. The borrowed cursor is returned either way.
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
        let zero = if self.has_zero_key {
            Some(K::ZERO)
        } else {
            None
        };
        zero.into_iter()
            .chain(self.keys.iter().copied().filter(|&k| k != K::ZERO))
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

impl<K, V, S> PartialEq for OpenHashMap<K, V, S>
where
    K: PrimKey,
    V: PrimValue,
    S: KeyStrategy<K> + PartialEq,
{
    /// Equal iff the strategies compare equal, the sizes match, and every
    /// entry of one is present with an equal value in the other (each side
    /// probed under its own strategy).
    fn eq(&self, other: &Self) -> bool {
        if self.strategy != other.strategy || self.len() != other.len() {
            return false;
        }
        if self.has_zero_key
            && !(other.contains(K::ZERO) && other.lget() == self.values[self.capacity()])
        {
            return false;
        }
        for slot in 0..self.keys.len() {
            let key = self.keys[slot];
            if key != K::ZERO && !(other.contains(key) && other.lget() == self.values[slot]) {
                return false;
            }
        }
        true
    }
}

impl<K, V, S> Hash for OpenHashMap<K, V, S>
where
    K: PrimKey,
    V: PrimValue,
    S: KeyStrategy<K>,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl<K, V, S> Clone for OpenHashMap<K, V, S>
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
            has_zero_key: self.has_zero_key,
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

impl<K, V, S> fmt::Debug for OpenHashMap<K, V, S>
where
    K: PrimKey + fmt::Debug,
    V: PrimValue + fmt::Debug,
    S: KeyStrategy<K>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Raw slot walk: Debug must not touch the iterator pool.
        let mut map = f.debug_map();
        if self.has_zero_key {
            map.entry(&K::ZERO, &self.values[self.capacity()]);
        }
        for slot in 0..self.keys.len() {
            let key = self.keys[slot];
            if key != K::ZERO {
                map.entry(&key, &self.values[slot]);
            }
        }
        map.finish()
    }
}

impl<K, V> FromIterator<(K, V)> for OpenHashMap<K, V>
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

impl<K, V, S> Extend<(K, V)> for OpenHashMap<K, V, S>
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

impl<'a, K, V, S> IntoIterator for &'a OpenHashMap<K, V, S>
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

/// Pooled iterator over a map's entries.
///
/// Walks occupied slots in ascending order, then the out-of-band zero
/// key. Exhaustion is the only automatic release path; there is
/// deliberately no `Drop` impl, so breaking out of a loop leaks the
/// cursor from the pool (bounded by the pool cap) unless `release` is
/// called.
pub struct Iter<'a, K, V, S> {
    map: &'a OpenHashMap<K, V, S>,
    cursor: Option<Cursor>,
}

impl<'a, K, V, S> Iter<'a, K, V, S>
where
    K: PrimKey,
    V: PrimValue,
    S: KeyStrategy<K>,
{
    /// Return the cursor to the pool. Idempotent: releasing an already
    /// released (or exhausted) iterator has no effect.
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
            let key = self.map.keys[slot];
            if key != K::ZERO {
                return Some((key, self.map.values[slot]));
            }
        }
        if cursor.slot == cap {
            cursor.slot += 1;
            if self.map.has_zero_key {
                return Some((K::ZERO, self.map.values[cap]));
            }
        }
        let cursor = self.cursor.take().expect("cursor present at exhaustion");
        self.map.pool.release_cursor(cursor);
        None
    }
}

/// Read view over a map's keys.
pub struct Keys<'a, K, V, S> {
    map: &'a OpenHashMap<K, V, S>,
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

/// Read view over a map's values.
pub struct Values<'a, K, V, S> {
    map: &'a OpenHashMap<K, V, S>,
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
