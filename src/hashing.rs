//! Hash mixing, perturbation, and capacity policy shared by both engines.
//!
//! Every probe sequence starts from `mix64(strategy_hash ^ perturbation)`
//! masked to the table. The perturbation is a per-capacity constant drawn
//! from a compile-time table, so the same key set does not collide into
//! the same clusters before and after a resize.

/// Smallest backing-array length a container will allocate.
pub const MIN_CAPACITY: usize = 4;

/// Largest backing-array length; construction and growth past this panic.
pub const MAX_CAPACITY: usize = 1 << 30;

/// Capacity used by `new()`.
pub const DEFAULT_CAPACITY: usize = 16;

/// Load factor used when the caller does not supply one.
pub const DEFAULT_LOAD_FACTOR: f64 = 0.75;

/// Inclusive load-factor bounds accepted at construction.
pub const MIN_LOAD_FACTOR: f64 = 0.05;
pub const MAX_LOAD_FACTOR: f64 = 1.0;

/// Last-match cache value meaning "no successful lookup on record".
pub(crate) const NO_SLOT: usize = usize::MAX;

/// Finalizer over the full 64-bit state (splitmix64). Zero maps to zero;
/// every other input avalanches across all output bits.
#[inline]
pub(crate) const fn mix64(mut x: u64) -> u64 {
    x ^= x >> 30;
    x = x.wrapping_mul(0xbf58476d1ce4e5b9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94d049bb133111eb);
    x ^= x >> 31;
    x
}

// One perturbation constant per capacity magnitude, generated at compile
// time from a splitmix64 stream. Indexed by `capacity.leading_zeros()`.
const PERTURBATIONS: [u64; 65] = {
    let mut table = [0u64; 65];
    let mut state: u64 = 0x9e3779b97f4a7c15;
    let mut i = 0;
    while i < 65 {
        state = state.wrapping_add(0x9e3779b97f4a7c15);
        table[i] = mix64(state);
        i += 1;
    }
    table
};

/// The capacity-derived value folded into every hash before mixing.
#[inline]
pub(crate) fn perturbation_for(capacity: usize) -> u64 {
    PERTURBATIONS[capacity.leading_zeros() as usize]
}

/// Round a requested capacity up to the next power of two within
/// `[MIN_CAPACITY, MAX_CAPACITY]`. Requests beyond the maximum are a
/// construction-time contract violation.
pub(crate) fn round_capacity(requested: usize) -> usize {
    assert!(
        requested <= MAX_CAPACITY,
        "requested capacity {} exceeds maximum {}",
        requested,
        MAX_CAPACITY
    );
    requested.next_power_of_two().max(MIN_CAPACITY)
}

/// Validate a caller-supplied load factor. Out-of-range or non-finite
/// values are logic errors and fail fast.
pub(crate) fn verify_load_factor(load_factor: f64) -> f64 {
    assert!(
        load_factor.is_finite()
            && load_factor >= MIN_LOAD_FACTOR
            && load_factor <= MAX_LOAD_FACTOR,
        "load factor {} outside [{}, {}]",
        load_factor,
        MIN_LOAD_FACTOR,
        MAX_LOAD_FACTOR
    );
    load_factor
}

/// Number of assigned slots at which the next new-key insert must grow
/// the table. Clamped to `capacity - 1` so at least one slot stays empty
/// and probe walks terminate; clamped to at least 1 so the table can
/// always accept a first key.
#[inline]
pub(crate) fn expand_at(capacity: usize, load_factor: f64) -> usize {
    let at = (capacity as f64 * load_factor) as usize;
    at.clamp(1, capacity - 1)
}
