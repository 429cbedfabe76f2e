//! probe-collections: primitive-specialized open-addressing hash sets and
//! maps with pooled, leak-tolerant iterators.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: store numeric and other small `Copy` keys without the per-entry
//!   overhead generic collections impose, in safe, verifiable layers so
//!   each piece can be reasoned about independently.
//! - Layers:
//!   - key/strategy: `PrimKey`/`PrimValue` describe the primitive types
//!     (zero sentinel, raw bits); `KeyStrategy` injects hash/equality,
//!     defaulting to the key's own bits and `==`.
//!   - hashing: splitmix-style mixer, per-capacity perturbation, and the
//!     capacity/load-factor policy shared by both engines.
//!   - pool: a per-container free-list of iteration cursors with a
//!     retention cap and auditable counters.
//!   - OpenHashMap/OpenHashSet: sentinel-free linear probing; `K::ZERO`
//!     marks empty slots, a stored zero key lives in an out-of-band flag
//!     plus one reserved value slot; removal is backward-shift.
//!   - RobinHoodMap/RobinHoodSet: explicit ideal-slot occupancy array,
//!     displacement-balancing insertion, early-exit lookup, and
//!     displacement-driven backward shift on removal.
//!
//! Constraints
//! - Single-threaded: containers embed `Cell`/`RefCell` state (last-match
//!   cache, iterator pool) and are not `Sync`; no internal locking.
//! - Backing storage is plain owned `Vec`s indexed by slot; capacities
//!   are powers of two and grow by doubling, never shrinking.
//! - No per-traversal allocation: iterators borrow cursors from their
//!   container's pool.
//!
//! Iterator lifecycle
//! - Exhausting an iterator returns its cursor to the pool automatically;
//!   that is the only automatic path. Breaking out of a loop (or a panic
//!   in caller code) leaves the cursor un-returned unless `release()` is
//!   called: an accepted leak bounded by the pool's retention cap, not
//!   an error. `release()` is idempotent. `for_each`/`for_each_while`
//!   own their borrow and always return it, even on early stop.
//!
//! Failure boundaries
//! - Recoverable outcomes are return values (`bool` freshness, removal
//!   counts, value-or-default). Contract violations (malformed
//!   construction arguments, last-match accessors without a prior hit)
//!   panic. User-supplied strategies and predicates may panic freely:
//!   the containers stay fully consistent for everything already
//!   processed, and debug builds trap callbacks that re-enter a mutator.
//!
//! Notes and non-goals
//! - Not thread-safe by design; no persistence, no serialization.
//! - Structural mutation while an iterator is outstanding is ruled out
//!   by the borrow checker, not a modification counter.
//! - Float keys are unsupported (NaN breaks probe invariants); floats
//!   work as values through their bit patterns.

mod guard;
mod hashing;
pub mod key;
pub mod open_hash_map;
mod open_hash_map_proptest;
pub mod open_hash_set;
pub mod pool;
pub mod robin_hood_map;
mod robin_hood_map_proptest;
pub mod robin_hood_set;
pub mod strategy;

// Public surface
pub use hashing::{
    DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR, MAX_CAPACITY, MAX_LOAD_FACTOR, MIN_CAPACITY,
    MIN_LOAD_FACTOR,
};
pub use key::{PrimKey, PrimValue};
pub use open_hash_map::OpenHashMap;
pub use open_hash_set::OpenHashSet;
pub use pool::IteratorPool;
pub use robin_hood_map::{RobinHoodMap, EMPTY_ORIGIN};
pub use robin_hood_set::RobinHoodSet;
pub use strategy::{Intrinsic, KeyStrategy};
