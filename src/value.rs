//! The element bound shared by every stream in the kernel.

use std::hash::Hash;

/// Marker bound for anything that can flow through the kernel as a value.
///
/// Mirrors the blanket `Data` bound the upstream dataflow engine places on
/// collection elements, minus the `Send`/`Sync`/serialization bounds that
/// only matter to a multi-worker, wire-transmitting engine: this kernel is
/// single-threaded and in-process (see the crate root docs).
pub trait Value: Clone + Eq + Hash + 'static {}

impl<T: Clone + Eq + Hash + 'static> Value for T {}

/// A finite `f64` ordered and hashed by bit pattern, so it can stand in a
/// [`Value`] slot the way `indexmap`/`fnv`-keyed state requires.
///
/// Two distinct bit patterns that happen to compare equal under IEEE-754
/// (`-0.0`/`0.0`) are treated as distinct here; every producer in this
/// crate (`avg`, `median`) always emits values built the same way for the
/// same inputs, so this never causes spurious duplicate groups in practice.
#[derive(Debug, Clone, Copy, PartialOrd)]
pub struct Quotient(pub f64);

impl PartialEq for Quotient {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Quotient {}

impl Hash for Quotient {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl From<f64> for Quotient {
    fn from(value: f64) -> Self {
        Quotient(value)
    }
}

impl From<Quotient> for f64 {
    fn from(value: Quotient) -> Self {
        value.0
    }
}

/// Process-wide allocator for the stable tags used to total-order values
/// that compare equal under a user comparator (see `operators::topk`).
///
/// A single allocator is shared across all graphs in a process; this is the
/// one piece of global mutable state the kernel keeps, and it is otherwise
/// harmless: tags are only ever compared for ordering, never serialized or
/// persisted, so collisions across graphs are not observable.
pub(crate) mod tag {
    use std::sync::atomic::{AtomicU64, Ordering};

    static NEXT_TAG: AtomicU64 = AtomicU64::new(0);

    /// Returns a fresh tag, strictly greater than every previously allocated one.
    pub(crate) fn next() -> u64 {
        NEXT_TAG.fetch_add(1, Ordering::Relaxed)
    }
}
