/// Order-dependent hash combining for binding contracts.
///
/// Root signatures and linked GL programs are compared through a hash built
/// field by field, so the combine step must depend on the order of the fields.

use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

/// Mix the hash of `value` into `seed`
pub fn hash_combine<T: Hash + ?Sized>(seed: &mut u64, value: &T) {
    let mut hasher = FxHasher::default();
    value.hash(&mut hasher);
    let h = hasher.finish();
    *seed ^= h
        .wrapping_add(0x9e37_79b9_7f4a_7c15)
        .wrapping_add(*seed << 6)
        .wrapping_add(*seed >> 2);
}

/// Chained builder over [`hash_combine`]
///
/// # Example
///
/// ```ignore
/// let hash = HashBuilder::new().add(&num_tables).add(&num_views).finish();
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct HashBuilder {
    seed: u64,
}

impl HashBuilder {
    pub fn new() -> Self {
        Self { seed: 0 }
    }

    pub fn add<T: Hash + ?Sized>(mut self, value: &T) -> Self {
        hash_combine(&mut self.seed, value);
        self
    }

    pub fn finish(self) -> u64 {
        self.seed
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "hash_tests.rs"]
mod tests;
