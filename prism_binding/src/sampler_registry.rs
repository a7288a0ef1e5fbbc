/// SamplerRegistry - device-scoped deduplication of sampler objects
///
/// Pipelines with identical immutable samplers share one sampler instance. The
/// registry only holds weak references: a sampler lives as long as some
/// pipeline or view holds it, and dead entries are dropped by `purge` or
/// replaced on the next lookup.

use crate::resource::{Sampler, SamplerDesc};
use crate::engine_trace;
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// Content-addressed sampler cache
#[derive(Debug, Default)]
pub struct SamplerRegistry {
    cache: Mutex<FxHashMap<SamplerDesc, Weak<Sampler>>>,
}

impl SamplerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FxHashMap<SamplerDesc, Weak<Sampler>>> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Return the live sampler for `desc`, creating it under `name` if needed
    pub fn get_or_create(&self, name: &str, desc: &SamplerDesc) -> Arc<Sampler> {
        let mut cache = self.lock();
        if let Some(sampler) = cache.get(desc).and_then(Weak::upgrade) {
            return sampler;
        }

        let sampler = Sampler::new(name, *desc);
        cache.insert(*desc, Arc::downgrade(&sampler));
        engine_trace!("prism::SamplerRegistry", "Created sampler '{}' ({} registered)", name, cache.len());
        sampler
    }

    /// Live sampler for `desc`, if any
    pub fn find(&self, desc: &SamplerDesc) -> Option<Arc<Sampler>> {
        self.lock().get(desc).and_then(Weak::upgrade)
    }

    /// Drop entries whose sampler is gone; returns how many were removed
    pub fn purge(&self) -> usize {
        let mut cache = self.lock();
        let before = cache.len();
        cache.retain(|_, weak| weak.strong_count() > 0);
        before - cache.len()
    }

    /// Number of live samplers
    pub fn len(&self) -> usize {
        self.lock().values().filter(|w| w.strong_count() > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "sampler_registry_tests.rs"]
mod tests;
