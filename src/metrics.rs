//! Lookup and eviction counters for a glyph cache.
//!
//! Counting is always on and costs one integer increment per event; caches
//! are single-threaded, so the counters are plain integers rather than
//! atomics. Read them with [`GlyphCache::metrics`](crate::cache::GlyphCache::metrics).

/// Snapshot of a cache's counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheMetrics {
    /// Calls to any lookup entry point.
    pub lookups: u64,
    /// Lookups answered from an existing node.
    pub hits: u64,
    /// Lookups that had to create a node.
    pub misses: u64,
    /// Nodes created from freshly loaded glyph data.
    pub loads: u64,
    /// Node creations that failed and were reported to the caller.
    pub load_failures: u64,
    /// Nodes dropped by the budget sweep.
    pub evictions: u64,
    /// Nodes dropped because their family went away (face removal,
    /// family recycling, `clear`).
    pub invalidations: u64,
    pub families_created: u64,
    pub families_removed: u64,
    /// Bucket table grow or shrink operations.
    pub resizes: u64,
}

impl CacheMetrics {
    /// Fraction of lookups served without loading, or `0.0` before the first
    /// lookup.
    pub fn hit_ratio(&self) -> f64 {
        if self.lookups == 0 {
            0.0
        } else {
            self.hits as f64 / self.lookups as f64
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct CacheCounters {
    current: CacheMetrics,
}

impl CacheCounters {
    pub(crate) fn snapshot(&self) -> CacheMetrics {
        self.current
    }

    pub(crate) fn reset(&mut self) {
        self.current = CacheMetrics::default();
    }

    pub(crate) fn inc_lookup(&mut self) {
        self.current.lookups += 1;
    }

    pub(crate) fn inc_hit(&mut self) {
        self.current.hits += 1;
    }

    pub(crate) fn inc_miss(&mut self) {
        self.current.misses += 1;
    }

    pub(crate) fn inc_load(&mut self) {
        self.current.loads += 1;
    }

    pub(crate) fn inc_load_failure(&mut self) {
        self.current.load_failures += 1;
    }

    pub(crate) fn inc_eviction(&mut self) {
        self.current.evictions += 1;
    }

    pub(crate) fn add_invalidations(&mut self, count: usize) {
        self.current.invalidations += count as u64;
    }

    pub(crate) fn inc_family_created(&mut self) {
        self.current.families_created += 1;
    }

    pub(crate) fn inc_family_removed(&mut self) {
        self.current.families_removed += 1;
    }

    pub(crate) fn inc_resize(&mut self) {
        self.current.resizes += 1;
    }
}
