//! Configuration and construction of glyph caches.
//!
//! ## Example
//!
//! ```rust
//! use glyphcache::builder::CacheBuilder;
//!
//! let images = CacheBuilder::new()
//!     .max_weight(512 * 1024)
//!     .max_families(32)
//!     .try_build_image()
//!     .unwrap();
//! assert_eq!(images.max_weight(), 512 * 1024);
//!
//! let sbits = CacheBuilder::new().max_nodes(256).try_build_sbit().unwrap();
//! assert!(sbits.is_empty());
//! ```

use crate::cache::GlyphCache;
use crate::error::ConfigError;
use crate::image::ImageCache;
use crate::node::GlyphNode;
use crate::sbit::SBitCache;

/// Byte budget used when none is configured.
pub const DEFAULT_MAX_WEIGHT: usize = 200_000;

/// Bucket count a new cache starts with, and the floor it shrinks back to.
pub const DEFAULT_INITIAL_BUCKETS: usize = 8;

/// Limits and sizing for one cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Total node weight the cache tries to stay under.
    pub max_weight: usize,
    /// Maximum number of nodes; `0` means only the byte budget applies.
    pub max_nodes: usize,
    /// Maximum number of families; `0` means unbounded. Recycling a family
    /// drops all of its nodes.
    pub max_families: usize,
    /// Initial bucket count; must be a power of two.
    pub initial_buckets: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_weight: DEFAULT_MAX_WEIGHT,
            max_nodes: 0,
            max_families: 0,
            initial_buckets: DEFAULT_INITIAL_BUCKETS,
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_weight == 0 {
            return Err(ConfigError::new("max_weight must be greater than zero"));
        }
        if self.initial_buckets == 0 || !self.initial_buckets.is_power_of_two() {
            return Err(ConfigError::new(format!(
                "initial_buckets must be a power of two, got {}",
                self.initial_buckets
            )));
        }
        Ok(())
    }
}

/// Builder for [`ImageCache`] and [`SBitCache`].
#[derive(Debug, Clone, Default)]
pub struct CacheBuilder {
    config: CacheConfig,
}

impl CacheBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_weight(mut self, bytes: usize) -> Self {
        self.config.max_weight = bytes;
        self
    }

    pub fn max_nodes(mut self, nodes: usize) -> Self {
        self.config.max_nodes = nodes;
        self
    }

    pub fn max_families(mut self, families: usize) -> Self {
        self.config.max_families = families;
        self
    }

    pub fn initial_buckets(mut self, buckets: usize) -> Self {
        self.config.initial_buckets = buckets;
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Builds a cache for any node type.
    pub fn try_build<N: GlyphNode>(&self) -> Result<GlyphCache<N>, ConfigError> {
        GlyphCache::new(self.config)
    }

    pub fn try_build_image(&self) -> Result<ImageCache, ConfigError> {
        self.try_build()
    }

    pub fn try_build_sbit(&self) -> Result<SBitCache, ConfigError> {
        self.try_build()
    }
}
