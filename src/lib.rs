//! glyphcache: MRU-ordered, weight-bounded caches for glyph images and small
//! bitmaps, keyed by rendering configuration and glyph index.
//!
//! The caches sit between text layout and an external face manager / glyph
//! engine (see [`face`]). A lookup either returns cached glyph data or loads
//! it once through the manager; a byte budget bounds what is kept, evicting
//! the least recently used unpinned nodes first.
//!
//! ```
//! use glyphcache::prelude::*;
//!
//! let cache = CacheBuilder::new().max_weight(256 * 1024).try_build_sbit().unwrap();
//! assert_eq!(cache.len(), 0);
//! ```
//!
//! See `DESIGN.md` for internal architecture and invariants.

pub mod builder;
pub mod cache;
pub mod ds;
pub mod error;
pub mod face;
pub mod family;
pub mod glyph;
pub mod image;
pub mod metrics;
pub mod node;
pub mod prelude;
pub mod sbit;

#[cfg(test)]
mod testing;
