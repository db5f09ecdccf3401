//! Error types for the glyphcache library.
//!
//! ## Key Components
//!
//! - [`CacheError`]: Returned by lookups and by the external face manager
//!   and glyph engine the caches call into.
//! - [`InvariantError`]: Returned when internal data-structure invariants are
//!   violated (`check_invariants` methods).
//! - [`ConfigError`]: Returned when cache configuration parameters are invalid
//!   (e.g. a zero byte budget, a bucket count that is not a power of two).
//!
//! ## Example Usage
//!
//! ```
//! use glyphcache::builder::CacheBuilder;
//! use glyphcache::error::ConfigError;
//!
//! // Fallible constructor for user-configurable parameters
//! let cache = CacheBuilder::new().max_weight(64 * 1024).try_build_image();
//! assert!(cache.is_ok());
//!
//! // Invalid budget is caught without panicking
//! let bad = CacheBuilder::new().max_weight(0).try_build_image();
//! assert!(bad.is_err());
//! ```

use std::fmt;

use crate::face::FaceId;
use crate::glyph::GlyphFormat;

// ---------------------------------------------------------------------------
// CacheError
// ---------------------------------------------------------------------------

/// Error returned by cache lookups.
///
/// Errors coming from the face manager or the glyph engine are propagated
/// unchanged; the cache never retries. A failed lookup leaves the cache as it
/// was before the call, apart from recency updates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// A caller-supplied argument cannot be served (empty scaler, glyph index
    /// outside the face).
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// An allocation for a node, family or buffer failed.
    #[error("out of memory")]
    OutOfMemory,

    /// The face manager could not resolve the face or size for a scaler.
    #[error("unknown face or size for face id {0}")]
    UnknownFaceOrSize(FaceId),

    /// The glyph engine produced an image the cache cannot store.
    #[error("unsupported glyph format {0:?}")]
    UnsupportedGlyphFormat(GlyphFormat),

    /// The glyph engine failed to load or render a glyph.
    #[error("failed to load glyph {gindex}: {reason}")]
    GlyphLoad { gindex: u32, reason: String },
}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
///
/// Produced by `check_invariants` methods on cache types (e.g.
/// [`GlyphCache::check_invariants`](crate::cache::GlyphCache::check_invariants)).
/// Carries a human-readable description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
///
/// Produced by [`CacheBuilder`](crate::builder::CacheBuilder) `try_build_*`
/// methods. Carries a human-readable description of which parameter failed
/// validation.
///
/// # Example
///
/// ```
/// use glyphcache::builder::CacheBuilder;
///
/// let err = CacheBuilder::new().initial_buckets(12).try_build_sbit().unwrap_err();
/// assert!(err.to_string().contains("power of two"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- CacheError -------------------------------------------------------

    #[test]
    fn cache_error_display() {
        assert_eq!(
            CacheError::InvalidArgument("empty scaler").to_string(),
            "invalid argument: empty scaler"
        );
        assert_eq!(CacheError::OutOfMemory.to_string(), "out of memory");
        assert_eq!(
            CacheError::UnknownFaceOrSize(FaceId(7)).to_string(),
            "unknown face or size for face id 7"
        );
        let err = CacheError::GlyphLoad {
            gindex: 42,
            reason: "bad outline".into(),
        };
        assert_eq!(err.to_string(), "failed to load glyph 42: bad outline");
    }

    #[test]
    fn cache_error_names_format() {
        let err = CacheError::UnsupportedGlyphFormat(GlyphFormat::Composite);
        assert!(err.to_string().contains("Composite"));
    }

    #[test]
    fn cache_error_implements_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<CacheError>();
    }

    // -- InvariantError ---------------------------------------------------

    #[test]
    fn invariant_display_shows_message() {
        let err = InvariantError::new("bucket chain mismatch");
        assert_eq!(err.to_string(), "bucket chain mismatch");
        assert_eq!(err.message(), "bucket chain mismatch");
    }

    #[test]
    fn invariant_clone_and_eq() {
        let a = InvariantError::new("x");
        let b = a.clone();
        assert_eq!(a, b);
    }

    // -- ConfigError ------------------------------------------------------

    #[test]
    fn config_display_shows_message() {
        let err = ConfigError::new("max_weight must be > 0");
        assert_eq!(err.to_string(), "max_weight must be > 0");
        assert_eq!(err.message(), "max_weight must be > 0");
    }

    #[test]
    fn config_implements_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<ConfigError>();
    }
}
