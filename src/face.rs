//! Interfaces to the face manager and glyph engine the caches sit in front of.
//!
//! Opening font files, owning face lifetimes, hinting and rasterising are not
//! done here. A cache only needs to turn a [`Scaler`] into a sized [`Face`]
//! (through a [`FaceManager`]) and ask that face to load one glyph.
//!
//! ```text
//!   caller ──lookup(scaler, flags, gindex)──► GlyphCache
//!                                                │ miss
//!                                                ▼
//!                                  FaceManager::lookup_size(scaler)
//!                                                │
//!                                                ▼
//!                                  Face::load_glyph(gindex, flags) ──► GlyphSlot
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::error::CacheError;
use crate::glyph::GlyphSlot;

/// Opaque identifier the face manager hands out for a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaceId(pub u64);

impl FaceId {
    /// Well-mixed hash of the identifier.
    pub fn hash_code(self) -> u64 {
        let mut hasher = FxHasher::default();
        self.0.hash(&mut hasher);
        hasher.finish()
    }
}

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

bitflags::bitflags! {
    /// Options forwarded to the glyph engine when loading a glyph.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LoadFlags: u32 {
        const NO_SCALE = 1 << 0;
        const NO_HINTING = 1 << 1;
        /// Render the glyph to a bitmap after loading it.
        const RENDER = 1 << 2;
        const NO_BITMAP = 1 << 3;
        const VERTICAL_LAYOUT = 1 << 4;
        const FORCE_AUTOHINT = 1 << 5;
        const CROP_BITMAP = 1 << 6;
        const PEDANTIC = 1 << 7;
        const IGNORE_GLOBAL_ADVANCE_WIDTH = 1 << 9;
        const NO_RECURSE = 1 << 10;
        const IGNORE_TRANSFORM = 1 << 11;
        const MONOCHROME = 1 << 12;
        const LINEAR_DESIGN = 1 << 13;
        const SBITS_ONLY = 1 << 14;
        const NO_AUTOHINT = 1 << 15;
        const COLOR = 1 << 20;
        const COMPUTE_METRICS = 1 << 21;
        const BITMAP_METRICS_ONLY = 1 << 22;
    }
}

/// Describes how a face is sized.
///
/// With `pixel` set, `width` and `height` are pixel sizes and the resolution
/// fields are ignored. Otherwise they are 26.6 point sizes rendered at
/// `x_res` × `y_res` dpi.
#[derive(Debug, Clone, Copy)]
pub struct Scaler {
    pub face_id: FaceId,
    pub width: u32,
    pub height: u32,
    pub pixel: bool,
    pub x_res: u32,
    pub y_res: u32,
}

impl Scaler {
    /// Scaler for a pixel size.
    pub fn pixels(face_id: FaceId, width: u32, height: u32) -> Self {
        Self {
            face_id,
            width,
            height,
            pixel: true,
            x_res: 0,
            y_res: 0,
        }
    }

    /// Scaler for a 26.6 point size at the given resolution.
    pub fn points(face_id: FaceId, width: u32, height: u32, x_res: u32, y_res: u32) -> Self {
        Self {
            face_id,
            width,
            height,
            pixel: false,
            x_res,
            y_res,
        }
    }

    /// Hash consistent with `==`: the resolution only contributes for point
    /// sizes.
    pub fn hash_code(&self) -> u64 {
        let mut hash = self
            .face_id
            .hash_code()
            .wrapping_add(u64::from(self.width))
            .wrapping_add(u64::from(self.height).wrapping_mul(7));
        if !self.pixel {
            hash = hash.wrapping_add(
                u64::from(self.x_res).wrapping_mul(33) ^ u64::from(self.y_res).wrapping_mul(61),
            );
        }
        hash
    }

    pub fn validate(&self) -> Result<(), CacheError> {
        if self.width == 0 && self.height == 0 {
            return Err(CacheError::InvalidArgument("scaler has neither width nor height"));
        }
        Ok(())
    }
}

impl PartialEq for Scaler {
    fn eq(&self, other: &Self) -> bool {
        self.face_id == other.face_id
            && self.width == other.width
            && self.height == other.height
            && self.pixel == other.pixel
            && (self.pixel || (self.x_res == other.x_res && self.y_res == other.y_res))
    }
}

impl Eq for Scaler {}

/// Shorthand for a pixel-sized scaler plus load flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageType {
    pub face_id: FaceId,
    pub width: u32,
    pub height: u32,
    pub flags: LoadFlags,
}

impl ImageType {
    pub fn scaler(&self) -> Scaler {
        Scaler::pixels(self.face_id, self.width, self.height)
    }
}

/// A live face, already sized when handed out by
/// [`FaceManager::lookup_size`].
pub trait Face {
    /// Number of glyph slots the face addresses.
    fn num_glyphs(&self) -> u32;

    /// Loads glyph `gindex`. With [`LoadFlags::RENDER`] the slot holds a
    /// bitmap on success.
    fn load_glyph(&mut self, gindex: u32, flags: LoadFlags) -> Result<GlyphSlot, CacheError>;
}

/// Resolves face identifiers and scalers to live faces.
///
/// Whoever owns the manager must call
/// [`GlyphCache::remove_face_id`](crate::cache::GlyphCache::remove_face_id)
/// on every cache before dropping a face.
pub trait FaceManager {
    type Face: Face;

    /// Returns the face for `face_id`, unsized.
    fn lookup_face(&mut self, face_id: FaceId) -> Result<&mut Self::Face, CacheError>;

    /// Returns the face for `scaler.face_id` with the size for `scaler`
    /// selected.
    fn lookup_size(&mut self, scaler: &Scaler) -> Result<&mut Self::Face, CacheError>;
}
