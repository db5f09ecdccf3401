//! Cache of small rendered bitmaps, batched several glyphs per node.
//!
//! Text tends to request runs of neighbouring glyph indices, so a node covers
//! the aligned range `[start, start + ITEMS)` and is rendered in one go when
//! it is created. Every glyph of the range hashes to the same bucket, which
//! means later lookups inside the range hit the same node without reaching
//! the glyph engine.
//!
//! Glyphs whose metrics do not fit the packed [`SBit`] fields, that fail to
//! load, or that do not render to a bitmap are kept as *missing* entries.

use std::mem;

use log::{trace, warn};

use crate::cache::GlyphCache;
use crate::error::CacheError;
use crate::face::FaceManager;
use crate::family::Family;
use crate::glyph::{GlyphSlot, PixelMode, SlotImage};
use crate::node::GlyphNode;

/// Glyphs per node in [`SBitCache`].
pub const ITEMS_PER_NODE: u32 = 16;

/// Small-bitmap cache. Lookups return [`SBit`]s.
pub type SBitCache = GlyphCache<SBitNode>;

/// A rendered glyph packed into byte-sized metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SBit {
    pub width: u8,
    pub height: u8,
    pub left: i8,
    pub top: i8,
    pub format: PixelMode,
    /// Highest gray level, `num_grays - 1`.
    pub max_grays: u8,
    pub pitch: i16,
    pub xadvance: i8,
    pub yadvance: i8,
    /// `None` marks a glyph the cache could not store.
    pub buffer: Option<Box<[u8]>>,
}

impl SBit {
    /// Entry for a glyph that has no small bitmap.
    pub fn missing() -> Self {
        Self::default()
    }

    pub fn is_missing(&self) -> bool {
        self.buffer.is_none()
    }

    pub fn buffer(&self) -> &[u8] {
        self.buffer.as_deref().unwrap_or(&[])
    }

    fn byte_len(&self) -> usize {
        if self.is_missing() {
            0
        } else {
            usize::from(self.pitch.unsigned_abs()) * usize::from(self.height)
        }
    }

    /// Packs a rendered slot. Anything that does not fit becomes a missing
    /// entry; only allocation failure is an error.
    fn from_slot(gindex: u32, slot: GlyphSlot) -> Result<Self, CacheError> {
        let SlotImage::Bitmap { bitmap, left, top } = slot.image else {
            trace!("glyph {} did not render to a bitmap", gindex);
            return Ok(SBit::missing());
        };
        let (xadvance, yadvance) = slot.advance.round_to_pixels();

        let packed = (
            u8::try_from(bitmap.width),
            u8::try_from(bitmap.rows),
            i16::try_from(bitmap.pitch),
            i8::try_from(left),
            i8::try_from(top),
            i8::try_from(xadvance),
            i8::try_from(yadvance),
        );
        let (Ok(width), Ok(height), Ok(pitch), Ok(left), Ok(top), Ok(xadvance), Ok(yadvance)) = packed
        else {
            warn!(
                "glyph {} too large for a small bitmap ({}x{}, pitch {})",
                gindex, bitmap.width, bitmap.rows, bitmap.pitch
            );
            return Ok(SBit::missing());
        };

        let len = bitmap.byte_len();
        if bitmap.buffer.len() < len {
            warn!(
                "glyph {} bitmap holds {} bytes, expected {}",
                gindex,
                bitmap.buffer.len(),
                len
            );
            return Ok(SBit::missing());
        }
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(len)
            .map_err(|_| CacheError::OutOfMemory)?;
        buffer.extend_from_slice(&bitmap.buffer[..len]);

        Ok(SBit {
            width,
            height,
            left,
            top,
            format: bitmap.pixel_mode,
            max_grays: u8::try_from(bitmap.num_grays.saturating_sub(1)).unwrap_or(u8::MAX),
            pitch,
            xadvance,
            yadvance,
            buffer: Some(buffer.into_boxed_slice()),
        })
    }
}

/// Small bitmaps for `ITEMS` consecutive glyph indices, clipped to the end of
/// the face.
///
/// `ITEMS` must be at least one; an empty batch is rejected at compile time:
///
/// ```compile_fail
/// use glyphcache::node::GlyphNode;
/// use glyphcache::sbit::SBitNode;
///
/// let _ = SBitNode::<0>::bucket_hash(0, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SBitNode<const ITEMS: u32 = ITEMS_PER_NODE> {
    gindex: u32,
    sbits: Vec<SBit>,
}

impl<const ITEMS: u32> SBitNode<ITEMS> {
    /// Glyphs actually held; less than `ITEMS` at the end of a face.
    pub fn count(&self) -> u32 {
        self.sbits.len() as u32
    }

    pub fn sbits(&self) -> &[SBit] {
        &self.sbits
    }
}

impl<const ITEMS: u32> GlyphNode for SBitNode<ITEMS> {
    type Item = SBit;

    fn bucket_hash(family_hash: u64, gindex: u32) -> u64 {
        const { assert!(ITEMS > 0, "an sbit node must hold at least one glyph") };
        family_hash.wrapping_add(u64::from(gindex / ITEMS))
    }

    fn load<M: FaceManager>(family: &Family, manager: &mut M, gindex: u32) -> Result<Self, CacheError> {
        const { assert!(ITEMS > 0, "an sbit node must hold at least one glyph") };
        let num_glyphs = family.glyph_count(manager)?;
        if gindex >= num_glyphs {
            return Err(CacheError::InvalidArgument("glyph index outside the face"));
        }
        let start = gindex - gindex % ITEMS;
        let count = (num_glyphs - start).min(ITEMS);

        let mut sbits = Vec::new();
        sbits
            .try_reserve_exact(count as usize)
            .map_err(|_| CacheError::OutOfMemory)?;

        let face = family.sized_face(manager)?;
        for index in start..start + count {
            let sbit = match family.load_bitmap(&mut *face, index) {
                Ok(slot) => SBit::from_slot(index, slot)?,
                Err(CacheError::OutOfMemory) => return Err(CacheError::OutOfMemory),
                Err(err) => {
                    trace!("glyph {} kept as missing: {}", index, err);
                    SBit::missing()
                },
            };
            sbits.push(sbit);
        }
        Ok(SBitNode { gindex: start, sbits })
    }

    fn start_index(&self) -> u32 {
        self.gindex
    }

    fn contains(&self, gindex: u32) -> bool {
        gindex >= self.gindex && gindex - self.gindex < self.count()
    }

    fn weight(&self) -> usize {
        mem::size_of::<Self>() + self.sbits.iter().map(SBit::byte_len).sum::<usize>()
    }

    fn item(&self, gindex: u32) -> &SBit {
        &self.sbits[(gindex - self.gindex) as usize]
    }
}
