//! Glyph data exchanged with the external glyph engine.
//!
//! The engine fills a [`GlyphSlot`] for every glyph it loads. The image cache
//! turns the slot into an owned [`Glyph`]; the small-bitmap cache packs the
//! rendered bitmap of the slot into an [`SBit`](crate::sbit::SBit).

use crate::error::CacheError;

/// A point or advance in 26.6 fixed point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Vector {
    pub x: i32,
    pub y: i32,
}

impl Vector {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Rounds both components from 26.6 to whole pixels. Saturates at the
    /// ends of the `i32` range.
    pub fn round_to_pixels(self) -> (i32, i32) {
        (self.x.saturating_add(32) >> 6, self.y.saturating_add(32) >> 6)
    }
}

/// Pixel layout of a [`Bitmap`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PixelMode {
    #[default]
    None = 0,
    Mono = 1,
    Gray = 2,
    Gray2 = 3,
    Gray4 = 4,
    Lcd = 5,
    LcdV = 6,
    Bgra = 7,
}

/// Rasterised glyph image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bitmap {
    pub rows: u32,
    pub width: u32,
    /// Bytes per row; negative for bottom-up storage.
    pub pitch: i32,
    pub pixel_mode: PixelMode,
    pub num_grays: u16,
    pub buffer: Vec<u8>,
}

impl Bitmap {
    /// Size of the pixel data described by `pitch` and `rows`.
    pub fn byte_len(&self) -> usize {
        self.pitch.unsigned_abs() as usize * self.rows as usize
    }
}

/// Scalable outline: points, one tag byte per point and contour end indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outline {
    pub points: Vec<Vector>,
    pub tags: Vec<u8>,
    pub contours: Vec<u16>,
}

/// An OpenType SVG document covering a range of glyphs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SvgDocument {
    pub document: Vec<u8>,
    pub start_glyph_id: u16,
    pub end_glyph_id: u16,
    pub units_per_em: u16,
}

/// Format tag of a loaded glyph image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlyphFormat {
    None,
    Composite,
    Bitmap,
    Outline,
    Plotter,
    Svg,
}

/// What the engine left in a glyph slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotImage {
    Empty,
    Composite,
    Plotter,
    Outline(Outline),
    Bitmap { bitmap: Bitmap, left: i32, top: i32 },
    Svg(SvgDocument),
}

impl SlotImage {
    pub fn format(&self) -> GlyphFormat {
        match self {
            SlotImage::Empty => GlyphFormat::None,
            SlotImage::Composite => GlyphFormat::Composite,
            SlotImage::Plotter => GlyphFormat::Plotter,
            SlotImage::Outline(_) => GlyphFormat::Outline,
            SlotImage::Bitmap { .. } => GlyphFormat::Bitmap,
            SlotImage::Svg(_) => GlyphFormat::Svg,
        }
    }
}

/// Result of a single glyph load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphSlot {
    /// Advance in 26.6 pixels.
    pub advance: Vector,
    pub image: SlotImage,
}

/// Owned image stored by the image cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlyphImage {
    Outline(Outline),
    Bitmap { bitmap: Bitmap, left: i32, top: i32 },
    Svg(SvgDocument),
}

/// A decoded glyph with exclusive ownership of its buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glyph {
    pub advance: Vector,
    pub image: GlyphImage,
}

impl Glyph {
    pub fn format(&self) -> GlyphFormat {
        match self.image {
            GlyphImage::Outline(_) => GlyphFormat::Outline,
            GlyphImage::Bitmap { .. } => GlyphFormat::Bitmap,
            GlyphImage::Svg(_) => GlyphFormat::Svg,
        }
    }

    pub fn as_outline(&self) -> Option<&Outline> {
        match &self.image {
            GlyphImage::Outline(outline) => Some(outline),
            _ => None,
        }
    }

    pub fn as_bitmap(&self) -> Option<&Bitmap> {
        match &self.image {
            GlyphImage::Bitmap { bitmap, .. } => Some(bitmap),
            _ => None,
        }
    }

    pub fn as_svg(&self) -> Option<&SvgDocument> {
        match &self.image {
            GlyphImage::Svg(svg) => Some(svg),
            _ => None,
        }
    }
}

/// Takes ownership of the slot contents. Only outline, bitmap and SVG
/// images can be kept; anything else is rejected.
impl TryFrom<GlyphSlot> for Glyph {
    type Error = CacheError;

    fn try_from(slot: GlyphSlot) -> Result<Self, Self::Error> {
        let image = match slot.image {
            SlotImage::Outline(outline) => GlyphImage::Outline(outline),
            SlotImage::Bitmap { bitmap, left, top } => GlyphImage::Bitmap { bitmap, left, top },
            SlotImage::Svg(svg) => GlyphImage::Svg(svg),
            other => return Err(CacheError::UnsupportedGlyphFormat(other.format())),
        };
        Ok(Glyph {
            advance: slot.advance,
            image,
        })
    }
}
