pub use crate::builder::{CacheBuilder, CacheConfig};
pub use crate::cache::GlyphCache;
pub use crate::error::{CacheError, ConfigError, InvariantError};
pub use crate::face::{Face, FaceId, FaceManager, ImageType, LoadFlags, Scaler};
pub use crate::glyph::{
    Bitmap, Glyph, GlyphFormat, GlyphImage, GlyphSlot, Outline, PixelMode, SlotImage,
    SvgDocument, Vector,
};
pub use crate::image::{ImageCache, ImageNode};
pub use crate::metrics::CacheMetrics;
pub use crate::node::{GlyphNode, Pinned};
pub use crate::sbit::{ITEMS_PER_NODE, SBit, SBitCache, SBitNode};
