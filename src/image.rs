//! Cache of whole glyph images, one glyph per node.

use std::mem;

use crate::cache::GlyphCache;
use crate::error::CacheError;
use crate::face::FaceManager;
use crate::family::Family;
use crate::glyph::{Glyph, GlyphImage, Vector};
use crate::node::GlyphNode;

/// Glyph image cache. Lookups return [`Glyph`]s.
pub type ImageCache = GlyphCache<ImageNode>;

/// One loaded glyph image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageNode {
    gindex: u32,
    glyph: Glyph,
}

impl ImageNode {
    pub fn glyph(&self) -> &Glyph {
        &self.glyph
    }
}

impl GlyphNode for ImageNode {
    type Item = Glyph;

    fn bucket_hash(family_hash: u64, gindex: u32) -> u64 {
        family_hash.wrapping_add(u64::from(gindex))
    }

    fn load<M: FaceManager>(family: &Family, manager: &mut M, gindex: u32) -> Result<Self, CacheError> {
        let glyph = family.load_glyph(manager, gindex)?;
        Ok(ImageNode { gindex, glyph })
    }

    fn start_index(&self) -> u32 {
        self.gindex
    }

    fn contains(&self, gindex: u32) -> bool {
        self.gindex == gindex
    }

    fn weight(&self) -> usize {
        mem::size_of::<Self>() + image_weight(&self.glyph.image)
    }

    fn item(&self, _gindex: u32) -> &Glyph {
        &self.glyph
    }
}

/// Bytes held by the image payload beyond the node itself.
fn image_weight(image: &GlyphImage) -> usize {
    match image {
        GlyphImage::Bitmap { bitmap, .. } => bitmap.byte_len(),
        GlyphImage::Outline(outline) => {
            outline.points.len() * (mem::size_of::<Vector>() + 1) + outline.contours.len() * 2
        },
        GlyphImage::Svg(svg) => svg.document.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face::{FaceId, LoadFlags, Scaler};
    use crate::glyph::{Bitmap, GlyphFormat, Outline, SvgDocument};
    use crate::testing::FakeManager;

    fn node(image: GlyphImage) -> ImageNode {
        ImageNode {
            gindex: 0,
            glyph: Glyph {
                advance: Vector::default(),
                image,
            },
        }
    }

    #[test]
    fn weight_counts_outline_points_and_contours() {
        let outline = Outline {
            points: vec![Vector::default(); 10],
            tags: vec![0; 10],
            contours: vec![4, 9],
        };
        let weight = node(GlyphImage::Outline(outline)).weight();
        assert_eq!(weight, mem::size_of::<ImageNode>() + 10 * 9 + 4);
    }

    #[test]
    fn weight_counts_bitmap_rows() {
        let bitmap = Bitmap {
            rows: 4,
            width: 10,
            pitch: -12,
            ..Bitmap::default()
        };
        let weight = node(GlyphImage::Bitmap {
            bitmap,
            left: 0,
            top: 0,
        })
        .weight();
        assert_eq!(weight, mem::size_of::<ImageNode>() + 48);
    }

    #[test]
    fn weight_counts_svg_document() {
        let svg = SvgDocument {
            document: vec![b'<'; 300],
            ..SvgDocument::default()
        };
        assert_eq!(node(GlyphImage::Svg(svg)).weight(), mem::size_of::<ImageNode>() + 300);
    }

    #[test]
    fn node_covers_exactly_one_glyph() {
        let n = ImageNode {
            gindex: 12,
            ..node(GlyphImage::Outline(Outline::default()))
        };
        assert!(n.contains(12));
        assert!(!n.contains(13));
        assert_eq!(ImageNode::bucket_hash(100, 12), 112);
    }

    #[test]
    fn composite_glyphs_are_not_cached() {
        let face = FaceId(3);
        let mut manager = FakeManager::with_face(face, 20);
        manager.face(face).composite.push(9);
        let mut cache = ImageCache::default();
        let scaler = Scaler::pixels(face, 12, 12);

        assert_eq!(
            cache.lookup(&mut manager, &scaler, LoadFlags::empty(), 9).unwrap_err(),
            CacheError::UnsupportedGlyphFormat(GlyphFormat::Composite)
        );
        assert!(cache.is_empty());
        assert_eq!(cache.family_count(), 0);
    }

    #[test]
    fn render_flag_caches_bitmaps() {
        let face = FaceId(3);
        let mut manager = FakeManager::with_face(face, 20);
        let mut cache = ImageCache::default();
        let scaler = Scaler::pixels(face, 12, 12);

        let glyph = cache.lookup(&mut manager, &scaler, LoadFlags::RENDER, 3).unwrap();
        assert_eq!(glyph.format(), GlyphFormat::Bitmap);
        assert_eq!(glyph.as_bitmap().map(|b| b.width), Some(4));

        let glyph = cache.lookup(&mut manager, &scaler, LoadFlags::empty(), 3).unwrap();
        assert_eq!(glyph.format(), GlyphFormat::Outline);
        assert_eq!(cache.family_count(), 2);
    }
}
