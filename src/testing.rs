//! In-memory face manager used by the unit tests.

use rustc_hash::FxHashMap;

use crate::error::CacheError;
use crate::face::{Face, FaceId, FaceManager, LoadFlags, Scaler};
use crate::glyph::{Bitmap, GlyphSlot, Outline, PixelMode, SlotImage, Vector};

/// Face whose glyph `g` is an outline with `g + 1` points, or a
/// `(g % 8 + 1)` × 2 gray bitmap filled with `g` when rendered.
#[derive(Debug, Default)]
pub(crate) struct FakeFace {
    pub num_glyphs: u32,
    /// Glyph indices whose load fails.
    pub broken: Vec<u32>,
    /// Glyph indices that load as composites.
    pub composite: Vec<u32>,
    pub loads: Vec<u32>,
}

impl FakeFace {
    pub fn new(num_glyphs: u32) -> Self {
        Self {
            num_glyphs,
            ..Self::default()
        }
    }
}

impl Face for FakeFace {
    fn num_glyphs(&self) -> u32 {
        self.num_glyphs
    }

    fn load_glyph(&mut self, gindex: u32, flags: LoadFlags) -> Result<GlyphSlot, CacheError> {
        self.loads.push(gindex);
        if gindex >= self.num_glyphs || self.broken.contains(&gindex) {
            return Err(CacheError::GlyphLoad {
                gindex,
                reason: "no such glyph".into(),
            });
        }
        if self.composite.contains(&gindex) {
            return Ok(GlyphSlot {
                advance: Vector::new(0, 0),
                image: SlotImage::Composite,
            });
        }

        let advance = Vector::new(((gindex % 8 + 1) * 64) as i32, 0);
        let image = if flags.contains(LoadFlags::RENDER) {
            let width = gindex % 8 + 1;
            SlotImage::Bitmap {
                bitmap: Bitmap {
                    rows: 2,
                    width,
                    pitch: width as i32,
                    pixel_mode: PixelMode::Gray,
                    num_grays: 256,
                    buffer: vec![gindex as u8; (width * 2) as usize],
                },
                left: 1,
                top: 2,
            }
        } else {
            let points = (0..=gindex as i32).map(|i| Vector::new(i * 64, 0)).collect::<Vec<_>>();
            SlotImage::Outline(Outline {
                tags: vec![1; points.len()],
                contours: vec![gindex as u16],
                points,
            })
        };
        Ok(GlyphSlot { advance, image })
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeManager {
    pub faces: FxHashMap<FaceId, FakeFace>,
    pub face_lookups: usize,
    pub size_lookups: usize,
}

impl FakeManager {
    pub fn with_face(face_id: FaceId, num_glyphs: u32) -> Self {
        let mut manager = Self::default();
        manager.faces.insert(face_id, FakeFace::new(num_glyphs));
        manager
    }

    pub fn face(&mut self, face_id: FaceId) -> &mut FakeFace {
        self.faces.entry(face_id).or_default()
    }

    /// Glyph loads across all faces.
    pub fn loads(&self) -> usize {
        self.faces.values().map(|face| face.loads.len()).sum()
    }
}

impl FaceManager for FakeManager {
    type Face = FakeFace;

    fn lookup_face(&mut self, face_id: FaceId) -> Result<&mut FakeFace, CacheError> {
        self.face_lookups += 1;
        self.faces
            .get_mut(&face_id)
            .ok_or(CacheError::UnknownFaceOrSize(face_id))
    }

    fn lookup_size(&mut self, scaler: &Scaler) -> Result<&mut FakeFace, CacheError> {
        self.size_lookups += 1;
        self.faces
            .get_mut(&scaler.face_id)
            .ok_or(CacheError::UnknownFaceOrSize(scaler.face_id))
    }
}
