//! Scripted face manager shared by the integration tests.

#![allow(dead_code)]

use rustc_hash::FxHashMap;

use glyphcache::prelude::*;

/// Per-face behaviour of [`ScriptedManager`].
#[derive(Debug, Clone)]
pub struct FaceScript {
    pub num_glyphs: u32,
    /// Glyph indices the engine refuses to load.
    pub broken: Vec<u32>,
    pub loads: Vec<(u32, LoadFlags)>,
}

impl FaceScript {
    fn new(num_glyphs: u32) -> Self {
        Self {
            num_glyphs,
            broken: Vec::new(),
            loads: Vec::new(),
        }
    }
}

impl Face for FaceScript {
    fn num_glyphs(&self) -> u32 {
        self.num_glyphs
    }

    /// Glyph `g` renders to a `(g % 10 + 1)` × 3 bitmap filled with `g`, or
    /// loads as an outline with `g % 5 + 3` points.
    fn load_glyph(&mut self, gindex: u32, flags: LoadFlags) -> Result<GlyphSlot, CacheError> {
        self.loads.push((gindex, flags));
        if gindex >= self.num_glyphs || self.broken.contains(&gindex) {
            return Err(CacheError::GlyphLoad {
                gindex,
                reason: "scripted failure".to_string(),
            });
        }
        let advance = Vector::new(((gindex % 10 + 1) * 64) as i32, 0);
        let image = if flags.contains(LoadFlags::RENDER) {
            let width = gindex % 10 + 1;
            SlotImage::Bitmap {
                bitmap: Bitmap {
                    rows: 3,
                    width,
                    pitch: width as i32,
                    pixel_mode: PixelMode::Gray,
                    num_grays: 256,
                    buffer: vec![gindex as u8; (width * 3) as usize],
                },
                left: 0,
                top: 3,
            }
        } else {
            let count = (gindex % 5 + 3) as usize;
            SlotImage::Outline(Outline {
                points: (0..count as i32).map(|i| Vector::new(i * 64, i * 32)).collect(),
                tags: vec![1; count],
                contours: vec![(count - 1) as u16],
            })
        };
        Ok(GlyphSlot { advance, image })
    }
}

/// Face manager over a fixed set of scripted faces that counts every call.
#[derive(Debug, Default)]
pub struct ScriptedManager {
    faces: FxHashMap<FaceId, FaceScript>,
    pub face_lookups: usize,
    pub size_lookups: usize,
}

impl ScriptedManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_face(mut self, face_id: FaceId, num_glyphs: u32) -> Self {
        self.faces.insert(face_id, FaceScript::new(num_glyphs));
        self
    }

    pub fn face(&mut self, face_id: FaceId) -> &mut FaceScript {
        self.faces
            .get_mut(&face_id)
            .expect("face registered with with_face")
    }

    /// Simulates the owner closing a face.
    pub fn close_face(&mut self, face_id: FaceId) {
        self.faces.remove(&face_id);
    }

    pub fn glyph_loads(&self) -> usize {
        self.faces.values().map(|face| face.loads.len()).sum()
    }
}

impl FaceManager for ScriptedManager {
    type Face = FaceScript;

    fn lookup_face(&mut self, face_id: FaceId) -> Result<&mut FaceScript, CacheError> {
        self.face_lookups += 1;
        self.faces
            .get_mut(&face_id)
            .ok_or(CacheError::UnknownFaceOrSize(face_id))
    }

    fn lookup_size(&mut self, scaler: &Scaler) -> Result<&mut FaceScript, CacheError> {
        self.size_lookups += 1;
        self.faces
            .get_mut(&scaler.face_id)
            .ok_or(CacheError::UnknownFaceOrSize(scaler.face_id))
    }
}
