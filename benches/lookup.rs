use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use glyphcache::builder::CacheBuilder;
use glyphcache::prelude::*;
use std::hint::black_box;

/// Face that renders every glyph as an 8×8 gray square.
struct SquareFace;

impl Face for SquareFace {
    fn num_glyphs(&self) -> u32 {
        4096
    }

    fn load_glyph(&mut self, gindex: u32, flags: LoadFlags) -> Result<GlyphSlot, CacheError> {
        let image = if flags.contains(LoadFlags::RENDER) {
            SlotImage::Bitmap {
                bitmap: Bitmap {
                    rows: 8,
                    width: 8,
                    pitch: 8,
                    pixel_mode: PixelMode::Gray,
                    num_grays: 256,
                    buffer: vec![gindex as u8; 64],
                },
                left: 0,
                top: 8,
            }
        } else {
            SlotImage::Outline(Outline {
                points: vec![Vector::new(0, 0), Vector::new(512, 0), Vector::new(512, 512)],
                tags: vec![1; 3],
                contours: vec![2],
            })
        };
        Ok(GlyphSlot {
            advance: Vector::new(576, 0),
            image,
        })
    }
}

struct SquareManager(SquareFace);

impl FaceManager for SquareManager {
    type Face = SquareFace;

    fn lookup_face(&mut self, _face_id: FaceId) -> Result<&mut SquareFace, CacheError> {
        Ok(&mut self.0)
    }

    fn lookup_size(&mut self, _scaler: &Scaler) -> Result<&mut SquareFace, CacheError> {
        Ok(&mut self.0)
    }
}

fn scaler() -> Scaler {
    Scaler::pixels(FaceId(1), 16, 16)
}

fn bench_image_hits(c: &mut Criterion) {
    let mut manager = SquareManager(SquareFace);
    let mut cache = ImageCache::default();
    for gindex in 0..256 {
        let _ = cache.lookup(&mut manager, &scaler(), LoadFlags::empty(), gindex);
    }
    c.bench_function("image_lookup_hit", |b| {
        b.iter(|| {
            for gindex in 0..256u32 {
                let _ = black_box(cache.lookup(
                    &mut manager,
                    &scaler(),
                    LoadFlags::empty(),
                    black_box(gindex),
                ));
            }
        })
    });
}

fn bench_image_eviction_churn(c: &mut Criterion) {
    c.bench_function("image_eviction_churn", |b| {
        b.iter_batched(
            || {
                (
                    SquareManager(SquareFace),
                    CacheBuilder::new().max_nodes(128).try_build_image().unwrap(),
                )
            },
            |(mut manager, mut cache)| {
                for gindex in 0..1024u32 {
                    let _ = black_box(cache.lookup(
                        &mut manager,
                        &scaler(),
                        LoadFlags::empty(),
                        black_box(gindex),
                    ));
                }
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_sbit_sequential_text(c: &mut Criterion) {
    c.bench_function("sbit_sequential_text", |b| {
        b.iter_batched(
            || (SquareManager(SquareFace), SBitCache::default()),
            |(mut manager, mut cache)| {
                for gindex in 32..160u32 {
                    let _ = black_box(cache.lookup(
                        &mut manager,
                        &scaler(),
                        LoadFlags::empty(),
                        black_box(gindex),
                    ));
                }
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_remove_face(c: &mut Criterion) {
    c.bench_function("remove_face_id", |b| {
        b.iter_batched(
            || {
                let mut manager = SquareManager(SquareFace);
                let mut cache = ImageCache::default();
                for size in 10..14 {
                    for gindex in 0..64 {
                        let scaler = Scaler::pixels(FaceId(u64::from(size % 2)), size, size);
                        let _ = cache.lookup(&mut manager, &scaler, LoadFlags::empty(), gindex);
                    }
                }
                cache
            },
            |mut cache| black_box(cache.remove_face_id(FaceId(0))),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_image_hits,
    bench_image_eviction_churn,
    bench_sbit_sequential_text,
    bench_remove_face
);
criterion_main!(benches);
