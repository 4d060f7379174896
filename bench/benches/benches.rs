use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use noisefield_core::{
    CaveGenerator, CaveParams, DomainWarp2D, FractalParams, NoiseGenerator, NoiseKind,
    ThermalErosion2D,
};

const SIZE: usize = 256;
const CHUNK: usize = 32;
const SEED: i64 = 2025;

fn params() -> FractalParams {
    FractalParams::new(50.0, 6, 0.5, 2.0)
}

fn bench_maps(c: &mut Criterion) {
    for kind in [NoiseKind::Perlin, NoiseKind::Simplex] {
        let g = NoiseGenerator::new(kind, SEED);
        let p = params();
        c.bench_function(&format!("{kind:?} map {SIZE}x{SIZE}, 6 octaves"), |b| {
            b.iter(|| g.generate_map(black_box(SIZE), SIZE, &p))
        });
    }
}

fn bench_chunks(c: &mut Criterion) {
    let g = NoiseGenerator::perlin(SEED);
    let p = params();
    c.bench_function("Perlin 8x8 chunks of 32 around the origin", |b| {
        b.iter(|| {
            for cy in -4..4 {
                for cx in -4..4 {
                    let _ = g.generate_chunk(black_box(cx), cy, CHUNK, &p);
                }
            }
        })
    });
}

fn bench_map_with_erosion(c: &mut Criterion) {
    let g = NoiseGenerator::perlin(SEED);
    let p = params();
    c.bench_function("Perlin map + erosion (5 iters)", |b| {
        b.iter(|| {
            let mut map = g.generate_map(SIZE, SIZE, &p).unwrap();
            ThermalErosion2D::new(5, 0.01).apply(&mut map).unwrap();
            map
        })
    });
}

fn bench_warp(c: &mut Criterion) {
    let base = NoiseGenerator::simplex(SEED);
    let warp = NoiseGenerator::simplex(SEED.wrapping_add(42));
    let dw = DomainWarp2D::new(&base, &warp, params(), 20.0).unwrap();
    c.bench_function("Simplex domain warp 256x256", |b| {
        b.iter(|| dw.generate_region(0, 0, black_box(SIZE), SIZE))
    });
}

fn bench_caves(c: &mut Criterion) {
    let caves = CaveGenerator::new(CaveParams::organic_caves().with_seed(SEED)).unwrap();
    c.bench_function("Cave generate 128x128 (smoothing + region cleanup)", |b| {
        b.iter(|| caves.generate(black_box(128), 128))
    });
}

criterion_group!(
    noise_benchmarks,
    bench_maps,
    bench_chunks,
    bench_map_with_erosion,
    bench_warp,
    bench_caves
);
criterion_main!(noise_benchmarks);
