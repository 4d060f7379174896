use serde::{Deserialize, Serialize};

use crate::NoiseKernel;
use crate::error::{NoiseError, Result, check_dimension};
use crate::field::ScalarField2D;
use crate::fractal2::{FractalParams, FractalSampler};
use crate::perlin2::Perlin2D;
use crate::simplex2::Simplex2D;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseKind {
    #[default]
    Perlin,
    Simplex,
}

#[derive(Clone, Debug)]
enum Kernel {
    Perlin(Perlin2D),
    Simplex(Simplex2D),
}

// A seeded generator handle. Building one shuffles the permutation table once;
// every later sample, map and chunk reads that same table.
#[derive(Clone, Debug)]
pub struct NoiseGenerator {
    kind: NoiseKind,
    seed: i64,
    kernel: Kernel,
}

impl NoiseGenerator {
    pub fn new(kind: NoiseKind, seed: i64) -> Self {
        let kernel = match kind {
            NoiseKind::Perlin => Kernel::Perlin(Perlin2D::new(seed)),
            NoiseKind::Simplex => Kernel::Simplex(Simplex2D::new(seed)),
        };
        tracing::debug!(?kind, seed, "noise generator constructed");
        Self { kind, seed, kernel }
    }

    pub fn perlin(seed: i64) -> Self {
        Self::new(NoiseKind::Perlin, seed)
    }

    pub fn simplex(seed: i64) -> Self {
        Self::new(NoiseKind::Simplex, seed)
    }

    pub fn kind(&self) -> NoiseKind {
        self.kind
    }

    pub fn seed(&self) -> i64 {
        self.seed
    }

    // Single octave at (x, y), in [0, 1]
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        self.get2(x, y)
    }

    // Fractal value at one world coordinate
    pub fn sample_fractal(&self, x: f64, y: f64, params: &FractalParams) -> Result<f64> {
        Ok(self.sampler(params)?.sample(x, y))
    }

    // Validate once, sample many
    pub fn sampler(&self, params: &FractalParams) -> Result<FractalSampler<'_, Self>> {
        FractalSampler::new(self, *params)
    }

    // width×height map whose cell (x, y) is the fractal value at world (x, y)
    pub fn generate_map(
        &self,
        width: usize,
        height: usize,
        params: &FractalParams,
    ) -> Result<ScalarField2D> {
        self.generate_region(0, 0, width, height, params)
    }

    // chunk_size² block covering world coordinates starting at
    // (chunk_x * chunk_size, chunk_y * chunk_size); negative chunks are fine
    pub fn generate_chunk(
        &self,
        chunk_x: i64,
        chunk_y: i64,
        chunk_size: usize,
        params: &FractalParams,
    ) -> Result<ScalarField2D> {
        let (origin_x, origin_y) = chunk_origin(chunk_x, chunk_y, chunk_size)?;
        self.generate_region(origin_x, origin_y, chunk_size, chunk_size, params)
    }

    // Both maps and chunks come through here, so the same world
    // coordinate always goes through the same arithmetic
    pub fn generate_region(
        &self,
        origin_x: i64,
        origin_y: i64,
        width: usize,
        height: usize,
        params: &FractalParams,
    ) -> Result<ScalarField2D> {
        check_dimension("width", width)?;
        check_dimension("height", height)?;
        let sampler = self.sampler(params)?;

        tracing::debug!(
            kind = ?self.kind,
            origin_x,
            origin_y,
            width,
            height,
            octaves = params.octaves,
            "generating noise region"
        );

        Ok(ScalarField2D::from_fn(width, height, |x, y| {
            let wx = origin_x as f64 + x as f64;
            let wy = origin_y as f64 + y as f64;
            sampler.sample(wx, wy) as f32
        }))
    }
}

// World coordinate of a chunk's first cell, (chunk_x * size, chunk_y * size), overflow checked
pub(crate) fn chunk_origin(chunk_x: i64, chunk_y: i64, chunk_size: usize) -> Result<(i64, i64)> {
    check_dimension("chunk_size", chunk_size)?;
    let size = i64::try_from(chunk_size)
        .map_err(|_| NoiseError::invalid("chunk_size", chunk_size as f64, "<= i64::MAX"))?;
    let origin_x = chunk_x
        .checked_mul(size)
        .ok_or_else(|| NoiseError::invalid("chunk_x", chunk_x as f64, "chunk origin within i64"))?;
    let origin_y = chunk_y
        .checked_mul(size)
        .ok_or_else(|| NoiseError::invalid("chunk_y", chunk_y as f64, "chunk origin within i64"))?;
    Ok((origin_x, origin_y))
}

impl NoiseKernel for NoiseGenerator {
    fn raw2(&self, x: f64, y: f64) -> f64 {
        match &self.kernel {
            Kernel::Perlin(k) => k.raw2(x, y),
            Kernel::Simplex(k) => k.raw2(x, y),
        }
    }

    fn finish(&self, value: f64) -> f64 {
        match &self.kernel {
            Kernel::Perlin(k) => k.finish(value),
            Kernel::Simplex(k) => k.finish(value),
        }
    }
}

// Generator selection plus fractal shape, as read from job files
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    pub kind: NoiseKind,
    pub seed: i64, // negative = fresh entropy on every build
    pub fractal: FractalParams,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            kind: NoiseKind::Perlin,
            seed: -1,
            fractal: FractalParams::default(),
        }
    }
}

impl NoiseConfig {
    pub fn build(&self) -> NoiseGenerator {
        NoiseGenerator::new(self.kind, self.seed)
    }

    pub fn generate_map(&self, width: usize, height: usize) -> Result<ScalarField2D> {
        self.build().generate_map(width, height, &self.fractal)
    }

    pub fn generate_chunk(
        &self,
        chunk_x: i64,
        chunk_y: i64,
        chunk_size: usize,
    ) -> Result<ScalarField2D> {
        self.build()
            .generate_chunk(chunk_x, chunk_y, chunk_size, &self.fractal)
    }
}

// One-call entry points, each building a fresh generator from `seed`

pub fn generate_perlin_map(
    width: usize,
    height: usize,
    params: &FractalParams,
    seed: i64,
) -> Result<ScalarField2D> {
    NoiseGenerator::perlin(seed).generate_map(width, height, params)
}

pub fn generate_simplex_map(
    width: usize,
    height: usize,
    params: &FractalParams,
    seed: i64,
) -> Result<ScalarField2D> {
    NoiseGenerator::simplex(seed).generate_map(width, height, params)
}

pub fn generate_perlin_chunk(
    chunk_x: i64,
    chunk_y: i64,
    chunk_size: usize,
    params: &FractalParams,
    seed: i64,
) -> Result<ScalarField2D> {
    NoiseGenerator::perlin(seed).generate_chunk(chunk_x, chunk_y, chunk_size, params)
}

pub fn generate_simplex_chunk(
    chunk_x: i64,
    chunk_y: i64,
    chunk_size: usize,
    params: &FractalParams,
    seed: i64,
) -> Result<ScalarField2D> {
    NoiseGenerator::simplex(seed).generate_chunk(chunk_x, chunk_y, chunk_size, params)
}

pub fn sample_perlin(x: f64, y: f64, params: &FractalParams, seed: i64) -> Result<f64> {
    NoiseGenerator::perlin(seed).sample_fractal(x, y, params)
}

pub fn sample_simplex(x: f64, y: f64, params: &FractalParams, seed: i64) -> Result<f64> {
    NoiseGenerator::simplex(seed).sample_fractal(x, y, params)
}
