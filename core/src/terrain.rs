use serde::{Deserialize, Serialize};

use crate::error::{NoiseError, Result, check_dimension, check_positive};
use crate::field::ScalarField2D;
use crate::fractal2::{FractalParams, FractalSampler};
use crate::perlin2::Perlin2D;

// Side-scroller ground line: one height per x column, in [0, 1]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    pub scale: f64, // horizontal feature width
    pub octaves: u32,
    pub persistence: f64,
    pub lacunarity: f64,
    pub base_height: f64, // baseline the noise swings around
    pub amplitude: f64,   // vertical swing
    pub min_height: f64,
    pub max_height: f64,
    pub max_slope: f64, // per-column limit used by profiles; 0 or >= 1 disables it
    pub enable_plateau: bool,
    pub plateau_threshold: f64,
    pub plateau_width: f64,
    pub seed: i64,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            scale: 100.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            base_height: 0.5,
            amplitude: 0.3,
            min_height: 0.2,
            max_height: 0.8,
            max_slope: 0.1,
            enable_plateau: false,
            plateau_threshold: 0.7,
            plateau_width: 0.05,
            seed: -1,
        }
    }
}

impl TerrainParams {
    pub fn rolling_hills() -> Self {
        Self {
            scale: 120.0,
            octaves: 3,
            amplitude: 0.25,
            min_height: 0.3,
            max_height: 0.75,
            max_slope: 0.08,
            ..Self::default()
        }
    }

    pub fn mountainous() -> Self {
        Self {
            scale: 80.0,
            octaves: 5,
            persistence: 0.6,
            lacunarity: 2.2,
            base_height: 0.45,
            amplitude: 0.4,
            min_height: 0.2,
            max_height: 0.9,
            max_slope: 0.15,
            ..Self::default()
        }
    }

    pub fn gentle_plains() -> Self {
        Self {
            scale: 200.0,
            octaves: 2,
            persistence: 0.4,
            amplitude: 0.15,
            min_height: 0.4,
            max_height: 0.65,
            max_slope: 0.05,
            ..Self::default()
        }
    }

    pub fn steep_cliffs() -> Self {
        Self {
            scale: 60.0,
            octaves: 4,
            persistence: 0.65,
            lacunarity: 2.5,
            amplitude: 0.35,
            min_height: 0.15,
            max_height: 0.85,
            max_slope: 0.25,
            ..Self::default()
        }
    }

    pub fn plateaus() -> Self {
        Self {
            min_height: 0.25,
            enable_plateau: true,
            plateau_threshold: 0.65,
            plateau_width: 0.08,
            ..Self::default()
        }
    }

    // Look up a preset by its snake_case name
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "rolling_hills" => Some(Self::rolling_hills()),
            "mountainous" => Some(Self::mountainous()),
            "gentle_plains" => Some(Self::gentle_plains()),
            "steep_cliffs" => Some(Self::steep_cliffs()),
            "plateaus" => Some(Self::plateaus()),
            _ => None,
        }
    }

    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = seed;
        self
    }

    pub fn fractal(&self) -> FractalParams {
        FractalParams::new(self.scale, self.octaves, self.persistence, self.lacunarity)
    }

    pub fn validate(&self) -> Result<()> {
        self.fractal().validate()?;
        for (field, value) in [
            ("base_height", self.base_height),
            ("amplitude", self.amplitude),
            ("min_height", self.min_height),
            ("max_height", self.max_height),
        ] {
            if !value.is_finite() {
                return Err(NoiseError::invalid(field, value, "a finite number"));
            }
        }
        // negated so a NaN bound can never reach clamp
        if !(self.min_height <= self.max_height) {
            return Err(NoiseError::invalid(
                "min_height",
                self.min_height,
                "<= max_height",
            ));
        }
        if self.enable_plateau {
            if !self.plateau_threshold.is_finite() {
                return Err(NoiseError::invalid(
                    "plateau_threshold",
                    self.plateau_threshold,
                    "a finite number",
                ));
            }
            check_positive("plateau_width", self.plateau_width)?;
        }
        Ok(())
    }
}

// Owns one Perlin table, so every column of every chunk reads the same permutation
pub struct TerrainSampler {
    params: TerrainParams,
    perlin: Perlin2D,
}

impl TerrainSampler {
    pub fn new(params: TerrainParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            perlin: Perlin2D::new(params.seed),
        })
    }

    pub fn params(&self) -> &TerrainParams {
        &self.params
    }

    fn fbm(&self) -> FractalSampler<'_, Perlin2D> {
        FractalSampler::prevalidated(&self.perlin, self.params.fractal())
    }

    // Height at world column x, clamped to [min_height, max_height]
    pub fn sample(&self, x: f64) -> f64 {
        self.height_at(&self.fbm(), x)
    }

    fn height_at(&self, fbm: &FractalSampler<'_, Perlin2D>, x: f64) -> f64 {
        let p = &self.params;
        let n = fbm.sample(x, 0.0);
        let mut h = p.base_height + (n - 0.5) * p.amplitude * 2.0;

        if p.enable_plateau && h > p.plateau_threshold {
            let over = h - p.plateau_threshold;
            let factor = (over / p.plateau_width).min(1.0);
            h = p.plateau_threshold + over * (1.0 - factor * 0.8);
        }

        h.clamp(p.min_height, p.max_height)
    }

    // `width` heights at start_x, start_x + step, ...; slope limited when enabled
    pub fn generate_profile(&self, width: usize, start_x: f64, step: f64) -> Result<Vec<f32>> {
        check_dimension("width", width)?;
        check_positive("step", step)?;

        let fbm = self.fbm();
        let profile: Vec<f32> = (0..width)
            .map(|i| self.height_at(&fbm, start_x + i as f64 * step) as f32)
            .collect();

        let max_slope = self.params.max_slope as f32;
        if max_slope > 0.0 && max_slope < 1.0 {
            return Ok(apply_slope_limit(&profile, max_slope));
        }
        Ok(profile)
    }

    // Raw column heights for x = chunk_x * chunk_size + i.
    // No slope limiting here: it looks at neighbours, which would break seams between chunks.
    pub fn generate_chunk(&self, chunk_x: i64, chunk_size: usize) -> Result<Vec<f32>> {
        check_dimension("chunk_size", chunk_size)?;
        let origin = i64::try_from(chunk_size)
            .ok()
            .and_then(|size| chunk_x.checked_mul(size))
            .ok_or_else(|| NoiseError::invalid("chunk_x", chunk_x as f64, "chunk origin within i64"))?;

        let fbm = self.fbm();
        Ok((0..chunk_size)
            .map(|i| self.height_at(&fbm, origin as f64 + i as f64) as f32)
            .collect())
    }

    // Side view for visualisation: 1.0 at and below the surface row,
    // a gradient fading out above it
    pub fn generate_heightmap(
        &self,
        width: usize,
        height: usize,
        start_x: f64,
        step: f64,
    ) -> Result<ScalarField2D> {
        check_dimension("width", width)?;
        check_dimension("height", height)?;
        let profile = self.generate_profile(width, start_x, step)?;

        let surface: Vec<usize> = profile
            .iter()
            .map(|&h| {
                let row = ((1.0 - h) * height as f32).max(0.0) as usize;
                row.min(height - 1)
            })
            .collect();

        Ok(ScalarField2D::from_fn(width, height, |x, y| {
            let top = surface[x];
            if y >= top {
                1.0
            } else {
                let dist = (top - y) as f32 / height as f32;
                (1.0 - dist * 2.0).max(0.0)
            }
        }))
    }
}

// Two passes (forward, then backward) so no neighbouring pair differs by more than max_slope.
// A limit outside (0, 1) returns the input unchanged.
pub fn apply_slope_limit(heights: &[f32], max_slope: f32) -> Vec<f32> {
    let mut out = heights.to_vec();
    if out.is_empty() || !(max_slope > 0.0 && max_slope < 1.0) {
        return out;
    }

    for i in 1..out.len() {
        let prev = out[i - 1];
        out[i] = out[i].clamp(prev - max_slope, prev + max_slope);
    }
    for i in (0..out.len() - 1).rev() {
        let next = out[i + 1];
        out[i] = out[i].clamp(next - max_slope, next + max_slope);
    }
    out
}

// Compress everything above `threshold`; the further above, the flatter
pub fn apply_plateaus(heights: &[f32], threshold: f32, width: f32) -> Vec<f32> {
    heights
        .iter()
        .map(|&h| {
            if h > threshold {
                let over = h - threshold;
                let factor = (over / width).min(1.0);
                threshold + over * (1.0 - factor * 0.9)
            } else {
                h
            }
        })
        .collect()
}
