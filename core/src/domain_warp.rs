use crate::NoiseKernel;
use crate::error::{NoiseError, Result, check_dimension};
use crate::field::ScalarField2D;
use crate::fractal2::{FractalParams, FractalSampler};
use crate::perlin2::Perlin2D;

// Decorrelates the y displacement from the x displacement, in units of `scale`
const WARP_OFFSET: f64 = 5.2;
// Frequency of the grid-level displacement maps
const DISPLACEMENT_SCALE: f64 = 0.02;

// Coherent warp: the base fractal is sampled at coordinates pushed around by a
// second fractal. Works on world coordinates, so warped chunks still tile.
pub struct DomainWarp2D<'a> {
    base: &'a dyn NoiseKernel,
    warp: &'a dyn NoiseKernel,
    params: FractalParams,
    warp_strength: f64, // maximum displacement in world units
}

impl<'a> DomainWarp2D<'a> {
    pub fn new(
        base: &'a dyn NoiseKernel,
        warp: &'a dyn NoiseKernel,
        params: FractalParams,
        warp_strength: f64,
    ) -> Result<Self> {
        params.validate()?;
        if !(warp_strength >= 0.0) {
            return Err(NoiseError::invalid("warp_strength", warp_strength, ">= 0"));
        }
        Ok(Self {
            base,
            warp,
            params,
            warp_strength,
        })
    }

    pub fn params(&self) -> &FractalParams {
        &self.params
    }

    pub fn warp_strength(&self) -> f64 {
        self.warp_strength
    }

    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let base = FractalSampler::prevalidated(self.base, self.params);
        let warp = FractalSampler::prevalidated(self.warp, self.params);
        self.sample_with(&base, &warp, x, y)
    }

    fn sample_with(
        &self,
        base: &FractalSampler<'_, dyn NoiseKernel + 'a>,
        warp: &FractalSampler<'_, dyn NoiseKernel + 'a>,
        x: f64,
        y: f64,
    ) -> f64 {
        let offset = WARP_OFFSET * self.params.scale;
        let dx = (warp.sample(x, y) * 2.0 - 1.0) * self.warp_strength;
        let dy = (warp.sample(x + offset, y + offset) * 2.0 - 1.0) * self.warp_strength;
        base.sample(x + dx, y + dy)
    }

    pub fn generate_region(
        &self,
        origin_x: i64,
        origin_y: i64,
        width: usize,
        height: usize,
    ) -> Result<ScalarField2D> {
        check_dimension("width", width)?;
        check_dimension("height", height)?;
        let base = FractalSampler::prevalidated(self.base, self.params);
        let warp = FractalSampler::prevalidated(self.warp, self.params);
        Ok(ScalarField2D::from_fn(width, height, |x, y| {
            let wx = origin_x as f64 + x as f64;
            let wy = origin_y as f64 + y as f64;
            self.sample_with(&base, &warp, wx, wy) as f32
        }))
    }
}

// Move every cell by (dx, dy) * strength, where dx/dy are [0, 1] maps centred on 0.5.
// Lookups truncate to the grid and clamp at the border.
pub fn warp_field(
    map: &ScalarField2D,
    dx: &ScalarField2D,
    dy: &ScalarField2D,
    strength: f32,
) -> Result<ScalarField2D> {
    map.ensure_not_empty()?;
    for d in [dx, dy] {
        if !map.same_shape(d) {
            return Err(NoiseError::DimensionMismatch {
                expected_width: map.width(),
                expected_height: map.height(),
                width: d.width(),
                height: d.height(),
            });
        }
    }

    let max_x = map.width() as i64 - 1;
    let max_y = map.height() as i64 - 1;
    Ok(ScalarField2D::from_fn(map.width(), map.height(), |x, y| {
        let ox = (dx.get(x, y) * 2.0 - 1.0) * strength;
        let oy = (dy.get(x, y) * 2.0 - 1.0) * strength;
        let sx = ((x as f32 + ox) as i64).clamp(0, max_x) as usize;
        let sy = ((y as f32 + oy) as i64).clamp(0, max_y) as usize;
        map.get(sx, sy)
    }))
}

// Single-octave Perlin displacement in [0, 1]
fn displacement_map(width: usize, height: usize, seed: i64) -> ScalarField2D {
    let perlin = Perlin2D::new(seed);
    ScalarField2D::from_fn(width, height, |x, y| {
        perlin.get2(x as f64 * DISPLACEMENT_SCALE, y as f64 * DISPLACEMENT_SCALE) as f32
    })
}

fn next_seed(seed: i64, step: i64) -> i64 {
    if seed >= 0 { seed.saturating_add(step) } else { seed }
}

pub fn domain_warp(map: &ScalarField2D, strength: f32, seed: i64) -> Result<ScalarField2D> {
    map.ensure_not_empty()?;
    let dx = displacement_map(map.width(), map.height(), seed);
    let dy = displacement_map(map.width(), map.height(), next_seed(seed, 1));
    warp_field(map, &dx, &dy, strength)
}

// Repeated warps, strength multiplied by `decay` after each pass
pub fn fractal_domain_warp(
    map: &ScalarField2D,
    strength: f32,
    iterations: u32,
    decay: f32,
    seed: i64,
) -> Result<ScalarField2D> {
    map.ensure_not_empty()?;
    let mut out = map.clone();
    let mut current = strength;
    for i in 0..iterations {
        out = domain_warp(&out, current, next_seed(seed, i64::from(i)))?;
        current *= decay;
    }
    Ok(out)
}
