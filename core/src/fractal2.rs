use serde::{Deserialize, Serialize};

use crate::NoiseKernel;
use crate::error::{Result, check_positive, check_unit_interval};

// Shape of a fractal (multi-octave) sum. Immutable during a call and reusable across calls.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FractalParams {
    pub scale: f64,       // inverse zoom: larger = smoother, larger features
    pub octaves: u32,     // number of octaves to sum
    pub frequency: f64,   // base frequency multiplier
    pub persistence: f64, // amplitude decay per octave
    pub lacunarity: f64,  // frequency growth per octave
    pub base: f64,        // global offset added to both coordinates before scaling
}

impl Default for FractalParams {
    fn default() -> Self {
        Self {
            scale: 50.0,
            octaves: 4,
            frequency: 1.0,
            persistence: 0.5,
            lacunarity: 2.0,
            base: 0.0,
        }
    }
}

impl FractalParams {
    pub fn new(scale: f64, octaves: u32, persistence: f64, lacunarity: f64) -> Self {
        Self {
            scale,
            octaves,
            persistence,
            lacunarity,
            ..Self::default()
        }
    }

    pub fn with_base(mut self, base: f64) -> Self {
        self.base = base;
        self
    }

    pub fn with_frequency(mut self, frequency: f64) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_positive("scale", self.scale)?;
        if self.octaves < 1 {
            return Err(crate::NoiseError::invalid(
                "octaves",
                f64::from(self.octaves),
                ">= 1",
            ));
        }
        check_positive("frequency", self.frequency)?;
        check_unit_interval("persistence", self.persistence)?;
        check_positive("lacunarity", self.lacunarity)?;
        Ok(())
    }
}

// Octave summation over any single-octave kernel (Fractal Brownian Motion).
// Parameters are validated once at construction, so sample() cannot fail.
pub struct FractalSampler<'a, K: NoiseKernel + ?Sized> {
    kernel: &'a K,
    params: FractalParams,
}

impl<'a, K: NoiseKernel + ?Sized> FractalSampler<'a, K> {
    pub fn new(kernel: &'a K, params: FractalParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { kernel, params })
    }

    // For owners that validated `params` when they were built
    pub(crate) fn prevalidated(kernel: &'a K, params: FractalParams) -> Self {
        Self { kernel, params }
    }

    pub fn params(&self) -> &FractalParams {
        &self.params
    }

    // Multi-octave value at world coordinate (x, y), always in [0, 1]
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let p = &self.params;
        let nx = (x + p.base) / p.scale;
        let ny = (y + p.base) / p.scale;

        let mut amplitude = 1.0; // Weight of the current octave
        let mut freq = p.frequency; // How zoomed in we are on the noise pattern
        let mut total = 0.0; // Accumulated noise value
        let mut max_amp = 0.0; // Sum of all weights, used to normalize

        for _ in 0..p.octaves {
            total += self.kernel.raw2(nx * freq, ny * freq) * amplitude;
            max_amp += amplitude;
            amplitude *= p.persistence;
            freq *= p.lacunarity;
        }

        // max_amp >= 1 because the first octave always has amplitude 1
        self.kernel.finish(total / max_amp)
    }
}

#[cfg(test)]
mod tests {
    use super::{FractalParams, FractalSampler};
    use crate::{NoiseError, NoiseKernel, Perlin2D, Simplex2D};

    // Constant kernel: every octave returns the same value, so the
    // normalized sum must come back unchanged whatever the weights are
    struct Flat(f64);

    impl NoiseKernel for Flat {
        fn raw2(&self, _x: f64, _y: f64) -> f64 {
            self.0
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(FractalParams::default().validate().is_ok());
    }

    #[test]
    fn validation_reports_offending_field() {
        let cases = [
            (FractalParams { scale: 0.0, ..Default::default() }, "scale"),
            (FractalParams { octaves: 0, ..Default::default() }, "octaves"),
            (FractalParams { frequency: -1.0, ..Default::default() }, "frequency"),
            (FractalParams { persistence: 1.5, ..Default::default() }, "persistence"),
            (FractalParams { lacunarity: 0.0, ..Default::default() }, "lacunarity"),
        ];
        for (params, expected) in cases {
            match params.validate() {
                Err(NoiseError::InvalidParameter { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected {} to be rejected, got {:?}", expected, other),
            }
        }
    }

    #[test]
    fn normalization_divides_by_total_amplitude() {
        let kernel = Flat(0.25);
        for octaves in [1, 2, 4, 8] {
            let params = FractalParams::new(10.0, octaves, 0.7, 2.0);
            let sampler = FractalSampler::new(&kernel, params).unwrap();
            assert!((sampler.sample(3.0, 4.0) - 0.25).abs() < 1e-12);
        }
    }

    #[test]
    fn zero_persistence_keeps_only_first_octave() {
        let perlin = Perlin2D::new(17);
        let params = FractalParams::new(20.0, 6, 0.0, 2.0);
        let sampler = FractalSampler::new(&perlin, params).unwrap();
        let expected = perlin.get2(13.0 / 20.0, 7.0 / 20.0);
        assert!((sampler.sample(13.0, 7.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn base_shifts_the_pattern() {
        let perlin = Perlin2D::new(5);
        let plain = FractalSampler::new(&perlin, FractalParams::new(25.0, 3, 0.5, 2.0)).unwrap();
        let shifted = FractalSampler::new(
            &perlin,
            FractalParams::new(25.0, 3, 0.5, 2.0).with_base(10.0),
        )
        .unwrap();
        assert_eq!(
            plain.sample(30.0, 40.0).to_bits(),
            shifted.sample(20.0, 30.0).to_bits()
        );
    }

    #[test]
    fn simplex_sum_lands_in_unit_range() {
        let simplex = Simplex2D::new(21);
        let sampler = FractalSampler::new(&simplex, FractalParams::new(8.0, 5, 0.6, 2.1)).unwrap();
        for i in 0..2000 {
            let v = sampler.sample(i as f64 * 0.37 - 300.0, i as f64 * 0.61);
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn sampler_rejects_invalid_params_up_front() {
        let perlin = Perlin2D::new(0);
        let bad = FractalParams { octaves: 0, ..Default::default() };
        assert!(FractalSampler::new(&perlin, bad).is_err());
    }
}
