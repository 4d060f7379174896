use serde::{Deserialize, Serialize};

use crate::error::{NoiseError, Result, check_dimension, check_positive};
use crate::field::ScalarField2D;
use crate::white::generate_white_map;

// Reference rate the octave spacing is measured against
const REFERENCE_RATE: f64 = 44_100.0;

// Pink (1/f^alpha) noise approximated by stacking block-averaged white noise layers
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinkParams {
    pub octaves: u32,
    pub alpha: f64,       // 1 = pink, 2 = brown, < 1 leans towards white
    pub sample_rate: u32, // scales the base block spacing
    pub amplitude: f64,
}

impl Default for PinkParams {
    fn default() -> Self {
        Self {
            octaves: 6,
            alpha: 1.0,
            sample_rate: 44_100,
            amplitude: 1.0,
        }
    }
}

impl PinkParams {
    pub fn validate(&self) -> Result<()> {
        if self.octaves < 1 {
            return Err(NoiseError::invalid("octaves", f64::from(self.octaves), ">= 1"));
        }
        if !(self.alpha >= 0.0) {
            return Err(NoiseError::invalid("alpha", self.alpha, ">= 0"));
        }
        check_positive("amplitude", self.amplitude)?;
        if self.sample_rate < 1 {
            return Err(NoiseError::invalid("sample_rate", 0.0, ">= 1"));
        }
        Ok(())
    }

    // Block edge length for octave `o`
    fn block_size(&self, octave: u32) -> usize {
        let spacing = (f64::from(self.sample_rate) / REFERENCE_RATE).sqrt().max(1.0);
        ((spacing * 2f64.powi(octave as i32)) as usize).max(1)
    }
}

// White noise averaged over block×block tiles; every cell in a tile gets the tile mean
fn blocky_white(width: usize, height: usize, block: usize, seed: i64) -> Result<ScalarField2D> {
    let white = generate_white_map(width, height, seed)?;
    let mut out = ScalarField2D::new(width, height);

    for by in (0..height).step_by(block) {
        for bx in (0..width).step_by(block) {
            let ey = (by + block).min(height);
            let ex = (bx + block).min(width);

            let mut sum = 0.0f32;
            for y in by..ey {
                for x in bx..ex {
                    sum += white.get(x, y);
                }
            }
            let avg = sum / ((ey - by) * (ex - bx)) as f32;

            for y in by..ey {
                for x in bx..ex {
                    out.set(x, y, avg);
                }
            }
        }
    }
    Ok(out)
}

pub fn generate_pink_map(
    width: usize,
    height: usize,
    params: &PinkParams,
    seed: i64,
) -> Result<ScalarField2D> {
    check_dimension("width", width)?;
    check_dimension("height", height)?;
    params.validate()?;

    let mut acc = ScalarField2D::new(width, height);
    let mut total_weight = 0.0f32;

    for o in 0..params.octaves {
        let block = params.block_size(o);
        // Each octave gets its own stream; negative seeds stay entropy-backed
        let layer_seed = if seed >= 0 { seed.saturating_add(i64::from(o)) } else { -1 };
        let layer = blocky_white(width, height, block, layer_seed)?;
        let weight = 1.0 / (block as f32).powf(params.alpha as f32);

        for (a, &v) in acc.as_mut_slice().iter_mut().zip(layer.as_slice()) {
            *a += v * weight;
        }
        total_weight += weight;
    }

    tracing::debug!(width, height, octaves = params.octaves, alpha = params.alpha, "pink map generated");

    let amplitude = params.amplitude as f32;
    Ok(acc.map(|v| (v / total_weight * amplitude).clamp(0.0, 1.0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pink_is_in_unit_range() {
        let map = generate_pink_map(64, 48, &PinkParams::default(), 11).unwrap();
        assert!(map.as_slice().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn pink_is_reproducible_per_seed() {
        let p = PinkParams::default();
        assert_eq!(
            generate_pink_map(32, 32, &p, 4).unwrap(),
            generate_pink_map(32, 32, &p, 4).unwrap()
        );
    }

    #[test]
    fn block_sizes_double_per_octave() {
        let p = PinkParams::default();
        let sizes: Vec<usize> = (0..4).map(|o| p.block_size(o)).collect();
        assert_eq!(sizes, vec![1, 2, 4, 8]);
        // A higher rate widens the base spacing
        let fast = PinkParams { sample_rate: 44_100 * 4, ..p };
        assert_eq!(fast.block_size(0), 2);
    }

    #[test]
    fn single_octave_is_plain_white_noise() {
        let p = PinkParams { octaves: 1, ..Default::default() };
        let pink = generate_pink_map(16, 16, &p, 9).unwrap();
        let white = generate_white_map(16, 16, 9).unwrap();
        for (a, b) in pink.as_slice().iter().zip(white.as_slice()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn smoother_than_white_noise() {
        // Mean absolute step between horizontal neighbours
        fn roughness(f: &ScalarField2D) -> f32 {
            let mut sum = 0.0;
            let mut n = 0;
            for row in f.rows() {
                for w in row.windows(2) {
                    sum += (w[1] - w[0]).abs();
                    n += 1;
                }
            }
            sum / n as f32
        }
        let pink = generate_pink_map(64, 64, &PinkParams::default(), 2).unwrap();
        let white = generate_white_map(64, 64, 2).unwrap();
        assert!(roughness(&pink) < roughness(&white));
    }

    #[test]
    fn invalid_params_fail_fast() {
        let bad = [
            PinkParams { octaves: 0, ..Default::default() },
            PinkParams { alpha: -0.5, ..Default::default() },
            PinkParams { amplitude: 0.0, ..Default::default() },
            PinkParams { sample_rate: 0, ..Default::default() },
        ];
        for p in bad {
            assert!(generate_pink_map(8, 8, &p, 1).is_err(), "{:?} accepted", p);
        }
    }
}
