use rand::{Rng, RngCore};

use crate::error::{Result, check_dimension};
use crate::field::ScalarField2D;
use crate::generator::chunk_origin;
use crate::permutation::seeded_rng;

// Independent uniform values in [0, 1), filled row by row from one stream
pub fn generate_white_map(width: usize, height: usize, seed: i64) -> Result<ScalarField2D> {
    check_dimension("width", width)?;
    check_dimension("height", height)?;
    let mut rng = seeded_rng(seed);
    Ok(ScalarField2D::from_fn(width, height, |_, _| {
        rng.gen_range(0.0f32..1.0)
    }))
}

// splitmix64 finalizer
#[inline]
fn mix(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

// Coordinate-addressed white noise: every integer lattice cell gets its own
// value, so any sample, chunk or region can be produced on its own
#[derive(Clone, Debug)]
pub struct WhiteNoise2D {
    seed: i64,
    key: u64, // first word of the seeded stream
}

impl WhiteNoise2D {
    pub fn new(seed: i64) -> Self {
        let key = seeded_rng(seed).next_u64();
        Self { seed, key }
    }

    pub fn seed(&self) -> i64 {
        self.seed
    }

    // 24 bits of hash, so the value is exact in f32 and stays below 1.0
    fn cell(&self, ix: i64, iy: i64) -> f64 {
        let h = mix(mix(self.key ^ ix as u64).wrapping_add(iy as u64));
        (h >> 40) as f64 / (1u64 << 24) as f64
    }

    // Value of the lattice cell containing (x, y), in [0, 1)
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        self.cell(x.floor() as i64, y.floor() as i64)
    }

    pub fn generate_chunk(
        &self,
        chunk_x: i64,
        chunk_y: i64,
        chunk_size: usize,
    ) -> Result<ScalarField2D> {
        let (origin_x, origin_y) = chunk_origin(chunk_x, chunk_y, chunk_size)?;
        self.generate_region(origin_x, origin_y, chunk_size, chunk_size)
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
        tracing::debug!(origin_x, origin_y, width, height, "generating white noise region");
        Ok(ScalarField2D::from_fn(width, height, |x, y| {
            self.cell(origin_x.wrapping_add(x as i64), origin_y.wrapping_add(y as i64)) as f32
        }))
    }
}

pub fn sample_white(x: f64, y: f64, seed: i64) -> f64 {
    WhiteNoise2D::new(seed).sample(x, y)
}

pub fn generate_white_chunk(
    chunk_x: i64,
    chunk_y: i64,
    chunk_size: usize,
    seed: i64,
) -> Result<ScalarField2D> {
    WhiteNoise2D::new(seed).generate_chunk(chunk_x, chunk_y, chunk_size)
}
