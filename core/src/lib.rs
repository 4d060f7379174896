// core holds the noise kernels, fractal sampling, map/chunk generation
// and the post-processing passes that run on generated fields
pub mod cave;
pub mod domain_warp;
pub mod erosion2;
pub mod error;
pub mod field;
pub mod filters;
pub mod fractal2;
pub mod generator;
pub mod permutation;
pub mod perlin2;
pub mod pink;
pub mod simplex2;
pub mod terrain;
pub mod white;

pub use cave::{CaveGenerator, CaveParams};
pub use domain_warp::DomainWarp2D;
pub use erosion2::ThermalErosion2D;
pub use error::{NoiseError, Result};
pub use field::{BoolField2D, FieldStats, ScalarField2D};
pub use fractal2::{FractalParams, FractalSampler};
pub use generator::{
    NoiseConfig, NoiseGenerator, NoiseKind, generate_perlin_chunk, generate_perlin_map,
    generate_simplex_chunk, generate_simplex_map, sample_perlin, sample_simplex,
};
pub use permutation::PermutationTable;
pub use perlin2::Perlin2D;
pub use pink::{PinkParams, generate_pink_map};
pub use simplex2::Simplex2D;
pub use terrain::{TerrainParams, TerrainSampler};
pub use white::{WhiteNoise2D, generate_white_chunk, generate_white_map, sample_white};

// Single-octave 2D noise source.
// `raw2` is the kernel's native output, which is what octaves are summed in;
// `finish` maps an amplitude-weighted mean of raw values into [0, 1].
pub trait NoiseKernel {
    fn raw2(&self, x: f64, y: f64) -> f64;

    fn finish(&self, value: f64) -> f64 {
        value.clamp(0.0, 1.0)
    }

    // Sample one octave at (x, y), in [0, 1]
    fn get2(&self, x: f64, y: f64) -> f64 {
        self.finish(self.raw2(x, y))
    }
}
