use crate::NoiseKernel;
use crate::permutation::PermutationTable;

// 2D Perlin noise kernel: one octave, no frequency or amplitude of its own.
// Octave summation lives in FractalSampler.
#[derive(Clone, Debug)]
pub struct Perlin2D {
    perm: PermutationTable,
}

impl Perlin2D {
    pub fn new(seed: i64) -> Self {
        Self {
            perm: PermutationTable::new(seed),
        }
    }

    pub fn permutation(&self) -> &PermutationTable {
        &self.perm
    }

    // Fade function as defined by Ken Perlin: 6t^5 − 15t^4 + 10t^3
    // First and second derivatives are zero at t=0 and t=1,
    // so neighbouring lattice cells join without a crease
    #[inline] // To skip function call overhead
    fn fade(t: f64) -> f64 {
        t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
    }

    // Linear interpolation
    #[inline]
    fn lerp(a: f64, b: f64, t: f64) -> f64 {
        a + t * (b - a)
    }

    // The low 2 bits of the hash pick one of the four diagonal gradients
    // (1,1), (-1,1), (1,-1), (-1,-1); the result is the dot product with (x, y)
    #[inline]
    fn grad(hash: u8, x: f64, y: f64) -> f64 {
        let h = hash & 3;
        let u = if (h & 1) == 0 { x } else { -x };
        let v = if (h & 2) == 0 { y } else { -y };
        u + v
    }

    // Single-octave Perlin noise at (x, y), rescaled from [−1, 1] to [0, 1]
    pub fn noise(&self, x: f64, y: f64) -> f64 {
        // Find unit square that contains point (Which square to sample?)
        let x0 = x.floor();
        let y0 = y.floor();
        let xi = (x0 as i64 & 255) as usize;
        let yi = (y0 as i64 & 255) as usize;
        // Relative x/y within the square (Where within the square?)
        let xf = x - x0;
        let yf = y - y0;
        let u = Self::fade(xf);
        let v = Self::fade(yf);

        // Hash the four corners; xi + 1 and perm + yi + 1 stay below 512
        let a = self.perm.at(xi) as usize;
        let b = self.perm.at(xi + 1) as usize;
        let aa = self.perm.at(a + yi);
        let ab = self.perm.at(a + yi + 1);
        let ba = self.perm.at(b + yi);
        let bb = self.perm.at(b + yi + 1);

        let x1 = Self::lerp(Self::grad(aa, xf, yf), Self::grad(ba, xf - 1.0, yf), u);
        let x2 = Self::lerp(
            Self::grad(ab, xf, yf - 1.0),
            Self::grad(bb, xf - 1.0, yf - 1.0),
            u,
        );
        // Interpolate the two results along y
        (Self::lerp(x1, x2, v) + 1.0) * 0.5
    }
}

impl NoiseKernel for Perlin2D {
    fn raw2(&self, x: f64, y: f64) -> f64 {
        self.noise(x, y)
    }

    // Already in [0, 1]; the clamp only absorbs rounding at the extremes
    fn finish(&self, value: f64) -> f64 {
        value.clamp(0.0, 1.0)
    }
}
