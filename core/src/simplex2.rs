use crate::NoiseKernel;
use crate::permutation::PermutationTable;

// Approximate value of sqrt(3)
const SQRT_3: f64 = 1.732_050_807_568_877_2;
// Skewing/Unskewing factors for 2D simplex
const F2: f64 = 0.5 * (SQRT_3 - 1.0); // compresses the square into a rhombus made of equilateral triangles
const G2: f64 = (3.0 - SQRT_3) / 6.0; // reverses the skewing

// Predefined 2D gradient directions: four diagonals and four axes
const GRAD2: [(i8, i8); 8] = [
    (1, 1),
    (-1, 1),
    (1, -1),
    (-1, -1),
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
];

// 2D Simplex noise kernel
// Simplex divides space into triangles, rather than squares,
// which gives better isotropy and only three contributing corners
#[derive(Clone, Debug)]
pub struct Simplex2D {
    perm: PermutationTable,
}

impl Simplex2D {
    pub fn new(seed: i64) -> Self {
        Self {
            perm: PermutationTable::new(seed),
        }
    }

    pub fn permutation(&self) -> &PermutationTable {
        &self.perm
    }

    #[inline]
    fn dot(g: (i8, i8), x: f64, y: f64) -> f64 {
        f64::from(g.0) * x + f64::from(g.1) * y
    }

    // Radial falloff (0.5 − d²)⁴ times the gradient dot product, zero outside the radius
    #[inline]
    fn corner(gi: usize, x: f64, y: f64) -> f64 {
        let t = 0.5 - x * x - y * y; // Circular distance of influence
        if t > 0.0 {
            let t_sq = t * t;
            t_sq * t_sq * Self::dot(GRAD2[gi], x, y)
        } else {
            0.0
        }
    }

    // Raw 2D Simplex noise at (xin, yin)
    // Returns roughly [−1.0, +1.0]; the 70.0 scale is empirical, not a hard bound
    pub fn raw_noise(&self, xin: f64, yin: f64) -> f64 {
        // Skew input space to determine simplex cell
        let s = (xin + yin) * F2;
        let i = (xin + s).floor() as i64;
        let j = (yin + s).floor() as i64;

        // Unskew back to get the relative position to the origin corner
        let t = (i + j) as f64 * G2;
        let x0 = xin - (i as f64 - t);
        let y0 = yin - (j as f64 - t);

        // Determine which simplex triangle we are in (Lower or Upper)
        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

        // Offsets for remaining corners
        let x1 = x0 - i1 as f64 + G2;
        let y1 = y0 - j1 as f64 + G2;
        let x2 = x0 - 1.0 + 2.0 * G2;
        let y2 = y0 - 1.0 + 2.0 * G2;

        // Hash the three simplex corners
        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;
        let gi0 = self.perm.at(ii + self.perm.at(jj) as usize) as usize % 8;
        let gi1 = self.perm.at(ii + i1 + self.perm.at(jj + j1) as usize) as usize % 8;
        let gi2 = self.perm.at(ii + 1 + self.perm.at(jj + 1) as usize) as usize % 8;

        let n0 = Self::corner(gi0, x0, y0);
        let n1 = Self::corner(gi1, x1, y1);
        let n2 = Self::corner(gi2, x2, y2);

        70.0 * (n0 + n1 + n2)
    }
}

impl NoiseKernel for Simplex2D {
    fn raw2(&self, x: f64, y: f64) -> f64 {
        self.raw_noise(x, y)
    }

    // Raw output can overshoot [−1, 1] slightly, so the rescale is clamped
    fn finish(&self, value: f64) -> f64 {
        (value * 0.5 + 0.5).clamp(0.0, 1.0)
    }
}
