use crate::error::{NoiseError, Result, check_positive};
use crate::field::ScalarField2D;

// 8-neighbour offsets: the four axes first, then the diagonals
const NEIGHBOURS: [(isize, isize); 8] = [
    (0, -1),
    (1, 0),
    (0, 1),
    (-1, 0),
    (1, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
];

pub struct ThermalErosion2D {
    iterations: usize,
    talus_angle: f32, // maximum stable height difference before material moves
    rate: f32,        // share of the excess moved per pass
}

impl ThermalErosion2D {
    // iterations - how many passes to run
    // More iterations = smoother terrain.
    // talus_angle - slope threshold (e.g. 0.05 on a [0, 1] field)
    // if the drop to the steepest neighbour exceeds this,
    // material slides downhill.
    pub fn new(iterations: usize, talus_angle: f32) -> Self {
        Self {
            iterations,
            talus_angle,
            rate: 0.5,
        }
    }

    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate;
        self
    }

    // In-place erosion of the field. Material only moves between cells,
    // so the sum of all heights is unchanged.
    pub fn apply(&self, map: &mut ScalarField2D) -> Result<()> {
        map.ensure_not_empty()?;
        check_positive("rate", f64::from(self.rate))?;
        if !(self.talus_angle >= 0.0) {
            return Err(NoiseError::invalid(
                "talus_angle",
                f64::from(self.talus_angle),
                ">= 0",
            ));
        }
        let (w, h) = (map.width() as isize, map.height() as isize);

        for pass in 0..self.iterations {
            // Accumulate deltas here to avoid order bias
            let mut delta = ScalarField2D::new(map.width(), map.height());
            let mut moved = 0usize;

            for y in 0..h {
                for x in 0..w {
                    let curr = map.get(x as usize, y as usize);
                    let mut max_diff = 0.0; // Largest downhill drop
                    let mut max_n = None; // Neighbour it drops to
                    for &(dx, dy) in &NEIGHBOURS {
                        let nx = x + dx;
                        let ny = y + dy;
                        if nx >= 0 && nx < w && ny >= 0 && ny < h {
                            let diff = curr - map.get(nx as usize, ny as usize);
                            if diff > max_diff {
                                max_diff = diff;
                                max_n = Some((nx as usize, ny as usize));
                            }
                        }
                    }
                    // If slope exceeds talus, erode; pits and flats have no target
                    if let Some(target) = max_n.filter(|_| max_diff > self.talus_angle) {
                        let amount = (max_diff - self.talus_angle) * self.rate;
                        delta[(x as usize, y as usize)] -= amount;
                        delta[target] += amount;
                        moved += 1;
                    }
                }
            }

            // Apply all deltas:
            for (v, d) in map.as_mut_slice().iter_mut().zip(delta.as_slice()) {
                *v += d;
            }
            tracing::trace!(pass, moved, "thermal erosion pass");
            if moved == 0 {
                // Nothing is steeper than the talus angle, later passes would be no-ops
                break;
            }
        }
        Ok(())
    }
}
