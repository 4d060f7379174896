use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::{NoiseError, Result, check_dimension};
use crate::field::{BoolField2D, ScalarField2D};
use crate::fractal2::{FractalParams, FractalSampler};
use crate::perlin2::Perlin2D;

// Boolean cave maps (true = solid, false = air) carved from thresholded Perlin density
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaveParams {
    pub scale: f64, // lower = smaller caves
    pub octaves: u32,
    pub persistence: f64,
    pub lacunarity: f64,
    pub seed: i64,

    pub threshold: f64,         // density above this is solid
    pub invert_threshold: bool, // flip solid and air

    pub smoothing_iterations: u32, // cellular automata passes, 0 disables
    pub birth_limit: u32,          // solid neighbours for air to turn solid
    pub death_limit: u32,          // solid neighbours for solid to survive

    pub remove_small_regions: bool,
    pub min_region_size: usize,
}

impl Default for CaveParams {
    fn default() -> Self {
        Self {
            scale: 30.0,
            octaves: 3,
            persistence: 0.5,
            lacunarity: 2.0,
            seed: -1,
            threshold: 0.5,
            invert_threshold: false,
            smoothing_iterations: 3,
            birth_limit: 4,
            death_limit: 3,
            remove_small_regions: true,
            min_region_size: 50,
        }
    }
}

impl CaveParams {
    pub fn open_caverns() -> Self {
        Self {
            scale: 40.0,
            octaves: 2,
            threshold: 0.45,
            smoothing_iterations: 4,
            min_region_size: 100,
            ..Self::default()
        }
    }

    pub fn tight_tunnels() -> Self {
        Self {
            scale: 20.0,
            octaves: 4,
            threshold: 0.55,
            smoothing_iterations: 2,
            birth_limit: 5,
            death_limit: 2,
            min_region_size: 30,
            ..Self::default()
        }
    }

    pub fn swiss_cheese() -> Self {
        Self {
            scale: 15.0,
            threshold: 0.52,
            smoothing_iterations: 1,
            death_limit: 4,
            min_region_size: 20,
            ..Self::default()
        }
    }

    pub fn vertical_shafts() -> Self {
        Self {
            scale: 25.0,
            persistence: 0.7,
            lacunarity: 1.5,
            threshold: 0.48,
            min_region_size: 60,
            ..Self::default()
        }
    }

    pub fn organic_caves() -> Self {
        Self {
            scale: 35.0,
            octaves: 4,
            persistence: 0.55,
            smoothing_iterations: 5,
            min_region_size: 80,
            ..Self::default()
        }
    }

    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "open_caverns" => Some(Self::open_caverns()),
            "tight_tunnels" => Some(Self::tight_tunnels()),
            "swiss_cheese" => Some(Self::swiss_cheese()),
            "vertical_shafts" => Some(Self::vertical_shafts()),
            "organic_caves" => Some(Self::organic_caves()),
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
        self.fractal().validate()
    }
}

pub struct CaveGenerator {
    params: CaveParams,
    perlin: Perlin2D,
}

impl CaveGenerator {
    pub fn new(params: CaveParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            perlin: Perlin2D::new(params.seed),
        })
    }

    pub fn params(&self) -> &CaveParams {
        &self.params
    }

    fn fbm(&self) -> FractalSampler<'_, Perlin2D> {
        FractalSampler::prevalidated(&self.perlin, self.params.fractal())
    }

    fn is_solid(&self, density: f32) -> bool {
        (density > self.params.threshold as f32) != self.params.invert_threshold
    }

    pub fn sample_density(&self, x: f64, y: f64) -> f64 {
        self.fbm().sample(x, y)
    }

    // Same f32 comparison as ScalarField2D::threshold, so chunks agree with maps
    pub fn sample(&self, x: f64, y: f64) -> bool {
        self.is_solid(self.sample_density(x, y) as f32)
    }

    pub fn generate_density(&self, width: usize, height: usize) -> Result<ScalarField2D> {
        self.density_region(0, 0, width, height)
    }

    fn density_region(
        &self,
        origin_x: i64,
        origin_y: i64,
        width: usize,
        height: usize,
    ) -> Result<ScalarField2D> {
        check_dimension("width", width)?;
        check_dimension("height", height)?;
        let fbm = self.fbm();
        Ok(ScalarField2D::from_fn(width, height, |x, y| {
            fbm.sample(origin_x as f64 + x as f64, origin_y as f64 + y as f64) as f32
        }))
    }

    // Thresholded samples only: smoothing needs neighbours outside the chunk
    pub fn generate_chunk(
        &self,
        chunk_x: i64,
        chunk_y: i64,
        chunk_size: usize,
    ) -> Result<BoolField2D> {
        check_dimension("chunk_size", chunk_size)?;
        let size = i64::try_from(chunk_size)
            .map_err(|_| NoiseError::invalid("chunk_size", chunk_size as f64, "<= i64::MAX"))?;
        let origin_x = chunk_x
            .checked_mul(size)
            .ok_or_else(|| NoiseError::invalid("chunk_x", chunk_x as f64, "chunk origin within i64"))?;
        let origin_y = chunk_y
            .checked_mul(size)
            .ok_or_else(|| NoiseError::invalid("chunk_y", chunk_y as f64, "chunk origin within i64"))?;

        let density = self.density_region(origin_x, origin_y, chunk_size, chunk_size)?;
        Ok(density.threshold(self.params.threshold as f32, self.params.invert_threshold))
    }

    // Full pipeline: density, threshold, smoothing, then small-region cleanup
    pub fn generate(&self, width: usize, height: usize) -> Result<BoolField2D> {
        let p = &self.params;
        let density = self.generate_density(width, height)?;
        let mut cave = density.threshold(p.threshold as f32, p.invert_threshold);

        if p.smoothing_iterations > 0 {
            cave = smooth_cellular_automata(&cave, p.smoothing_iterations, p.birth_limit, p.death_limit)?;
        }

        if p.remove_small_regions {
            // Stray rock islands first, then sealed air pockets
            remove_small_regions(&mut cave, p.min_region_size, false)?;
            remove_small_regions(&mut cave, p.min_region_size, true)?;
        }

        tracing::debug!(
            width,
            height,
            solid = cave.count_true(),
            "cave generated"
        );
        Ok(cave)
    }
}

// Solid cells among the (2r+1)² - 1 neighbours; off-map counts as solid so caves close at the edge
pub fn count_solid_neighbors(cave: &BoolField2D, x: usize, y: usize, range: usize) -> usize {
    let (w, h) = (cave.width() as isize, cave.height() as isize);
    let r = range as isize;
    let mut count = 0;
    for dy in -r..=r {
        for dx in -r..=r {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = x as isize + dx;
            let ny = y as isize + dy;
            if nx < 0 || nx >= w || ny < 0 || ny >= h || cave.get(nx as usize, ny as usize) {
                count += 1;
            }
        }
    }
    count
}

// Every pass reads the previous grid and writes a fresh one
pub fn smooth_cellular_automata(
    cave: &BoolField2D,
    iterations: u32,
    birth_limit: u32,
    death_limit: u32,
) -> Result<BoolField2D> {
    cave.ensure_not_empty()?;
    let mut current = cave.clone();
    for _ in 0..iterations {
        let prev = current;
        current = BoolField2D::from_fn(prev.width(), prev.height(), |x, y| {
            let n = count_solid_neighbors(&prev, x, y, 1) as u32;
            if prev.get(x, y) { n >= death_limit } else { n >= birth_limit }
        });
    }
    Ok(current)
}

// 4-connected region labelling of cells equal to `solid`
#[derive(Clone, Debug)]
pub struct Regions {
    width: usize,
    labels: Vec<Option<usize>>,
    sizes: Vec<usize>,
}

impl Regions {
    pub fn count(&self) -> usize {
        self.sizes.len()
    }

    pub fn label(&self, x: usize, y: usize) -> Option<usize> {
        self.labels[y * self.width + x]
    }

    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    // Lowest label among the largest regions
    pub fn largest(&self) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        for (id, &size) in self.sizes.iter().enumerate() {
            if best.is_none_or(|(_, s)| size > s) {
                best = Some((id, size));
            }
        }
        best.map(|(id, _)| id)
    }
}

pub fn find_regions(cave: &BoolField2D, solid: bool) -> Regions {
    let (w, h) = (cave.width(), cave.height());
    let mut labels = vec![None; w * h];
    let mut sizes = Vec::new();
    let mut queue = VecDeque::new();

    for sy in 0..h {
        for sx in 0..w {
            if labels[sy * w + sx].is_some() || cave.get(sx, sy) != solid {
                continue;
            }
            let id = sizes.len();
            let mut size = 0;
            labels[sy * w + sx] = Some(id);
            queue.push_back((sx, sy));

            while let Some((x, y)) = queue.pop_front() {
                size += 1;
                let neighbours = [
                    (x.checked_sub(1), Some(y)),
                    (Some(x + 1).filter(|&nx| nx < w), Some(y)),
                    (Some(x), y.checked_sub(1)),
                    (Some(x), Some(y + 1).filter(|&ny| ny < h)),
                ];
                for (nx, ny) in neighbours {
                    let (Some(nx), Some(ny)) = (nx, ny) else { continue };
                    let i = ny * w + nx;
                    if labels[i].is_none() && cave.get(nx, ny) == solid {
                        labels[i] = Some(id);
                        queue.push_back((nx, ny));
                    }
                }
            }
            sizes.push(size);
        }
    }

    Regions {
        width: w,
        labels,
        sizes,
    }
}

// remove_air = false: solid islands smaller than min_size become air.
// remove_air = true: air pockets smaller than min_size are filled.
// The largest region of the scanned kind is always kept.
pub fn remove_small_regions(cave: &mut BoolField2D, min_size: usize, remove_air: bool) -> Result<()> {
    cave.ensure_not_empty()?;
    let target = !remove_air;
    let regions = find_regions(cave, target);
    let largest = regions.largest();

    let mut removed = 0;
    for y in 0..cave.height() {
        for x in 0..cave.width() {
            if let Some(id) = regions.label(x, y) {
                if Some(id) != largest && regions.sizes()[id] < min_size {
                    cave.set(x, y, !target);
                    removed += 1;
                }
            }
        }
    }
    tracing::trace!(removed, remove_air, "small regions removed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&str]) -> BoolField2D {
        let rows: Vec<Vec<bool>> = rows
            .iter()
            .map(|r| r.chars().map(|c| c == '#').collect())
            .collect();
        BoolField2D::from_rows(&rows).unwrap()
    }

    #[test]
    fn neighbours_off_the_edge_count_as_solid() {
        let cave = grid(&["...", "...", "..."]);
        assert_eq!(count_solid_neighbors(&cave, 1, 1, 1), 0);
        assert_eq!(count_solid_neighbors(&cave, 0, 0, 1), 5);
    }

    #[test]
    fn lone_rock_dies_and_enclosed_air_is_born() {
        let rock = grid(&[".....", ".....", "..#..", ".....", "....."]);
        let out = smooth_cellular_automata(&rock, 1, 4, 3).unwrap();
        assert!(!out.get(2, 2));

        let hole = grid(&["#####", "#####", "##.##", "#####", "#####"]);
        let out = smooth_cellular_automata(&hole, 1, 4, 3).unwrap();
        assert!(out.get(2, 2));
    }

    #[test]
    fn regions_are_four_connected() {
        let cave = grid(&["#.#", ".#.", "#.#"]);
        let solid = find_regions(&cave, true);
        assert_eq!(solid.count(), 5);
        let air = find_regions(&cave, false);
        assert_eq!(air.count(), 4);
        assert!(air.sizes().iter().all(|&s| s == 1));
    }

    #[test]
    fn small_islands_removed_largest_kept() {
        let mut cave = grid(&[
            "###.....",
            "###.....",
            "###...#.",
            "........",
        ]);
        remove_small_regions(&mut cave, 4, false).unwrap();
        assert!(!cave.get(6, 2));
        assert_eq!(cave.count_true(), 9);

        // Even an undersized region survives when it is the largest
        let mut tiny = grid(&["#...", "...."]);
        remove_small_regions(&mut tiny, 10, false).unwrap();
        assert!(tiny.get(0, 0));
    }

    #[test]
    fn air_pockets_are_filled() {
        let mut cave = grid(&[
            "........",
            "........",
            "#######.",
            "###.###.",
            "#######.",
        ]);
        remove_small_regions(&mut cave, 3, true).unwrap();
        assert!(cave.get(3, 3));
        assert!(!cave.get(0, 0));
    }

    #[test]
    fn chunks_match_the_thresholded_density_map() {
        let caves = CaveGenerator::new(CaveParams::default().with_seed(21)).unwrap();
        let density = caves.generate_density(64, 64).unwrap();
        let map = density.threshold(0.5, false);
        let chunk = caves.generate_chunk(1, 2, 16).unwrap();
        for y in 0..16 {
            for x in 0..16 {
                assert_eq!(chunk.get(x, y), map.get(16 + x, 32 + y));
                assert_eq!(chunk.get(x, y), caves.sample((16 + x) as f64, (32 + y) as f64));
            }
        }
    }

    #[test]
    fn full_pipeline_is_deterministic() {
        let params = CaveParams::organic_caves().with_seed(3);
        let a = CaveGenerator::new(params).unwrap().generate(80, 60).unwrap();
        let b = CaveGenerator::new(params).unwrap().generate(80, 60).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.width(), 80);
        assert_eq!(a.height(), 60);
    }

    #[test]
    fn inverted_threshold_flips_cells() {
        let plain = CaveGenerator::new(CaveParams::default().with_seed(5)).unwrap();
        let inverted = CaveGenerator::new(CaveParams {
            invert_threshold: true,
            ..CaveParams::default().with_seed(5)
        })
        .unwrap();
        let a = plain.generate_chunk(-1, -1, 8).unwrap();
        let b = inverted.generate_chunk(-1, -1, 8).unwrap();
        for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
            assert_ne!(x, y);
        }
    }

    #[test]
    fn presets_validate() {
        for name in ["open_caverns", "tight_tunnels", "swiss_cheese", "vertical_shafts", "organic_caves"] {
            let p = CaveParams::preset(name).unwrap();
            assert!(p.validate().is_ok(), "{}", name);
        }
    }
}
