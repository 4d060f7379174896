use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use noisefield_core::{BoolField2D, ScalarField2D};
use serde::{Deserialize, Serialize};

use crate::{ExportError, Result, ensure_parent};

// Tile ids for 2D platformers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum TileType {
    Air = 0,
    Solid = 1,
    Platform = 2, // one-way platform
    Hazard = 3,   // spikes, lava
    Ladder = 4,
    Water = 5,
    Ice = 6,
    Breakable = 7,
}

impl TileType {
    pub fn id(self) -> i32 {
        self as i32
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoTiling {
    #[default]
    None,
    Four,  // N E S W, ids 0..=15
    Eight, // plus diagonals, ids 0..=255
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TilemapConfig {
    pub tile_width: u32,
    pub tile_height: u32,
    // (threshold, tile id), ascending by threshold
    pub height_to_tile: Vec<(f32, i32)>,
    pub solid_tile_id: i32,
    pub air_tile_id: i32,
    pub auto_tiling: AutoTiling,
    pub layer_name: String,
}

impl Default for TilemapConfig {
    fn default() -> Self {
        Self {
            tile_width: 16,
            tile_height: 16,
            height_to_tile: vec![
                (0.0, 0),  // deep water
                (0.3, 1),  // shallow water
                (0.45, 2), // sand
                (0.55, 3), // grass
                (0.70, 4), // rock
                (0.85, 5), // mountain
                (1.0, 6),  // snow
            ],
            solid_tile_id: TileType::Solid.id(),
            air_tile_id: TileType::Air.id(),
            auto_tiling: AutoTiling::None,
            layer_name: "Ground".to_string(),
        }
    }
}

impl TilemapConfig {
    // Id of the last threshold that `height` reaches; 0 below the first one
    pub fn tile_for_height(&self, height: f32) -> i32 {
        let mut id = 0;
        for &(threshold, tile) in &self.height_to_tile {
            if height >= threshold {
                id = tile;
            } else {
                break;
            }
        }
        id
    }
}

// Row-major grid of tile ids
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tilemap {
    width: usize,
    height: usize,
    tiles: Vec<i32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TilemapJson<'a> {
    width: usize,
    height: usize,
    tile_width: u32,
    tile_height: u32,
    layer_name: &'a str,
    tiles: Vec<&'a [i32]>,
}

impl Tilemap {
    pub fn new(width: usize, height: usize, fill: i32) -> Self {
        Self {
            width,
            height,
            tiles: vec![fill; width * height],
        }
    }

    pub fn from_field(field: &ScalarField2D, config: &TilemapConfig) -> Self {
        let mut map = Self {
            width: field.width(),
            height: field.height(),
            tiles: field
                .as_slice()
                .iter()
                .map(|&h| config.tile_for_height(h))
                .collect(),
        };
        map.apply_config(config);
        map
    }

    pub fn from_bool(field: &BoolField2D, config: &TilemapConfig) -> Self {
        let mut map = Self {
            width: field.width(),
            height: field.height(),
            tiles: field
                .as_slice()
                .iter()
                .map(|&solid| if solid { config.solid_tile_id } else { config.air_tile_id })
                .collect(),
        };
        map.apply_config(config);
        map
    }

    // Side view of a 1D profile: a column is solid from its surface row down,
    // with the surface row at (1 - h) * map_height like the terrain heightmap
    pub fn from_terrain(heights: &[f32], map_height: usize, config: &TilemapConfig) -> Result<Self> {
        if heights.is_empty() || map_height == 0 {
            return Err(ExportError::Empty { what: "terrain profile" });
        }
        let width = heights.len();
        let mut map = Self::new(width, map_height, config.air_tile_id);
        for (x, &h) in heights.iter().enumerate() {
            let top = (((1.0 - h) * map_height as f32).max(0.0) as usize).min(map_height - 1);
            for y in top..map_height {
                map.set(x, y, config.solid_tile_id);
            }
        }
        map.apply_config(config);
        Ok(map)
    }

    fn apply_config(&mut self, config: &TilemapConfig) {
        if config.auto_tiling != AutoTiling::None {
            *self = self.autotile(config.auto_tiling, config.solid_tile_id);
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> i32 {
        self.tiles[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, id: i32) {
        self.tiles[y * self.width + x] = id;
    }

    pub fn tiles(&self) -> &[i32] {
        &self.tiles
    }

    pub fn rows(&self) -> impl Iterator<Item = &[i32]> {
        self.tiles.chunks(self.width.max(1))
    }

    fn is(&self, x: isize, y: isize, id: i32) -> bool {
        x >= 0
            && y >= 0
            && (x as usize) < self.width
            && (y as usize) < self.height
            && self.get(x as usize, y as usize) == id
    }

    // Neighbour bitmask: N=1 E=2 S=4 W=8, diagonals NE=16 SE=32 SW=64 NW=128.
    // Off-map neighbours count as empty.
    pub fn bitmask(&self, x: usize, y: usize, solid_id: i32, diagonals: bool) -> i32 {
        let (x, y) = (x as isize, y as isize);
        let mut mask = 0;
        let mut bit = |dx: isize, dy: isize, value: i32| {
            if self.is(x + dx, y + dy, solid_id) {
                mask |= value;
            }
        };
        bit(0, -1, 1);
        bit(1, 0, 2);
        bit(0, 1, 4);
        bit(-1, 0, 8);
        if diagonals {
            bit(1, -1, 16);
            bit(1, 1, 32);
            bit(-1, 1, 64);
            bit(-1, -1, 128);
        }
        mask
    }

    // Replace every solid tile by its neighbour bitmask
    pub fn autotile(&self, mode: AutoTiling, solid_id: i32) -> Self {
        let diagonals = match mode {
            AutoTiling::None => return self.clone(),
            AutoTiling::Four => false,
            AutoTiling::Eight => true,
        };
        let mut out = self.clone();
        for y in 0..self.height {
            for x in 0..self.width {
                if self.get(x, y) == solid_id {
                    out.set(x, y, self.bitmask(x, y, solid_id, diagonals));
                }
            }
        }
        out
    }

    fn ensure_not_empty(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ExportError::Empty { what: "tilemap" });
        }
        Ok(())
    }

    fn create(path: &Path) -> Result<BufWriter<File>> {
        ensure_parent(path)?;
        let file = File::create(path).map_err(|e| ExportError::io(path, e))?;
        Ok(BufWriter::new(file))
    }

    // One line per row, ids separated by commas
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        self.ensure_not_empty()?;
        let mut out = Self::create(path)?;
        for row in self.rows() {
            let line: Vec<String> = row.iter().map(i32::to_string).collect();
            writeln!(out, "{}", line.join(",")).map_err(|e| ExportError::io(path, e))?;
        }
        out.flush().map_err(|e| ExportError::io(path, e))?;
        tracing::info!(path = %path.display(), "tilemap written as csv");
        Ok(path.to_path_buf())
    }

    pub fn write_json(&self, path: impl AsRef<Path>, config: &TilemapConfig) -> Result<PathBuf> {
        let path = path.as_ref();
        self.ensure_not_empty()?;
        let doc = TilemapJson {
            width: self.width,
            height: self.height,
            tile_width: config.tile_width,
            tile_height: config.tile_height,
            layer_name: &config.layer_name,
            tiles: self.rows().collect(),
        };
        let mut out = Self::create(path)?;
        serde_json::to_writer_pretty(&mut out, &doc).map_err(|source| ExportError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        out.flush().map_err(|e| ExportError::io(path, e))?;
        tracing::info!(path = %path.display(), "tilemap written as json");
        Ok(path.to_path_buf())
    }

    // Little-endian i32 width, i32 height, then width*height i32 ids row by row
    pub fn write_binary(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        self.ensure_not_empty()?;
        let w = i32::try_from(self.width).map_err(|_| ExportError::TooLarge {
            dimension: "width",
            value: self.width,
        })?;
        let h = i32::try_from(self.height).map_err(|_| ExportError::TooLarge {
            dimension: "height",
            value: self.height,
        })?;

        let mut bytes = Vec::with_capacity(8 + self.tiles.len() * 4);
        bytes.extend_from_slice(&w.to_le_bytes());
        bytes.extend_from_slice(&h.to_le_bytes());
        for id in &self.tiles {
            bytes.extend_from_slice(&id.to_le_bytes());
        }

        let mut out = Self::create(path)?;
        out.write_all(&bytes).map_err(|e| ExportError::io(path, e))?;
        out.flush().map_err(|e| ExportError::io(path, e))?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "tilemap written as binary");
        Ok(path.to_path_buf())
    }

    pub fn read_binary(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let malformed = |reason: &str| ExportError::Malformed {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };

        let mut bytes = Vec::new();
        File::open(path)
            .and_then(|mut f| f.read_to_end(&mut bytes))
            .map_err(|e| ExportError::io(path, e))?;

        let mut words = bytes
            .chunks_exact(4)
            .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]));
        if bytes.len() % 4 != 0 {
            return Err(malformed("length is not a multiple of 4"));
        }
        let (Some(w), Some(h)) = (words.next(), words.next()) else {
            return Err(malformed("missing header"));
        };
        let (Ok(width), Ok(height)) = (usize::try_from(w), usize::try_from(h)) else {
            return Err(malformed("negative dimensions"));
        };
        let tiles: Vec<i32> = words.collect();
        if Some(tiles.len()) != width.checked_mul(height) {
            return Err(malformed("tile count does not match header"));
        }
        Ok(Self {
            width,
            height,
            tiles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_pick_the_last_band_reached() {
        let c = TilemapConfig::default();
        assert_eq!(c.tile_for_height(-0.1), 0);
        assert_eq!(c.tile_for_height(0.0), 0);
        assert_eq!(c.tile_for_height(0.3), 1);
        assert_eq!(c.tile_for_height(0.5), 2);
        assert_eq!(c.tile_for_height(0.99), 5);
        assert_eq!(c.tile_for_height(1.0), 6);
    }

    #[test]
    fn bool_fields_map_to_solid_and_air() {
        let field = BoolField2D::from_rows(&[vec![true, false], vec![false, true]]).unwrap();
        let map = Tilemap::from_bool(&field, &TilemapConfig::default());
        assert_eq!(map.tiles(), &[1, 0, 0, 1]);
    }

    #[test]
    fn terrain_columns_fill_downwards() {
        let map = Tilemap::from_terrain(&[0.5, 1.0, 0.0], 4, &TilemapConfig::default()).unwrap();
        let column = |x| (0..4).map(|y| map.get(x, y)).collect::<Vec<_>>();
        assert_eq!(column(0), vec![0, 0, 1, 1]);
        assert_eq!(column(1), vec![1, 1, 1, 1]);
        assert_eq!(column(2), vec![0, 0, 0, 1]);
    }

    #[test]
    fn bitmask_bits() {
        // A plus sign: the centre sees all four arms, off-map counts as empty
        let mut map = Tilemap::new(3, 3, 0);
        for (x, y) in [(1, 0), (0, 1), (1, 1), (2, 1), (1, 2)] {
            map.set(x, y, 1);
        }
        assert_eq!(map.bitmask(1, 1, 1, false), 15);
        assert_eq!(map.bitmask(1, 0, 1, false), 4);
        assert_eq!(map.bitmask(0, 0, 1, true), 2 | 4 | 32);
        assert_eq!(map.bitmask(2, 2, 1, true), 1 | 8 | 128);

        let tiled = map.autotile(AutoTiling::Four, 1);
        assert_eq!(tiled.get(1, 1), 15);
        assert_eq!(tiled.get(0, 0), 0);
    }

    #[test]
    fn autotiling_from_config() {
        let field = BoolField2D::filled(2, 1, true);
        let config = TilemapConfig {
            auto_tiling: AutoTiling::Four,
            ..Default::default()
        };
        let map = Tilemap::from_bool(&field, &config);
        assert_eq!(map.tiles(), &[2, 8]);
    }

    #[test]
    fn empty_tilemaps_are_not_written() {
        let dir = std::env::temp_dir().join(format!("noisefield-empty-tiles-{}", std::process::id()));
        let empty = Tilemap::new(0, 0, 0);
        let config = TilemapConfig::default();
        assert!(matches!(empty.write_csv(dir.join("e.csv")), Err(ExportError::Empty { .. })));
        assert!(matches!(empty.write_json(dir.join("e.json"), &config), Err(ExportError::Empty { .. })));
        assert!(matches!(empty.write_binary(dir.join("e.bin")), Err(ExportError::Empty { .. })));
        assert!(!dir.exists());
    }
}
