use std::fs;
use std::path::PathBuf;

use noisefield_core::{CaveGenerator, CaveParams, FractalParams, NoiseConfig, NoiseKind, ThermalErosion2D};
use noisefield_export::{
    AutoTiling, ExportError, FieldDoc, FieldStore, ImageStyle, Tilemap, TilemapConfig, save_bool,
    save_field,
};

fn scratch(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("noisefield-export-{}-{}", tag, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir
}

#[test]
fn test_roundtrip_2d() {
    let dir = scratch("store");
    let store = FieldStore::open(&dir).expect("store open failed");

    // Generate a small height-map
    let noise = NoiseConfig {
        kind: NoiseKind::Perlin,
        seed: 42,
        fractal: FractalParams::new(16.0, 4, 0.5, 2.0),
    };
    let size = 65;
    let mut grid = noise.generate_map(size, size).expect("generation failed");
    ThermalErosion2D::new(3, 0.01).apply(&mut grid).expect("erosion failed");

    let doc = FieldDoc::new("eroded", noise, &grid);
    store.create(&doc).expect("create failed");

    let found = store
        .read_by_name("eroded")
        .expect("read failed")
        .expect("doc not found");
    assert_eq!(found, doc);
    assert_eq!(found.data.len(), size * size);
    assert_eq!(found.to_field().expect("bad shape"), grid);
    assert_eq!(store.list_names().expect("list failed"), vec!["eroded".to_string()]);

    // Same name replaces the old document
    let flat = noisefield_core::ScalarField2D::filled(2, 2, 0.25);
    store.create(&FieldDoc::new("eroded", noise, &flat)).expect("replace failed");
    let replaced = store.read_by_name("eroded").unwrap().unwrap();
    assert_eq!(replaced.width, 2);

    // Clean up
    assert!(store.delete_by_name("eroded").expect("delete failed"));
    assert!(store.read_by_name("eroded").unwrap().is_none());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn tilemap_binary_roundtrip() {
    let dir = scratch("tiles");
    let caves = CaveGenerator::new(CaveParams::default().with_seed(7)).unwrap();
    let cave = caves.generate(40, 24).unwrap();
    let config = TilemapConfig {
        auto_tiling: AutoTiling::Eight,
        ..Default::default()
    };
    let map = Tilemap::from_bool(&cave, &config);

    let path = map.write_binary(dir.join("level.bin")).unwrap();
    assert_eq!(fs::metadata(&path).unwrap().len(), 8 + 40 * 24 * 4);
    let back = Tilemap::read_binary(&path).unwrap();
    assert_eq!(back, map);
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn truncated_binary_is_malformed() {
    let dir = scratch("truncated");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("short.bin");
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&3i32.to_le_bytes());
    bytes.extend_from_slice(&3i32.to_le_bytes());
    bytes.extend_from_slice(&1i32.to_le_bytes());
    fs::write(&path, bytes).unwrap();
    assert!(matches!(Tilemap::read_binary(&path), Err(ExportError::Malformed { .. })));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn csv_and_json_layouts() {
    let dir = scratch("text");
    let heights = [0.5, 1.0, 0.0];
    let config = TilemapConfig::default();
    let map = Tilemap::from_terrain(&heights, 2, &config).unwrap();

    let csv = fs::read_to_string(map.write_csv(dir.join("t.csv")).unwrap()).unwrap();
    assert_eq!(csv, "0,1,0\n1,1,1\n");

    let json = fs::read_to_string(map.write_json(dir.join("t.json"), &config).unwrap()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["width"], 3);
    assert_eq!(value["height"], 2);
    assert_eq!(value["tileWidth"], 16);
    assert_eq!(value["layerName"], "Ground");
    assert_eq!(value["tiles"][1][2], 1);
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn images_land_on_disk() {
    let dir = scratch("images");
    let noise = NoiseConfig {
        seed: 3,
        ..Default::default()
    };
    let map = noise.generate_map(32, 16).unwrap();
    for (name, style) in [("gray.png", ImageStyle::Gray), ("terrain.jpg", ImageStyle::Terrain)] {
        let path = save_field(&map, dir.join("nested").join(name), style).unwrap();
        assert!(fs::metadata(&path).unwrap().len() > 0);
    }

    let caves = CaveGenerator::new(CaveParams::open_caverns().with_seed(1)).unwrap();
    let path = save_bool(&caves.generate(16, 16).unwrap(), dir.join("cave.png")).unwrap();
    let decoded = image::open(&path).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (16, 16));
    let _ = fs::remove_dir_all(&dir);
}
