mod config;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use noisefield_core::{
    CaveGenerator, CaveParams, FractalParams, NoiseGenerator, NoiseKind, TerrainParams,
    TerrainSampler,
};
use noisefield_export::{
    AutoTiling, ImageStyle, Tilemap, TilemapConfig, preview, save_bool, save_field,
};
use tracing_subscriber::EnvFilter;

use crate::config::JobConfig;

#[derive(Parser, Debug)]
#[command(name = "noisefield", about = "Seeded Perlin/Simplex noise maps, caves and terrain")]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fractal noise map, or one chunk of the infinite field
    Map(MapArgs),
    /// Cellular cave map from a preset
    Cave(CaveArgs),
    /// Side-view platformer terrain from a preset
    Terrain(TerrainArgs),
    /// Run a TOML job file
    Run {
        job: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
    Perlin,
    Simplex,
}

impl From<KindArg> for NoiseKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Perlin => NoiseKind::Perlin,
            KindArg::Simplex => NoiseKind::Simplex,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StyleArg {
    Gray,
    Terrain,
}

impl From<StyleArg> for ImageStyle {
    fn from(s: StyleArg) -> Self {
        match s {
            StyleArg::Gray => ImageStyle::Gray,
            StyleArg::Terrain => ImageStyle::Terrain,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TilingArg {
    None,
    Four,
    Eight,
}

impl From<TilingArg> for AutoTiling {
    fn from(t: TilingArg) -> Self {
        match t {
            TilingArg::None => AutoTiling::None,
            TilingArg::Four => AutoTiling::Four,
            TilingArg::Eight => AutoTiling::Eight,
        }
    }
}

#[derive(clap::Args, Debug)]
struct MapArgs {
    #[arg(long, value_enum, default_value_t = KindArg::Perlin)]
    kind: KindArg,

    /// Negative = fresh entropy each run
    #[arg(long, default_value_t = 42, allow_negative_numbers = true)]
    seed: i64,

    #[arg(long, default_value_t = 256)]
    width: usize,

    #[arg(long, default_value_t = 256)]
    height: usize,

    #[arg(long, default_value_t = 50.0)]
    scale: f64,

    #[arg(long, default_value_t = 4)]
    octaves: u32,

    #[arg(long, default_value_t = 0.5)]
    persistence: f64,

    #[arg(long, default_value_t = 2.0)]
    lacunarity: f64,

    #[arg(long, default_value_t = 1.0)]
    frequency: f64,

    /// Generate the chunk at these chunk coordinates instead of a map at the origin
    #[arg(long, num_args = 2, value_names = ["X", "Y"], allow_negative_numbers = true)]
    chunk: Option<Vec<i64>>,

    #[arg(long, default_value_t = 64)]
    chunk_size: usize,

    #[arg(long, value_enum, default_value_t = StyleArg::Gray)]
    style: StyleArg,

    /// Print a '#'/'.' preview of the field
    #[arg(long)]
    preview: bool,

    #[arg(short, long, default_value = "map.png")]
    output: PathBuf,
}

#[derive(clap::Args, Debug)]
struct CaveArgs {
    /// open_caverns, tight_tunnels, swiss_cheese, vertical_shafts or organic_caves
    #[arg(long, default_value = "organic_caves")]
    preset: String,

    #[arg(long, default_value_t = 42, allow_negative_numbers = true)]
    seed: i64,

    #[arg(long, default_value_t = 128)]
    width: usize,

    #[arg(long, default_value_t = 96)]
    height: usize,

    #[arg(short, long, default_value = "cave.png")]
    output: PathBuf,

    /// Also write a tilemap; .csv, .json or .bin
    #[arg(long)]
    tilemap: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = TilingArg::None)]
    auto_tiling: TilingArg,
}

#[derive(clap::Args, Debug)]
struct TerrainArgs {
    /// rolling_hills, mountainous, gentle_plains, steep_cliffs or plateaus
    #[arg(long, default_value = "rolling_hills")]
    preset: String,

    #[arg(long, default_value_t = 42, allow_negative_numbers = true)]
    seed: i64,

    #[arg(long, default_value_t = 512)]
    width: usize,

    #[arg(long, default_value_t = 256)]
    height: usize,

    #[arg(short, long, default_value = "terrain.png")]
    output: PathBuf,

    /// Also write a tilemap; .csv, .json or .bin
    #[arg(long)]
    tilemap: Option<PathBuf>,
}

fn init_tracing(verbose: u8) {
    // -v wins over RUST_LOG; without it RUST_LOG applies, defaulting to info
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn write_tilemap(map: &Tilemap, path: &Path, config: &TilemapConfig) -> Result<PathBuf> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let written = match ext.as_deref() {
        Some("csv") => map.write_csv(path)?,
        Some("json") => map.write_json(path, config)?,
        Some("bin") => map.write_binary(path)?,
        _ => bail!("unknown tilemap format for {}; use .csv, .json or .bin", path.display()),
    };
    Ok(written)
}

fn run_map(args: &MapArgs) -> Result<()> {
    let params = FractalParams::new(args.scale, args.octaves, args.persistence, args.lacunarity)
        .with_frequency(args.frequency);
    let generator = NoiseGenerator::new(args.kind.into(), args.seed);

    let start = Instant::now();
    let field = match args.chunk.as_deref() {
        Some(&[cx, cy]) => generator.generate_chunk(cx, cy, args.chunk_size, &params)?,
        Some(_) => bail!("--chunk takes exactly two values"),
        None => generator.generate_map(args.width, args.height, &params)?,
    };
    let stats = field.stats()?;
    tracing::info!(
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        min = stats.min,
        max = stats.max,
        mean = stats.mean,
        "field generated"
    );

    if args.preview {
        print!("{}", preview::ascii(&field, 0.5, 80, 40));
    }
    save_field(&field, &args.output, args.style.into())?;
    Ok(())
}

fn run_cave(args: &CaveArgs) -> Result<()> {
    let params = CaveParams::preset(&args.preset)
        .with_context(|| format!("unknown cave preset `{}`", args.preset))?
        .with_seed(args.seed);
    let caves = CaveGenerator::new(params)?;
    let cave = caves.generate(args.width, args.height)?;
    tracing::info!(
        solid = cave.count_true(),
        cells = cave.len(),
        preset = %args.preset,
        "cave generated"
    );

    save_bool(&cave, &args.output)?;
    if let Some(path) = &args.tilemap {
        let config = TilemapConfig {
            auto_tiling: args.auto_tiling.into(),
            ..Default::default()
        };
        write_tilemap(&Tilemap::from_bool(&cave, &config), path, &config)?;
    }
    Ok(())
}

fn run_terrain(args: &TerrainArgs) -> Result<()> {
    let params = TerrainParams::preset(&args.preset)
        .with_context(|| format!("unknown terrain preset `{}`", args.preset))?
        .with_seed(args.seed);
    let sampler = TerrainSampler::new(params)?;

    let view = sampler.generate_heightmap(args.width, args.height, 0.0, 1.0)?;
    save_field(&view, &args.output, ImageStyle::Gray)?;

    if let Some(path) = &args.tilemap {
        let config = TilemapConfig::default();
        let profile = sampler.generate_profile(args.width, 0.0, 1.0)?;
        let map = Tilemap::from_terrain(&profile, args.height, &config)?;
        write_tilemap(&map, path, &config)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Command::Map(args) => run_map(args),
        Command::Cave(args) => run_cave(args),
        Command::Terrain(args) => run_terrain(args),
        Command::Run { job } => {
            let path = JobConfig::load(job)?.run()?;
            tracing::info!(path = %path.display(), "job finished");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn negative_chunks_and_seeds_parse() {
        let cli = Cli::try_parse_from([
            "noisefield", "map", "--seed", "-1", "--chunk", "-3", "2", "--kind", "simplex",
        ])
        .unwrap();
        let Command::Map(args) = cli.command else {
            panic!("expected map");
        };
        assert_eq!(args.seed, -1);
        assert_eq!(args.chunk, Some(vec![-3, 2]));
        assert!(matches!(args.kind, KindArg::Simplex));
    }

    #[test]
    fn unknown_tilemap_extensions_are_refused() {
        let map = Tilemap::new(1, 1, 0);
        assert!(write_tilemap(&map, Path::new("level.txt"), &TilemapConfig::default()).is_err());
    }
}
