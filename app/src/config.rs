// Job files: one TOML document describing a map, its post-processing and where it goes
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use noisefield_core::{NoiseConfig, ScalarField2D, ThermalErosion2D, domain_warp, filters};
use noisefield_export::{FieldDoc, FieldStore, ImageStyle, save_field};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub width: usize,
    pub height: usize,
    pub noise: NoiseConfig,
    pub post: PostConfig,
    pub output: OutputConfig,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            noise: NoiseConfig::default(),
            post: PostConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

// Every pass is off at its default
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostConfig {
    pub warp_strength: f32,
    pub erosion_iterations: usize,
    pub talus: f32,
    pub blur_sigma: f32,
    pub normalize: bool,
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            warp_strength: 0.0,
            erosion_iterations: 0,
            talus: 0.01,
            blur_sigma: 0.0,
            normalize: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: PathBuf,
    pub style: ImageStyle,
    pub store: Option<PathBuf>, // field store directory; the document is named after the image
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("noisefield.png"),
            style: ImageStyle::Gray,
            store: None,
        }
    }
}

impl JobConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading job file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing job file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let job: Self = toml::from_str(text)?;
        ensure!(job.width > 0 && job.height > 0, "width and height must be positive");
        Ok(job)
    }

    // Generate, then warp, erode, blur and normalize in that order
    pub fn build_field(&self) -> Result<ScalarField2D> {
        let mut map = self
            .noise
            .generate_map(self.width, self.height)
            .context("generating base map")?;
        let post = &self.post;

        if post.warp_strength > 0.0 {
            tracing::trace!(strength = post.warp_strength, "domain warp");
            map = domain_warp::domain_warp(&map, post.warp_strength, self.noise.seed)?;
        }
        if post.erosion_iterations > 0 {
            tracing::trace!(iterations = post.erosion_iterations, talus = post.talus, "thermal erosion");
            ThermalErosion2D::new(post.erosion_iterations, post.talus).apply(&mut map)?;
        }
        if post.blur_sigma > 0.0 {
            tracing::trace!(sigma = post.blur_sigma, "gaussian blur");
            map = filters::gaussian_blur(&map, post.blur_sigma)?;
        }
        if post.normalize {
            map = filters::normalize(&map)?;
        }
        Ok(map)
    }

    pub fn run(&self) -> Result<PathBuf> {
        let map = self.build_field()?;
        let path = save_field(&map, &self.output.path, self.output.style)?;

        if let Some(dir) = &self.output.store {
            let name = self
                .output
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .context("output path has no file name to store the field under")?;
            let store = FieldStore::open(dir)?;
            store.create(&FieldDoc::new(name, self.noise, &map))?;
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noisefield_core::NoiseKind;

    #[test]
    fn partial_job_fills_from_defaults() {
        let job = JobConfig::parse(
            r#"
            width = 64

            [noise]
            kind = "simplex"
            seed = 9

            [noise.fractal]
            octaves = 6

            [post]
            erosion_iterations = 4

            [output]
            path = "out/hills.jpg"
            style = "terrain"
            "#,
        )
        .unwrap();
        assert_eq!(job.width, 64);
        assert_eq!(job.height, 256);
        assert_eq!(job.noise.kind, NoiseKind::Simplex);
        assert_eq!(job.noise.seed, 9);
        assert_eq!(job.noise.fractal.octaves, 6);
        assert_eq!(job.noise.fractal.scale, 50.0);
        assert_eq!(job.post.erosion_iterations, 4);
        assert_eq!(job.post.blur_sigma, 0.0);
        assert_eq!(job.output.style, ImageStyle::Terrain);
        assert!(job.output.store.is_none());
    }

    #[test]
    fn zero_sized_jobs_are_rejected() {
        assert!(JobConfig::parse("width = 0").is_err());
        assert!(JobConfig::parse("width = \"wide\"").is_err());
    }

    #[test]
    fn default_job_is_plain_generation() {
        let job = JobConfig {
            width: 16,
            height: 8,
            noise: NoiseConfig {
                seed: 4,
                ..Default::default()
            },
            ..Default::default()
        };
        let field = job.build_field().unwrap();
        assert_eq!(field, job.noise.generate_map(16, 8).unwrap());
    }

    #[test]
    fn post_passes_keep_the_shape() {
        let job = JobConfig {
            width: 24,
            height: 20,
            noise: NoiseConfig {
                seed: 11,
                ..Default::default()
            },
            post: PostConfig {
                warp_strength: 4.0,
                erosion_iterations: 3,
                talus: 0.01,
                blur_sigma: 1.0,
                normalize: true,
            },
            ..Default::default()
        };
        let field = job.build_field().unwrap();
        assert_eq!((field.width(), field.height()), (24, 20));
        let (min, max) = field.min_max().unwrap();
        assert!(min >= 0.0 && max <= 1.0 + 1e-6);
    }
}
