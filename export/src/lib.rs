// export turns generated fields into files: images, tilemaps and stored field documents
pub mod image_export;
pub mod models;
pub mod preview;
pub mod tilemap;

use std::path::PathBuf;

use thiserror::Error;

pub use image_export::{ImageStyle, save_bool, save_field, save_grayscale, save_terrain};
pub use models::{FieldDoc, FieldStore};
pub use tilemap::{AutoTiling, TileType, Tilemap, TilemapConfig};

pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image encoding failed for {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("json error on {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot export an empty {what}")]
    Empty { what: &'static str },

    #[error("{dimension} of {value} does not fit the output format")]
    TooLarge { dimension: &'static str, value: usize },

    #[error("malformed tilemap file {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("invalid document name `{0}`")]
    InvalidName(String),

    #[error(transparent)]
    Noise(#[from] noisefield_core::NoiseError),
}

impl ExportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExportError::Io {
            path: path.into(),
            source,
        }
    }
}

// Create the parent directory of `path` if it has one
pub(crate) fn ensure_parent(path: &std::path::Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| ExportError::io(dir, e))?;
    }
    Ok(())
}
