use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageFormat};
use noisefield_core::{BoolField2D, ScalarField2D};
use palette::{Gradient, LinSrgb};
use serde::{Deserialize, Serialize};

use crate::{ExportError, Result, ensure_parent};

const JPEG_QUALITY: u8 = 90;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageStyle {
    #[default]
    Gray,
    Terrain,
}

#[inline]
fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0) as u8
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"))
        .unwrap_or(false)
}

fn dims(width: usize, height: usize) -> Result<(u32, u32)> {
    if width == 0 || height == 0 {
        return Err(ExportError::Empty { what: "image" });
    }
    let w = u32::try_from(width).map_err(|_| ExportError::TooLarge {
        dimension: "width",
        value: width,
    })?;
    let h = u32::try_from(height).map_err(|_| ExportError::TooLarge {
        dimension: "height",
        value: height,
    })?;
    Ok((w, h))
}

// JPEG for .jpg/.jpeg, PNG for everything else
fn write_pixels(
    path: &Path,
    pixels: &[u8],
    width: u32,
    height: u32,
    color: ExtendedColorType,
) -> Result<PathBuf> {
    ensure_parent(path)?;
    let img_err = |source: image::ImageError| ExportError::Image {
        path: path.to_path_buf(),
        source,
    };

    if is_jpeg(path) {
        let file = File::create(path).map_err(|e| ExportError::io(path, e))?;
        let mut out = BufWriter::new(file);
        JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
            .encode(pixels, width, height, color)
            .map_err(img_err)?;
    } else {
        image::save_buffer_with_format(path, pixels, width, height, color, ImageFormat::Png)
            .map_err(img_err)?;
    }

    tracing::info!(path = %path.display(), width, height, "image written");
    Ok(path.to_path_buf())
}

// 8-bit grayscale, 0.0 = black, 1.0 = white
pub fn save_grayscale(field: &ScalarField2D, path: impl AsRef<Path>) -> Result<PathBuf> {
    let (w, h) = dims(field.width(), field.height())?;
    let pixels: Vec<u8> = field.as_slice().iter().map(|&v| to_byte(v)).collect();
    write_pixels(path.as_ref(), &pixels, w, h, ExtendedColorType::L8)
}

// Solid cells white, air black
pub fn save_bool(field: &BoolField2D, path: impl AsRef<Path>) -> Result<PathBuf> {
    let (w, h) = dims(field.width(), field.height())?;
    let pixels: Vec<u8> = field
        .as_slice()
        .iter()
        .map(|&solid| if solid { 255 } else { 0 })
        .collect();
    write_pixels(path.as_ref(), &pixels, w, h, ExtendedColorType::L8)
}

// Create a color gradient - deep water to shallow water to sand to grass to rock to snow
fn terrain_gradient() -> Gradient<LinSrgb> {
    Gradient::with_domain(vec![
        (0.00, LinSrgb::new(0.0, 0.0, 0.5)), // deep water
        (0.30, LinSrgb::new(0.0, 0.5, 1.0)), // shallow water
        (0.40, LinSrgb::new(0.8, 0.8, 0.5)), // sand
        (0.60, LinSrgb::new(0.1, 0.6, 0.2)), // grass
        (0.80, LinSrgb::new(0.5, 0.4, 0.3)), // rock
        (1.00, LinSrgb::new(1.0, 1.0, 1.0)), // snow
    ])
}

// RGB map coloured by height band
pub fn save_terrain(field: &ScalarField2D, path: impl AsRef<Path>) -> Result<PathBuf> {
    let (w, h) = dims(field.width(), field.height())?;
    let gradient = terrain_gradient();
    let mut pixels = Vec::with_capacity(field.len() * 3);
    for &v in field.as_slice() {
        let col: LinSrgb = gradient.get(v.clamp(0.0, 1.0));
        let rgb = col.into_format::<u8>();
        pixels.extend_from_slice(&[rgb.red, rgb.green, rgb.blue]);
    }
    write_pixels(path.as_ref(), &pixels, w, h, ExtendedColorType::Rgb8)
}

pub fn save_field(field: &ScalarField2D, path: impl AsRef<Path>, style: ImageStyle) -> Result<PathBuf> {
    match style {
        ImageStyle::Gray => save_grayscale(field, path),
        ImageStyle::Terrain => save_terrain(field, path),
    }
}
