use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::error::{NoiseError, Result, check_len};

// Wire shape of both grids; decoding goes through from_vec so the
// length check cannot be skipped
#[derive(Deserialize)]
struct RawField<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

// 2D scalar field: row-major Vec<f32> of size width×height,
// access as `field.get(x, y)` or `field[(x, y)]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawField<f32>")]
pub struct ScalarField2D {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    pub std_dev: f32,
}

impl ScalarField2D {
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, 0.0)
    }

    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    // Build by evaluating `f(x, y)` for every cell, row by row
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn from_vec(width: usize, height: usize, data: Vec<f32>) -> Result<Self> {
        check_len(width, height, data.len())?;
        Ok(Self {
            width,
            height,
            data,
        })
    }

    // From nested rows, `rows[y][x]`; every row must have the same length
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(width * height);
        for row in rows {
            if row.len() != width {
                return Err(NoiseError::DimensionMismatch {
                    expected_width: width,
                    expected_height: height,
                    width: row.len(),
                    height,
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    pub fn try_get(&self, x: usize, y: usize) -> Option<f32> {
        if x < self.width && y < self.height {
            Some(self.get(x, y))
        } else {
            None
        }
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        self.data[y * self.width + x] = value;
    }

    pub fn row(&self, y: usize) -> &[f32] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        // chunks(0) panics, an empty field simply yields no rows
        self.data.chunks(self.width.max(1))
    }

    pub fn to_rows(&self) -> Vec<Vec<f32>> {
        self.rows().map(<[f32]>::to_vec).collect()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    pub fn same_shape(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height
    }

    pub fn map(&self, f: impl Fn(f32) -> f32) -> Self {
        Self {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    pub(crate) fn ensure_not_empty(&self) -> Result<()> {
        if self.is_empty() {
            return Err(NoiseError::EmptyInput { what: "scalar field" });
        }
        Ok(())
    }

    pub fn min_max(&self) -> Option<(f32, f32)> {
        if self.is_empty() {
            return None;
        }
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for &v in &self.data {
            min = min.min(v);
            max = max.max(v);
        }
        Some((min, max))
    }

    pub fn stats(&self) -> Result<FieldStats> {
        self.ensure_not_empty()?;
        let (min, max) = self.min_max().unwrap_or((0.0, 0.0));
        // Accumulate in f64, a 1024×1024 f32 sum drifts noticeably otherwise
        let n = self.data.len() as f64;
        let mean = self.data.iter().map(|&v| f64::from(v)).sum::<f64>() / n;
        let variance = self
            .data
            .iter()
            .map(|&v| {
                let d = f64::from(v) - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        Ok(FieldStats {
            min,
            max,
            mean: mean as f32,
            std_dev: variance.sqrt() as f32,
        })
    }

    // Solid where value > threshold; `invert` flips the result
    pub fn threshold(&self, threshold: f32, invert: bool) -> BoolField2D {
        BoolField2D {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| (v > threshold) != invert).collect(),
        }
    }
}

impl Index<(usize, usize)> for ScalarField2D {
    type Output = f32;

    fn index(&self, (x, y): (usize, usize)) -> &f32 {
        &self.data[y * self.width + x]
    }
}

impl IndexMut<(usize, usize)> for ScalarField2D {
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut f32 {
        &mut self.data[y * self.width + x]
    }
}

// Row-major boolean grid produced by thresholding (true = solid)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawField<bool>")]
pub struct BoolField2D {
    width: usize,
    height: usize,
    data: Vec<bool>,
}

impl BoolField2D {
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, false)
    }

    pub fn filled(width: usize, height: usize, value: bool) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> bool) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn from_vec(width: usize, height: usize, data: Vec<bool>) -> Result<Self> {
        check_len(width, height, data.len())?;
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn from_rows(rows: &[Vec<bool>]) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(width * height);
        for row in rows {
            if row.len() != width {
                return Err(NoiseError::DimensionMismatch {
                    expected_width: width,
                    expected_height: height,
                    width: row.len(),
                    height,
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        self.data[y * self.width + x] = value;
    }

    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.data.chunks(self.width.max(1))
    }

    pub fn to_rows(&self) -> Vec<Vec<bool>> {
        self.rows().map(<[bool]>::to_vec).collect()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.data
    }

    pub fn count_true(&self) -> usize {
        self.data.iter().filter(|&&b| b).count()
    }

    pub(crate) fn ensure_not_empty(&self) -> Result<()> {
        if self.is_empty() {
            return Err(NoiseError::EmptyInput { what: "boolean field" });
        }
        Ok(())
    }

    // true -> 1.0, false -> 0.0
    pub fn to_scalar(&self) -> ScalarField2D {
        ScalarField2D {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect(),
        }
    }
}

impl Index<(usize, usize)> for BoolField2D {
    type Output = bool;

    fn index(&self, (x, y): (usize, usize)) -> &bool {
        &self.data[y * self.width + x]
    }
}

impl TryFrom<RawField<f32>> for ScalarField2D {
    type Error = NoiseError;

    fn try_from(raw: RawField<f32>) -> Result<Self> {
        Self::from_vec(raw.width, raw.height, raw.data)
    }
}

impl TryFrom<RawField<bool>> for BoolField2D {
    type Error = NoiseError;

    fn try_from(raw: RawField<bool>) -> Result<Self> {
        Self::from_vec(raw.width, raw.height, raw.data)
    }
}
