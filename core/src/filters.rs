// Grid filters over ScalarField2D. None of them mutate their input;
// neighbourhood filters clamp lookups to the border.
use crate::error::{NoiseError, Result, check_positive};
use crate::field::ScalarField2D;

// Below this the field is treated as flat and normalize leaves it alone
const FLAT_RANGE: f32 = 1e-4;

#[inline]
fn clamped(map: &ScalarField2D, x: isize, y: isize) -> f32 {
    let cx = x.clamp(0, map.width() as isize - 1) as usize;
    let cy = y.clamp(0, map.height() as isize - 1) as usize;
    map.get(cx, cy)
}

// Mean over a (2r+1)² window
pub fn box_blur(map: &ScalarField2D, radius: usize) -> Result<ScalarField2D> {
    map.ensure_not_empty()?;
    let r = radius as isize;
    let area = ((2 * radius + 1) * (2 * radius + 1)) as f32;
    Ok(ScalarField2D::from_fn(map.width(), map.height(), |x, y| {
        let mut sum = 0.0;
        for dy in -r..=r {
            for dx in -r..=r {
                sum += clamped(map, x as isize + dx, y as isize + dy);
            }
        }
        sum / area
    }))
}

// Separable Gaussian, kernel radius floor(3σ)
pub fn gaussian_blur(map: &ScalarField2D, sigma: f32) -> Result<ScalarField2D> {
    map.ensure_not_empty()?;
    check_positive("sigma", f64::from(sigma))?;

    let half = (sigma * 3.0) as isize;
    let mut kernel: Vec<f32> = (-half..=half)
        .map(|i| (-((i * i) as f32) / (2.0 * sigma * sigma)).exp())
        .collect();
    let total: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= total);

    let horizontal = ScalarField2D::from_fn(map.width(), map.height(), |x, y| {
        kernel
            .iter()
            .zip(-half..=half)
            .map(|(k, d)| k * clamped(map, x as isize + d, y as isize))
            .sum()
    });
    Ok(ScalarField2D::from_fn(map.width(), map.height(), |x, y| {
        kernel
            .iter()
            .zip(-half..=half)
            .map(|(k, d)| k * clamped(&horizontal, x as isize, y as isize + d))
            .sum()
    }))
}

// Stair-step the heights into `levels` bands; smoothness > 0 eases each riser with a smoothstep
pub fn terrace(map: &ScalarField2D, levels: u32, smoothness: f32) -> Result<ScalarField2D> {
    map.ensure_not_empty()?;
    if levels < 1 {
        return Err(NoiseError::invalid("levels", 0.0, ">= 1"));
    }
    let n = levels as f32;
    Ok(map.map(|v| {
        let scaled = v * n;
        let step = scaled.floor();
        if smoothness > 0.0 {
            let t = ((scaled - step) / smoothness).clamp(0.0, 1.0);
            let t = t * t * (3.0 - 2.0 * t);
            (step + t) / n
        } else {
            step / n
        }
    }))
}

pub fn quantize(map: &ScalarField2D, levels: u32) -> Result<ScalarField2D> {
    map.ensure_not_empty()?;
    if levels < 1 {
        return Err(NoiseError::invalid("levels", 0.0, ">= 1"));
    }
    let n = levels as f32;
    Ok(map.map(|v| (v * n).trunc() / n))
}

pub fn power_curve(map: &ScalarField2D, power: f32) -> Result<ScalarField2D> {
    map.ensure_not_empty()?;
    check_positive("power", f64::from(power))?;
    Ok(map.map(|v| v.powf(power)))
}

// Stretch to [0, 1]; a flat field comes back unchanged
pub fn normalize(map: &ScalarField2D) -> Result<ScalarField2D> {
    map.ensure_not_empty()?;
    let (min, max) = map.min_max().unwrap_or((0.0, 0.0));
    let range = max - min;
    if range < FLAT_RANGE {
        return Ok(map.clone());
    }
    Ok(map.map(|v| (v - min) / range))
}

pub fn normalize_range(map: &ScalarField2D, lo: f32, hi: f32) -> Result<ScalarField2D> {
    let unit = normalize(map)?;
    remap(&unit, 0.0, 1.0, lo, hi)
}

pub fn remap(
    map: &ScalarField2D,
    old_lo: f32,
    old_hi: f32,
    new_lo: f32,
    new_hi: f32,
) -> Result<ScalarField2D> {
    map.ensure_not_empty()?;
    let old_range = old_hi - old_lo;
    if old_range == 0.0 || !old_range.is_finite() {
        return Err(NoiseError::invalid(
            "old_hi",
            f64::from(old_hi),
            "a value different from old_lo",
        ));
    }
    let new_range = new_hi - new_lo;
    Ok(map.map(|v| new_lo + (v - old_lo) / old_range * new_range))
}

pub fn invert(map: &ScalarField2D) -> Result<ScalarField2D> {
    map.ensure_not_empty()?;
    Ok(map.map(|v| 1.0 - v))
}

// Weighted per-cell sum a * wa + b * wb
pub fn blend(a: &ScalarField2D, b: &ScalarField2D, wa: f32, wb: f32) -> Result<ScalarField2D> {
    a.ensure_not_empty()?;
    if !a.same_shape(b) {
        return Err(NoiseError::DimensionMismatch {
            expected_width: a.width(),
            expected_height: a.height(),
            width: b.width(),
            height: b.height(),
        });
    }
    Ok(ScalarField2D::from_fn(a.width(), a.height(), |x, y| {
        a.get(x, y) * wa + b.get(x, y) * wb
    }))
}
