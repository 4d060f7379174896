use thiserror::Error;

pub type Result<T> = std::result::Result<T, NoiseError>;

// Every fallible operation in core reports through this type.
// Validation runs before any grid is allocated, so an error never comes with partial output.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NoiseError {
    #[error("invalid parameter `{field}`: expected {expected}, got {value}")]
    InvalidParameter {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },

    #[error("cannot process an empty {what}")]
    EmptyInput { what: &'static str },

    #[error("a {width}x{height} grid needs {expected} values, got {actual}")]
    LengthMismatch {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error(
        "dimension mismatch: expected {expected_width}x{expected_height}, got {width}x{height}"
    )]
    DimensionMismatch {
        expected_width: usize,
        expected_height: usize,
        width: usize,
        height: usize,
    },
}

impl NoiseError {
    pub(crate) fn invalid(field: &'static str, value: f64, expected: &'static str) -> Self {
        NoiseError::InvalidParameter {
            field,
            value,
            expected,
        }
    }
}

// Shared checks used by every generator entry point
pub(crate) fn check_dimension(field: &'static str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(NoiseError::invalid(field, 0.0, "> 0"));
    }
    Ok(())
}

pub(crate) fn check_positive(field: &'static str, value: f64) -> Result<()> {
    // written as a negated comparison so NaN is rejected too
    if !(value > 0.0) {
        return Err(NoiseError::invalid(field, value, "> 0"));
    }
    Ok(())
}

pub(crate) fn check_unit_interval(field: &'static str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(NoiseError::invalid(field, value, "within [0, 1]"));
    }
    Ok(())
}

// Flat row-major buffers must hold exactly width*height values
pub(crate) fn check_len(width: usize, height: usize, actual: usize) -> Result<()> {
    match width.checked_mul(height) {
        Some(expected) if expected == actual => Ok(()),
        expected => Err(NoiseError::LengthMismatch {
            width,
            height,
            expected: expected.unwrap_or(usize::MAX),
            actual,
        }),
    }
}
