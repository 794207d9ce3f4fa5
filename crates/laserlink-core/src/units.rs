//! Unit conversion utilities
//!
//! Handles conversion between pixel coordinates (job space) and millimeters
//! (protocol space) at a given resolution in dots per inch.

use crate::error::JobValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Millimeters per inch
pub const MM_PER_INCH: f64 = 25.4;

/// Resolution of a job part in dots per inch
///
/// Always strictly positive and finite, so conversions never divide by zero.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Resolution(f64);

impl Resolution {
    /// Create a resolution, rejecting values <= 0
    pub fn new(dpi: f64) -> Result<Self, JobValidationError> {
        if dpi.is_finite() && dpi > 0.0 {
            Ok(Self(dpi))
        } else {
            Err(JobValidationError::InvalidResolution(dpi))
        }
    }

    /// Dots per inch
    pub fn dpi(self) -> f64 {
        self.0
    }

    /// Convert a pixel value to millimeters
    pub fn px_to_mm(self, px: f64) -> f64 {
        px / self.0 * MM_PER_INCH
    }

    /// Convert millimeters to a (fractional) pixel value
    pub fn mm_to_px(self, mm: f64) -> f64 {
        mm * self.0 / MM_PER_INCH
    }

    /// Size of one pixel in millimeters
    pub fn mm_per_px(self) -> f64 {
        MM_PER_INCH / self.0
    }
}

impl TryFrom<f64> for Resolution {
    type Error = JobValidationError;

    fn try_from(dpi: f64) -> Result<Self, Self::Error> {
        Self::new(dpi)
    }
}

impl From<Resolution> for f64 {
    fn from(resolution: Resolution) -> Self {
        resolution.0
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} dpi", self.0)
    }
}

/// Convert pixels to millimeters at `dpi`
///
/// Fails only when `dpi` is not a positive number.
pub fn px2mm(px: f64, dpi: f64) -> Result<f64, JobValidationError> {
    Ok(Resolution::new(dpi)?.px_to_mm(px))
}

/// Convert millimeters to pixels at `dpi`
///
/// Fails only when `dpi` is not a positive number.
pub fn mm2px(mm: f64, dpi: f64) -> Result<f64, JobValidationError> {
    Ok(Resolution::new(dpi)?.mm_to_px(mm))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_px_to_mm() {
        let r = Resolution::new(500.0).unwrap();
        assert!((r.px_to_mm(100.0) - 5.08).abs() < 1e-12);
        assert!((r.px_to_mm(500.0) - 25.4).abs() < 1e-12);
    }

    #[test]
    fn test_mm_to_px() {
        let r = Resolution::new(254.0).unwrap();
        assert!((r.mm_to_px(1.0) - 10.0).abs() < 1e-12);
        assert!((r.mm_per_px() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_resolution() {
        assert_eq!(
            Resolution::new(0.0),
            Err(JobValidationError::InvalidResolution(0.0))
        );
        assert!(Resolution::new(-3.0).is_err());
        assert!(Resolution::new(f64::NAN).is_err());
        assert!(px2mm(10.0, 0.0).is_err());
        assert!(mm2px(10.0, -1.0).is_err());
    }

    #[test]
    fn test_serde_rejects_zero() {
        let ok: Resolution = serde_json::from_str("500.0").unwrap();
        assert_eq!(ok.dpi(), 500.0);
        assert!(serde_json::from_str::<Resolution>("0.0").is_err());
    }
}
