//! Raster parts: rectangular bitmaps of per-pixel laser intensity
//!
//! Intensity 0 means "do not mark", 255 means full power. Black/white rasters
//! only ever hold 0 or 255; greyscale rasters hold the whole range and scale
//! the part's power per pixel.

use super::{Bounds, LaserProperty, Point};
use crate::error::JobValidationError;
use crate::units::Resolution;
use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Grey values at or below this level become black when thresholding
pub const BLACK_THRESHOLD: u8 = 127;

/// Pixel encoding of a raster part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RasterKind {
    /// Every pixel is either off or full power
    #[default]
    BlackWhite,
    /// Pixels carry 0-255 intensity (engraving depth)
    Greyscale,
}

impl fmt::Display for RasterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RasterKind::BlackWhite => write!(f, "Raster"),
            RasterKind::Greyscale => write!(f, "Raster 3D"),
        }
    }
}

/// A raster image placed on the bed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterPart {
    /// Pixel encoding
    #[serde(default)]
    pub kind: RasterKind,
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
    /// Row-major intensities, `width * height` entries
    pub pixels: Vec<u8>,
    /// Position of the top-left pixel on the bed, in pixels
    #[serde(default)]
    pub start: Point,
    /// Power/speed for this raster; power is the full-intensity power
    pub property: LaserProperty,
    /// Resolution used to convert pixel coordinates
    pub resolution: Resolution,
}

impl RasterPart {
    /// Create a raster part, checking that `pixels` matches the geometry
    pub fn new(
        kind: RasterKind,
        width: usize,
        height: usize,
        pixels: Vec<u8>,
        property: LaserProperty,
        resolution: Resolution,
    ) -> Result<Self, JobValidationError> {
        let part = Self {
            kind,
            width,
            height,
            pixels,
            start: Point::default(),
            property,
            resolution,
        };
        part.validate()?;
        Ok(part)
    }

    /// Build a greyscale part from an image where dark means "burn"
    ///
    /// Luma is inverted so that black pixels carry full intensity.
    pub fn from_gray_image(
        image: &GrayImage,
        property: LaserProperty,
        resolution: Resolution,
    ) -> Self {
        let pixels = image.pixels().map(|p| 255 - p.0[0]).collect();
        Self {
            kind: RasterKind::Greyscale,
            width: image.width() as usize,
            height: image.height() as usize,
            pixels,
            start: Point::default(),
            property,
            resolution,
        }
    }

    /// Build a black/white part from an image, thresholding at mid-grey
    pub fn black_white_from_image(
        image: &GrayImage,
        property: LaserProperty,
        resolution: Resolution,
    ) -> Self {
        let pixels = image
            .pixels()
            .map(|p| if p.0[0] <= BLACK_THRESHOLD { 255 } else { 0 })
            .collect();
        Self {
            kind: RasterKind::BlackWhite,
            width: image.width() as usize,
            height: image.height() as usize,
            pixels,
            start: Point::default(),
            property,
            resolution,
        }
    }

    /// Place the part at `start`
    pub fn at(mut self, start: Point) -> Self {
        self.start = start;
        self
    }

    /// Check that the pixel buffer matches the declared geometry
    pub fn validate(&self) -> Result<(), JobValidationError> {
        if self.pixels.len() != self.width * self.height {
            return Err(JobValidationError::InvalidRaster(format!(
                "{} pixels for a {}x{} raster",
                self.pixels.len(),
                self.width,
                self.height
            )));
        }
        if self.kind == RasterKind::BlackWhite && self.pixels.iter().any(|&p| p != 0 && p != 255)
        {
            return Err(JobValidationError::InvalidRaster(
                "black/white raster holds grey pixels".to_string(),
            ));
        }
        Ok(())
    }

    /// Intensity at (`x`, `y`), or `None` outside the raster
    pub fn pixel(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    /// One raster line, or `None` outside the raster
    pub fn line(&self, y: usize) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        self.pixels.get(y * self.width..(y + 1) * self.width)
    }

    /// Whether line `y` has no marking pixel (lines outside count as blank)
    pub fn line_is_blank(&self, y: usize) -> bool {
        self.line(y).is_none_or(|line| line.iter().all(|&p| p == 0))
    }

    /// Index of the first marking pixel on line `y`
    pub fn first_non_white_pixel(&self, y: usize) -> Option<usize> {
        self.line(y)?.iter().position(|&p| p != 0)
    }

    /// Index of the last marking pixel on line `y`
    pub fn last_non_white_pixel(&self, y: usize) -> Option<usize> {
        self.line(y)?.iter().rposition(|&p| p != 0)
    }

    /// Bed position of the first pixel of line `y`
    pub fn line_start(&self, y: usize) -> Point {
        Point::new(self.start.x, self.start.y + y as i32)
    }

    /// Full-intensity power in percent
    pub fn black_power(&self) -> f64 {
        self.property.power.unwrap_or(0.0)
    }

    /// Power in percent for a pixel of the given intensity
    pub fn power_for_intensity(&self, intensity: u8) -> f64 {
        self.black_power() * f64::from(intensity) / 255.0
    }

    /// Whether the part marks anything at all
    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|&p| p == 0)
    }

    /// Bounding box of the raster rectangle
    pub fn bounds(&self) -> Bounds {
        Bounds {
            min: self.start,
            max: Point::new(
                self.start.x + self.width as i32,
                self.start.y + self.height as i32,
            ),
        }
    }
}
