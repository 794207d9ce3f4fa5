//! Job model
//!
//! A [`LaserJob`] is an ordered list of [`JobPart`]s. Each part is either a
//! [`VectorPart`] (travel/mark commands) or a [`RasterPart`] (bitmap), and
//! carries its own resolution. Coordinates are integer pixels; conversion to
//! millimeters happens in the protocol encoder.

pub mod property;
pub mod raster;
pub mod vector;

pub use property::{LaserProperty, PropertyKind};
pub use raster::{RasterKind, RasterPart, BLACK_THRESHOLD};
pub use vector::{VectorCommand, VectorPart};

use crate::error::JobValidationError;
use crate::units::Resolution;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Integer pixel coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    /// X in pixels
    pub x: i32,
    /// Y in pixels
    pub y: i32,
}

impl Point {
    /// Create a new point
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Axis-aligned pixel bounding box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    /// Top-left corner
    pub min: Point,
    /// Bottom-right corner
    pub max: Point,
}

impl Bounds {
    /// Bounding box of a set of points, `None` when empty
    pub fn of_points(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(
            Bounds {
                min: first,
                max: first,
            },
            |b, p| Bounds {
                min: Point::new(b.min.x.min(p.x), b.min.y.min(p.y)),
                max: Point::new(b.max.x.max(p.x), b.max.y.max(p.y)),
            },
        ))
    }
}

/// One homogeneous piece of a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "part", rename_all = "snake_case")]
pub enum JobPart {
    /// Travel/mark commands
    Vector(VectorPart),
    /// Bitmap engraving
    Raster(RasterPart),
}

impl JobPart {
    /// Resolution of this part
    pub fn resolution(&self) -> Resolution {
        match self {
            JobPart::Vector(v) => v.resolution,
            JobPart::Raster(r) => r.resolution,
        }
    }

    /// Human readable kind, used in validation messages
    pub fn kind_name(&self) -> String {
        match self {
            JobPart::Vector(_) => "Vector".to_string(),
            JobPart::Raster(r) => r.kind.to_string(),
        }
    }

    /// Pixel bounding box, `None` for a part without geometry
    pub fn bounds(&self) -> Option<Bounds> {
        match self {
            JobPart::Vector(v) => v.bounds(),
            JobPart::Raster(r) => Some(r.bounds()),
        }
    }

    /// Copy of this part moved by (`dx`, `dy`) pixels
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        match self {
            JobPart::Vector(v) => JobPart::Vector(v.translated(dx, dy)),
            JobPart::Raster(r) => {
                let start = Point::new(r.start.x + dx, r.start.y + dy);
                JobPart::Raster(r.clone().at(start))
            }
        }
    }
}

impl From<VectorPart> for JobPart {
    fn from(part: VectorPart) -> Self {
        JobPart::Vector(part)
    }
}

impl From<RasterPart> for JobPart {
    fn from(part: RasterPart) -> Self {
        JobPart::Raster(part)
    }
}

/// A complete job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaserJob {
    /// Job name, used for logging and output file names
    pub name: String,
    /// Parts in execution order
    #[serde(default)]
    pub parts: Vec<JobPart>,
    /// Origin shift applied once before transmission, in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_point: Option<Point>,
}

impl LaserJob {
    /// Create an empty job
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parts: Vec::new(),
            start_point: None,
        }
    }

    /// Append a part
    pub fn add_part(&mut self, part: impl Into<JobPart>) -> &mut Self {
        self.parts.push(part.into());
        self
    }

    /// Set the start point
    pub fn with_start_point(mut self, start: Point) -> Self {
        self.start_point = Some(start);
        self
    }

    /// Whether the job contains a part of the given raster kind
    pub fn contains_raster(&self, kind: RasterKind) -> bool {
        self.parts
            .iter()
            .any(|p| matches!(p, JobPart::Raster(r) if r.kind == kind))
    }

    /// Check that the job can be transmitted at all
    pub fn validate(&self) -> Result<(), JobValidationError> {
        if self.parts.is_empty() {
            return Err(JobValidationError::EmptyJob(self.name.clone()));
        }
        for part in &self.parts {
            if let JobPart::Raster(r) = part {
                r.validate()?;
            }
        }
        Ok(())
    }

    /// Check every part's geometry against a bed of the given size in mm
    pub fn check_bed(
        &self,
        bed_width_mm: f64,
        bed_height_mm: f64,
    ) -> Result<(), JobValidationError> {
        for (index, part) in self.parts.iter().enumerate() {
            let Some(bounds) = part.bounds() else {
                continue;
            };
            if bounds.min.x < 0 || bounds.min.y < 0 {
                return Err(JobValidationError::NegativeCoordinates { index });
            }
            let resolution = part.resolution();
            let width_mm = resolution.px_to_mm(f64::from(bounds.max.x));
            let height_mm = resolution.px_to_mm(f64::from(bounds.max.y));
            // half a pixel of slack for rounding at the bed edge
            let slack = resolution.mm_per_px() / 2.0;
            if width_mm > bed_width_mm + slack || height_mm > bed_height_mm + slack {
                return Err(JobValidationError::ExceedsBed {
                    index,
                    width_mm,
                    height_mm,
                    bed_width_mm,
                    bed_height_mm,
                });
            }
        }
        Ok(())
    }

    /// Copy of the job with the start point applied
    ///
    /// Every part is shifted by minus the start point and the start point is
    /// cleared, so applying twice is a no-op. The caller's job is untouched.
    pub fn with_start_point_applied(&self) -> LaserJob {
        let Some(start) = self.start_point else {
            return self.clone();
        };
        debug!(job = %self.name, x = start.x, y = start.y, "Applying start point");
        LaserJob {
            name: self.name.clone(),
            parts: self
                .parts
                .iter()
                .map(|p| p.translated(-start.x, -start.y))
                .collect(),
            start_point: None,
        }
    }
}
