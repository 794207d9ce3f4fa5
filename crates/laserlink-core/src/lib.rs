//! # laserlink core
//!
//! Core types for laserlink: the job model, pixel/millimeter conversion,
//! the device-independent operation stream, progress reporting, and the
//! error types shared by every crate in the workspace.

pub mod error;
pub mod job;
pub mod ops;
pub mod progress;
pub mod units;

pub use error::{
    ConfigurationError, ConnectionError, Error, IdentificationError, JobValidationError,
    ProtocolError, Result,
};

pub use job::{
    Bounds, JobPart, LaserJob, LaserProperty, Point, PropertyKind, RasterKind, RasterPart,
    VectorCommand, VectorPart,
};

pub use ops::{lower_vector, Operation};
pub use progress::{part_progress, NoProgress, ProgressListener, ProgressLog};
pub use units::{mm2px, px2mm, Resolution, MM_PER_INCH};
