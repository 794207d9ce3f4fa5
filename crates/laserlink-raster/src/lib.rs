//! # laserlink raster
//!
//! Lowers raster parts to operation streams. Two strategies are available:
//!
//! - [`VectorApproximator`]: walks each line as runs of equal intensity and
//!   emits travel, power and mark operations, scanning in a serpentine.
//! - [`BinaryRasterEncoder`]: streams per-pixel power bytes as base64 chunks
//!   (`G7` lines) with overscan padding.

pub mod binary;
pub mod chunk;
pub mod scan;
pub mod vector_approx;

pub use binary::BinaryRasterEncoder;
pub use chunk::{decode_chunks, encode_chunks, sanitise, split_bytes, CHUNK_SIZE};
pub use scan::{line_span, next_non_blank, runs, split_span, LineSpan, Run};
pub use vector_approx::VectorApproximator;

use laserlink_core::{Operation, RasterPart};
use serde::{Deserialize, Serialize};

/// Boxed iterator used to walk pixels in either direction
pub type BoxedIterator<T> = Box<dyn Iterator<Item = T>>;

/// How raster parts are lowered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RasterMode {
    /// Runs of equal intensity become power changes and marking moves
    #[default]
    VectorApproximation,
    /// Per-pixel bytes are streamed as base64 chunks
    BinaryChunk,
}

/// Options shared by both raster strategies
#[derive(Debug, Clone, PartialEq)]
pub struct RasterOptions {
    /// Lowering strategy
    pub mode: RasterMode,
    /// Alternate scan direction on every emitted line
    pub bidirectional: bool,
    /// Shrink or widen each pass to the marked area and the next line's needs
    pub optimise: bool,
    /// Travel added before and after each line, in mm
    pub padding_mm: f64,
    /// Bed width in mm; padding never leaves the bed
    pub bed_width_mm: f64,
    /// Feed rate at 100% speed, mm/min
    pub max_speed: f64,
    /// Replace `+` and `/` in chunk payloads
    pub sanitise: bool,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            mode: RasterMode::VectorApproximation,
            bidirectional: true,
            optimise: false,
            padding_mm: 0.0,
            bed_width_mm: 250.0,
            max_speed: 1200.0,
            sanitise: false,
        }
    }
}

/// Lower a raster part with the strategy selected in `options`
pub fn lower_raster(part: &RasterPart, options: &RasterOptions) -> Vec<Operation> {
    match options.mode {
        RasterMode::VectorApproximation => VectorApproximator::new(options).lower(part),
        RasterMode::BinaryChunk => BinaryRasterEncoder::new(options).lower(part),
    }
}
