//! Binary chunk rastering (`G7`)
//!
//! Each non-blank line becomes a travel move to the line start minus the
//! overscan, followed by the line's power bytes (with `overscan` zero bytes
//! on either side) in base64 chunks. The first chunk of a line carries the
//! scan direction. A header and trailer configure and reset the raster
//! engine of the firmware.

use crate::chunk::encode_chunks;
use crate::scan::{line_span, split_span, LineSpan};
use crate::{BoxedIterator, RasterOptions};
use laserlink_core::{Operation, Point, RasterPart};

/// Power byte of a pixel that is not marked
const WHITE: u8 = 0;

/// Lowers raster parts to `G7` chunk operations
#[derive(Debug, Clone)]
pub struct BinaryRasterEncoder<'a> {
    options: &'a RasterOptions,
}

impl<'a> BinaryRasterEncoder<'a> {
    /// Create an encoder using `options`
    pub fn new(options: &'a RasterOptions) -> Self {
        Self { options }
    }

    /// Overscan in pixels for `part`
    pub fn overscan_px(&self, part: &RasterPart) -> usize {
        part.resolution
            .mm_to_px(self.options.padding_mm.max(0.0))
            .round() as usize
    }

    /// Power bytes for `span` of line `y`, in scan order, with overscan
    ///
    /// Bytes are the pixel intensities: a pixel's power relative to the
    /// part's full power, scaled to 0-255.
    pub fn line_bytes(
        &self,
        part: &RasterPart,
        y: usize,
        span: LineSpan,
        forward: bool,
    ) -> Vec<u8> {
        let overscan = self.overscan_px(part);
        let mut data = Vec::with_capacity(span.len() + 2 * overscan);
        data.resize(overscan, WHITE);
        let xs: BoxedIterator<usize> = if forward {
            Box::new(span.first..=span.last)
        } else {
            Box::new((span.first..=span.last).rev())
        };
        data.extend(xs.map(|x| part.pixel(x, y).unwrap_or(WHITE)));
        data.resize(data.len() + overscan, WHITE);
        data
    }

    /// Lower one raster part
    ///
    /// A blank part produces no operations at all.
    pub fn lower(&self, part: &RasterPart) -> Vec<Operation> {
        if part.is_blank() || part.width == 0 {
            return Vec::new();
        }

        let mm_per_px = part.resolution.mm_per_px();
        let black_power = part.black_power();
        let speed = part.property.speed.unwrap_or(100.0);
        let overscan = self.overscan_px(part) as i32;

        let mut ops = vec![
            Operation::Raw(format!(
                ";Beginning of Raster Image. Pixel size: {}x{}",
                part.width, part.height
            )),
            Operation::Raw(format!("M649 S{black_power:.6} B2 D0 R{mm_per_px:.6}")),
            Operation::Raw(format!(
                "G0 F{:.6}",
                speed * self.options.max_speed / 100.0
            )),
        ];

        let full_width = LineSpan {
            first: 0,
            last: part.width - 1,
        };
        let mut forward = true;
        let mut lines = 0usize;
        for y in 0..part.height {
            let Some(marked) = line_span(part, y) else {
                continue;
            };
            lines += 1;
            let span = if self.options.optimise {
                split_span(part, y).unwrap_or(marked)
            } else {
                full_width
            };

            let origin = part.line_start(y);
            let start_x = if forward {
                origin.x + span.first as i32 - overscan
            } else {
                origin.x + span.last as i32 + overscan
            };
            ops.push(Operation::MoveTo(Point::new(start_x, origin.y)));

            let bytes = self.line_bytes(part, y, span, forward);
            for (i, payload) in encode_chunks(&bytes, self.options.sanitise)
                .into_iter()
                .enumerate()
            {
                ops.push(Operation::RasterChunk {
                    forward: (i == 0).then_some(forward),
                    payload,
                });
            }

            if self.options.bidirectional {
                forward = !forward;
            }
        }

        ops.push(Operation::Raw("M5".to_string()));
        ops.push(Operation::Raw(format!(
            "M649 S{black_power:.6} B0 D0 R{mm_per_px:.6}"
        )));
        ops.push(Operation::Raw(";End of Raster Image.".to_string()));
        // the framing set feed and laser state directly
        ops.push(Operation::ResetModal);

        tracing::debug!(
            lines,
            operations = ops.len(),
            overscan,
            "Encoded {}x{} raster as G7 chunks",
            part.width,
            part.height
        );
        ops
    }
}
