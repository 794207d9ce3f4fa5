//! Vector approximation of raster parts
//!
//! Every non-blank line is cut as a sequence of marking moves, one per run of
//! equal intensity. The power of a run is the part's power scaled by
//! `intensity / 255`. Lines are scanned in a serpentine when bidirectional
//! scanning is on; blank lines are skipped entirely and do not flip the
//! direction.

use crate::scan::{line_span, runs, split_span, Run};
use crate::{BoxedIterator, RasterOptions};
use laserlink_core::{Operation, Point, RasterPart};

/// Lowers raster parts to travel/power/mark operations
#[derive(Debug, Clone)]
pub struct VectorApproximator<'a> {
    options: &'a RasterOptions,
}

impl<'a> VectorApproximator<'a> {
    /// Create an approximator using `options`
    pub fn new(options: &'a RasterOptions) -> Self {
        Self { options }
    }

    /// Lower one raster part
    pub fn lower(&self, part: &RasterPart) -> Vec<Operation> {
        let mut ops = Vec::new();
        let padding_px = part.resolution.mm_to_px(self.options.padding_mm.max(0.0)) as i32;
        let bed_px = part.resolution.mm_to_px(self.options.bed_width_mm) as i32;
        let mut forward = true;
        let mut lines = 0usize;

        for y in 0..part.height {
            let Some(span) = line_span(part, y) else {
                continue;
            };
            if lines == 0 {
                if let Some(speed) = part.property.speed {
                    ops.push(Operation::SetSpeed(speed));
                }
                if let Some(focus) = part.property.focus {
                    ops.push(Operation::SetFocus(focus));
                }
            }
            lines += 1;

            let travel = if self.options.optimise {
                split_span(part, y).unwrap_or(span)
            } else {
                span
            };
            let origin = part.line_start(y);
            let px = |x: usize| origin.x + x as i32;
            let at = |x: i32| Point::new(x, origin.y);

            let lead_in = (px(travel.first) - padding_px).max(0);
            let lead_out = (px(travel.last) + padding_px).min(bed_px);
            let (approach, retreat, first_entry, last_exit) = if forward {
                (lead_in, lead_out, px(span.first), px(span.last))
            } else {
                (lead_out, lead_in, px(span.last), px(span.first))
            };

            if approach != first_entry {
                ops.push(Operation::MoveTo(at(approach)));
            }

            let line_runs = runs(part, y, span);
            let ordered: BoxedIterator<Run> = if forward {
                Box::new(line_runs.into_iter())
            } else {
                Box::new(line_runs.into_iter().rev())
            };
            for run in ordered {
                let (entry, exit) = if forward {
                    (run.start, run.end)
                } else {
                    (run.end, run.start)
                };
                ops.push(Operation::MoveTo(at(px(entry))));
                ops.push(Operation::SetPower(part.power_for_intensity(run.value)));
                ops.push(Operation::LineTo(at(px(exit))));
            }

            if retreat != last_exit {
                ops.push(Operation::MoveTo(at(retreat)));
            }

            if self.options.bidirectional {
                forward = !forward;
            }
        }

        tracing::debug!(
            lines,
            operations = ops.len(),
            "Approximated {}x{} raster",
            part.width,
            part.height
        );
        ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use laserlink_core::{LaserProperty, RasterKind, Resolution};

    fn part(width: usize, rows: &[&[u8]]) -> RasterPart {
        let pixels = rows.iter().flat_map(|r| r.iter().copied()).collect();
        RasterPart::new(
            RasterKind::Greyscale,
            width,
            rows.len(),
            pixels,
            LaserProperty::power_speed(100.0, 50.0),
            Resolution::new(254.0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_single_pixel_line() {
        let p = part(3, &[&[0, 255, 0]]);
        let ops = VectorApproximator::new(&RasterOptions::default()).lower(&p);
        assert_eq!(
            ops,
            vec![
                Operation::SetSpeed(50.0),
                Operation::MoveTo(Point::new(1, 0)),
                Operation::SetPower(100.0),
                Operation::LineTo(Point::new(1, 0)),
            ]
        );
    }

    #[test]
    fn test_reverse_line_is_mirrored() {
        let p = part(4, &[&[255, 0, 0, 0], &[0, 51, 255, 0]]);
        let ops = VectorApproximator::new(&RasterOptions::default()).lower(&p);
        assert_eq!(
            &ops[4..],
            &[
                Operation::MoveTo(Point::new(2, 1)),
                Operation::SetPower(100.0),
                Operation::LineTo(Point::new(2, 1)),
                Operation::MoveTo(Point::new(1, 1)),
                Operation::SetPower(20.0),
                Operation::LineTo(Point::new(1, 1)),
            ]
        );
    }
}
