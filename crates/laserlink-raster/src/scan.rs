//! Scan-line analysis shared by both raster strategies

use laserlink_core::RasterPart;

/// Marking extent of one raster line, inclusive pixel indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    /// First pixel to cover
    pub first: usize,
    /// Last pixel to cover
    pub last: usize,
}

impl LineSpan {
    /// Span covering both `self` and `other`
    pub fn union(self, other: LineSpan) -> LineSpan {
        LineSpan {
            first: self.first.min(other.first),
            last: self.last.max(other.last),
        }
    }

    /// Number of pixels covered
    pub fn len(self) -> usize {
        self.last - self.first + 1
    }

    /// Always false, a span covers at least one pixel
    pub fn is_empty(self) -> bool {
        false
    }
}

/// A maximal run of equal, non-zero intensity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    /// First pixel of the run
    pub start: usize,
    /// Last pixel of the run
    pub end: usize,
    /// Intensity shared by every pixel of the run
    pub value: u8,
}

/// First-to-last marking pixel of line `y`, `None` for blank lines
pub fn line_span(part: &RasterPart, y: usize) -> Option<LineSpan> {
    Some(LineSpan {
        first: part.first_non_white_pixel(y)?,
        last: part.last_non_white_pixel(y)?,
    })
}

/// Index of the next non-blank line after `y`
pub fn next_non_blank(part: &RasterPart, y: usize) -> Option<usize> {
    (y + 1..part.height).find(|&next| !part.line_is_blank(next))
}

/// Span of line `y` extended to cover the next non-blank line
///
/// The head finishes a line where the following one starts, so the pass over
/// `y` is widened to whatever the next line needs. Blank lines have no span.
pub fn split_span(part: &RasterPart, y: usize) -> Option<LineSpan> {
    let own = line_span(part, y)?;
    Some(
        next_non_blank(part, y)
            .and_then(|next| line_span(part, next))
            .map_or(own, |next| own.union(next)),
    )
}

/// Non-zero runs of line `y` within `span`, left to right
pub fn runs(part: &RasterPart, y: usize, span: LineSpan) -> Vec<Run> {
    let Some(line) = part.line(y) else {
        return Vec::new();
    };
    let mut result = Vec::new();
    let mut current: Option<Run> = None;
    for (x, &value) in line
        .iter()
        .enumerate()
        .take(span.last + 1)
        .skip(span.first)
    {
        match current {
            Some(ref mut run) if run.value == value => run.end = x,
            _ => {
                if let Some(run) = current.take() {
                    if run.value != 0 {
                        result.push(run);
                    }
                }
                current = Some(Run {
                    start: x,
                    end: x,
                    value,
                });
            }
        }
    }
    if let Some(run) = current {
        if run.value != 0 {
            result.push(run);
        }
    }
    result
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
    fn test_runs() {
        let p = part(8, &[&[0, 5, 5, 0, 0, 9, 7, 0]]);
        let span = line_span(&p, 0).unwrap();
        assert_eq!(span, LineSpan { first: 1, last: 6 });
        assert_eq!(
            runs(&p, 0, span),
            vec![
                Run { start: 1, end: 2, value: 5 },
                Run { start: 5, end: 5, value: 9 },
                Run { start: 6, end: 6, value: 7 },
            ]
        );
    }

    #[test]
    fn test_split_span_skips_blank_lines() {
        let p = part(
            6,
            &[
                &[0, 0, 255, 255, 0, 0],
                &[0, 0, 0, 0, 0, 0],
                &[255, 0, 0, 0, 0, 0],
                &[0, 0, 0, 0, 0, 255],
            ],
        );
        assert_eq!(next_non_blank(&p, 0), Some(2));
        assert_eq!(split_span(&p, 0), Some(LineSpan { first: 0, last: 3 }));
        assert_eq!(split_span(&p, 1), None);
        assert_eq!(split_span(&p, 2), Some(LineSpan { first: 0, last: 5 }));
        assert_eq!(split_span(&p, 3), Some(LineSpan { first: 5, last: 5 }));
    }
}
