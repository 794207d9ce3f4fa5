//! Device-independent operations
//!
//! Parts are lowered to a flat stream of operations before encoding. Motion
//! stays in pixel space; the encoder converts to millimeters with the part's
//! resolution.

use crate::job::{Point, VectorCommand, VectorPart};
use std::fmt;

/// One step of a lowered job part
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Travel without marking
    MoveTo(Point),
    /// Mark from the current position
    LineTo(Point),
    /// Power in percent for subsequent marks
    SetPower(f64),
    /// Speed in percent of the maximum feed rate
    SetSpeed(f64),
    /// Focus offset in mm
    SetFocus(f64),
    /// Pulse frequency in Hz
    SetFrequency(f64),
    /// One chunk of a binary raster line
    RasterChunk {
        /// Direction flag, present on the first chunk of a line only
        forward: Option<bool>,
        /// Encoded payload
        payload: String,
    },
    /// A literal protocol line
    Raw(String),
    /// Forget the last power and speed so the next mark restates both
    ResetModal,
}

impl Operation {
    /// Whether the operation marks material
    pub fn is_mark(&self) -> bool {
        matches!(self, Operation::LineTo(_) | Operation::RasterChunk { .. })
    }
}

/// Lower a vector part to operations
///
/// A property change becomes power, speed, focus and frequency operations
/// for the fields it sets, in that order.
pub fn lower_vector(part: &VectorPart) -> Vec<Operation> {
    let mut ops = Vec::with_capacity(part.commands.len());
    for command in &part.commands {
        match command {
            VectorCommand::MoveTo { x, y } => ops.push(Operation::MoveTo(Point::new(*x, *y))),
            VectorCommand::LineTo { x, y } => ops.push(Operation::LineTo(Point::new(*x, *y))),
            VectorCommand::SetProperty(property) => {
                ops.extend(property.power.map(Operation::SetPower));
                ops.extend(property.speed.map(Operation::SetSpeed));
                ops.extend(property.focus.map(Operation::SetFocus));
                ops.extend(property.frequency.map(Operation::SetFrequency));
            }
        }
    }
    ops
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::MoveTo(p) => write!(f, "MoveTo{p}"),
            Operation::LineTo(p) => write!(f, "LineTo{p}"),
            Operation::SetPower(v) => write!(f, "SetPower({v})"),
            Operation::SetSpeed(v) => write!(f, "SetSpeed({v})"),
            Operation::SetFocus(v) => write!(f, "SetFocus({v})"),
            Operation::SetFrequency(v) => write!(f, "SetFrequency({v})"),
            Operation::RasterChunk { payload, .. } => write!(f, "RasterChunk({} chars)", payload.len()),
            Operation::Raw(line) => write!(f, "Raw({line})"),
            Operation::ResetModal => write!(f, "ResetModal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::LaserProperty;
    use crate::units::Resolution;

    #[test]
    fn test_lower_vector() {
        let mut part = VectorPart::with_property(
            Resolution::new(500.0).unwrap(),
            LaserProperty::power_speed(50.0, 80.0),
        );
        part.move_to(0, 0).line_to(100, 0);
        assert_eq!(
            lower_vector(&part),
            vec![
                Operation::SetPower(50.0),
                Operation::SetSpeed(80.0),
                Operation::MoveTo(Point::new(0, 0)),
                Operation::LineTo(Point::new(100, 0)),
            ]
        );
    }
}
