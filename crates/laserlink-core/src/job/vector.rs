//! Vector parts: ordered travel/mark commands in pixel space

use super::{Bounds, LaserProperty, Point};
use crate::units::Resolution;
use serde::{Deserialize, Serialize};

/// One vector command
///
/// The current position is implicit: it is the target of the last
/// `MoveTo`/`LineTo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VectorCommand {
    /// Travel without marking
    MoveTo {
        /// Target x in pixels
        x: i32,
        /// Target y in pixels
        y: i32,
    },
    /// Mark from the current position
    LineTo {
        /// Target x in pixels
        x: i32,
        /// Target y in pixels
        y: i32,
    },
    /// Change power/speed/focus/frequency for subsequent marks
    SetProperty(LaserProperty),
}

impl VectorCommand {
    /// Target of a motion command
    pub fn target(&self) -> Option<Point> {
        match self {
            VectorCommand::MoveTo { x, y } | VectorCommand::LineTo { x, y } => {
                Some(Point::new(*x, *y))
            }
            VectorCommand::SetProperty(_) => None,
        }
    }
}

/// Ordered vector commands at one resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorPart {
    /// Resolution used to convert pixel coordinates
    pub resolution: Resolution,
    /// Commands in execution order
    pub commands: Vec<VectorCommand>,
}

impl VectorPart {
    /// Create an empty vector part
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            commands: Vec::new(),
        }
    }

    /// Create a vector part that starts with `property`
    pub fn with_property(resolution: Resolution, property: LaserProperty) -> Self {
        let mut part = Self::new(resolution);
        part.set_property(property);
        part
    }

    /// Append a travel move
    pub fn move_to(&mut self, x: i32, y: i32) -> &mut Self {
        self.commands.push(VectorCommand::MoveTo { x, y });
        self
    }

    /// Append a marking move
    pub fn line_to(&mut self, x: i32, y: i32) -> &mut Self {
        self.commands.push(VectorCommand::LineTo { x, y });
        self
    }

    /// Append a property change
    pub fn set_property(&mut self, property: LaserProperty) -> &mut Self {
        self.commands.push(VectorCommand::SetProperty(property));
        self
    }

    /// Bounding box of every motion target, if any
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::of_points(self.commands.iter().filter_map(VectorCommand::target))
    }

    /// Copy of this part moved by (`dx`, `dy`) pixels
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        let commands = self
            .commands
            .iter()
            .map(|cmd| match cmd {
                VectorCommand::MoveTo { x, y } => VectorCommand::MoveTo {
                    x: x + dx,
                    y: y + dy,
                },
                VectorCommand::LineTo { x, y } => VectorCommand::LineTo {
                    x: x + dx,
                    y: y + dy,
                },
                VectorCommand::SetProperty(p) => VectorCommand::SetProperty(p.clone()),
            })
            .collect();
        Self {
            resolution: self.resolution,
            commands,
        }
    }
}
