//! Device dialects
//!
//! A [`Dialect`] is plain data describing how one family of controllers
//! speaks: how it identifies itself, which line terminator it expects,
//! whether every line is acknowledged, and how power/speed/focus changes are
//! written. One protocol engine serves every dialect.

pub mod handshake;

pub use handshake::{Handshake, Identification, MatchRule};

use laserlink_core::RasterKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Supported controller families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DialectKind {
    /// GRBL-style controllers (also Smoothieboard)
    #[default]
    Generic,
    /// Marlin laser firmware
    Marlin,
    /// Lasersaur (LasaurGrbl)
    Lasersaur,
    /// MakeBlock XY plotter with pen or laser head
    MakeBlockXYPlotter,
}

impl DialectKind {
    /// Every dialect, in presentation order
    pub const ALL: [DialectKind; 4] = [
        DialectKind::Generic,
        DialectKind::Marlin,
        DialectKind::Lasersaur,
        DialectKind::MakeBlockXYPlotter,
    ];
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialectKind::Generic => write!(f, "Generic GCode Driver"),
            DialectKind::Marlin => write!(f, "Marlin"),
            DialectKind::Lasersaur => write!(f, "Lasersaur"),
            DialectKind::MakeBlockXYPlotter => write!(f, "MakeBlockXYPlotter"),
        }
    }
}

impl FromStr for DialectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "generic" | "grbl" => Ok(DialectKind::Generic),
            "marlin" => Ok(DialectKind::Marlin),
            "lasersaur" => Ok(DialectKind::Lasersaur),
            "makeblock" | "makeblockxyplotter" => Ok(DialectKind::MakeBlockXYPlotter),
            other => Err(format!("unknown dialect '{other}'")),
        }
    }
}

/// Line terminator appended to every protocol line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LineEnding {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    CrLf,
}

impl LineEnding {
    /// Terminator text
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

impl FromStr for LineEnding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LF" => Ok(LineEnding::Lf),
            "CRLF" => Ok(LineEnding::CrLf),
            other => Err(format!("unknown line ending '{other}'")),
        }
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineEnding::Lf => write!(f, "LF"),
            LineEnding::CrLf => write!(f, "CRLF"),
        }
    }
}

/// How power and speed changes reach the device
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModalStyle {
    /// Appended to the next `G1` as ` S<float>` and ` F<int>`
    Fused {
        /// `S` value at 100% power
        spindle_max: f64,
        /// Feed rate at 100% speed, mm/min
        max_speed: f64,
        /// Emit `G0 Z<mm>` when focus changes
        focus: bool,
    },
    /// Written as their own `S<int>` and `G1 F<int>` lines
    Standalone {
        /// `S` value at 100% power
        power_rate: f64,
        /// `F` value at 100% speed
        speed_rate: f64,
    },
    /// Not written at all (pen plotters)
    Ignored,
}

/// Pen lift commands of plotter heads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PenControl {
    /// Lifts the pen before travel
    pub up: String,
    /// Lowers the pen before marking
    pub down: String,
}

impl Default for PenControl {
    fn default() -> Self {
        Self {
            up: "M1 90".to_string(),
            down: "M1 130".to_string(),
        }
    }
}

/// Tool mounted on a MakeBlock plotter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlotterTool {
    /// Servo-driven pen
    #[default]
    Pen,
    /// Laser diode
    Laser,
}

impl FromStr for PlotterTool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PEN" => Ok(PlotterTool::Pen),
            "LASER" => Ok(PlotterTool::Laser),
            other => Err(format!("unknown tool '{other}'")),
        }
    }
}

impl fmt::Display for PlotterTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlotterTool::Pen => write!(f, "PEN"),
            PlotterTool::Laser => write!(f, "LASER"),
        }
    }
}

/// Everything the protocol engine needs to know about a controller family
#[derive(Debug, Clone, PartialEq)]
pub struct Dialect {
    /// Controller family
    pub kind: DialectKind,
    /// Connection handshake
    pub handshake: Handshake,
    /// Line terminator
    pub line_ending: LineEnding,
    /// Block on an `ok` after every line
    pub wait_for_ok: bool,
    /// Power/speed/focus emission
    pub modal: ModalStyle,
    /// Pen lift commands, for plotters
    pub pen: Option<PenControl>,
    /// Mirror X around the bed width
    pub flip_x: bool,
    /// Raster kinds the controller can engrave
    pub raster_kinds: Vec<RasterKind>,
    /// Whether `G7` binary rastering is understood
    pub binary_raster: bool,
}

impl Dialect {
    /// Generic GRBL-style dialect
    pub fn generic() -> Self {
        Self {
            kind: DialectKind::Generic,
            handshake: Handshake::Identify(Identification::exact("Grbl")),
            line_ending: LineEnding::CrLf,
            wait_for_ok: true,
            modal: ModalStyle::Fused {
                spindle_max: 100.0,
                max_speed: 1200.0,
                focus: true,
            },
            pen: None,
            flip_x: false,
            raster_kinds: vec![RasterKind::BlackWhite, RasterKind::Greyscale],
            binary_raster: false,
        }
    }

    /// Marlin laser firmware
    ///
    /// Greets with `start...`, then dumps its settings; the dump ends with a
    /// line starting with `echo:SD`.
    pub fn marlin() -> Self {
        Self {
            kind: DialectKind::Marlin,
            handshake: Handshake::IdentifyThenDrain {
                identification: Identification::prefix("start"),
                sentinel: "echo:SD".to_string(),
            },
            binary_raster: true,
            ..Self::generic()
        }
    }

    /// Lasersaur: no greeting, no acknowledgments, standalone power lines
    pub fn lasersaur() -> Self {
        Self {
            kind: DialectKind::Lasersaur,
            handshake: Handshake::None,
            line_ending: LineEnding::Lf,
            wait_for_ok: false,
            modal: ModalStyle::Standalone {
                power_rate: 255.0,
                speed_rate: 2000.0,
            },
            pen: None,
            flip_x: false,
            raster_kinds: vec![RasterKind::BlackWhite, RasterKind::Greyscale],
            binary_raster: false,
        }
    }

    /// MakeBlock XY plotter with the given tool
    pub fn makeblock(tool: PlotterTool) -> Self {
        let (modal, pen) = match tool {
            PlotterTool::Pen => (ModalStyle::Ignored, Some(PenControl::default())),
            PlotterTool::Laser => (
                ModalStyle::Standalone {
                    power_rate: 255.0,
                    speed_rate: 255.0,
                },
                None,
            ),
        };
        Self {
            kind: DialectKind::MakeBlockXYPlotter,
            handshake: Handshake::WakeUp {
                sequence: "\r\n\r\n".to_string(),
                settle: Duration::from_millis(2000),
            },
            line_ending: LineEnding::Lf,
            wait_for_ok: true,
            modal,
            pen,
            flip_x: false,
            raster_kinds: vec![RasterKind::BlackWhite],
            binary_raster: false,
        }
    }

    /// Defaults for `kind`
    pub fn for_kind(kind: DialectKind) -> Self {
        match kind {
            DialectKind::Generic => Self::generic(),
            DialectKind::Marlin => Self::marlin(),
            DialectKind::Lasersaur => Self::lasersaur(),
            DialectKind::MakeBlockXYPlotter => Self::makeblock(PlotterTool::Pen),
        }
    }

    /// Default pre-job lines
    pub fn default_pre_job(kind: DialectKind) -> Vec<String> {
        let lines: &[&str] = match kind {
            DialectKind::Generic => &["G21", "G90"],
            DialectKind::Marlin => &["G21", "G90", "G28 XY", "M5"],
            DialectKind::Lasersaur => &["G54", "G21", "G90", "G0 X0 Y0"],
            DialectKind::MakeBlockXYPlotter => &["G54", "G21", "G90", "M1 90", "G28 X Y"],
        };
        lines.iter().map(|l| l.to_string()).collect()
    }

    /// Default post-job lines
    pub fn default_post_job(kind: DialectKind) -> Vec<String> {
        let lines: &[&str] = match kind {
            DialectKind::Generic | DialectKind::Lasersaur => &["G0 X0 Y0"],
            DialectKind::Marlin => &["G0 X0 Y0", "M5", "G28 XY"],
            DialectKind::MakeBlockXYPlotter => &["G28 X Y"],
        };
        lines.iter().map(|l| l.to_string()).collect()
    }

    /// Whether `kind` rasters can be engraved
    pub fn supports_raster(&self, kind: RasterKind) -> bool {
        self.raster_kinds.contains(&kind)
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self::generic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_defaults() {
        let generic = Dialect::generic();
        assert_eq!(generic.line_ending, LineEnding::CrLf);
        assert!(generic.wait_for_ok);

        let marlin = Dialect::marlin();
        assert!(marlin.binary_raster);
        assert!(matches!(
            marlin.handshake,
            Handshake::IdentifyThenDrain { .. }
        ));

        let plotter = Dialect::makeblock(PlotterTool::Pen);
        assert!(plotter.pen.is_some());
        assert!(!plotter.supports_raster(RasterKind::Greyscale));
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("marlin".parse::<DialectKind>(), Ok(DialectKind::Marlin));
        assert_eq!("CRLF".parse::<LineEnding>(), Ok(LineEnding::CrLf));
        assert_eq!("laser".parse::<PlotterTool>(), Ok(PlotterTool::Laser));
        assert!("smoothie".parse::<DialectKind>().is_err());
    }

    #[test]
    fn test_marlin_job_wrapping() {
        assert_eq!(
            Dialect::default_pre_job(DialectKind::Marlin),
            vec!["G21", "G90", "G28 XY", "M5"]
        );
        assert_eq!(
            Dialect::default_post_job(DialectKind::Marlin),
            vec!["G0 X0 Y0", "M5", "G28 XY"]
        );
    }
}
