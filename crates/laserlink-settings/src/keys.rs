//! Key/value access to driver settings
//!
//! Settings are exposed under human-readable keys, as shown in a driver's
//! property sheet. Each dialect exposes its own subset.

use crate::config::DriverSettings;
use laserlink_communication::{DialectKind, LineEnding, PlotterTool};
use laserlink_core::{ConfigurationError, Result};
use laserlink_raster::RasterMode;
use std::fmt;
use std::str::FromStr;

/// One user-facing setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    /// Network host name or address
    Host,
    /// Serial port name, or `auto` to probe
    ComPort,
    /// Laser bed width in mm
    BedWidth,
    /// Laser bed height in mm
    BedHeight,
    /// Feed rate at 100% speed, mm/min
    MaxSpeed,
    /// Lines sent before the job, comma separated
    PreJob,
    /// Lines sent after the job, comma separated
    PostJob,
    /// Expected first line from the board
    Identification,
    /// Wait for `ok` after every line
    WaitForOk,
    /// Line terminator (LF or CRLF)
    LineEnd,
    /// Serial baud rate
    BaudRate,
    /// Read timeout in ms, 0 for none
    ReadTimeout,
    /// Alternate raster scan direction
    Bidirectional,
    /// Overscan per raster line in mm
    RasterPadding,
    /// Raster with `G7` binary chunks
    UseG7,
    /// Trim raster passes to the marked area
    OptimiseRaster,
    /// Replace `+` and `/` in `G7` payloads
    Sanitise,
    /// X axis runs right to left
    FlipX,
    /// Laser feed rate at 100% speed
    LaserRate,
    /// `F` value at 100% speed
    SpeedRate,
    /// `S` value at 100% power
    PowerRate,
    /// Plotter tool (pen or laser)
    Tool,
    /// Delay after the wake-up sequence in ms
    WakeUpDelay,
}

impl SettingKey {
    /// Every key, in property-sheet order
    pub const ALL: [SettingKey; 23] = [
        SettingKey::Host,
        SettingKey::ComPort,
        SettingKey::BedWidth,
        SettingKey::BedHeight,
        SettingKey::MaxSpeed,
        SettingKey::PreJob,
        SettingKey::PostJob,
        SettingKey::Identification,
        SettingKey::WaitForOk,
        SettingKey::LineEnd,
        SettingKey::BaudRate,
        SettingKey::ReadTimeout,
        SettingKey::Bidirectional,
        SettingKey::RasterPadding,
        SettingKey::UseG7,
        SettingKey::OptimiseRaster,
        SettingKey::Sanitise,
        SettingKey::FlipX,
        SettingKey::LaserRate,
        SettingKey::SpeedRate,
        SettingKey::PowerRate,
        SettingKey::Tool,
        SettingKey::WakeUpDelay,
    ];

    /// Human-readable key
    pub fn name(self) -> &'static str {
        match self {
            SettingKey::Host => "IP/Hostname",
            SettingKey::ComPort => "COM Port",
            SettingKey::BedWidth => "Laserbed width",
            SettingKey::BedHeight => "Laserbed height",
            SettingKey::MaxSpeed => "Max speed (in mm/min)",
            SettingKey::PreJob => "Pre-Job GCode (comma separated)",
            SettingKey::PostJob => "Post-Job GCode (comma separated)",
            SettingKey::Identification => "Board Identification String",
            SettingKey::WaitForOk => "Wait for OK after each line (interactive mode)",
            SettingKey::LineEnd => "Line ending (LF, CRLF)",
            SettingKey::BaudRate => "Baud rate",
            SettingKey::ReadTimeout => "Read timeout (ms, 0 = none)",
            SettingKey::Bidirectional => "Bidirectional rastering",
            SettingKey::RasterPadding => "Additional space per Raster line (mm)",
            SettingKey::UseG7 => "Use G7 rastering",
            SettingKey::OptimiseRaster => "Optimise rastering",
            SettingKey::Sanitise => "Sanitise for Pronterface",
            SettingKey::FlipX => "X axis goes right to left (yes/no)",
            SettingKey::LaserRate => "Max. Laser Rate (mm/min)",
            SettingKey::SpeedRate => "Max. Speed Rate (abs. value)",
            SettingKey::PowerRate => "Max. Power Rate (abs. value)",
            SettingKey::Tool => "Tool (PEN, LASER)",
            SettingKey::WakeUpDelay => "Wake-up delay (ms)",
        }
    }

    /// Keys exposed for `kind`
    pub fn for_dialect(kind: DialectKind) -> &'static [SettingKey] {
        use SettingKey::*;
        match kind {
            DialectKind::Generic => &[
                Host, ComPort, BedWidth, BedHeight, MaxSpeed, PreJob, PostJob,
                Identification, WaitForOk, LineEnd, BaudRate, ReadTimeout, Bidirectional,
                RasterPadding,
            ],
            DialectKind::Marlin => &[
                Host, ComPort, BedWidth, BedHeight, MaxSpeed, PreJob, PostJob, BaudRate,
                ReadTimeout, Bidirectional, RasterPadding, UseG7, OptimiseRaster, Sanitise,
            ],
            DialectKind::Lasersaur => &[
                ComPort, BedWidth, BedHeight, PreJob, PostJob, FlipX, RasterPadding,
                LaserRate, Bidirectional,
            ],
            DialectKind::MakeBlockXYPlotter => &[
                ComPort, BedWidth, BedHeight, PreJob, PostJob, RasterPadding, SpeedRate,
                PowerRate, Tool, WakeUpDelay,
            ],
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for SettingKey {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        SettingKey::ALL
            .into_iter()
            .find(|key| key.name() == s)
            .ok_or_else(|| ConfigurationError::UnknownSetting(s.to_string()))
    }
}

fn parse<T: FromStr>(key: SettingKey, value: &str) -> std::result::Result<T, ConfigurationError>
where
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigurationError::InvalidSetting {
            key: key.name().to_string(),
            reason: e.to_string(),
        })
}

fn parse_bool(key: SettingKey, value: &str) -> std::result::Result<bool, ConfigurationError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(ConfigurationError::InvalidSetting {
            key: key.name().to_string(),
            reason: format!("expected yes or no, got '{other}'"),
        }),
    }
}

impl DriverSettings {
    /// Keys exposed by this driver's dialect
    pub fn property_keys(&self) -> Vec<&'static str> {
        SettingKey::for_dialect(self.dialect)
            .iter()
            .map(|key| key.name())
            .collect()
    }

    fn exposed(&self, key: &str) -> std::result::Result<SettingKey, ConfigurationError> {
        let parsed: SettingKey = key.parse()?;
        if SettingKey::for_dialect(self.dialect).contains(&parsed) {
            Ok(parsed)
        } else {
            Err(ConfigurationError::UnknownSetting(key.to_string()))
        }
    }

    /// Value of `key` as text, `None` if the dialect does not expose it
    pub fn get_property(&self, key: &str) -> Option<String> {
        let key = self.exposed(key).ok()?;
        let value = match key {
            SettingKey::Host => self.host.clone(),
            SettingKey::ComPort => self.comport.clone(),
            SettingKey::BedWidth => self.bed_width_mm.to_string(),
            SettingKey::BedHeight => self.bed_height_mm.to_string(),
            SettingKey::MaxSpeed => self.max_speed.to_string(),
            SettingKey::PreJob => self.pre_job.clone(),
            SettingKey::PostJob => self.post_job.clone(),
            SettingKey::Identification => self.identification.clone(),
            SettingKey::WaitForOk => self.wait_for_ok.to_string(),
            SettingKey::LineEnd => self.line_ending.to_string(),
            SettingKey::BaudRate => self.baud_rate.to_string(),
            SettingKey::ReadTimeout => self.read_timeout_ms.unwrap_or(0).to_string(),
            SettingKey::Bidirectional => self.bidirectional.to_string(),
            SettingKey::RasterPadding => self.raster_padding_mm.to_string(),
            SettingKey::UseG7 => (self.raster_mode == RasterMode::BinaryChunk).to_string(),
            SettingKey::OptimiseRaster => self.optimise_raster.to_string(),
            SettingKey::Sanitise => self.sanitise.to_string(),
            SettingKey::FlipX => self.flip_x.to_string(),
            SettingKey::LaserRate | SettingKey::SpeedRate => self.speed_rate.to_string(),
            SettingKey::PowerRate => self.power_rate.to_string(),
            SettingKey::Tool => self.tool.to_string(),
            SettingKey::WakeUpDelay => self.wake_up_delay_ms.to_string(),
        };
        Some(value)
    }

    /// Set `key` from text
    ///
    /// Unknown keys and keys the dialect does not expose are rejected, as
    /// are values that do not parse. Range checks happen in `validate`.
    pub fn set_property(&mut self, key: &str, value: &str) -> Result<()> {
        let key = self.exposed(key)?;
        match key {
            SettingKey::Host => self.host = value.trim().to_string(),
            SettingKey::ComPort => self.comport = value.trim().to_string(),
            SettingKey::BedWidth => self.bed_width_mm = parse(key, value)?,
            SettingKey::BedHeight => self.bed_height_mm = parse(key, value)?,
            SettingKey::MaxSpeed => self.max_speed = parse(key, value)?,
            SettingKey::PreJob => self.pre_job = value.to_string(),
            SettingKey::PostJob => self.post_job = value.to_string(),
            SettingKey::Identification => self.identification = value.to_string(),
            SettingKey::WaitForOk => self.wait_for_ok = parse_bool(key, value)?,
            SettingKey::LineEnd => self.line_ending = parse::<LineEnding>(key, value)?,
            SettingKey::BaudRate => self.baud_rate = parse(key, value)?,
            SettingKey::ReadTimeout => {
                let ms: u64 = parse(key, value)?;
                self.read_timeout_ms = (ms > 0).then_some(ms);
            }
            SettingKey::Bidirectional => self.bidirectional = parse_bool(key, value)?,
            SettingKey::RasterPadding => self.raster_padding_mm = parse(key, value)?,
            SettingKey::UseG7 => {
                self.raster_mode = if parse_bool(key, value)? {
                    RasterMode::BinaryChunk
                } else {
                    RasterMode::VectorApproximation
                };
            }
            SettingKey::OptimiseRaster => self.optimise_raster = parse_bool(key, value)?,
            SettingKey::Sanitise => self.sanitise = parse_bool(key, value)?,
            SettingKey::FlipX => self.flip_x = parse_bool(key, value)?,
            SettingKey::LaserRate | SettingKey::SpeedRate => self.speed_rate = parse(key, value)?,
            SettingKey::PowerRate => self.power_rate = parse(key, value)?,
            SettingKey::Tool => self.tool = parse::<PlotterTool>(key, value)?,
            SettingKey::WakeUpDelay => self.wake_up_delay_ms = parse(key, value)?,
        }
        tracing::trace!("{} = {}", key, value);
        Ok(())
    }
}
