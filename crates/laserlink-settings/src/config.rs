//! Driver settings
//!
//! Provides the persisted configuration of one device driver, its validation,
//! and its conversion into an immutable [`SessionConfig`].
//! Supports JSON and TOML file formats stored in platform-specific directories.

use laserlink_communication::{
    split_lines, Dialect, DialectKind, Handshake, LineEnding, LinkOptions, ModalStyle,
    PlotterTool, SessionConfig, Target, AUTO_PORT,
};
use laserlink_core::{ConfigurationError, Result};
use laserlink_raster::{RasterMode, RasterOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings file name inside the config directory
pub const SETTINGS_FILE: &str = "driver.toml";

/// Persisted settings of one device driver
///
/// Values not present in a settings file take the generic defaults; use
/// [`DriverSettings::for_dialect`] for the defaults of another dialect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverSettings {
    /// Controller family
    pub dialect: DialectKind,
    /// Network host; takes precedence over the serial port when set
    pub host: String,
    /// Serial device, or `auto` to probe every candidate
    pub comport: String,
    /// Serial baud rate
    pub baud_rate: u32,
    /// TCP connect timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Per-read timeout in milliseconds; unset blocks forever
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_timeout_ms: Option<u64>,
    /// Bed width in mm
    pub bed_width_mm: f64,
    /// Bed height in mm
    pub bed_height_mm: f64,
    /// Feed rate at 100% speed, mm/min
    pub max_speed: f64,
    /// `S` value at 100% power for fused dialects
    pub spindle_max: f64,
    /// `S` value at 100% power for standalone power lines
    pub power_rate: f64,
    /// `F` value at 100% speed for standalone speed lines
    pub speed_rate: f64,
    /// Comma-separated lines sent before the job
    pub pre_job: String,
    /// Comma-separated lines sent after the job
    pub post_job: String,
    /// Expected identification line; empty disables identification
    pub identification: String,
    /// Block on `ok` after every line
    pub wait_for_ok: bool,
    /// Line terminator
    pub line_ending: LineEnding,
    /// Raster lowering strategy
    pub raster_mode: RasterMode,
    /// Alternate raster scan direction
    pub bidirectional: bool,
    /// Trim and extend raster passes to what neighbouring lines need
    pub optimise_raster: bool,
    /// Replace `+` and `/` in `G7` payloads
    pub sanitise: bool,
    /// Travel added on each side of a raster line, mm
    pub raster_padding_mm: f64,
    /// X axis runs right to left
    pub flip_x: bool,
    /// Tool of a plotter head
    pub tool: PlotterTool,
    /// Delay after the wake-up sequence, milliseconds
    pub wake_up_delay_ms: u64,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            dialect: DialectKind::Generic,
            host: String::new(),
            comport: AUTO_PORT.to_string(),
            baud_rate: 115_200,
            connect_timeout_ms: 1000,
            read_timeout_ms: None,
            bed_width_mm: 250.0,
            bed_height_mm: 280.0,
            max_speed: 1200.0,
            spindle_max: 100.0,
            power_rate: 255.0,
            speed_rate: 2000.0,
            pre_job: "G21,G90".to_string(),
            post_job: "G0 X0 Y0".to_string(),
            identification: "Grbl".to_string(),
            wait_for_ok: true,
            line_ending: LineEnding::CrLf,
            raster_mode: RasterMode::VectorApproximation,
            bidirectional: true,
            optimise_raster: false,
            sanitise: false,
            raster_padding_mm: 0.0,
            flip_x: false,
            tool: PlotterTool::Pen,
            wake_up_delay_ms: 2000,
        }
    }
}

impl DriverSettings {
    /// Create settings with the generic defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults for `kind`
    pub fn for_dialect(kind: DialectKind) -> Self {
        let lines = |lines: Vec<String>| lines.join(",");
        let base = Self {
            dialect: kind,
            pre_job: lines(Dialect::default_pre_job(kind)),
            post_job: lines(Dialect::default_post_job(kind)),
            ..Self::default()
        };
        match kind {
            DialectKind::Generic => base,
            DialectKind::Marlin => Self {
                identification: "start".to_string(),
                read_timeout_ms: Some(35_000),
                ..base
            },
            DialectKind::Lasersaur => Self {
                comport: "/dev/ttyUSB0".to_string(),
                identification: String::new(),
                wait_for_ok: false,
                line_ending: LineEnding::Lf,
                speed_rate: 2000.0,
                raster_padding_mm: 0.5,
                ..base
            },
            DialectKind::MakeBlockXYPlotter => Self {
                identification: String::new(),
                line_ending: LineEnding::Lf,
                bed_width_mm: 300.0,
                bed_height_mm: 210.0,
                power_rate: 255.0,
                speed_rate: 255.0,
                raster_padding_mm: 0.5,
                ..base
            },
        }
    }

    /// Default settings file location
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        path.push("laserlink");
        path.push(SETTINGS_FILE);
        path
    }

    /// Load settings from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigurationError::LoadFailed(format!("{}: {}", path.display(), e))
        })?;

        let settings: Self = match extension(path) {
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| ConfigurationError::LoadFailed(format!("Invalid JSON settings: {e}")))?,
            Some("toml") => toml::from_str(&content)
                .map_err(|e| ConfigurationError::LoadFailed(format!("Invalid TOML settings: {e}")))?,
            _ => {
                return Err(ConfigurationError::LoadFailed(
                    "Settings file must be .json or .toml".to_string(),
                )
                .into())
            }
        };

        settings.validate()?;
        tracing::debug!("Loaded {} settings from {}", settings.dialect, path.display());
        Ok(settings)
    }

    /// Save settings to file (JSON or TOML)
    ///
    /// Missing parent directories are created.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        self.validate()?;

        let content = match extension(path) {
            Some("json") => serde_json::to_string_pretty(self)
                .map_err(|e| ConfigurationError::SaveFailed(e.to_string()))?,
            Some("toml") => toml::to_string_pretty(self)
                .map_err(|e| ConfigurationError::SaveFailed(e.to_string()))?,
            _ => {
                return Err(ConfigurationError::SaveFailed(
                    "Settings file must be .json or .toml".to_string(),
                )
                .into())
            }
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigurationError::SaveFailed(format!("{}: {}", parent.display(), e)))?;
        }
        std::fs::write(path, content)
            .map_err(|e| ConfigurationError::SaveFailed(format!("{}: {}", path.display(), e)))?;
        tracing::debug!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Validate settings
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("Laserbed width", self.bed_width_mm),
            ("Laserbed height", self.bed_height_mm),
            ("Max speed", self.max_speed),
            ("Spindle max", self.spindle_max),
            ("Max. Power Rate", self.power_rate),
            ("Max. Speed Rate", self.speed_rate),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(key, format!("must be > 0, got {value}")));
            }
        }

        if !(self.raster_padding_mm.is_finite() && self.raster_padding_mm >= 0.0) {
            return Err(invalid(
                "Additional space per Raster line",
                format!("must be >= 0, got {}", self.raster_padding_mm),
            ));
        }

        if self.baud_rate == 0 {
            return Err(invalid("Baud rate", "must be > 0".to_string()));
        }

        if self.connect_timeout_ms == 0 {
            return Err(invalid("Connect timeout", "must be > 0".to_string()));
        }

        if self.read_timeout_ms == Some(0) {
            return Err(invalid("Read timeout", "must be > 0 when set".to_string()));
        }

        if self.raster_mode == RasterMode::BinaryChunk && self.dialect != DialectKind::Marlin {
            return Err(invalid(
                "Use G7 rastering",
                format!("not supported by {}", self.dialect),
            ));
        }

        self.target()?;
        Ok(())
    }

    /// Device location
    pub fn target(&self) -> Result<Target> {
        Target::from_settings(&self.host, &self.comport)
    }

    /// Dialect descriptor with these settings applied
    pub fn dialect_descriptor(&self) -> Dialect {
        match self.dialect {
            DialectKind::Generic => Dialect {
                handshake: Handshake::identify_or_none(&self.identification),
                line_ending: self.line_ending,
                wait_for_ok: self.wait_for_ok,
                modal: self.fused(),
                ..Dialect::generic()
            },
            // identification, acknowledgment and line ending are fixed for Marlin
            DialectKind::Marlin => Dialect {
                modal: self.fused(),
                ..Dialect::marlin()
            },
            DialectKind::Lasersaur => Dialect {
                modal: ModalStyle::Standalone {
                    power_rate: 255.0,
                    speed_rate: self.speed_rate,
                },
                flip_x: self.flip_x,
                ..Dialect::lasersaur()
            },
            DialectKind::MakeBlockXYPlotter => {
                let mut dialect = Dialect::makeblock(self.tool);
                if let ModalStyle::Standalone { .. } = dialect.modal {
                    dialect.modal = ModalStyle::Standalone {
                        power_rate: self.power_rate,
                        speed_rate: self.speed_rate,
                    };
                }
                if let Handshake::WakeUp { settle, .. } = &mut dialect.handshake {
                    *settle = Duration::from_millis(self.wake_up_delay_ms);
                }
                dialect
            }
        }
    }

    fn fused(&self) -> ModalStyle {
        ModalStyle::Fused {
            spindle_max: self.spindle_max,
            max_speed: self.max_speed,
            focus: true,
        }
    }

    /// Raster lowering options
    pub fn raster_options(&self) -> RasterOptions {
        RasterOptions {
            mode: self.raster_mode,
            bidirectional: self.bidirectional,
            optimise: self.optimise_raster,
            padding_mm: self.raster_padding_mm,
            bed_width_mm: self.bed_width_mm,
            max_speed: self.max_speed,
            sanitise: self.sanitise,
        }
    }

    /// Transport parameters
    pub fn link_options(&self) -> LinkOptions {
        LinkOptions {
            baud_rate: self.baud_rate,
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            read_timeout: self.read_timeout_ms.map(Duration::from_millis),
        }
    }

    /// Immutable configuration for one send attempt
    pub fn session_config(&self) -> Result<SessionConfig> {
        self.validate()?;
        let config = SessionConfig {
            dialect: self.dialect_descriptor(),
            target: self.target()?,
            bed_width_mm: self.bed_width_mm,
            bed_height_mm: self.bed_height_mm,
            pre_job: split_lines(&self.pre_job),
            post_job: split_lines(&self.post_job),
            raster: self.raster_options(),
            link: self.link_options(),
        };
        config.validate()?;
        Ok(config)
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

fn invalid(key: &str, reason: String) -> laserlink_core::Error {
    ConfigurationError::InvalidSetting {
        key: key.to_string(),
        reason,
    }
    .into()
}
