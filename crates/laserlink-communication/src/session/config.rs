use crate::communication::{Endpoint, LinkOptions, DEFAULT_NETWORK_PORT};
use crate::dialect::Dialect;
use laserlink_core::{ConfigurationError, Result};
use laserlink_raster::{RasterMode, RasterOptions};
use std::fmt;

/// Serial port value that requests auto-probing
pub const AUTO_PORT: &str = "auto";

/// Serial port selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerialTarget {
    /// Probe every candidate in enumeration order
    Auto,
    /// Open this port only
    Named(String),
}

/// Where a job is sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Network-attached controller
    Network {
        /// Host name or address
        host: String,
        /// TCP port
        port: u16,
    },
    /// Serial controller
    Serial(SerialTarget),
}

impl Target {
    /// Resolve a target from the host and serial port settings
    ///
    /// A non-empty host wins. Otherwise the serial port is used, where
    /// `auto` requests probing. With neither set, this is a configuration
    /// error.
    pub fn from_settings(host: &str, comport: &str) -> Result<Self> {
        let host = host.trim();
        let comport = comport.trim();
        if !host.is_empty() {
            return Ok(Target::Network {
                host: host.to_string(),
                port: DEFAULT_NETWORK_PORT,
            });
        }
        if comport.is_empty() {
            return Err(ConfigurationError::MissingTarget.into());
        }
        if comport.eq_ignore_ascii_case(AUTO_PORT) {
            Ok(Target::Serial(SerialTarget::Auto))
        } else {
            Ok(Target::Serial(SerialTarget::Named(comport.to_string())))
        }
    }

    /// Endpoint for a fixed target, `None` when probing
    pub fn endpoint(&self) -> Option<Endpoint> {
        match self {
            Target::Network { host, port } => Some(Endpoint::Network {
                host: host.clone(),
                port: *port,
            }),
            Target::Serial(SerialTarget::Named(port)) => Some(Endpoint::Serial { port: port.clone() }),
            Target::Serial(SerialTarget::Auto) => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Network { host, port } => write!(f, "{host}:{port}"),
            Target::Serial(SerialTarget::Auto) => write!(f, "{AUTO_PORT}"),
            Target::Serial(SerialTarget::Named(port)) => write!(f, "{port}"),
        }
    }
}

/// Everything a session needs to send one job
///
/// Built once from the driver settings and never changed during a send.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Controller dialect
    pub dialect: Dialect,
    /// Device location
    pub target: Target,
    /// Bed width in mm
    pub bed_width_mm: f64,
    /// Bed height in mm
    pub bed_height_mm: f64,
    /// Lines sent before the job body
    pub pre_job: Vec<String>,
    /// Lines sent after the job body
    pub post_job: Vec<String>,
    /// Raster lowering options
    pub raster: RasterOptions,
    /// Transport parameters
    pub link: LinkOptions,
}

impl SessionConfig {
    /// Configuration with the dialect's default job wrapping
    pub fn new(dialect: Dialect, target: Target) -> Self {
        let pre_job = Dialect::default_pre_job(dialect.kind);
        let post_job = Dialect::default_post_job(dialect.kind);
        Self {
            dialect,
            target,
            bed_width_mm: 250.0,
            bed_height_mm: 280.0,
            pre_job,
            post_job,
            raster: RasterOptions::default(),
            link: LinkOptions::default(),
        }
    }

    /// Set the bed size in mm
    pub fn with_bed(mut self, width_mm: f64, height_mm: f64) -> Self {
        self.bed_width_mm = width_mm;
        self.bed_height_mm = height_mm;
        self
    }

    /// Set the raster options
    pub fn with_raster(mut self, raster: RasterOptions) -> Self {
        self.raster = raster;
        self
    }

    /// Set the transport parameters
    pub fn with_link(mut self, link: LinkOptions) -> Self {
        self.link = link;
        self
    }

    /// Raster options with the bed width of this configuration
    pub fn raster_options(&self) -> RasterOptions {
        RasterOptions {
            bed_width_mm: self.bed_width_mm,
            ..self.raster.clone()
        }
    }

    /// Check the configuration for values no job can be sent with
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("Laserbed width", self.bed_width_mm),
            ("Laserbed height", self.bed_height_mm),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigurationError::InvalidSetting {
                    key: key.to_string(),
                    reason: format!("must be > 0, got {value}"),
                }
                .into());
            }
        }
        if !(self.raster.padding_mm.is_finite() && self.raster.padding_mm >= 0.0) {
            return Err(ConfigurationError::InvalidSetting {
                key: "Raster padding".to_string(),
                reason: format!("must be >= 0, got {}", self.raster.padding_mm),
            }
            .into());
        }
        if self.raster.mode == RasterMode::BinaryChunk && !self.dialect.binary_raster {
            return Err(ConfigurationError::InvalidSetting {
                key: "Raster mode".to_string(),
                reason: format!("{} does not understand G7 rastering", self.dialect.kind),
            }
            .into());
        }
        Ok(())
    }
}
