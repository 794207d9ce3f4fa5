//! Error handling for laserlink
//!
//! Provides one error type per failure class of a job transmission:
//! - Configuration errors (missing target, invalid settings)
//! - Connection errors (transport cannot be opened, probe exhausted)
//! - Identification errors (device identity mismatch)
//! - Protocol errors (bad or missing acknowledgment, timeouts)
//! - Job validation errors (empty job, out-of-bed geometry, unsupported parts)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Configuration error type
///
/// Raised before any transport is opened.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// Neither a network host nor a serial port is configured
    #[error("Either COM Port or IP/Host has to be set")]
    MissingTarget,

    /// A setting carries a value outside its valid domain
    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting {
        /// The setting key.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A key/value lookup used a key the driver does not expose
    #[error("Unknown setting: {0}")]
    UnknownSetting(String),

    /// A settings file could not be read or parsed
    #[error("Failed to load settings: {0}")]
    LoadFailed(String),

    /// A settings file could not be written
    #[error("Failed to save settings: {0}")]
    SaveFailed(String),
}

/// Connection error type
///
/// Represents failures to open a transport to the device.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConnectionError {
    /// Port is already in use
    #[error("Port in use {port}")]
    PortInUse {
        /// The port that is busy.
        port: String,
    },

    /// Failed to open port
    #[error("Failed to open port {port}: {reason}")]
    FailedToOpen {
        /// The port that failed to open.
        port: String,
        /// The reason reported by the operating system.
        reason: String,
    },

    /// Failed to reach a network endpoint
    #[error("Failed to connect to {host}:{port}: {reason}")]
    Network {
        /// Host name or address.
        host: String,
        /// TCP port.
        port: u16,
        /// The reason reported by the operating system.
        reason: String,
    },

    /// Serial enumeration produced no candidates
    #[error("No serial port found")]
    NoSerialPorts,

    /// Every probed candidate failed to open or identify
    #[error("No device identified on any serial port ({})", attempts.join("; "))]
    ProbeExhausted {
        /// One failure description per probed candidate, in probe order.
        attempts: Vec<String>,
    },

    /// Port enumeration itself failed
    #[error("Failed to enumerate ports: {0}")]
    Enumeration(String),
}

/// Identification error type
///
/// The device answered, but not with the configured identification line.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IdentificationError {
    /// The first line did not match the expected identification
    #[error("Does not seem to be a {expected} device on {port} (got '{received}')")]
    Mismatch {
        /// The port or endpoint that was probed.
        port: String,
        /// The expected identification line.
        expected: String,
        /// The line actually received.
        received: String,
    },

    /// The device stayed silent or closed the stream during identification
    #[error("No identification received on {port}: {reason}")]
    NoResponse {
        /// The port or endpoint that was probed.
        port: String,
        /// What went wrong while reading.
        reason: String,
    },
}

/// Protocol error type
///
/// Raised while streaming lines to an identified device.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// The response to a line was not the acknowledgment token
    #[error("Device did not respond 'ok' to '{line}' (got '{response}')")]
    UnexpectedResponse {
        /// The line that was sent.
        line: String,
        /// The response that was received instead.
        response: String,
    },

    /// The acknowledgment for a line did not arrive in time
    #[error("Timed out after {timeout_ms}ms waiting for 'ok' to '{line}'")]
    Timeout {
        /// The line that was sent.
        line: String,
        /// The read timeout in milliseconds.
        timeout_ms: u64,
    },

    /// The device closed the stream while an acknowledgment was pending
    #[error("Connection closed while waiting for 'ok' to '{line}'")]
    ConnectionClosed {
        /// The line that was sent.
        line: String,
    },
}

/// Job validation error type
///
/// Raised before a connection attempt is made.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum JobValidationError {
    /// A job without parts cannot be sent
    #[error("Job '{0}' contains no parts")]
    EmptyJob(String),

    /// Part geometry leaves the laser bed
    #[error(
        "Part {index} extends to {width_mm:.2}x{height_mm:.2}mm, bed is {bed_width_mm:.2}x{bed_height_mm:.2}mm"
    )]
    ExceedsBed {
        /// Index of the offending part in the job.
        index: usize,
        /// Right-most extent of the part in mm.
        width_mm: f64,
        /// Bottom-most extent of the part in mm.
        height_mm: f64,
        /// Configured bed width in mm.
        bed_width_mm: f64,
        /// Configured bed height in mm.
        bed_height_mm: f64,
    },

    /// Part geometry has negative coordinates
    #[error("Part {index} has coordinates left of or above the origin")]
    NegativeCoordinates {
        /// Index of the offending part in the job.
        index: usize,
    },

    /// The dialect cannot render this kind of part
    #[error("{part} parts are not implemented for {dialect}")]
    UnsupportedPart {
        /// Dialect name.
        dialect: String,
        /// Part kind name.
        part: String,
    },

    /// Resolution must be strictly positive
    #[error("Invalid resolution {0}: must be > 0")]
    InvalidResolution(f64),

    /// Raster data does not match its declared geometry
    #[error("Invalid raster: {0}")]
    InvalidRaster(String),
}

/// Main error type for laserlink
///
/// A unified error type that can represent any error from all layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Identification error
    #[error(transparent)]
    Identification(#[from] IdentificationError),

    /// Protocol error
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Job validation error
    #[error(transparent)]
    JobValidation(#[from] JobValidationError),

    /// Transport read/write failure mid-transmission
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Protocol(ProtocolError::Timeout { .. }))
    }

    /// Check if this is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_))
    }

    /// Check if this is an identification error
    pub fn is_identification_error(&self) -> bool {
        matches!(self, Error::Identification(_))
    }

    /// Check if this is a protocol error
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Error::Protocol(_))
    }

    /// Check if this is a job validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::JobValidation(_))
    }

    /// Check if this is a configuration error
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
