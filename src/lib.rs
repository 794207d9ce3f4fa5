//! # laserlink
//!
//! Sends laser cutter and pen plotter jobs to G-code controllers:
//! - GRBL-style boards, Marlin laser firmware, Lasersaur and MakeBlock XY plotters
//! - Serial (USB) and TCP/IP connectivity, with serial auto-probing
//! - Vector and raster (black/white, greyscale, binary-chunk) job parts
//!
//! ## Architecture
//!
//! laserlink is organized as a workspace with multiple crates:
//!
//! 1. **laserlink-core** - Job model, units, operations, progress, errors
//! 2. **laserlink-raster** - Raster scan optimizer and binary chunk encoder
//! 3. **laserlink-communication** - Transports, dialects, encoder, device session
//! 4. **laserlink-settings** - Persisted driver settings
//! 5. **laserlink** - Job file loading and the command line front-end

pub mod jobfile;

pub use jobfile::{load_job, ImageImport};

pub use laserlink_core::{
    ConfigurationError, ConnectionError, Error, IdentificationError, JobPart, JobValidationError,
    LaserJob, LaserProperty, NoProgress, Point, ProgressListener, ProgressLog, ProtocolError,
    RasterKind, RasterPart, Resolution, Result, VectorCommand, VectorPart,
};

pub use laserlink_raster::{RasterMode, RasterOptions};

pub use laserlink_communication::{
    is_candidate_port, list_ports, save_job, DeviceSession, Dialect, DialectKind, SerialPortInfo,
    SessionConfig, SessionState, Target,
};

pub use laserlink_settings::{DriverSettings, SettingKey};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    // stdout carries G-code when saving to "-", so logs go to stderr
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
