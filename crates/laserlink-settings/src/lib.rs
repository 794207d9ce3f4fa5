//! laserlink Settings Crate
//!
//! Persisted driver settings, the key/value surface of each dialect, and the
//! conversion into the immutable configuration a device session runs with.

pub mod config;
pub mod keys;

pub use config::{DriverSettings, SETTINGS_FILE};
pub use keys::SettingKey;
