//! Laser properties
//!
//! A property is a small bag of numeric fields (power, speed, focus,
//! frequency). Which fields a property exposes depends on its kind. Fields that
//! were never set are `None` and leave the device's modal state untouched.

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key of the power field (percent)
pub const POWER: &str = "power";
/// Key of the speed field (percent of the maximum feed rate)
pub const SPEED: &str = "speed";
/// Key of the focus field (mm offset)
pub const FOCUS: &str = "focus";
/// Key of the frequency field (Hz)
pub const FREQUENCY: &str = "frequency";

/// Which fields a property exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PropertyKind {
    /// Power, speed and focus
    #[default]
    PowerSpeedFocus,
    /// Power, speed, focus and pulse frequency
    PowerSpeedFocusFrequency,
}

impl PropertyKind {
    /// Keys exposed by this kind, in presentation order
    pub fn keys(self) -> &'static [&'static str] {
        match self {
            PropertyKind::PowerSpeedFocus => &[POWER, SPEED, FOCUS],
            PropertyKind::PowerSpeedFocusFrequency => &[POWER, SPEED, FOCUS, FREQUENCY],
        }
    }

    /// Whether `key` belongs to this kind
    pub fn has_key(self, key: &str) -> bool {
        self.keys().contains(&key)
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKind::PowerSpeedFocus => write!(f, "PowerSpeedFocus"),
            PropertyKind::PowerSpeedFocusFrequency => write!(f, "PowerSpeedFocusFrequency"),
        }
    }
}

/// Laser settings attached to vector commands and raster parts
///
/// Power and speed are percentages in [0, 100]. Values are stored as given;
/// nothing is clamped. `Clone` yields an independent copy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LaserProperty {
    /// Field set exposed by this property
    #[serde(default)]
    pub kind: PropertyKind,
    /// Laser power in percent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<f64>,
    /// Feed speed in percent of the device maximum
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    /// Focus offset in mm
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<f64>,
    /// Pulse frequency in Hz
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f64>,
}

impl LaserProperty {
    /// Create an empty property of the given kind
    pub fn new(kind: PropertyKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    /// Create a power/speed property
    pub fn power_speed(power: f64, speed: f64) -> Self {
        Self::default().with_power(power).with_speed(speed)
    }

    /// Set the power field
    pub fn with_power(mut self, power: f64) -> Self {
        self.power = Some(power);
        self
    }

    /// Set the speed field
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    /// Set the focus field
    pub fn with_focus(mut self, focus: f64) -> Self {
        self.focus = Some(focus);
        self
    }

    /// Set the frequency field, upgrading the kind if needed
    pub fn with_frequency(mut self, frequency: f64) -> Self {
        self.kind = PropertyKind::PowerSpeedFocusFrequency;
        self.frequency = Some(frequency);
        self
    }

    /// Keys exposed by this property
    pub fn keys(&self) -> &'static [&'static str] {
        self.kind.keys()
    }

    /// Look up a field by key
    pub fn get(&self, key: &str) -> Result<Option<f64>, ConfigurationError> {
        if !self.kind.has_key(key) {
            return Err(ConfigurationError::UnknownSetting(key.to_string()));
        }
        Ok(match key {
            POWER => self.power,
            SPEED => self.speed,
            FOCUS => self.focus,
            _ => self.frequency,
        })
    }

    /// Set a field by key
    pub fn set(&mut self, key: &str, value: f64) -> Result<(), ConfigurationError> {
        if !self.kind.has_key(key) {
            return Err(ConfigurationError::UnknownSetting(key.to_string()));
        }
        if !value.is_finite() {
            return Err(ConfigurationError::InvalidSetting {
                key: key.to_string(),
                reason: format!("{value} is not a number"),
            });
        }
        let slot = match key {
            POWER => &mut self.power,
            SPEED => &mut self.speed,
            FOCUS => &mut self.focus,
            _ => &mut self.frequency,
        };
        *slot = Some(value);
        Ok(())
    }
}

impl fmt::Display for LaserProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.kind)?;
        let mut first = true;
        for key in self.keys() {
            if let Ok(Some(value)) = self.get(key) {
                if !first {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
                first = false;
            }
        }
        write!(f, ")")
    }
}
