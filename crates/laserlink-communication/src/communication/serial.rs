//! Serial port transport
//!
//! Provides port enumeration for auto-probing and opens serial devices as
//! line-oriented transports.

use super::{LinkOptions, StreamTransport};
use laserlink_core::{ConnectionError, Result};
use std::time::Duration;

/// Read timeout used when none is configured
const BLOCKING_READ_TIMEOUT: Duration = Duration::from_secs(60 * 60 * 24);

/// Information about an available serial port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialPortInfo {
    /// Port name (e.g., "/dev/ttyUSB0", "COM3")
    pub port_name: String,

    /// Port description (e.g., "USB Serial Port")
    pub description: String,

    /// Manufacturer name if available
    pub manufacturer: Option<String>,

    /// USB vendor ID if applicable
    pub vid: Option<u16>,

    /// USB product ID if applicable
    pub pid: Option<u16>,
}

impl SerialPortInfo {
    /// Create a new port info
    pub fn new(port_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            description: description.into(),
            manufacturer: None,
            vid: None,
            pid: None,
        }
    }

    /// Set manufacturer
    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    /// Set USB IDs
    pub fn with_usb_ids(mut self, vid: u16, pid: u16) -> Self {
        self.vid = Some(vid);
        self.pid = Some(pid);
        self
    }
}

/// List every serial port, in enumeration order
///
/// Nothing is filtered out: auto-connect tries each port in turn. Use
/// [`is_candidate_port`] to tell likely controller ports apart.
pub fn list_ports() -> Result<Vec<SerialPortInfo>> {
    match serialport::available_ports() {
        Ok(ports) => Ok(port_infos(&ports)),
        Err(e) => {
            tracing::error!("Failed to enumerate serial ports: {}", e);
            Err(ConnectionError::Enumeration(e.to_string()).into())
        }
    }
}

fn port_infos(ports: &[serialport::SerialPortInfo]) -> Vec<SerialPortInfo> {
    ports
        .iter()
        .map(|port| {
            let info = SerialPortInfo::new(&port.port_name, port_description(port));
            match &port.port_type {
                serialport::SerialPortType::UsbPort(usb) => {
                    let info = info.with_usb_ids(usb.vid, usb.pid);
                    match &usb.manufacturer {
                        Some(mfg) => info.with_manufacturer(mfg),
                        None => info,
                    }
                }
                _ => info,
            }
        })
        .collect()
}

/// Check if a port name looks like a USB/ACM/COM controller port
///
/// Only used to highlight ports in listings; auto-connect does not filter.
///
/// Valid patterns:
/// - Windows: COM* (COM1, COM2, etc.)
/// - Linux: /dev/ttyUSB*, /dev/ttyACM*
/// - macOS: /dev/cu.usbserial-*, /dev/cu.usbmodem*
pub fn is_candidate_port(port_name: &str) -> bool {
    if let Some(number) = port_name.strip_prefix("COM") {
        return !number.is_empty() && number.chars().all(|c| c.is_ascii_digit());
    }

    if port_name.starts_with("/dev/ttyUSB") || port_name.starts_with("/dev/ttyACM") {
        return true;
    }

    port_name.starts_with("/dev/cu.usbserial-") || port_name.starts_with("/dev/cu.usbmodem")
}

fn port_description(port: &serialport::SerialPortInfo) -> String {
    match &port.port_type {
        serialport::SerialPortType::UsbPort(usb) => format!(
            "USB {} {}",
            usb.manufacturer.as_deref().unwrap_or("Device"),
            usb.product.as_deref().unwrap_or("Serial Port")
        ),
        serialport::SerialPortType::BluetoothPort => "Bluetooth Serial".to_string(),
        serialport::SerialPortType::PciPort => "PCI Serial".to_string(),
        _ => "Serial Port".to_string(),
    }
}

/// Open `port` as a transport
pub fn open(
    port: &str,
    options: &LinkOptions,
) -> Result<StreamTransport<Box<dyn serialport::SerialPort>>> {
    tracing::debug!("Opening serial port {} at {} baud", port, options.baud_rate);
    let builder = serialport::new(port, options.baud_rate)
        .data_bits(serialport::DataBits::Eight)
        .stop_bits(serialport::StopBits::One)
        .parity(serialport::Parity::None)
        .flow_control(serialport::FlowControl::None)
        .timeout(options.read_timeout.unwrap_or(BLOCKING_READ_TIMEOUT));

    match builder.open() {
        Ok(handle) => Ok(StreamTransport::new(port, handle)),
        Err(e) => {
            tracing::warn!("Failed to open serial port {}: {}", port, e);
            Err(open_error(port, &e).into())
        }
    }
}

fn open_error(port: &str, e: &serialport::Error) -> ConnectionError {
    match e.kind() {
        serialport::ErrorKind::Io(std::io::ErrorKind::ResourceBusy) => ConnectionError::PortInUse {
            port: port.to_string(),
        },
        _ => ConnectionError::FailedToOpen {
            port: port.to_string(),
            reason: e.to_string(),
        },
    }
}
