//! Transports
//!
//! A [`Transport`] is an exclusively owned, line-oriented byte stream to a
//! device. Transports are created by a [`TransportFactory`], which also
//! enumerates serial candidates for auto-probing. The system factory opens
//! real serial ports and TCP sockets; the mock factory serves scripted
//! in-memory devices.

pub mod mock;
pub mod serial;
pub mod stream;
pub mod tcp;

pub use mock::{MockResponse, MockTransport, MockTransportFactory};
pub use serial::{is_candidate_port, list_ports, SerialPortInfo};
pub use stream::StreamTransport;

use laserlink_core::Result;
use std::fmt;
use std::io;
use std::time::Duration;

/// Default TCP port of network-attached controllers
pub const DEFAULT_NETWORK_PORT: u16 = 23;

/// Bidirectional line-oriented byte stream
pub trait Transport: Send {
    /// Port or endpoint name, for logs and error messages
    fn name(&self) -> &str;

    /// Read one line without its terminator
    ///
    /// Returns `Ok(None)` when the stream has ended. A read timeout surfaces
    /// as an error of kind `TimedOut` or `WouldBlock`.
    fn read_line(&mut self) -> io::Result<Option<String>>;

    /// Write raw bytes
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flush buffered output
    fn flush(&mut self) -> io::Result<()>;

    /// Release the underlying resource
    fn close(&mut self) -> io::Result<()>;
}

/// Where a transport connects to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// TCP socket
    Network {
        /// Host name or address
        host: String,
        /// TCP port
        port: u16,
    },
    /// Serial device
    Serial {
        /// Device name, e.g. `/dev/ttyUSB0` or `COM3`
        port: String,
    },
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Network { host, port } => write!(f, "{host}:{port}"),
            Endpoint::Serial { port } => write!(f, "{port}"),
        }
    }
}

/// Link parameters applied when opening a transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkOptions {
    /// Serial baud rate (ignored for TCP)
    pub baud_rate: u32,
    /// Maximum time to establish a TCP connection
    pub connect_timeout: Duration,
    /// Maximum time a single read may block, `None` to block forever
    pub read_timeout: Option<Duration>,
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            connect_timeout: Duration::from_millis(1000),
            read_timeout: None,
        }
    }
}

/// Opens transports and enumerates serial candidates
pub trait TransportFactory {
    /// Every serial port to try, in enumeration order
    fn serial_candidates(&self) -> Result<Vec<String>>;

    /// Open a transport to `endpoint`
    fn open(&self, endpoint: &Endpoint, options: &LinkOptions) -> Result<Box<dyn Transport>>;
}

/// Factory backed by the operating system's serial ports and sockets
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTransportFactory;

impl TransportFactory for SystemTransportFactory {
    fn serial_candidates(&self) -> Result<Vec<String>> {
        Ok(list_ports()?.into_iter().map(|p| p.port_name).collect())
    }

    fn open(&self, endpoint: &Endpoint, options: &LinkOptions) -> Result<Box<dyn Transport>> {
        match endpoint {
            Endpoint::Network { host, port } => Ok(Box::new(tcp::open(host, *port, options)?)),
            Endpoint::Serial { port } => Ok(Box::new(serial::open(port, options)?)),
        }
    }
}

/// Whether an I/O error is a read timeout
pub fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
    )
}
