//! In-memory transports for tests
//!
//! A [`MockTransport`] replays scripted device responses, records every line
//! written to it and counts `close` calls. Clones share state, so a test can
//! keep a handle while a session owns the boxed transport.

use super::{Endpoint, LinkOptions, Transport, TransportFactory};
use laserlink_core::{ConnectionError, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

/// One scripted reaction to a read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockResponse {
    /// A line of text
    Line(String),
    /// The read times out
    Timeout,
    /// The device hangs up
    Eof,
    /// The read fails with an I/O error
    Error,
}

#[derive(Debug, Default)]
struct MockState {
    responses: VecDeque<MockResponse>,
    auto_ok: bool,
    written: Vec<u8>,
    writes: usize,
    fail_write_after: Option<usize>,
    closes: usize,
}

/// Scripted in-memory transport
#[derive(Debug, Clone)]
pub struct MockTransport {
    name: String,
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a silent device
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Create a device that greets with `identification` and acks every line
    pub fn responsive(name: impl Into<String>, identification: &str) -> Self {
        let mock = Self::new(name).with_auto_ok();
        mock.push_line(identification);
        mock
    }

    /// Answer `ok` to every read once the script is exhausted
    pub fn with_auto_ok(self) -> Self {
        self.state.lock().auto_ok = true;
        self
    }

    /// Queue a response line
    pub fn push_line(&self, line: &str) {
        self.push(MockResponse::Line(line.to_string()));
    }

    /// Queue a scripted response
    pub fn push(&self, response: MockResponse) {
        self.state.lock().responses.push_back(response);
    }

    /// Fail every write after the first `writes` succeeded
    pub fn fail_writes_after(&self, writes: usize) {
        self.state.lock().fail_write_after = Some(writes);
    }

    /// Everything written so far, as text
    pub fn written(&self) -> String {
        String::from_utf8_lossy(&self.state.lock().written).into_owned()
    }

    /// Written text split into lines, terminators removed
    pub fn written_lines(&self) -> Vec<String> {
        self.written()
            .split_terminator('\n')
            .map(|l| l.trim_end_matches('\r').to_string())
            .collect()
    }

    /// How often `close` was called
    pub fn close_count(&self) -> usize {
        self.state.lock().closes
    }
}

impl Transport for MockTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut state = self.state.lock();
        match state.responses.pop_front() {
            Some(MockResponse::Line(line)) => Ok(Some(line)),
            Some(MockResponse::Timeout) => {
                Err(io::Error::new(io::ErrorKind::TimedOut, "read timed out"))
            }
            Some(MockResponse::Eof) => Ok(None),
            Some(MockResponse::Error) => Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset",
            )),
            None if state.auto_ok => Ok(Some("ok".to_string())),
            None => Ok(None),
        }
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        let mut state = self.state.lock();
        if state.fail_write_after.is_some_and(|limit| state.writes >= limit) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"));
        }
        state.writes += 1;
        state.written.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.state.lock().closes += 1;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct FactoryState {
    serial: Vec<(String, Option<MockTransport>)>,
    network: Option<MockTransport>,
    opened: Vec<String>,
}

/// Factory serving [`MockTransport`]s
///
/// Serial ports are listed in registration order. A port registered without
/// a device fails to open as if it were busy.
#[derive(Debug, Clone, Default)]
pub struct MockTransportFactory {
    state: Arc<Mutex<FactoryState>>,
}

impl MockTransportFactory {
    /// Create a factory with no ports
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a serial port backed by `device`
    pub fn with_serial(self, device: MockTransport) -> Self {
        let name = device.name.clone();
        self.state.lock().serial.push((name, Some(device)));
        self
    }

    /// Register a serial port that is in use by another program
    pub fn with_busy_serial(self, name: impl Into<String>) -> Self {
        self.state.lock().serial.push((name.into(), None));
        self
    }

    /// Serve `device` for every network endpoint
    pub fn with_network(self, device: MockTransport) -> Self {
        self.state.lock().network = Some(device);
        self
    }

    /// Endpoints opened so far, in order
    pub fn opened(&self) -> Vec<String> {
        self.state.lock().opened.clone()
    }
}

impl TransportFactory for MockTransportFactory {
    fn serial_candidates(&self) -> Result<Vec<String>> {
        Ok(self
            .state
            .lock()
            .serial
            .iter()
            .map(|(name, _)| name.clone())
            .collect())
    }

    fn open(&self, endpoint: &Endpoint, _options: &LinkOptions) -> Result<Box<dyn Transport>> {
        let mut state = self.state.lock();
        state.opened.push(endpoint.to_string());
        match endpoint {
            Endpoint::Network { host, port } => match &state.network {
                Some(device) => Ok(Box::new(device.clone())),
                None => Err(ConnectionError::Network {
                    host: host.clone(),
                    port: *port,
                    reason: "connection refused".to_string(),
                }
                .into()),
            },
            Endpoint::Serial { port } => {
                match state.serial.iter().find(|(name, _)| name == port) {
                    Some((_, Some(device))) => Ok(Box::new(device.clone())),
                    Some((_, None)) => Err(ConnectionError::PortInUse { port: port.clone() }.into()),
                    None => Err(ConnectionError::FailedToOpen {
                        port: port.clone(),
                        reason: "no such port".to_string(),
                    }
                    .into()),
                }
            }
        }
    }
}
