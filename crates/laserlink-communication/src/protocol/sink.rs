//! Line sinks
//!
//! The job pipeline writes finished protocol lines to a [`LineSink`]. A live
//! device is driven through [`TransportSink`], which can block on an `ok`
//! after every line; files are written through [`WriterSink`]. Both append the
//! same terminator, so saved output is byte-identical to what a device
//! receives.

use crate::communication::{is_timeout, Transport};
use crate::dialect::LineEnding;
use laserlink_core::{ProtocolError, Result};
use std::io::Write;
use std::time::Duration;

/// Acknowledgment token, compared case-sensitively
pub const ACK: &str = "ok";

/// Destination of protocol lines
pub trait LineSink {
    /// Deliver one line (without terminator)
    fn send_line(&mut self, line: &str) -> Result<()>;
}

/// Sends lines to a live device
pub struct TransportSink<'a> {
    transport: &'a mut dyn Transport,
    line_ending: LineEnding,
    wait_for_ok: bool,
    read_timeout: Option<Duration>,
    sent: usize,
}

impl<'a> TransportSink<'a> {
    /// Create a sink writing to `transport`
    pub fn new(
        transport: &'a mut dyn Transport,
        line_ending: LineEnding,
        wait_for_ok: bool,
        read_timeout: Option<Duration>,
    ) -> Self {
        Self {
            transport,
            line_ending,
            wait_for_ok,
            read_timeout,
            sent: 0,
        }
    }

    /// Number of lines written so far
    pub fn sent(&self) -> usize {
        self.sent
    }

    fn await_ack(&mut self, line: &str) -> Result<()> {
        match self.transport.read_line() {
            Ok(Some(response)) if response == ACK => {
                tracing::trace!("< {}", response);
                Ok(())
            }
            Ok(Some(response)) => Err(ProtocolError::UnexpectedResponse {
                line: line.to_string(),
                response,
            }
            .into()),
            Ok(None) => Err(ProtocolError::ConnectionClosed {
                line: line.to_string(),
            }
            .into()),
            Err(e) if is_timeout(&e) => Err(ProtocolError::Timeout {
                line: line.to_string(),
                timeout_ms: self
                    .read_timeout
                    .map_or(0, |t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX)),
            }
            .into()),
            Err(e) => Err(e.into()),
        }
    }
}

impl LineSink for TransportSink<'_> {
    fn send_line(&mut self, line: &str) -> Result<()> {
        tracing::trace!("> {}", line);
        self.transport.write_all(line.as_bytes())?;
        self.transport
            .write_all(self.line_ending.as_str().as_bytes())?;
        self.transport.flush()?;
        self.sent += 1;
        if self.wait_for_ok {
            self.await_ack(line)?;
        }
        Ok(())
    }
}

/// Writes lines to any [`Write`] (files, buffers)
pub struct WriterSink<W: Write> {
    writer: W,
    line_ending: LineEnding,
}

impl<W: Write> WriterSink<W> {
    /// Create a sink writing to `writer`
    pub fn new(writer: W, line_ending: LineEnding) -> Self {
        Self {
            writer,
            line_ending,
        }
    }

    /// Flush and return the writer
    pub fn into_inner(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> LineSink for WriterSink<W> {
    fn send_line(&mut self, line: &str) -> Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(self.line_ending.as_str().as_bytes())?;
        Ok(())
    }
}

impl LineSink for Vec<String> {
    fn send_line(&mut self, line: &str) -> Result<()> {
        self.push(line.to_string());
        Ok(())
    }
}
