//! Connection handshakes
//!
//! Runs right after a transport is opened and before any job line is sent.
//! The strategy is fixed per dialect; only the expected identification text
//! is user-configurable.

use crate::communication::{is_timeout, Transport};
use laserlink_core::{IdentificationError, Result};
use std::thread;
use std::time::Duration;

/// How an identification line is compared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    /// Whole line must equal the expected text
    Exact,
    /// Line must start with the expected text
    Prefix,
}

/// Expected identification line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identification {
    /// Expected text
    pub expected: String,
    /// Comparison rule
    pub rule: MatchRule,
}

impl Identification {
    /// Line must equal `expected`
    pub fn exact(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
            rule: MatchRule::Exact,
        }
    }

    /// Line must start with `expected`
    pub fn prefix(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
            rule: MatchRule::Prefix,
        }
    }

    /// Whether `line` identifies the device
    pub fn matches(&self, line: &str) -> bool {
        match self.rule {
            MatchRule::Exact => line == self.expected,
            MatchRule::Prefix => line.starts_with(&self.expected),
        }
    }
}

/// Handshake strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handshake {
    /// Start sending immediately
    None,
    /// First line must match the identification
    Identify(Identification),
    /// Identify, then discard lines up to and including one that starts with
    /// `sentinel`
    IdentifyThenDrain {
        /// Expected identification
        identification: Identification,
        /// Prefix of the last banner line
        sentinel: String,
    },
    /// Write a wake-up sequence and give the board time to settle
    WakeUp {
        /// Bytes written verbatim
        sequence: String,
        /// Delay after writing
        settle: Duration,
    },
}

impl Handshake {
    /// Handshake that identifies with `expected`, or none when it is empty
    pub fn identify_or_none(expected: &str) -> Self {
        if expected.is_empty() {
            Handshake::None
        } else {
            Handshake::Identify(Identification::exact(expected))
        }
    }

    /// Expected identification, if any
    pub fn identification(&self) -> Option<&Identification> {
        match self {
            Handshake::Identify(id) | Handshake::IdentifyThenDrain { identification: id, .. } => {
                Some(id)
            }
            Handshake::None | Handshake::WakeUp { .. } => None,
        }
    }

    /// Run the handshake on a freshly opened transport
    pub fn perform(&self, transport: &mut dyn Transport) -> Result<()> {
        match self {
            Handshake::None => Ok(()),
            Handshake::Identify(identification) => identify(transport, identification),
            Handshake::IdentifyThenDrain {
                identification,
                sentinel,
            } => {
                identify(transport, identification)?;
                drain_until(transport, sentinel)
            }
            Handshake::WakeUp { sequence, settle } => {
                transport.write_all(sequence.as_bytes())?;
                transport.flush()?;
                tracing::debug!("Waiting {:?} for {} to wake up", settle, transport.name());
                thread::sleep(*settle);
                Ok(())
            }
        }
    }
}

fn next_line(transport: &mut dyn Transport) -> std::result::Result<String, IdentificationError> {
    let port = transport.name().to_string();
    match transport.read_line() {
        Ok(Some(line)) => {
            tracing::trace!("< {}", line);
            Ok(line)
        }
        Ok(None) => Err(IdentificationError::NoResponse {
            port,
            reason: "connection closed".to_string(),
        }),
        Err(e) if is_timeout(&e) => Err(IdentificationError::NoResponse {
            port,
            reason: "timed out".to_string(),
        }),
        Err(e) => Err(IdentificationError::NoResponse {
            port,
            reason: e.to_string(),
        }),
    }
}

fn identify(transport: &mut dyn Transport, identification: &Identification) -> Result<()> {
    let line = next_line(transport)?;
    if identification.matches(&line) {
        tracing::debug!("Identified device on {}: {}", transport.name(), line);
        Ok(())
    } else {
        Err(IdentificationError::Mismatch {
            port: transport.name().to_string(),
            expected: identification.expected.clone(),
            received: line,
        }
        .into())
    }
}

fn drain_until(transport: &mut dyn Transport, sentinel: &str) -> Result<()> {
    let mut drained = 0usize;
    loop {
        let line = next_line(transport)?;
        drained += 1;
        if line.starts_with(sentinel) {
            tracing::debug!("Skipped {} banner lines", drained);
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::communication::{MockResponse, MockTransport};
    use crate::dialect::Dialect;
    use laserlink_core::Error;

    #[test]
    fn test_exact_identification() {
        let mut mock = MockTransport::new("COM1");
        mock.push_line("Grbl");
        assert!(Handshake::Identify(Identification::exact("Grbl"))
            .perform(&mut mock)
            .is_ok());

        mock.push_line("Grbl 1.1h");
        let err = Handshake::Identify(Identification::exact("Grbl"))
            .perform(&mut mock)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Identification(IdentificationError::Mismatch { ref received, .. }) if received == "Grbl 1.1h"
        ));
    }

    #[test]
    fn test_drain_banner() {
        let mut mock = MockTransport::new("COM1");
        for line in ["start", "echo: External Reset", "echo:Steps per unit:", "echo:SD init fail", "ok"] {
            mock.push_line(line);
        }
        Dialect::marlin().handshake.perform(&mut mock).unwrap();
        // the line after the sentinel is left for the protocol
        assert_eq!(mock.read_line().unwrap().as_deref(), Some("ok"));
    }

    #[test]
    fn test_silent_device() {
        let mut mock = MockTransport::new("COM1");
        mock.push(MockResponse::Timeout);
        let err = Handshake::identify_or_none("Grbl")
            .perform(&mut mock)
            .unwrap_err();
        assert!(err.is_identification_error());
        assert_eq!(Handshake::identify_or_none(""), Handshake::None);
    }

    #[test]
    fn test_wake_up_writes_sequence() {
        let mut mock = MockTransport::new("COM1");
        Handshake::WakeUp {
            sequence: "\r\n\r\n".to_string(),
            settle: Duration::from_millis(1),
        }
        .perform(&mut mock)
        .unwrap();
        assert_eq!(mock.written(), "\r\n\r\n");
    }
}
