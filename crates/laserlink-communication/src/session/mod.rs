//! Device sessions
//!
//! A [`DeviceSession`] sends one job to one device: it validates the job,
//! opens and identifies the transport, streams the job lines with optional
//! per-line acknowledgment and always closes the transport before returning.
//! A new send needs a new session.

pub mod config;
pub mod connection;
pub mod pipeline;
pub mod state;

pub use config::{SerialTarget, SessionConfig, Target, AUTO_PORT};
pub use connection::Connection;
pub use pipeline::{check_job, emit_job};
pub use state::SessionState;

use crate::communication::{Endpoint, SystemTransportFactory, TransportFactory};
use crate::protocol::{TransportSink, WriterSink};
use laserlink_core::{ConnectionError, Error, LaserJob, NoProgress, ProgressListener, Result};
use std::io::Write;
use uuid::Uuid;

/// One send attempt against one device
pub struct DeviceSession<F: TransportFactory = SystemTransportFactory> {
    id: Uuid,
    config: SessionConfig,
    factory: F,
    state: SessionState,
    history: Vec<SessionState>,
}

impl DeviceSession<SystemTransportFactory> {
    /// Session using the system's serial ports and sockets
    pub fn new(config: SessionConfig) -> Self {
        Self::with_factory(config, SystemTransportFactory)
    }
}

impl<F: TransportFactory> DeviceSession<F> {
    /// Session opening transports through `factory`
    pub fn with_factory(config: SessionConfig, factory: F) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            factory,
            state: SessionState::Idle,
            history: vec![SessionState::Idle],
        }
    }

    /// Session id, also recorded on the tracing span
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Every state visited so far, starting with `Idle`
    pub fn history(&self) -> &[SessionState] {
        &self.history
    }

    /// Configuration in use
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Send `job` to the device
    ///
    /// Validation happens before any transport is opened. Whatever the
    /// outcome, the transport is closed when this returns. On error the
    /// remaining job is not sent and progress stays below 100.
    pub fn send_job(&mut self, job: &LaserJob, progress: &mut dyn ProgressListener) -> Result<()> {
        if self.state != SessionState::Idle {
            return Err(Error::other(format!(
                "Session {} already used ({}); create a new session per job",
                self.id, self.state
            )));
        }
        let span = tracing::info_span!(
            "session",
            id = %self.id,
            dialect = %self.config.dialect.kind,
            job = %job.name
        );
        let _enter = span.enter();

        let mut connection = None;
        match self.run(job, progress, &mut connection) {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!("Job aborted: {}", e);
                self.transition(SessionState::Aborting);
                progress.task_changed("disconnecting");
                if let Some(mut connection) = connection.take() {
                    if let Err(close_err) = connection.close() {
                        tracing::warn!("Failed to close {}: {}", connection.name(), close_err);
                    }
                }
                self.transition(SessionState::Closed);
                Err(e)
            }
        }
    }

    fn run(
        &mut self,
        job: &LaserJob,
        progress: &mut dyn ProgressListener,
        connection: &mut Option<Connection>,
    ) -> Result<()> {
        progress.progress_changed(0);
        progress.task_changed("checking job");
        self.config.validate()?;
        let job = job.with_start_point_applied();
        check_job(&self.config, &job)?;

        progress.task_changed("connecting...");
        self.transition(SessionState::Connecting);
        self.connect(connection)?;
        let connection = connection
            .as_mut()
            .ok_or_else(|| Error::other("No connection after connect"))?;

        progress.task_changed("sending");
        self.transition(SessionState::Sending);
        let mut sink = TransportSink::new(
            connection.transport()?,
            self.config.dialect.line_ending,
            self.config.dialect.wait_for_ok,
            self.config.link.read_timeout,
        );
        let lines = emit_job(&self.config, &job, &mut sink, progress)?;
        tracing::info!("Sent {} lines to {}", lines, connection.name());

        self.transition(SessionState::ShuttingDown);
        progress.task_changed("disconnecting");
        connection.close()?;
        self.transition(SessionState::Completed);
        progress.task_changed("sent.");
        progress.progress_changed(100);
        Ok(())
    }

    /// Open and identify the device, leaving the connection in `slot`
    ///
    /// For a fixed target the handshake runs in `Identifying`. Probing
    /// identifies each candidate while still `Connecting`.
    fn connect(&mut self, slot: &mut Option<Connection>) -> Result<()> {
        match self.config.target.endpoint() {
            Some(endpoint) => {
                tracing::info!("Connecting to {}", endpoint);
                let transport = self.factory.open(&endpoint, &self.config.link)?;
                let connection = slot.insert(Connection::new(transport));
                self.transition(SessionState::Identifying);
                self.config.dialect.handshake.perform(connection.transport()?)?;
            }
            None => {
                *slot = Some(self.probe()?);
                self.transition(SessionState::Identifying);
            }
        }
        Ok(())
    }

    /// Try every serial candidate in order, stopping at the first device
    /// that identifies
    fn probe(&self) -> Result<Connection> {
        let candidates = self.factory.serial_candidates()?;
        if candidates.is_empty() {
            return Err(ConnectionError::NoSerialPorts.into());
        }
        let mut attempts = Vec::new();
        let found = candidates.iter().find_map(|port| match self.try_port(port) {
            Ok(connection) => Some(connection),
            Err(e) => {
                tracing::warn!("Probe of {} failed: {}", port, e);
                attempts.push(e.to_string());
                None
            }
        });
        found.ok_or_else(|| ConnectionError::ProbeExhausted { attempts }.into())
    }

    fn try_port(&self, port: &str) -> Result<Connection> {
        tracing::debug!("Probing {}", port);
        let endpoint = Endpoint::Serial {
            port: port.to_string(),
        };
        let mut connection = Connection::new(self.factory.open(&endpoint, &self.config.link)?);
        self.config.dialect.handshake.perform(connection.transport()?)?;
        tracing::info!("Found {} on {}", self.config.dialect.kind, port);
        Ok(connection)
    }

    fn transition(&mut self, next: SessionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid session transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!("{} -> {}", self.state, next);
        self.state = next;
        self.history.push(next);
    }
}

/// Write `job` to `writer` exactly as it would be sent to a device
///
/// No acknowledgments are awaited; the line content, order and terminators
/// are the same as for a live send. Returns the number of lines written.
pub fn save_job<W: Write>(config: &SessionConfig, job: &LaserJob, writer: W) -> Result<usize> {
    config.validate()?;
    let job = job.with_start_point_applied();
    check_job(config, &job)?;
    let mut sink = WriterSink::new(writer, config.dialect.line_ending);
    let lines = emit_job(config, &job, &mut sink, &mut NoProgress)?;
    sink.into_inner()?;
    tracing::info!("Saved {} lines for job '{}'", lines, job.name);
    Ok(lines)
}
