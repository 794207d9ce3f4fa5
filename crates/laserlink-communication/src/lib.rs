//! # laserlink communication
//!
//! Gets jobs onto devices. This crate holds:
//!
//! - **Transports**: serial ports, TCP sockets and scripted mocks behind one
//!   line-oriented [`Transport`] trait
//! - **Dialects**: data descriptors for each controller family, including
//!   their connection handshake
//! - **Protocol**: the modal G-code encoder and line sinks with
//!   acknowledgment gating
//! - **Sessions**: the connect/identify/send/teardown state machine

pub mod communication;
pub mod dialect;
pub mod protocol;
pub mod session;

pub use communication::{
    is_candidate_port, list_ports, Endpoint, LinkOptions, MockResponse, MockTransport,
    MockTransportFactory, SerialPortInfo, StreamTransport, SystemTransportFactory, Transport,
    TransportFactory, DEFAULT_NETWORK_PORT,
};
pub use dialect::{
    Dialect, DialectKind, Handshake, Identification, LineEnding, MatchRule, ModalStyle,
    PenControl, PlotterTool,
};
pub use protocol::{
    join_lines, split_lines, GcodeEncoder, LineSink, ModalState, TransportSink, WriterSink, ACK,
};
pub use session::{
    check_job, emit_job, save_job, Connection, DeviceSession, SerialTarget, SessionConfig,
    SessionState, Target, AUTO_PORT,
};
