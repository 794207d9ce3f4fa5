//! TCP transport for network-attached controllers

use super::{LinkOptions, StreamTransport};
use laserlink_core::{ConnectionError, Result};
use std::net::{TcpStream, ToSocketAddrs};

fn network_error(host: &str, port: u16, reason: impl ToString) -> ConnectionError {
    ConnectionError::Network {
        host: host.to_string(),
        port,
        reason: reason.to_string(),
    }
}

/// Connect to `host:port` within the configured connect timeout
pub fn open(host: &str, port: u16, options: &LinkOptions) -> Result<StreamTransport<TcpStream>> {
    tracing::debug!("Connecting to {}:{}", host, port);
    let addrs = (host, port)
        .to_socket_addrs()
        .map_err(|e| network_error(host, port, e))?;

    let mut last_error = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, options.connect_timeout) {
            Ok(stream) => {
                stream
                    .set_read_timeout(options.read_timeout)
                    .map_err(|e| network_error(host, port, e))?;
                stream
                    .set_nodelay(true)
                    .map_err(|e| network_error(host, port, e))?;
                return Ok(StreamTransport::new(format!("{host}:{port}"), stream));
            }
            Err(e) => {
                tracing::debug!("Connection to {} failed: {}", addr, e);
                last_error = Some(e);
            }
        }
    }

    let reason = last_error.map_or_else(
        || "no address resolved".to_string(),
        |e| e.to_string(),
    );
    tracing::warn!("Failed to connect to {}:{}: {}", host, port, reason);
    Err(network_error(host, port, reason).into())
}
