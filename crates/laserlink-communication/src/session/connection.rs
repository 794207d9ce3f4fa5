use crate::communication::Transport;
use laserlink_core::{Error, Result};

/// Exclusively owned, open transport
///
/// `close` releases the transport once; later calls are no-ops. A connection
/// dropped while still open is closed on drop.
pub struct Connection {
    name: String,
    transport: Option<Box<dyn Transport>>,
}

impl Connection {
    /// Take ownership of an open transport
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            name: transport.name().to_string(),
            transport: Some(transport),
        }
    }

    /// Port or endpoint name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the transport is still open
    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    /// The open transport
    pub fn transport(&mut self) -> Result<&mut dyn Transport> {
        match self.transport.as_mut() {
            Some(transport) => Ok(transport.as_mut()),
            None => Err(Error::other(format!("Connection to {} is closed", self.name))),
        }
    }

    /// Close the transport
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut transport) = self.transport.take() {
            tracing::debug!("Closing {}", self.name);
            transport.close()?;
        }
        Ok(())
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("Failed to close {}: {}", self.name, e);
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("name", &self.name)
            .field("open", &self.is_open())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::communication::MockTransport;

    #[test]
    fn test_close_once() {
        let mock = MockTransport::new("COM7");
        let mut connection = Connection::new(Box::new(mock.clone()));
        assert_eq!(connection.name(), "COM7");
        connection.close().unwrap();
        connection.close().unwrap();
        assert!(connection.transport().is_err());
        drop(connection);
        assert_eq!(mock.close_count(), 1);
    }

    #[test]
    fn test_drop_closes() {
        let mock = MockTransport::new("COM7");
        {
            let _connection = Connection::new(Box::new(mock.clone()));
        }
        assert_eq!(mock.close_count(), 1);
    }
}
