//! Transport over any `Read + Write` stream

use super::Transport;
use std::io::{self, BufRead, BufReader, Read, Write};

/// Line-buffered transport over a byte stream
///
/// Writes go straight to the stream; reads are buffered. Closing drops the
/// stream, which releases the port or socket.
#[derive(Debug)]
pub struct StreamTransport<S: Read + Write + Send> {
    name: String,
    stream: Option<BufReader<S>>,
}

impl<S: Read + Write + Send> StreamTransport<S> {
    /// Wrap an open stream
    pub fn new(name: impl Into<String>, stream: S) -> Self {
        Self {
            name: name.into(),
            stream: Some(BufReader::new(stream)),
        }
    }

    fn stream(&mut self) -> io::Result<&mut BufReader<S>> {
        self.stream.as_mut().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotConnected,
                format!("{} is closed", self.name),
            )
        })
    }
}

impl<S: Read + Write + Send> Transport for StreamTransport<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut buf = Vec::new();
        let read = self.stream()?.read_until(b'\n', &mut buf)?;
        if read == 0 {
            return Ok(None);
        }
        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.stream()?.get_mut().write_all(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream()?.get_mut().flush()
    }

    fn close(&mut self) -> io::Result<()> {
        if let Some(mut stream) = self.stream.take() {
            stream.get_mut().flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_strips_terminators() {
        let mut t = StreamTransport::new("cursor", Cursor::new(b"Grbl 1.1\r\nok\nlast".to_vec()));
        assert_eq!(t.read_line().unwrap().as_deref(), Some("Grbl 1.1"));
        assert_eq!(t.read_line().unwrap().as_deref(), Some("ok"));
        assert_eq!(t.read_line().unwrap().as_deref(), Some("last"));
        assert_eq!(t.read_line().unwrap(), None);
    }

    #[test]
    fn test_closed_stream_rejects_io() {
        let mut t = StreamTransport::new("cursor", Cursor::new(Vec::new()));
        t.close().unwrap();
        assert_eq!(
            t.write_all(b"G0\n").unwrap_err().kind(),
            io::ErrorKind::NotConnected
        );
        // closing twice is harmless
        t.close().unwrap();
    }
}
