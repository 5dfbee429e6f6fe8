//! The byte stream the client runs over.
//!
//! Anything that is `Read + Write` and can be closed can carry a WebSocket
//! connection. The helpers here turn the stream's partial reads and writes
//! into the "exactly N bytes" operations the protocol needs.

use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream};

use bytes::{Buf, BytesMut};
use log::debug;

use crate::config::Timeouts;
use crate::error::{Error, Result};

/// A connected, ordered, reliable byte stream with blocking I/O.
pub trait Transport: Read + Write {
    /// Release the underlying resource. Called at most once per client.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for TcpStream {
    fn close(&mut self) -> io::Result<()> {
        match self.shutdown(Shutdown::Both) {
            // peer already gone
            Err(err) if err.kind() == ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// Open a TCP connection to `host:port` and apply socket options.
///
/// # Errors
///
/// Returns `Error::Io` if resolution, connection or socket setup fails.
pub fn connect_tcp(host: &str, port: u16, timeouts: Option<&Timeouts>) -> Result<TcpStream> {
    let stream = TcpStream::connect((host, port))?;
    stream.set_nodelay(true)?;
    if let Some(timeouts) = timeouts {
        stream.set_read_timeout(Some(timeouts.read))?;
        stream.set_write_timeout(Some(timeouts.write))?;
    }
    debug!("connected to {}:{} from {:?}", host, port, stream.local_addr().ok());
    Ok(stream)
}

/// Write all of `buf`, looping over partial writes, then flush.
///
/// # Errors
///
/// Returns `Error::Io` if the transport fails or stops accepting bytes.
pub fn send_all<T: Write + ?Sized>(io: &mut T, buf: &[u8]) -> Result<()> {
    let mut sent = 0;
    while sent < buf.len() {
        match io.write(&buf[sent..]) {
            Ok(0) => {
                return Err(Error::Io(format!(
                    "transport accepted 0 of {} remaining bytes",
                    buf.len() - sent
                )));
            }
            Ok(n) => sent += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => {}
            Err(err) => return Err(err.into()),
        }
    }
    io.flush()?;
    Ok(())
}

/// Fill `buf` completely, looping over partial reads.
///
/// `stage` names what was being read and ends up in `Error::PeerClosed` when
/// the peer hangs up first.
///
/// # Errors
///
/// - `Error::PeerClosed` on a zero-length read before `buf` is full
/// - `Error::Io` if the transport fails
pub fn read_exact<T: Read + ?Sized>(io: &mut T, buf: &mut [u8], stage: &'static str) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        match io.read(&mut buf[filled..]) {
            Ok(0) => return Err(Error::PeerClosed(stage)),
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => {}
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

/// A transport that replays already-received bytes before reading more.
///
/// The handshake reads in chunks and may pull in the start of the first
/// frame along with the response head; those bytes are parked here.
#[derive(Debug)]
pub struct BufferedTransport<T> {
    io: T,
    pending: BytesMut,
}

impl<T> BufferedTransport<T> {
    /// Wrap `io`, serving `pending` first.
    pub fn new(io: T, pending: BytesMut) -> Self {
        Self { io, pending }
    }

    /// Bytes not yet handed to a reader.
    #[must_use]
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    pub fn get_ref(&self) -> &T {
        &self.io
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.io
    }

    /// Unwrap the transport, dropping anything still pending.
    pub fn into_inner(self) -> T {
        self.io
    }
}

impl<T: Read> Read for BufferedTransport<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            return self.io.read(buf);
        }
        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.advance(n);
        Ok(n)
    }
}

impl<T: Write> Write for BufferedTransport<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.io.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.io.flush()
    }
}

impl<T: Transport> Transport for BufferedTransport<T> {
    fn close(&mut self) -> io::Result<()> {
        self.pending.clear();
        self.io.close()
    }
}

/// In-memory transport for unit tests.
#[cfg(test)]
pub(crate) mod mock {
    use std::io::{self, Read, Write};

    use super::Transport;

    /// Serves `input` at most `chunk` bytes per read and records writes.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedTransport {
        pub input: Vec<u8>,
        pub pos: usize,
        pub chunk: usize,
        pub written: Vec<u8>,
        pub max_write: usize,
        pub closed: bool,
        pub fail_reads: bool,
    }

    impl ScriptedTransport {
        pub fn new(input: impl Into<Vec<u8>>) -> Self {
            Self {
                input: input.into(),
                chunk: usize::MAX,
                max_write: usize::MAX,
                ..Default::default()
            }
        }

        pub fn with_chunk(mut self, chunk: usize) -> Self {
            self.chunk = chunk;
            self
        }

        pub fn with_max_write(mut self, max_write: usize) -> Self {
            self.max_write = max_write;
            self
        }
    }

    impl Read for ScriptedTransport {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.fail_reads {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer"));
            }
            let remaining = &self.input[self.pos..];
            let n = remaining.len().min(buf.len()).min(self.chunk);
            buf[..n].copy_from_slice(&remaining[..n]);
            self.pos += n;
            Ok(n)
        }
    }

    impl Write for ScriptedTransport {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let n = buf.len().min(self.max_write);
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Transport for ScriptedTransport {
        fn close(&mut self) -> io::Result<()> {
            self.closed = true;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::ScriptedTransport;
    use super::*;

    #[test]
    fn test_read_exact_assembles_single_byte_reads() {
        let mut io = ScriptedTransport::new(b"abcdef".to_vec()).with_chunk(1);
        let mut buf = [0u8; 6];
        read_exact(&mut io, &mut buf, "frame").unwrap();
        assert_eq!(&buf, b"abcdef");
    }

    #[test]
    fn test_read_exact_reports_hangup() {
        let mut io = ScriptedTransport::new(b"abc".to_vec());
        let mut buf = [0u8; 4];
        assert_eq!(
            read_exact(&mut io, &mut buf, "frame"),
            Err(Error::PeerClosed("frame"))
        );
    }

    #[test]
    fn test_read_exact_surfaces_io_error() {
        let mut io = ScriptedTransport::new(Vec::new());
        io.fail_reads = true;
        let mut buf = [0u8; 1];
        assert!(matches!(
            read_exact(&mut io, &mut buf, "frame"),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_send_all_loops_over_partial_writes() {
        let mut io = ScriptedTransport::new(Vec::new()).with_max_write(3);
        send_all(&mut io, b"hello world").unwrap();
        assert_eq!(io.written, b"hello world");
    }

    #[test]
    fn test_send_all_rejects_zero_writes() {
        let mut io = ScriptedTransport::new(Vec::new()).with_max_write(0);
        assert!(matches!(send_all(&mut io, b"x"), Err(Error::Io(_))));
    }

    #[test]
    fn test_buffered_transport_drains_pending_first() {
        let inner = ScriptedTransport::new(b"world".to_vec());
        let mut io = BufferedTransport::new(inner, BytesMut::from(&b"hello "[..]));

        let mut buf = [0u8; 4];
        read_exact(&mut io, &mut buf, "frame").unwrap();
        assert_eq!(&buf, b"hell");
        assert_eq!(io.pending(), b"o ");

        let mut rest = [0u8; 7];
        read_exact(&mut io, &mut rest, "frame").unwrap();
        assert_eq!(&rest, b"o world");
        assert!(io.pending().is_empty());

        io.close().unwrap();
        assert!(io.get_ref().closed);
    }
}
