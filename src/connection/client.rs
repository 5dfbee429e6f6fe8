use std::net::TcpStream;

use log::{debug, trace, warn};

use crate::config::Config;
use crate::connection::ConnectionState;
use crate::error::{Error, Result};
use crate::protocol::entropy::{Entropy, SystemEntropy};
use crate::protocol::handshake::{HandshakeRequest, HandshakeResponse, negotiate};
use crate::protocol::{Frame, FrameDecoder, FrameEncoder, OpCode};
use crate::transport::{BufferedTransport, Transport, connect_tcp, send_all};

/// A blocking WebSocket client that owns its transport.
///
/// A `Client` only exists once the upgrade handshake has succeeded. Every
/// operation blocks until it completes, and `&mut self` keeps at most one
/// operation in flight. Any transport or protocol failure during `send` or
/// `receive` closes the client; there is no recovery path.
///
/// ## Example
///
/// ```rust,no_run
/// use wsframe::{Client, OpCode};
///
/// let mut client = Client::connect("localhost", 5000, "/")?;
/// client.send_text("Hello!")?;
/// client.receive_with(|opcode, payload| {
///     if opcode == OpCode::Text {
///         println!("Server responded with: {}", String::from_utf8_lossy(&payload));
///     }
/// })?;
/// client.close()?;
/// # Ok::<(), wsframe::Error>(())
/// ```
#[derive(Debug)]
pub struct Client<T: Transport, E: Entropy = SystemEntropy> {
    io: BufferedTransport<T>,
    encoder: FrameEncoder<E>,
    decoder: FrameDecoder,
    state: ConnectionState,
    response: HandshakeResponse,
    config: Config,
}

impl Client<TcpStream> {
    /// Connect over TCP and perform the handshake with default settings.
    ///
    /// # Errors
    ///
    /// Transport errors from connecting, or any handshake error.
    pub fn connect(host: &str, port: u16, path: &str) -> Result<Self> {
        Self::connect_with_config(host, port, path, Config::default())
    }

    /// Connect over TCP and perform the handshake.
    ///
    /// Socket timeouts from `config.timeouts` are applied before the handshake.
    ///
    /// # Errors
    ///
    /// Transport errors from connecting, or any handshake error.
    pub fn connect_with_config(host: &str, port: u16, path: &str, config: Config) -> Result<Self> {
        let stream = connect_tcp(host, port, config.timeouts.as_ref())?;
        Self::handshake(stream, host, port, path, config)
    }
}

impl<T: Transport> Client<T> {
    /// Perform the handshake over an already-connected transport.
    ///
    /// # Errors
    ///
    /// Any handshake error. The transport is closed before returning.
    pub fn handshake(io: T, host: &str, port: u16, path: &str, config: Config) -> Result<Self> {
        Self::handshake_with_entropy(io, host, port, path, config, SystemEntropy)
    }
}

impl<T: Transport, E: Entropy> Client<T, E> {
    /// Perform the handshake, drawing the nonce and every mask key from
    /// `entropy`.
    ///
    /// # Errors
    ///
    /// Any handshake error. The transport is closed before returning.
    pub fn handshake_with_entropy(
        mut io: T,
        host: &str,
        port: u16,
        path: &str,
        config: Config,
        mut entropy: E,
    ) -> Result<Self> {
        let negotiated = HandshakeRequest::from_config(host, port, path, &config, &mut entropy)
            .and_then(|request| negotiate(&mut io, &request, &config));

        let (response, leftover) = match negotiated {
            Ok(negotiated) => negotiated,
            Err(err) => {
                warn!("handshake with {}:{} failed: {}", host, port, err);
                if let Err(close_err) = io.close() {
                    debug!("closing transport after failed handshake: {}", close_err);
                }
                return Err(err);
            }
        };

        debug!("connection to {}:{}{} open", host, port, path);

        let decoder = FrameDecoder::new(config.limits.clone())
            .with_control_payloads(config.preserve_control_payloads);

        Ok(Self {
            io: BufferedTransport::new(io, leftover),
            encoder: FrameEncoder::new(entropy),
            decoder,
            state: ConnectionState::Open,
            response,
            config,
        })
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }

    /// The server's upgrade response.
    #[must_use]
    pub fn handshake_response(&self) -> &HandshakeResponse {
        &self.response
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The underlying transport.
    #[must_use]
    pub fn get_ref(&self) -> &T {
        self.io.get_ref()
    }

    /// Send one frame.
    ///
    /// # Errors
    ///
    /// - `Error::NotOpen` if the client is closed
    /// - `Error::FragmentedFrame` / `Error::ControlFrameTooLarge` for a frame
    ///   that cannot be encoded; nothing is written and the client stays open
    /// - `Error::Entropy` and transport errors, which close the client
    pub fn send(&mut self, opcode: OpCode, payload: &[u8]) -> Result<()> {
        self.ensure_open()?;
        let wire = match self.encoder.encode(opcode, payload) {
            Ok(wire) => wire,
            Err(err @ Error::Entropy(_)) => return Err(self.fail(err)),
            Err(err) => return Err(err),
        };

        match send_all(&mut self.io, &wire) {
            Ok(()) => {
                trace!("sent {} frame, {} payload bytes", opcode, payload.len());
                Ok(())
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Send a text frame.
    ///
    /// # Errors
    ///
    /// See [`Client::send`].
    pub fn send_text(&mut self, text: &str) -> Result<()> {
        self.send(OpCode::Text, text.as_bytes())
    }

    /// Send a binary frame.
    ///
    /// # Errors
    ///
    /// See [`Client::send`].
    pub fn send_binary(&mut self, data: &[u8]) -> Result<()> {
        self.send(OpCode::Binary, data)
    }

    /// Block until one complete frame arrives.
    ///
    /// Close, Ping and Pong are returned like any other frame (with an empty
    /// payload unless control payloads are preserved); replying is up to the
    /// caller.
    ///
    /// # Errors
    ///
    /// - `Error::NotOpen` if the client is closed
    /// - protocol and transport errors, which close the client
    pub fn receive(&mut self) -> Result<Frame> {
        self.ensure_open()?;
        match self.decoder.decode(&mut self.io) {
            Ok(frame) => Ok(frame),
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Receive one frame and hand its opcode and payload to `callback`.
    ///
    /// # Errors
    ///
    /// See [`Client::receive`]. The callback is not invoked on error.
    pub fn receive_with<F, R>(&mut self, callback: F) -> Result<R>
    where
        F: FnOnce(OpCode, Vec<u8>) -> R,
    {
        let (opcode, payload) = self.receive()?.into_parts();
        Ok(callback(opcode, payload))
    }

    /// Close the transport. Closing a closed client does nothing.
    ///
    /// No Close frame is sent; send one first with
    /// `send(OpCode::Close, ..)` for a graceful shutdown.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the transport fails to close. The client is
    /// considered closed either way.
    pub fn close(&mut self) -> Result<()> {
        if self.state.is_closed() {
            return Ok(());
        }
        self.transition(ConnectionState::Closed);
        debug!("closing connection");
        self.io.close()?;
        Ok(())
    }

    fn transition(&mut self, next: ConnectionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        self.state = next;
    }

    fn ensure_open(&self) -> Result<()> {
        if !self.state.is_open() {
            return Err(Error::NotOpen(self.state));
        }
        Ok(())
    }

    /// Tear the connection down after an unrecoverable error.
    #[cold]
    fn fail(&mut self, err: Error) -> Error {
        warn!("closing connection after error: {}", err);
        self.transition(ConnectionState::Closed);
        if let Err(close_err) = self.io.close() {
            debug!("closing transport: {}", close_err);
        }
        err
    }
}

impl<T: Transport, E: Entropy> Drop for Client<T, E> {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            debug!("closing transport on drop: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::protocol::FixedEntropy;
    use crate::protocol::handshake::compute_accept_key;
    use crate::transport::mock::ScriptedTransport;

    const KEY: &str = "dGhlIHNhbXBsZSBub25jZQ==";

    fn response_with(frames: &[u8]) -> Vec<u8> {
        let mut input = format!(
            "HTTP/1.1 101 Switching Protocols\r\n\
             Upgrade: websocket\r\n\
             Connection: Upgrade\r\n\
             Sec-WebSocket-Accept: {}\r\n\r\n",
            compute_accept_key(KEY)
        )
        .into_bytes();
        input.extend_from_slice(frames);
        input
    }

    fn client(input: Vec<u8>) -> Client<ScriptedTransport, FixedEntropy> {
        Client::handshake_with_entropy(
            ScriptedTransport::new(input),
            "localhost",
            5000,
            "/",
            Config::new().with_handshake_key(KEY),
            FixedEntropy::new([0x37, 0xfa, 0x21, 0x3d]),
        )
        .unwrap()
    }

    #[test]
    fn test_handshake_opens_connection() {
        let client = client(response_with(&[]));
        assert_eq!(client.state(), ConnectionState::Open);
        assert!(client.is_open());
        assert_eq!(
            client.handshake_response().status_line,
            "HTTP/1.1 101 Switching Protocols"
        );
    }

    #[test]
    fn test_handshake_failure_closes_transport() {
        let mut io = ScriptedTransport::new(b"HTTP/1.1 200 OK\r\n\r\n".to_vec());
        let result = Client::handshake_with_entropy(
            &mut io,
            "localhost",
            5000,
            "/",
            Config::default(),
            FixedEntropy::default(),
        );
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Handshake);
        assert!(io.closed);
    }

    #[test]
    fn test_send_text_writes_masked_frame() {
        let mut client = client(response_with(&[]));
        let request_len = client.get_ref().written.len();

        client.send_text("Hello").unwrap();
        assert_eq!(
            &client.get_ref().written[request_len..],
            &[0x81, 0x85, 0x37, 0xfa, 0x21, 0x3d, 0x7f, 0x9f, 0x4d, 0x51, 0x58]
        );
    }

    #[test]
    fn test_receive_frame_buffered_with_handshake() {
        let mut client = client(response_with(&[0x81, 0x02, b'h', b'i']));
        let frame = client.receive().unwrap();
        assert_eq!(frame.opcode, OpCode::Text);
        assert_eq!(frame.payload(), b"hi");
    }

    #[test]
    fn test_receive_with_callback() {
        let mut client = client(response_with(&[0x82, 0x03, 1, 2, 3]));
        let seen = client
            .receive_with(|opcode, payload| (opcode, payload))
            .unwrap();
        assert_eq!(seen, (OpCode::Binary, vec![1, 2, 3]));
    }

    #[test]
    fn test_protocol_error_closes_client() {
        let mut client = client(response_with(&[0x01, 0x01, b'x']));
        assert_eq!(client.receive(), Err(Error::FragmentedFrame));
        assert_eq!(client.state(), ConnectionState::Closed);
        assert!(client.get_ref().closed);
        assert_eq!(
            client.receive(),
            Err(Error::NotOpen(ConnectionState::Closed))
        );
    }

    #[test]
    fn test_encode_error_keeps_client_open() {
        let mut client = client(response_with(&[]));
        assert_eq!(
            client.send(OpCode::Ping, &[0u8; 200]),
            Err(Error::ControlFrameTooLarge(200))
        );
        assert!(client.is_open());
    }

    #[derive(Debug)]
    struct DeadEntropy;

    impl Entropy for DeadEntropy {
        fn fill(&mut self, _dest: &mut [u8]) -> Result<()> {
            Err(Error::Entropy("no randomness available".into()))
        }
    }

    #[test]
    fn test_entropy_failure_closes_client() {
        let mut client = Client::handshake_with_entropy(
            ScriptedTransport::new(response_with(&[])),
            "localhost",
            5000,
            "/",
            Config::new().with_handshake_key(KEY),
            DeadEntropy,
        )
        .unwrap();
        let request_len = client.get_ref().written.len();

        let err = client.send_text("Hello").unwrap_err();
        assert!(matches!(err, Error::Entropy(_)));
        assert_eq!(client.state(), ConnectionState::Closed);
        assert!(client.get_ref().closed);
        assert_eq!(client.get_ref().written.len(), request_len);
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut client = client(response_with(&[]));
        client.close().unwrap();
        client.close().unwrap();
        assert_eq!(client.state(), ConnectionState::Closed);
        assert_eq!(
            client.send_text("late"),
            Err(Error::NotOpen(ConnectionState::Closed))
        );
    }
}
