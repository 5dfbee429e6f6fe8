//! Client side of the HTTP Upgrade handshake (RFC 6455 §4.1).

use std::collections::HashMap;
use std::io::{Read, Write};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use bytes::BytesMut;
use log::debug;
use sha1::{Digest, Sha1};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::protocol::entropy::Entropy;
use crate::transport::send_all;

/// The WebSocket GUID used in the Sec-WebSocket-Accept calculation (RFC 6455).
pub const WS_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Marks the end of the response head.
pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Status text that makes a response successful.
pub const SWITCHING_PROTOCOLS: &str = "101 Switching Protocols";

/// Computes the Sec-WebSocket-Accept value from the client's Sec-WebSocket-Key.
///
/// The accept key is calculated as: Base64(SHA-1(key + GUID))
///
/// # Example
///
/// ```
/// use wsframe::protocol::handshake::compute_accept_key;
///
/// let key = "dGhlIHNhbXBsZSBub25jZQ==";
/// let accept = compute_accept_key(key);
/// assert_eq!(accept, "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");
/// ```
pub fn compute_accept_key(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(WS_GUID.as_bytes());
    let hash = hasher.finalize();
    BASE64.encode(hash)
}

/// Generate a fresh `Sec-WebSocket-Key`: 16 random bytes, base64 encoded.
///
/// # Errors
///
/// Returns `Error::Entropy` if the source fails.
pub fn generate_key<E: Entropy + ?Sized>(entropy: &mut E) -> Result<String> {
    let mut nonce = [0u8; 16];
    entropy.fill(&mut nonce)?;
    Ok(BASE64.encode(nonce))
}

/// Validate that a header value does not contain CR or LF characters.
///
/// # Errors
/// Returns `Error::InvalidHeaderValue` if the value contains `\r` or `\n`.
fn validate_header_value(header_name: &str, value: &str) -> Result<()> {
    if value.contains('\r') || value.contains('\n') {
        return Err(Error::InvalidHeaderValue {
            header: header_name.to_string(),
            reason: "contains CR or LF characters".to_string(),
        });
    }
    Ok(())
}

/// Parse header lines into a map keyed by lowercase name.
///
/// Later duplicates win. Lines without a colon are skipped.
fn parse_headers<'a, I>(lines: I) -> HashMap<String, String>
where
    I: Iterator<Item = &'a str>,
{
    let mut headers = HashMap::new();
    for line in lines {
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_lowercase(), value.trim().to_string());
        }
    }
    headers
}

/// Position just past the first `\r\n\r\n` in `buf`, searching from `from`.
fn find_terminator(buf: &[u8], from: usize) -> Option<usize> {
    buf.get(from..)?
        .windows(HEADER_TERMINATOR.len())
        .position(|window| window == HEADER_TERMINATOR)
        .map(|pos| from + pos + HEADER_TERMINATOR.len())
}

/// Upgrade request sent by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeRequest {
    /// Target host, sent in the Host header.
    pub host: String,
    /// Target port, sent in the Host header.
    pub port: u16,
    /// Request path (e.g. "/chat"). Empty means "/".
    pub path: String,
    /// The Sec-WebSocket-Key header value.
    pub key: String,
    /// The Origin header value (optional).
    pub origin: Option<String>,
}

impl HandshakeRequest {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        path: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            path: path.into(),
            key: key.into(),
            origin: None,
        }
    }

    /// Build a request using the key and origin from `config`, drawing a
    /// nonce from `entropy` when no fixed key is configured.
    ///
    /// # Errors
    ///
    /// Returns `Error::Entropy` if a nonce cannot be generated.
    pub fn from_config<E: Entropy + ?Sized>(
        host: &str,
        port: u16,
        path: &str,
        config: &Config,
        entropy: &mut E,
    ) -> Result<Self> {
        let key = match &config.handshake_key {
            Some(key) => key.clone(),
            None => generate_key(entropy)?,
        };
        Ok(Self {
            origin: config.origin.clone(),
            ..Self::new(host, port, path, key)
        })
    }

    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// The Sec-WebSocket-Accept value a compliant server answers with.
    #[must_use]
    pub fn expected_accept(&self) -> String {
        compute_accept_key(&self.key)
    }

    /// Write the HTTP request to a buffer.
    ///
    /// # Errors
    /// Returns `Error::InvalidHeaderValue` if any value contains CR/LF.
    pub fn write(&self, buf: &mut Vec<u8>) -> Result<()> {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        validate_header_value("Request-Target", path)?;
        validate_header_value("Host", &self.host)?;
        validate_header_value("Sec-WebSocket-Key", &self.key)?;

        buf.extend_from_slice(format!("GET {} HTTP/1.1\r\n", path).as_bytes());
        buf.extend_from_slice(format!("Host: {}:{}\r\n", self.host, self.port).as_bytes());
        buf.extend_from_slice(b"Upgrade: websocket\r\n");
        buf.extend_from_slice(b"Connection: Upgrade\r\n");

        if let Some(ref origin) = self.origin {
            validate_header_value("Origin", origin)?;
            buf.extend_from_slice(format!("Origin: {}\r\n", origin).as_bytes());
        }

        buf.extend_from_slice(b"Sec-WebSocket-Version: 13\r\n");
        buf.extend_from_slice(format!("Sec-WebSocket-Key: {}\r\n", self.key).as_bytes());
        buf.extend_from_slice(b"\r\n");
        Ok(())
    }
}

/// Upgrade response head received from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeResponse {
    /// First line of the response, e.g. "HTTP/1.1 101 Switching Protocols".
    pub status_line: String,
    /// Headers keyed by lowercase name.
    pub headers: HashMap<String, String>,
}

impl HandshakeResponse {
    /// Parse a response head (everything up to and including `\r\n\r\n`).
    ///
    /// The head is treated as raw bytes: success depends only on the
    /// `101 Switching Protocols` marker appearing somewhere in it. Bytes that
    /// are not UTF-8 are replaced in the recorded status line and headers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHandshake`] if the marker is missing.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let text = String::from_utf8_lossy(data);
        let mut lines = text.lines().skip_while(|line| line.is_empty());
        let status_line = lines.next().unwrap_or_default().to_string();

        let marker = SWITCHING_PROTOCOLS.as_bytes();
        if !data.windows(marker.len()).any(|window| window == marker) {
            return Err(Error::InvalidHandshake(format!(
                "Expected 101 status, got: {}",
                status_line
            )));
        }

        Ok(Self {
            status_line,
            headers: parse_headers(lines),
        })
    }

    /// Look up a header by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    /// The Sec-WebSocket-Accept value, if the server sent one.
    #[must_use]
    pub fn accept(&self) -> Option<&str> {
        self.header("sec-websocket-accept")
    }

    /// Check Sec-WebSocket-Accept against the request key.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidHandshake` if the header is missing
    /// - `Error::AcceptKeyMismatch` if it does not match
    pub fn verify_accept(&self, request: &HandshakeRequest) -> Result<()> {
        let actual = self.accept().ok_or_else(|| {
            Error::InvalidHandshake("Missing Sec-WebSocket-Accept header".into())
        })?;
        let expected = request.expected_accept();
        if actual != expected {
            return Err(Error::AcceptKeyMismatch {
                expected,
                actual: actual.to_string(),
            });
        }
        Ok(())
    }
}

/// Run the upgrade exchange over `io`.
///
/// Returns the parsed response and any bytes that arrived after the response
/// head, which belong to the frame stream.
///
/// # Errors
///
/// - `Error::InvalidHeaderValue` if the request cannot be written
/// - `Error::Io` / `Error::PeerClosed` from the transport
/// - `Error::HandshakeTooLarge` if no terminator shows up within the limit
/// - `Error::InvalidHandshake` / `Error::AcceptKeyMismatch` for a bad response
pub fn negotiate<T: Read + Write + ?Sized>(
    io: &mut T,
    request: &HandshakeRequest,
    config: &Config,
) -> Result<(HandshakeResponse, BytesMut)> {
    let mut out = Vec::with_capacity(256);
    request.write(&mut out)?;
    send_all(io, &out)?;
    debug!(
        "sent upgrade request for {}:{}{}",
        request.host, request.port, request.path
    );

    let chunk_size = config.read_chunk_size.max(1);
    let mut buf = BytesMut::with_capacity(chunk_size);
    let mut chunk = vec![0u8; chunk_size];

    let head_len = loop {
        let searched = buf.len().saturating_sub(HEADER_TERMINATOR.len() - 1);
        let n = match io.read(&mut chunk) {
            Ok(0) => return Err(Error::PeerClosed("handshake")),
            Ok(n) => n,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        buf.extend_from_slice(&chunk[..n]);

        if let Some(end) = find_terminator(&buf, searched) {
            break end;
        }
        config.limits.check_handshake_size(buf.len())?;
    };

    let leftover = buf.split_off(head_len);
    let response = HandshakeResponse::parse(&buf)?;
    if config.verify_accept_key {
        response.verify_accept(request)?;
    }
    debug!(
        "handshake complete: {} ({} bytes of frame data buffered)",
        response.status_line,
        leftover.len()
    );

    Ok((response, leftover))
}
