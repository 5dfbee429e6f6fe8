use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread::JoinHandle;

use wsframe::protocol::frame::LengthField;
use wsframe::{OpCode, compute_accept_key};

/// Build an unmasked server-to-client frame.
pub fn server_frame(opcode: OpCode, payload: &[u8]) -> Vec<u8> {
    let length = LengthField::for_len(payload.len());
    let mut out = vec![0x80 | opcode.as_u8(), length.len7()];
    match length {
        LengthField::Short(_) => {}
        LengthField::Extended16(len) => out.extend_from_slice(&len.to_be_bytes()),
        LengthField::Extended64(len) => out.extend_from_slice(&len.to_be_bytes()),
    }
    out.extend_from_slice(payload);
    out
}

/// A compliant `101` response for `key`.
pub fn upgrade_response(key: &str) -> Vec<u8> {
    format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {}\r\n\r\n",
        compute_accept_key(key)
    )
    .into_bytes()
}

/// Read the client's upgrade request head and return it as text.
pub fn read_request(stream: &mut TcpStream) -> String {
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        let n = stream.read(&mut byte).expect("read request");
        assert!(n > 0, "client hung up during handshake");
        head.push(byte[0]);
    }
    String::from_utf8(head).expect("request is UTF-8")
}

/// Extract the `Sec-WebSocket-Key` value from a request head.
pub fn request_key(request: &str) -> String {
    request
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.trim()
                .eq_ignore_ascii_case("sec-websocket-key")
                .then(|| value.trim().to_string())
        })
        .expect("request carries Sec-WebSocket-Key")
}

/// One-connection loopback peer running a script on its own thread.
pub struct TestServer<R> {
    addr: SocketAddr,
    handle: Option<JoinHandle<R>>,
}

impl<R: Send + 'static> TestServer<R> {
    /// Bind to an ephemeral port and run `script` on the first connection.
    pub fn spawn<F>(script: F) -> Self
    where
        F: FnOnce(TcpStream) -> R + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        let addr = listener.local_addr().expect("local addr");
        let handle = std::thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept");
            script(stream)
        });
        Self {
            addr,
            handle: Some(handle),
        }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Wait for the script to finish and return its result.
    pub fn join(mut self) -> R {
        self.handle
            .take()
            .expect("joined once")
            .join()
            .expect("server thread panicked")
    }
}

/// Accept the upgrade, answering with `response` built from the client key.
pub fn accept_with<F>(stream: &mut TcpStream, response: F) -> String
where
    F: FnOnce(&str) -> Vec<u8>,
{
    let request = read_request(stream);
    let key = request_key(&request);
    stream.write_all(&response(&key)).expect("write response");
    request
}
