//! Test harness: an in-memory transport and a loopback WebSocket peer.

#![allow(dead_code, unused_imports)]

mod server;
mod stream;

pub use server::{TestServer, accept_with, read_request, request_key, server_frame, upgrade_response};
pub use stream::ScriptedStream;
