//! Client facade and connection lifecycle.
//!
//! ## Connection Lifecycle
//!
//! 1. **Connecting** - upgrade handshake in progress
//! 2. **Open** - handshake succeeded, frames flow in both directions
//! 3. **Closed** - closed by the caller or by an unrecoverable error
//!
//! ## Example
//!
//! ```rust,no_run
//! use wsframe::{Client, Config};
//!
//! let config = Config::new().with_origin("null");
//! let mut client = Client::connect_with_config("localhost", 5000, "/", config)?;
//!
//! client.send_text("Hello")?;
//! let frame = client.receive()?;
//! println!("{}: {:?}", frame.opcode, frame.payload());
//! client.close()?;
//! # Ok::<(), wsframe::Error>(())
//! ```

mod client;
mod state;

pub use client::Client;
pub use state::ConnectionState;
