//! Simple WebSocket client example.
//!
//! Start any echo server on localhost:5000, then run:
//! RUST_LOG=debug cargo run --example client

use std::error::Error;

use wsframe::{Client, Config, OpCode, Timeouts};

const HOST: &str = "localhost";
const PORT: u16 = 5000;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    println!("Connecting to ws://{}:{}/", HOST, PORT);
    let config = Config::new().with_timeouts(Timeouts::default());
    let mut client = Client::connect_with_config(HOST, PORT, "/", config)?;
    println!(
        "Handshake complete: {}",
        client.handshake_response().status_line
    );

    let message = "Hello!";
    println!("Sending: {}", message);
    client.send_text(message)?;

    client.receive_with(|opcode, payload| match opcode {
        OpCode::Text => println!("Server responded with: {}", String::from_utf8_lossy(&payload)),
        OpCode::Binary => println!("Server responded with {} bytes", payload.len()),
        other => println!("Server sent a {} frame", other),
    })?;

    // a graceful close: Close frame first, then drop the socket
    client.send(OpCode::Close, &1000u16.to_be_bytes())?;
    client.close()?;
    Ok(())
}
