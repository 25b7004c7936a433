//! Transport and remote-value collaborators
//!
//! The engine only ever writes to the transport; inbound delivery is a call
//! into [`Engine::on_message`](crate::Engine::on_message) made by the
//! surrounding dispatch layer once bytes arrive from the wire.

use crate::midi::Message;
use anyhow::{Context, Result};
use midir::MidiOutputConnection;
use parking_lot::Mutex;
use tracing::{debug, info};

/// Outbound byte transport. Implementations must be cheap to call from the
/// dispatch path; failures are logged by the engine, never propagated into
/// the state machine.
pub trait Transport: Send + Sync {
    fn send(&self, message: &Message) -> Result<()>;
}

/// Callback receiving values from a remote observable.
pub type ValueCallback = Box<dyn Fn(f64) + Send + Sync>;

/// An observable value in the remote application.
///
/// `subscribe` delivers the current value and every future change;
/// `set` issues a command toward the application (no-op by default for
/// read-only observables).
pub trait RemoteValue: Send + Sync {
    fn subscribe(&self, callback: ValueCallback);

    fn set(&self, _value: f64) {}
}

/// Transport over `midir` output connections, one per port index.
pub struct MidirTransport {
    connections: Mutex<Vec<MidiOutputConnection>>,
}

impl MidirTransport {
    /// Wrap already-opened output connections; the connection at index `n`
    /// serves messages whose port is `n`.
    pub fn new(connections: Vec<MidiOutputConnection>) -> Self {
        info!("MIDI transport ready with {} output port(s)", connections.len());
        Self { connections: Mutex::new(connections) }
    }
}

impl Transport for MidirTransport {
    fn send(&self, message: &Message) -> Result<()> {
        let bytes = message.to_bytes();
        let port = message.port() as usize;
        let mut connections = self.connections.lock();
        let connection = connections
            .get_mut(port)
            .with_context(|| format!("no MIDI output connection for port {}", port))?;
        connection
            .send(&bytes)
            .with_context(|| format!("failed to send {} bytes on port {}", bytes.len(), port))
    }
}

/// Logging transport for development and diagnostics.
pub struct ConsoleTransport {
    name: String,
}

impl ConsoleTransport {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Transport for ConsoleTransport {
    fn send(&self, message: &Message) -> Result<()> {
        debug!("[{}] → {}", self.name, message);
        Ok(())
    }
}

/// Recording transport for tests: every sent message is retained in order.
#[derive(Default)]
pub struct MemoryTransport {
    sent: Mutex<Vec<Message>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages sent so far, in send order.
    pub fn sent(&self) -> Vec<Message> {
        self.sent.lock().clone()
    }

    /// Number of messages sent so far.
    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }

    /// Drop the recorded history.
    pub fn clear(&self) {
        self.sent.lock().clear();
    }
}

impl Transport for MemoryTransport {
    fn send(&self, message: &Message) -> Result<()> {
        self.sent.lock().push(message.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::ChannelMessage;

    #[test]
    fn test_memory_transport_records_in_order() {
        let transport = MemoryTransport::new();
        let first: Message = ChannelMessage::new(0, 0x90, 0x3C, 0x7F).into();
        let second: Message = ChannelMessage::new(0, 0x80, 0x3C, 0x00).into();

        transport.send(&first).unwrap();
        transport.send(&second).unwrap();

        assert_eq!(transport.sent(), vec![first, second]);
        transport.clear();
        assert_eq!(transport.sent_count(), 0);
    }

    #[test]
    fn test_console_transport_never_fails() {
        let transport = ConsoleTransport::new("test");
        let msg: Message = ChannelMessage::new(0, 0xB0, 0x07, 0x40).into();
        assert!(transport.send(&msg).is_ok());
    }
}
