/// Persistent connection to the notification server
///
/// Architecture:
/// 1. `Connector` opens one `Connection` (Socket.IO over WebSocket in production)
/// 2. `TransportClient` owns at most one live connection and drives it from a
///    single background task
/// 3. Inbound events fan out over a broadcast channel (`TransportEvent`)
/// 4. Unexpected disconnects are retried with linear backoff up to a cap
pub mod client;

pub use client::TransportClient;

use crate::error::Result;
use async_trait::async_trait;
use event_schema::{ClientEvent, Notification, ServerEvent};
use serde_json::Value;
use std::time::Duration;

/// One live, bidirectional connection
#[async_trait]
pub trait Connection: Send {
    async fn send(&mut self, event: &ClientEvent) -> Result<()>;

    /// Next server event; `None` once the connection is closed.
    /// Must be cancel-safe.
    async fn recv(&mut self) -> Option<Result<ServerEvent>>;

    async fn close(&mut self) -> Result<()>;
}

/// Opens connections to the notification server
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn Connection>>;
}

/// Transport failure surfaced to listeners
#[derive(Debug, Clone, PartialEq)]
pub struct TransportFailure {
    pub message: String,
    /// Reconnect attempts are exhausted; nothing further happens without `connect()`
    pub terminal: bool,
}

/// Events produced by the transport client, in arrival order per connection
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connected,
    Disconnected,
    Notification(Notification),
    Subscribed(Value),
    Unsubscribed(Value),
    PlaySound,
    Error(TransportFailure),
    ReconnectScheduled { attempt: u32, delay: Duration },
}
