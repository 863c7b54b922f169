/// Socket.IO client plumbing
///
/// This module speaks just enough of Engine.IO v4 / Socket.IO v5 over a
/// WebSocket to talk to the notification server: handshake, default
/// namespace connect, ping/pong, and JSON events.
pub mod connector;
pub mod packet;

pub use connector::{SocketIoConnection, SocketIoConnector};
pub use packet::{EnginePacket, SocketPacket};
