use super::packet::{EnginePacket, SocketPacket};
use crate::error::{ClientError, Result};
use crate::transport::{Connection, Connector};
use async_trait::async_trait;
use event_schema::{ClientEvent, ServerEvent};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};
use url::Url;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const ENGINE_PATH: &str = "/socket.io/";

/// Opens Socket.IO sessions over the WebSocket transport
#[derive(Debug, Clone)]
pub struct SocketIoConnector {
    endpoint: Url,
}

impl SocketIoConnector {
    /// `server_url` is the page origin, e.g. `http://localhost:5000`
    pub fn new(server_url: &str) -> Result<Self> {
        let mut endpoint = Url::parse(server_url)
            .map_err(|e| ClientError::Config(format!("invalid server url {:?}: {}", server_url, e)))?;

        let scheme = match endpoint.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(ClientError::Config(format!(
                    "unsupported server url scheme {:?}",
                    other
                )))
            }
        };
        endpoint
            .set_scheme(scheme)
            .map_err(|_| ClientError::Config("cannot set websocket scheme".to_string()))?;
        endpoint.set_path(ENGINE_PATH);
        endpoint.set_query(Some("EIO=4&transport=websocket"));

        Ok(Self { endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Connector for SocketIoConnector {
    async fn connect(&self) -> Result<Box<dyn Connection>> {
        let (mut ws, _) = connect_async(self.endpoint.as_str()).await?;

        match next_packet(&mut ws).await? {
            EnginePacket::Open(handshake) => {
                debug!(sid = %handshake["sid"], "Engine.IO handshake complete");
            }
            other => {
                return Err(ClientError::Connection(format!(
                    "expected open packet, got {:?}",
                    other
                )))
            }
        }

        send_packet(&mut ws, EnginePacket::Message(SocketPacket::connect())).await?;

        loop {
            match next_packet(&mut ws).await? {
                EnginePacket::Message(SocketPacket::Connect { data, .. }) => {
                    info!(
                        sid = %data.as_ref().map(|d| d["sid"].to_string()).unwrap_or_default(),
                        "Socket.IO namespace connected"
                    );
                    break;
                }
                EnginePacket::Message(SocketPacket::ConnectError { data, .. }) => {
                    return Err(ClientError::Connection(format!("connect refused: {}", data)));
                }
                EnginePacket::Ping(data) => send_packet(&mut ws, EnginePacket::Pong(data)).await?,
                EnginePacket::Close => {
                    return Err(ClientError::Connection(
                        "server closed during handshake".to_string(),
                    ))
                }
                _ => {}
            }
        }

        Ok(Box::new(SocketIoConnection { ws }))
    }
}

/// A connected Socket.IO session on the default namespace
pub struct SocketIoConnection {
    ws: WsStream,
}

#[async_trait]
impl Connection for SocketIoConnection {
    async fn send(&mut self, event: &ClientEvent) -> Result<()> {
        let packet = EnginePacket::Message(SocketPacket::event(event.name(), event.payload()));
        send_packet(&mut self.ws, packet).await
    }

    async fn recv(&mut self) -> Option<Result<ServerEvent>> {
        loop {
            let frame = match self.ws.next().await? {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) => return None,
                Ok(_) => continue,
                Err(e) => return Some(Err(e.into())),
            };

            let packet = match EnginePacket::decode(&frame) {
                Ok(packet) => packet,
                Err(e) => return Some(Err(e)),
            };

            match packet {
                EnginePacket::Ping(data) => {
                    if let Err(e) = send_packet(&mut self.ws, EnginePacket::Pong(data)).await {
                        return Some(Err(e));
                    }
                }
                EnginePacket::Close => return None,
                EnginePacket::Message(SocketPacket::Event { name, args, .. }) => {
                    let payload = args.into_iter().next().unwrap_or(Value::Null);
                    return Some(ServerEvent::from_wire(&name, payload).map_err(Into::into));
                }
                EnginePacket::Message(SocketPacket::Disconnect { .. }) => {
                    return Some(Ok(ServerEvent::Disconnect))
                }
                EnginePacket::Message(SocketPacket::Connect { .. }) => {
                    return Some(Ok(ServerEvent::Connect))
                }
                EnginePacket::Message(SocketPacket::ConnectError { data, .. }) => {
                    return Some(Ok(ServerEvent::Error(data)))
                }
                _ => {}
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        let namespace_leave = EnginePacket::Message(SocketPacket::Disconnect {
            namespace: "/".to_string(),
        });
        send_packet(&mut self.ws, namespace_leave).await?;
        self.ws.close(None).await?;
        Ok(())
    }
}

async fn send_packet(ws: &mut WsStream, packet: EnginePacket) -> Result<()> {
    ws.send(Message::Text(packet.encode())).await?;
    Ok(())
}

async fn next_packet(ws: &mut WsStream) -> Result<EnginePacket> {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => return EnginePacket::decode(&text),
            Some(Ok(Message::Close(_))) | None => {
                return Err(ClientError::Connection(
                    "connection closed during handshake".to_string(),
                ))
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_from_http_origin() {
        let connector = SocketIoConnector::new("http://localhost:5000").unwrap();
        assert_eq!(
            connector.endpoint().as_str(),
            "ws://localhost:5000/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn test_endpoint_from_https_origin() {
        let connector = SocketIoConnector::new("https://waiter.example/app").unwrap();
        assert_eq!(connector.endpoint().scheme(), "wss");
        assert_eq!(connector.endpoint().path(), "/socket.io/");
    }

    #[test]
    fn test_rejects_unsupported_scheme() {
        assert!(matches!(
            SocketIoConnector::new("ftp://example.com"),
            Err(ClientError::Config(_))
        ));
        assert!(SocketIoConnector::new("not a url").is_err());
    }
}
