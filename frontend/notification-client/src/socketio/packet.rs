/// Engine.IO v4 / Socket.IO v5 text packet codec
///
/// A text frame is one Engine.IO packet: a type digit followed by its data.
/// Engine `message` packets (`4`) carry one Socket.IO packet:
/// `<type>[<namespace>,][<ack id>][<json>]`. Binary attachments are not
/// used by the notification server and are rejected.
use crate::error::{ClientError, Result};
use serde_json::Value;

const DEFAULT_NAMESPACE: &str = "/";

#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    /// Handshake (`sid`, `pingInterval`, `pingTimeout`, ...)
    Open(Value),
    Close,
    Ping(String),
    Pong(String),
    Message(SocketPacket),
    Upgrade,
    Noop,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect {
        namespace: String,
        data: Option<Value>,
    },
    Disconnect {
        namespace: String,
    },
    Event {
        namespace: String,
        ack_id: Option<u64>,
        name: String,
        args: Vec<Value>,
    },
    Ack {
        namespace: String,
        ack_id: u64,
        args: Vec<Value>,
    },
    ConnectError {
        namespace: String,
        data: Value,
    },
}

impl EnginePacket {
    pub fn decode(frame: &str) -> Result<Self> {
        let mut chars = frame.chars();
        let kind = chars
            .next()
            .ok_or_else(|| ClientError::Protocol("empty engine packet".to_string()))?;
        let rest = chars.as_str();

        Ok(match kind {
            '0' => EnginePacket::Open(serde_json::from_str(rest)?),
            '1' => EnginePacket::Close,
            '2' => EnginePacket::Ping(rest.to_string()),
            '3' => EnginePacket::Pong(rest.to_string()),
            '4' => EnginePacket::Message(SocketPacket::decode(rest)?),
            '5' => EnginePacket::Upgrade,
            '6' => EnginePacket::Noop,
            other => {
                return Err(ClientError::Protocol(format!(
                    "unknown engine packet type {:?}",
                    other
                )))
            }
        })
    }

    pub fn encode(&self) -> String {
        match self {
            EnginePacket::Open(handshake) => format!("0{}", handshake),
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping(data) => format!("2{}", data),
            EnginePacket::Pong(data) => format!("3{}", data),
            EnginePacket::Message(packet) => format!("4{}", packet.encode()),
            EnginePacket::Upgrade => "5".to_string(),
            EnginePacket::Noop => "6".to_string(),
        }
    }
}

impl SocketPacket {
    /// Connect to the default namespace without auth
    pub fn connect() -> Self {
        SocketPacket::Connect {
            namespace: DEFAULT_NAMESPACE.to_string(),
            data: None,
        }
    }

    pub fn event(name: impl Into<String>, payload: Value) -> Self {
        SocketPacket::Event {
            namespace: DEFAULT_NAMESPACE.to_string(),
            ack_id: None,
            name: name.into(),
            args: vec![payload],
        }
    }

    pub fn decode(raw: &str) -> Result<Self> {
        let mut chars = raw.chars();
        let kind = chars
            .next()
            .ok_or_else(|| ClientError::Protocol("empty socket packet".to_string()))?;
        let mut rest = chars.as_str();

        if matches!(kind, '5' | '6') {
            return Err(ClientError::Protocol(
                "binary socket packets are not supported".to_string(),
            ));
        }

        let namespace = if rest.starts_with('/') {
            match rest.find(',') {
                Some(idx) => {
                    let ns = rest[..idx].to_string();
                    rest = &rest[idx + 1..];
                    ns
                }
                None => {
                    let ns = rest.to_string();
                    rest = "";
                    ns
                }
            }
        } else {
            DEFAULT_NAMESPACE.to_string()
        };

        let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
        let ack_id = if digits > 0 {
            let id = rest[..digits]
                .parse()
                .map_err(|e| ClientError::Protocol(format!("bad ack id: {}", e)))?;
            rest = &rest[digits..];
            Some(id)
        } else {
            None
        };

        let data: Option<Value> = if rest.is_empty() {
            None
        } else {
            Some(serde_json::from_str(rest)?)
        };

        Ok(match kind {
            '0' => SocketPacket::Connect { namespace, data },
            '1' => SocketPacket::Disconnect { namespace },
            '2' => {
                let mut args = match data {
                    Some(Value::Array(args)) => args,
                    _ => {
                        return Err(ClientError::Protocol(
                            "event packet without argument array".to_string(),
                        ))
                    }
                };
                if args.is_empty() {
                    return Err(ClientError::Protocol("event packet without name".to_string()));
                }
                let name = match args.remove(0) {
                    Value::String(name) => name,
                    other => {
                        return Err(ClientError::Protocol(format!(
                            "event name is not a string: {}",
                            other
                        )))
                    }
                };
                SocketPacket::Event {
                    namespace,
                    ack_id,
                    name,
                    args,
                }
            }
            '3' => SocketPacket::Ack {
                namespace,
                ack_id: ack_id
                    .ok_or_else(|| ClientError::Protocol("ack packet without id".to_string()))?,
                args: match data {
                    Some(Value::Array(args)) => args,
                    _ => Vec::new(),
                },
            },
            '4' => SocketPacket::ConnectError {
                namespace,
                data: data.unwrap_or(Value::Null),
            },
            other => {
                return Err(ClientError::Protocol(format!(
                    "unknown socket packet type {:?}",
                    other
                )))
            }
        })
    }

    pub fn encode(&self) -> String {
        match self {
            SocketPacket::Connect { namespace, data } => {
                let mut out = format!("0{}", namespace_prefix(namespace));
                if let Some(data) = data {
                    out.push_str(&data.to_string());
                }
                out
            }
            SocketPacket::Disconnect { namespace } => {
                format!("1{}", namespace_prefix(namespace))
            }
            SocketPacket::Event {
                namespace,
                ack_id,
                name,
                args,
            } => {
                let mut array = Vec::with_capacity(args.len() + 1);
                array.push(Value::String(name.clone()));
                array.extend(args.iter().cloned());
                format!(
                    "2{}{}{}",
                    namespace_prefix(namespace),
                    ack_id.map(|id| id.to_string()).unwrap_or_default(),
                    Value::Array(array)
                )
            }
            SocketPacket::Ack {
                namespace,
                ack_id,
                args,
            } => format!(
                "3{}{}{}",
                namespace_prefix(namespace),
                ack_id,
                Value::Array(args.clone())
            ),
            SocketPacket::ConnectError { namespace, data } => {
                format!("4{}{}", namespace_prefix(namespace), data)
            }
        }
    }
}

fn namespace_prefix(namespace: &str) -> String {
    if namespace == DEFAULT_NAMESPACE {
        String::new()
    } else {
        format!("{},", namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_open_handshake() {
        let packet = EnginePacket::decode(
            r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#,
        )
        .unwrap();
        match packet {
            EnginePacket::Open(handshake) => assert_eq!(handshake["sid"], "abc"),
            other => panic!("unexpected packet: {:?}", other),
        }
    }

    #[test]
    fn test_decode_connect_ack() {
        let packet = EnginePacket::decode(r#"40{"sid":"xyz"}"#).unwrap();
        assert_eq!(
            packet,
            EnginePacket::Message(SocketPacket::Connect {
                namespace: "/".to_string(),
                data: Some(json!({"sid": "xyz"})),
            })
        );
    }

    #[test]
    fn test_encode_event_on_default_namespace() {
        let packet = EnginePacket::Message(SocketPacket::event(
            "subscribe_table",
            json!({"tableId": "42", "customerId": "customer_1"}),
        ));
        let frame = packet.encode();
        assert!(frame.starts_with(r#"42["subscribe_table","#));

        assert_eq!(EnginePacket::decode(&frame).unwrap(), packet);
    }

    #[test]
    fn test_decode_event_with_namespace_and_ack() {
        let packet = SocketPacket::decode(r#"2/admin,13["notification",{"title":"t"}]"#).unwrap();
        assert_eq!(
            packet,
            SocketPacket::Event {
                namespace: "/admin".to_string(),
                ack_id: Some(13),
                name: "notification".to_string(),
                args: vec![json!({"title": "t"})],
            }
        );
    }

    #[test]
    fn test_ping_pong_and_connect() {
        assert_eq!(EnginePacket::decode("2").unwrap(), EnginePacket::Ping(String::new()));
        assert_eq!(EnginePacket::Pong(String::new()).encode(), "3");
        assert_eq!(EnginePacket::Message(SocketPacket::connect()).encode(), "40");
    }

    #[test]
    fn test_rejects_malformed_packets() {
        assert!(EnginePacket::decode("").is_err());
        assert!(EnginePacket::decode("9").is_err());
        assert!(SocketPacket::decode("2{}").is_err());
        assert!(SocketPacket::decode("2[]").is_err());
        assert!(SocketPacket::decode("2[5]").is_err());
        assert!(SocketPacket::decode(r#"51-["x",{"_placeholder":true,"num":0}]"#).is_err());
    }

    #[test]
    fn test_connect_error() {
        let packet = SocketPacket::decode(r#"4{"message":"Not authorized"}"#).unwrap();
        assert!(matches!(packet, SocketPacket::ConnectError { ref data, .. } if data["message"] == "Not authorized"));
    }
}
