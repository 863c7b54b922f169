/// Socket event names and payloads exchanged with the notification server
use crate::notification::Notification;
use crate::topic::Topic;
use serde_json::{json, Value};

/// Event names on the wire
pub mod names {
    // Consumed
    pub const CONNECT: &str = "connect";
    pub const DISCONNECT: &str = "disconnect";
    pub const ERROR: &str = "error";
    pub const NOTIFICATION: &str = "notification";
    pub const SUBSCRIBED: &str = "subscribed";
    pub const UNSUBSCRIBED: &str = "unsubscribed";
    pub const PLAY_SOUND: &str = "play_sound";

    // Emitted
    pub const SUBSCRIBE_TABLE: &str = "subscribe_table";
    pub const UNSUBSCRIBE_TABLE: &str = "unsubscribe_table";
    pub const SUBSCRIBE_RESTAURANT: &str = "subscribe_restaurant";
    pub const SUBSCRIBE_USER: &str = "subscribe_user";
}

/// Events emitted by the client
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClientEvent {
    SubscribeTable { table_id: String, customer_id: String },
    UnsubscribeTable { table_id: String },
    SubscribeRestaurant { restaurant_id: String },
    SubscribeUser { user_id: String },
}

impl ClientEvent {
    /// Subscription emission for a topic
    pub fn subscribe(topic: &Topic, customer_id: &str) -> Self {
        match topic {
            Topic::Table(id) => ClientEvent::SubscribeTable {
                table_id: id.clone(),
                customer_id: customer_id.to_string(),
            },
            Topic::Restaurant(id) => ClientEvent::SubscribeRestaurant {
                restaurant_id: id.clone(),
            },
            Topic::User(id) => ClientEvent::SubscribeUser {
                user_id: id.clone(),
            },
        }
    }

    /// Only table subscriptions have a server-side unsubscribe event
    pub fn unsubscribe(topic: &Topic) -> Option<Self> {
        match topic {
            Topic::Table(id) => Some(ClientEvent::UnsubscribeTable {
                table_id: id.clone(),
            }),
            Topic::Restaurant(_) | Topic::User(_) => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::SubscribeTable { .. } => names::SUBSCRIBE_TABLE,
            ClientEvent::UnsubscribeTable { .. } => names::UNSUBSCRIBE_TABLE,
            ClientEvent::SubscribeRestaurant { .. } => names::SUBSCRIBE_RESTAURANT,
            ClientEvent::SubscribeUser { .. } => names::SUBSCRIBE_USER,
        }
    }

    pub fn payload(&self) -> Value {
        match self {
            ClientEvent::SubscribeTable {
                table_id,
                customer_id,
            } => json!({ "tableId": table_id, "customerId": customer_id }),
            ClientEvent::UnsubscribeTable { table_id } => json!({ "tableId": table_id }),
            ClientEvent::SubscribeRestaurant { restaurant_id } => {
                json!({ "restaurantId": restaurant_id })
            }
            ClientEvent::SubscribeUser { user_id } => json!({ "userId": user_id }),
        }
    }
}

/// Events consumed from the server
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    Connect,
    Disconnect,
    Error(Value),
    Notification(Notification),
    Subscribed(Value),
    Unsubscribed(Value),
    PlaySound(Value),
    /// Any event this client has no handler for
    Other { name: String, payload: Value },
}

impl ServerEvent {
    /// Map a named event and its first argument to a typed event
    pub fn from_wire(name: &str, payload: Value) -> Result<Self, serde_json::Error> {
        Ok(match name {
            names::CONNECT => ServerEvent::Connect,
            names::DISCONNECT => ServerEvent::Disconnect,
            names::ERROR => ServerEvent::Error(payload),
            names::NOTIFICATION => ServerEvent::Notification(serde_json::from_value(payload)?),
            names::SUBSCRIBED => ServerEvent::Subscribed(payload),
            names::UNSUBSCRIBED => ServerEvent::Unsubscribed(payload),
            names::PLAY_SOUND => ServerEvent::PlaySound(payload),
            other => ServerEvent::Other {
                name: other.to_string(),
                payload,
            },
        })
    }
}
