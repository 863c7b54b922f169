use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Notification as produced by the backend
///
/// Arrives identically over the socket (`notification` event) and as a push
/// payload. The socket server historically sends the text under `message`,
/// the push path under `body`; both are accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(default)]
    pub title: String,

    #[serde(default, alias = "message")]
    pub body: String,

    /// Routing hints (`type`, `restaurantId`, `tableId`, `orderId`, `url`)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<NotificationAction>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub require_interaction: bool,
}

/// Action button attached to a notification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationAction {
    #[serde(alias = "action")]
    pub id: String,
    #[serde(alias = "title")]
    pub label: String,
}

/// Notification kinds the click router knows about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationKind {
    NewOrder,
    OrderStatus,
    Other(String),
}

impl NotificationKind {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "new_order" => NotificationKind::NewOrder,
            "order_status" => NotificationKind::OrderStatus,
            other => NotificationKind::Other(other.to_string()),
        }
    }
}

/// Typed view over the `data` map
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingHints {
    pub kind: Option<NotificationKind>,
    pub restaurant_id: Option<String>,
    pub table_id: Option<String>,
    pub order_id: Option<String>,
    pub url: Option<String>,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn with_action(mut self, id: impl Into<String>, label: impl Into<String>) -> Self {
        self.actions.push(NotificationAction {
            id: id.into(),
            label: label.into(),
        });
        self
    }

    /// Extract routing hints; numeric ids are accepted and rendered as strings
    pub fn hints(&self) -> RoutingHints {
        RoutingHints {
            kind: data_string(&self.data, "type").map(|raw| NotificationKind::parse(&raw)),
            restaurant_id: data_string(&self.data, "restaurantId"),
            table_id: data_string(&self.data, "tableId"),
            order_id: data_string(&self.data, "orderId"),
            url: data_string(&self.data, "url"),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn data_string(data: &Map<String, Value>, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}
