use crate::config::WorkerConfig;
use event_schema::{Notification, NotificationAction};
use serde::Serialize;
use serde_json::{Map, Value};

/// Options handed to the platform's notification display
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOptions {
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: Map<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<NotificationAction>,
    pub require_interaction: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedNotification {
    pub title: String,
    pub options: NotificationOptions,
}

/// Decode a push payload
///
/// JSON payloads are taken as notifications; anything else becomes the body
/// of a notification with the default title. No payload at all yields the
/// default title and body.
pub fn parse_push_payload(payload: Option<&[u8]>, config: &WorkerConfig) -> Notification {
    let payload = match payload {
        Some(payload) => payload,
        None => return Notification::new(&config.default_title, &config.default_body),
    };

    match serde_json::from_slice::<Notification>(payload) {
        Ok(notification) => notification,
        Err(_) => Notification::new(
            &config.default_title,
            String::from_utf8_lossy(payload).into_owned(),
        ),
    }
}

pub fn render(notification: &Notification, config: &WorkerConfig) -> RenderedNotification {
    RenderedNotification {
        title: notification.title.clone(),
        options: NotificationOptions {
            body: notification.body.clone(),
            icon: config.icon.clone(),
            badge: config.badge.clone(),
            vibrate: config.vibrate.clone(),
            data: notification.data.clone(),
            actions: notification.actions.clone(),
            require_interaction: notification.require_interaction,
        },
    }
}
