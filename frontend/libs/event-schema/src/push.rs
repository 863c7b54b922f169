/// Push subscription exchange with the backend
use serde::{Deserialize, Serialize};

pub const SUBSCRIBE_PATH: &str = "/api/push/subscribe";
pub const UNSUBSCRIBE_PATH: &str = "/api/push/unsubscribe";

/// Platform-issued push subscription (endpoint + encryption keys)
///
/// The backend stores a copy; the client holds the live handle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscriptionCredential {
    pub endpoint: String,
    #[serde(default)]
    pub expiration_time: Option<i64>,
    pub keys: PushKeys,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PushKeys {
    pub p256dh: String,
    pub auth: String,
}

/// Body of `POST /api/push/subscribe`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    pub subscription: PushSubscriptionCredential,
    pub user_id: Option<String>,
    pub restaurant_id: Option<String>,
    pub customer_id: Option<String>,
}

/// Body of `POST /api/push/unsubscribe`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UnsubscribeRequest {
    pub user_id: Option<String>,
    pub restaurant_id: Option<String>,
    pub customer_id: Option<String>,
}

/// `{success, message?}` returned by both endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_subscribe_request_wire_shape() {
        let request = SubscribeRequest {
            subscription: PushSubscriptionCredential {
                endpoint: "https://push.example/abc".to_string(),
                expiration_time: None,
                keys: PushKeys {
                    p256dh: "key".to_string(),
                    auth: "secret".to_string(),
                },
            },
            user_id: Some("7".to_string()),
            restaurant_id: None,
            customer_id: Some("customer_x".to_string()),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["subscription"]["endpoint"], "https://push.example/abc");
        assert_eq!(value["subscription"]["keys"]["p256dh"], "key");
        assert_eq!(value["userId"], "7");
        assert_eq!(value["restaurantId"], json!(null));
        assert_eq!(value["customerId"], "customer_x");
    }

    #[test]
    fn test_backend_response_without_message() {
        let response: BackendResponse = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(response.success);
        assert!(response.message.is_none());
    }
}
