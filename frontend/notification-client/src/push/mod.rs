/// Push subscription management
///
/// Registers the background delivery worker, asks for notification
/// permission, and exchanges the platform push credential with the backend.
/// Every failure here is logged; the client keeps working socket-only.
pub mod backend;
pub mod manager;

pub use backend::{HttpPushBackend, PushBackend};
pub use manager::{PushIdentity, PushSubscriptionManager};

use crate::error::{ClientError, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use event_schema::PushSubscriptionCredential;

/// Script the delivery worker is registered from
pub const WORKER_SCRIPT_URL: &str = "/static/js/service-worker.js";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerRegistration {
    pub script_url: String,
    pub scope: String,
}

/// Platform push service and background worker registry
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushPlatform: Send + Sync {
    /// Background workers and a push service are both available
    fn is_supported(&self) -> bool;

    async fn register_worker(&self, script_url: &str) -> Result<WorkerRegistration>;

    async fn existing_subscription(&self) -> Result<Option<PushSubscriptionCredential>>;

    async fn subscribe(
        &self,
        application_server_key: Vec<u8>,
    ) -> Result<PushSubscriptionCredential>;

    /// Revoke the credential; `false` if the platform refused
    async fn unsubscribe(&self, credential: &PushSubscriptionCredential) -> Result<bool>;
}

/// Decode a URL-safe base64 application server key into raw bytes
///
/// Missing padding is restored; standard-alphabet input is accepted too.
pub fn decode_application_server_key(key: &str) -> Result<Vec<u8>> {
    let mut normalized: String = key
        .trim()
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    let padding = (4 - normalized.len() % 4) % 4;
    normalized.extend(std::iter::repeat('=').take(padding));

    URL_SAFE
        .decode(normalized.as_bytes())
        .map_err(|e| ClientError::Subscription(format!("invalid application server key: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_restores_padding() {
        // "hello?" encodes to "aGVsbG8_" url-safe, no padding needed
        assert_eq!(decode_application_server_key("aGVsbG8_").unwrap(), b"hello?");
        // "hi" encodes to "aGk=" and is usually published without padding
        assert_eq!(decode_application_server_key("aGk").unwrap(), b"hi");
    }

    #[test]
    fn test_decode_accepts_standard_alphabet() {
        assert_eq!(decode_application_server_key("aGVsbG8/").unwrap(), b"hello?");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_application_server_key("!!!"),
            Err(ClientError::Subscription(_))
        ));
    }
}
