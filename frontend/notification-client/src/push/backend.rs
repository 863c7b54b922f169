use crate::error::{ClientError, Result};
use async_trait::async_trait;
use event_schema::push::{SUBSCRIBE_PATH, UNSUBSCRIBE_PATH};
use event_schema::{BackendResponse, SubscribeRequest, UnsubscribeRequest};
use serde::Serialize;
use std::time::Duration;
use url::Url;

/// Backend endpoints storing this device's push credential
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushBackend: Send + Sync {
    async fn subscribe(&self, request: &SubscribeRequest) -> Result<BackendResponse>;
    async fn unsubscribe(&self, request: &UnsubscribeRequest) -> Result<BackendResponse>;
}

/// JSON-over-HTTP push backend
pub struct HttpPushBackend {
    base_url: Url,
    http_client: reqwest::Client,
}

impl HttpPushBackend {
    pub fn new(api_base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(api_base_url)
            .map_err(|e| ClientError::Config(format!("invalid api base url {:?}: {}", api_base_url, e)))?;
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    async fn post<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<BackendResponse> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| ClientError::Config(format!("invalid endpoint {}: {}", path, e)))?;

        let response = self.http_client.post(url).json(body).send().await?;

        match response.status() {
            status if status.is_success() => Ok(response.json().await?),
            status => {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                Err(ClientError::Http(format!("{} - {}", status, error_text)))
            }
        }
    }
}

#[async_trait]
impl PushBackend for HttpPushBackend {
    async fn subscribe(&self, request: &SubscribeRequest) -> Result<BackendResponse> {
        self.post(SUBSCRIBE_PATH, request).await
    }

    async fn unsubscribe(&self, request: &UnsubscribeRequest) -> Result<BackendResponse> {
        self.post(UNSUBSCRIBE_PATH, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(matches!(
            HttpPushBackend::new("not a url", Duration::from_secs(10)),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn test_endpoints_resolve_against_base() {
        let backend = HttpPushBackend::new("https://waiter.example/app/", Duration::from_secs(10)).unwrap();
        assert_eq!(
            backend.base_url.join(SUBSCRIBE_PATH).unwrap().as_str(),
            "https://waiter.example/api/push/subscribe"
        );
    }
}
