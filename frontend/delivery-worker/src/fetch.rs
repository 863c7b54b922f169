use crate::cache::CacheStorage;
use crate::errors::{Result, WorkerError};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub method: String,
    pub url: String,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.into(),
        }
    }
}

/// Response origin class, as the platform reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    /// Same-origin
    Basic,
    Cors,
    Opaque,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub kind: ResponseType,
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// Only complete same-origin responses are stored
    pub fn is_cacheable(&self) -> bool {
        self.status == 200 && self.kind == ResponseType::Basic
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not intercepted; the platform performs the request itself
    Bypass,
    FromCache(FetchResponse),
    FromNetwork(FetchResponse),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse>;
}

/// Network access over HTTP, resolving paths against the app origin
pub struct HttpNetwork {
    origin: Url,
    http_client: reqwest::Client,
}

impl HttpNetwork {
    pub fn new(origin: &str) -> Result<Self> {
        let origin = Url::parse(origin)
            .map_err(|e| WorkerError::Network(format!("invalid origin {:?}: {}", origin, e)))?;
        Ok(Self {
            origin,
            http_client: reqwest::Client::new(),
        })
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        let url = self
            .origin
            .join(&request.url)
            .map_err(|e| WorkerError::Network(format!("invalid url {:?}: {}", request.url, e)))?;
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| WorkerError::Network(format!("invalid method: {}", e)))?;

        let kind = if url.origin() == self.origin.origin() {
            ResponseType::Basic
        } else {
            ResponseType::Cors
        };

        let response = self.http_client.request(method, url).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        Ok(FetchResponse { status, kind, body })
    }
}

/// Cache-first routing for static GET requests
pub struct FetchRouter {
    cache: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    cache_name: String,
    api_marker: String,
}

impl FetchRouter {
    pub fn new(
        cache: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
        cache_name: impl Into<String>,
        api_marker: impl Into<String>,
    ) -> Self {
        Self {
            cache,
            network,
            cache_name: cache_name.into(),
            api_marker: api_marker.into(),
        }
    }

    /// Non-GET and API requests are never intercepted
    pub fn bypasses(&self, request: &FetchRequest) -> bool {
        !request.method.eq_ignore_ascii_case("GET") || request.url.contains(&self.api_marker)
    }

    pub async fn handle(&self, request: &FetchRequest) -> Result<FetchOutcome> {
        if self.bypasses(request) {
            return Ok(FetchOutcome::Bypass);
        }

        match self.cache.lookup(&request.url).await {
            Ok(Some(cached)) => {
                debug!(url = %request.url, "Serving from cache");
                return Ok(FetchOutcome::FromCache(cached.response));
            }
            Ok(None) => {}
            Err(e) => warn!(url = %request.url, "Cache lookup failed: {}", e),
        }

        let response = self.network.fetch(request).await?;
        if response.is_cacheable() {
            if let Err(e) = self
                .cache
                .put(&self.cache_name, &request.url, response.clone())
                .await
            {
                warn!(url = %request.url, "Failed to cache response: {}", e);
            }
        }

        Ok(FetchOutcome::FromNetwork(response))
    }

    /// Fetch and store one asset unconditionally (install-time pre-cache)
    pub async fn precache(&self, url: &str) -> Result<()> {
        let response = self.network.fetch(&FetchRequest::get(url)).await?;
        if response.status != 200 {
            return Err(WorkerError::Cache(format!(
                "pre-cache of {} returned {}",
                url, response.status
            )));
        }
        self.cache.put(&self.cache_name, url, response).await
    }
}
