use crate::errors::Result;
use crate::render::RenderedNotification;
use async_trait::async_trait;
use event_schema::Notification;

/// An open page controlled (or controllable) by the worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowClient {
    pub id: String,
    pub url: String,
}

/// Open pages of this application
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WindowClients: Send + Sync {
    async fn list(&self) -> Result<Vec<WindowClient>>;

    async fn focus(&self, id: &str) -> Result<()>;

    async fn open(&self, url: &str) -> Result<WindowClient>;

    /// Take control of already-open pages without a reload
    async fn claim(&self) -> Result<()>;

    async fn post_message(&self, id: &str, notification: &Notification) -> Result<()>;
}

/// Platform notification display
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationDisplay: Send + Sync {
    async fn show(&self, notification: &RenderedNotification) -> Result<()>;

    async fn close(&self, notification: &Notification) -> Result<()>;
}
