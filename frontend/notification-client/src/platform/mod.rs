/// Platform capabilities the page context depends on
///
/// Audio playback, platform notifications and user-interaction events are
/// provided by whatever hosts the client. The dispatcher only sees these
/// traits; `headless` has implementations for running without a UI.
pub mod headless;

use crate::error::Result;
use crate::push::PushPlatform;
use async_trait::async_trait;
use event_schema::NotificationAction;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Platform notification permission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    /// Not yet asked
    Default,
    Granted,
    Denied,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("playback rejected by autoplay policy")]
    AutoplayBlocked,
    #[error("playback failed: {0}")]
    Failed(String),
}

/// User interaction that can unlock audio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    Click,
    Touch,
}

/// Notification as handed to the platform for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformNotification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub data: Map<String, Value>,
    pub actions: Vec<NotificationAction>,
    pub require_interaction: bool,
    /// Close automatically after this long
    pub auto_close: Option<Duration>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    async fn play(&self, source: &str) -> std::result::Result<(), PlaybackError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSurface: Send + Sync {
    /// Whether platform notifications exist at all
    fn is_supported(&self) -> bool;

    fn permission(&self) -> PermissionState;

    /// Show the permission prompt once and return the outcome
    async fn request_permission(&self) -> PermissionState;

    async fn show(&self, notification: PlatformNotification) -> Result<()>;
}

#[async_trait]
pub trait InteractionSource: Send + Sync {
    /// Resolves on the next click or touch
    async fn next_interaction(&self) -> Interaction;
}

/// Everything the host platform provides to a session
#[derive(Clone)]
pub struct PlatformServices {
    pub audio: Arc<dyn AudioPlayer>,
    pub surface: Arc<dyn NotificationSurface>,
    pub interactions: Arc<dyn InteractionSource>,
    pub push: Arc<dyn PushPlatform>,
}

impl PlatformServices {
    /// Log-only services with a fixed notification permission and no push service
    pub fn headless(permission: PermissionState) -> Self {
        Self {
            audio: Arc::new(headless::LoggingAudioPlayer),
            surface: Arc::new(headless::LoggingSurface::new(permission)),
            interactions: Arc::new(headless::NoInteractions),
            push: Arc::new(headless::UnsupportedPushPlatform),
        }
    }
}
