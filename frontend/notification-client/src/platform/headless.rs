/// Platform stand-ins for running the client without a UI
use super::{
    AudioPlayer, Interaction, InteractionSource, NotificationSurface, PermissionState,
    PlatformNotification, PlaybackError,
};
use crate::error::{ClientError, Result};
use crate::push::{PushPlatform, WorkerRegistration};
use async_trait::async_trait;
use event_schema::PushSubscriptionCredential;
use tracing::info;

/// Logs the sound it would have played
#[derive(Debug, Default)]
pub struct LoggingAudioPlayer;

#[async_trait]
impl AudioPlayer for LoggingAudioPlayer {
    async fn play(&self, source: &str) -> std::result::Result<(), PlaybackError> {
        info!(source, "Playing notification sound");
        Ok(())
    }
}

/// Logs platform notifications instead of rendering them
#[derive(Debug)]
pub struct LoggingSurface {
    permission: PermissionState,
}

impl LoggingSurface {
    pub fn new(permission: PermissionState) -> Self {
        Self { permission }
    }
}

#[async_trait]
impl NotificationSurface for LoggingSurface {
    fn is_supported(&self) -> bool {
        true
    }

    fn permission(&self) -> PermissionState {
        self.permission
    }

    async fn request_permission(&self) -> PermissionState {
        self.permission
    }

    async fn show(&self, notification: PlatformNotification) -> Result<()> {
        info!(
            title = %notification.title,
            body = %notification.body,
            "Platform notification"
        );
        Ok(())
    }
}

/// Never produces an interaction; audio is never blocked headless
#[derive(Debug, Default)]
pub struct NoInteractions;

#[async_trait]
impl InteractionSource for NoInteractions {
    async fn next_interaction(&self) -> Interaction {
        futures::future::pending().await
    }
}

/// No background worker, no push service; the client runs socket-only
#[derive(Debug, Default)]
pub struct UnsupportedPushPlatform;

#[async_trait]
impl PushPlatform for UnsupportedPushPlatform {
    fn is_supported(&self) -> bool {
        false
    }

    async fn register_worker(&self, _script_url: &str) -> Result<WorkerRegistration> {
        Err(unsupported())
    }

    async fn existing_subscription(&self) -> Result<Option<PushSubscriptionCredential>> {
        Ok(None)
    }

    async fn subscribe(&self, _application_server_key: Vec<u8>) -> Result<PushSubscriptionCredential> {
        Err(unsupported())
    }

    async fn unsubscribe(&self, _credential: &PushSubscriptionCredential) -> Result<bool> {
        Ok(false)
    }
}

fn unsupported() -> ClientError {
    ClientError::PlatformUnsupported("no push service in headless mode".to_string())
}
