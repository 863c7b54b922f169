use super::events::{DispatchEvent, EventKind, Listener, ListenerId, ListenerRegistry};
use crate::config::AlertConfig;
use crate::error::{ClientError, Result};
use crate::metrics;
use crate::models::DeliveryChannel;
use crate::platform::{
    AudioPlayer, InteractionSource, NotificationSurface, PermissionState, PlatformNotification,
};
use crate::preferences::{self, PreferenceStore};
use event_schema::Notification;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const DEFAULT_TITLE: &str = "Notification";
const AUTO_CLOSE_AFTER: Duration = Duration::from_secs(5);

/// Turns received notifications into user-visible alerts
///
/// For every notification: play the alert sound (if enabled), hand it to the
/// registered listeners, then show a platform notification (if permitted).
/// The same payload arriving over both channels is handled twice.
pub struct NotificationDispatcher {
    preferences: Arc<dyn PreferenceStore>,
    audio: Arc<dyn AudioPlayer>,
    surface: Arc<dyn NotificationSurface>,
    interactions: Arc<dyn InteractionSource>,
    alerts: AlertConfig,
    listeners: ListenerRegistry,
    sound_enabled: AtomicBool,
    unlock_armed: Arc<AtomicBool>,
}

impl NotificationDispatcher {
    pub fn new(
        preferences: Arc<dyn PreferenceStore>,
        audio: Arc<dyn AudioPlayer>,
        surface: Arc<dyn NotificationSurface>,
        interactions: Arc<dyn InteractionSource>,
        alerts: AlertConfig,
    ) -> Self {
        let sound_enabled = preferences::sound_enabled(preferences.as_ref());
        Self {
            preferences,
            audio,
            surface,
            interactions,
            alerts,
            listeners: ListenerRegistry::new(),
            sound_enabled: AtomicBool::new(sound_enabled),
            unlock_armed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn handle(&self, notification: Notification, channel: DeliveryChannel) {
        info!(
            channel = channel.as_str(),
            title = %notification.title,
            "Notification received"
        );
        metrics::record_notification(channel.as_str());

        self.play_alert().await;

        let platform = self.to_platform_notification(&notification);
        self.listeners.dispatch(&DispatchEvent::Notification {
            notification,
            channel,
        });

        self.show_platform_notification(platform).await;
    }

    /// Play the alert sound unless muted
    ///
    /// An autoplay rejection arms a one-shot unlock: the next user
    /// interaction plays the silent clip so later alerts are audible.
    pub async fn play_alert(&self) {
        if !self.sound_enabled() {
            debug!("Notification sound disabled, skipping");
            return;
        }

        match self
            .audio
            .play(&self.alerts.sound_url)
            .await
            .map_err(ClientError::from)
        {
            Ok(()) => {}
            Err(ClientError::PlaybackBlocked) => {
                warn!("Sound playback blocked until user interaction");
                self.arm_audio_unlock();
            }
            Err(e) => error!("Error playing notification sound: {}", e),
        }
    }

    /// Whether an audio unlock is waiting for a user interaction
    pub fn audio_unlock_armed(&self) -> bool {
        self.unlock_armed.load(Ordering::SeqCst)
    }

    fn arm_audio_unlock(&self) {
        if self.unlock_armed.swap(true, Ordering::SeqCst) {
            return;
        }

        let audio = self.audio.clone();
        let interactions = self.interactions.clone();
        let armed = self.unlock_armed.clone();
        let silent = self.alerts.silent_sound_url.clone();

        tokio::spawn(async move {
            let interaction = interactions.next_interaction().await;
            debug!(?interaction, "Unlocking audio playback");
            match audio.play(&silent).await {
                Ok(()) => info!("Audio playback unlocked"),
                Err(e) => warn!("Audio unlock failed: {}", e),
            }
            armed.store(false, Ordering::SeqCst);
        });
    }

    fn to_platform_notification(&self, notification: &Notification) -> PlatformNotification {
        let title = if notification.title.is_empty() {
            DEFAULT_TITLE.to_string()
        } else {
            notification.title.clone()
        };
        let body = if notification.body.is_empty() {
            serde_json::to_string(&notification.data).unwrap_or_default()
        } else {
            notification.body.clone()
        };

        PlatformNotification {
            title,
            body,
            icon: self.alerts.icon_url.clone(),
            data: notification.data.clone(),
            actions: notification.actions.clone(),
            require_interaction: notification.require_interaction,
            auto_close: Some(AUTO_CLOSE_AFTER),
        }
    }

    async fn show_platform_notification(&self, notification: PlatformNotification) {
        if !self.surface.is_supported() {
            debug!("Platform notifications unsupported");
            return;
        }
        if self.surface.permission() != PermissionState::Granted {
            debug!("Notification permission not granted, skipping platform notification");
            return;
        }

        match self.surface.show(notification).await {
            Ok(()) => metrics::record_platform_notification(),
            Err(e) => error!("Failed to show platform notification: {}", e),
        }
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled.load(Ordering::SeqCst)
    }

    /// Persist the sound toggle; the in-memory value changes even if persisting fails
    pub fn set_sound_enabled(&self, enabled: bool) -> Result<()> {
        self.sound_enabled.store(enabled, Ordering::SeqCst);
        preferences::set_sound_enabled(self.preferences.as_ref(), enabled)
    }

    pub fn add_listener<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&DispatchEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.listeners.add(kind, Arc::new(listener))
    }

    pub fn add_listener_arc(&self, kind: EventKind, listener: Arc<dyn Listener>) -> ListenerId {
        self.listeners.add(kind, listener)
    }

    pub fn remove_listener(&self, kind: EventKind, id: ListenerId) -> bool {
        self.listeners.remove(kind, id)
    }

    /// Deliver a non-notification event to listeners
    pub fn dispatch(&self, event: &DispatchEvent) -> usize {
        self.listeners.dispatch(event)
    }
}
