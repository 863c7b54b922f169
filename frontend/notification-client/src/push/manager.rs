use super::{decode_application_server_key, PushBackend, PushPlatform, WorkerRegistration};
use crate::error::{ClientError, Result};
use crate::platform::{NotificationSurface, PermissionState};
use event_schema::{PushSubscriptionCredential, SubscribeRequest, UnsubscribeRequest};
use std::sync::{Arc, RwLock};
use tracing::{debug, error, info, warn};

/// Identifiers sent with the credential so the backend can target this device
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushIdentity {
    pub user_id: Option<String>,
    pub restaurant_id: Option<String>,
    pub customer_id: Option<String>,
}

pub struct PushSubscriptionManager {
    platform: Arc<dyn PushPlatform>,
    backend: Arc<dyn PushBackend>,
    surface: Arc<dyn NotificationSurface>,
    application_server_key: Option<String>,
    identity: RwLock<PushIdentity>,
    registration: RwLock<Option<WorkerRegistration>>,
    credential: RwLock<Option<PushSubscriptionCredential>>,
}

impl PushSubscriptionManager {
    pub fn new(
        platform: Arc<dyn PushPlatform>,
        backend: Arc<dyn PushBackend>,
        surface: Arc<dyn NotificationSurface>,
        application_server_key: Option<String>,
        identity: PushIdentity,
    ) -> Self {
        Self {
            platform,
            backend,
            surface,
            application_server_key,
            identity: RwLock::new(identity),
            registration: RwLock::new(None),
            credential: RwLock::new(None),
        }
    }

    pub fn identity(&self) -> PushIdentity {
        self.identity.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn set_user_id(&self, user_id: impl Into<String>) {
        self.identity.write().unwrap_or_else(|e| e.into_inner()).user_id = Some(user_id.into());
    }

    pub fn set_restaurant_id(&self, restaurant_id: impl Into<String>) {
        self.identity
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .restaurant_id = Some(restaurant_id.into());
    }

    pub fn registration(&self) -> Option<WorkerRegistration> {
        self.registration.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn credential(&self) -> Option<PushSubscriptionCredential> {
        self.credential.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Register the background delivery worker
    ///
    /// `PlatformUnsupported` is returned (and logged) when the platform has
    /// no worker or push support.
    pub async fn register_background_worker(&self) -> Result<WorkerRegistration> {
        if !self.platform.is_supported() {
            warn!("Push notifications are not supported on this platform");
            return Err(ClientError::PlatformUnsupported(
                "background worker or push service unavailable".to_string(),
            ));
        }

        match self.platform.register_worker(super::WORKER_SCRIPT_URL).await {
            Ok(registration) => {
                info!(scope = %registration.scope, "Background worker registered");
                *self.registration.write().unwrap_or_else(|e| e.into_inner()) =
                    Some(registration.clone());
                Ok(registration)
            }
            Err(e) => {
                error!("Background worker registration failed: {}", e);
                Err(e)
            }
        }
    }

    /// Ask for notification permission
    ///
    /// Prompts once per call while the state is undecided; a previous denial
    /// is returned without prompting again.
    pub async fn request_permission(&self) -> Result<()> {
        if !self.surface.is_supported() {
            return Err(ClientError::PlatformUnsupported(
                "platform notifications unavailable".to_string(),
            ));
        }

        let state = match self.surface.permission() {
            PermissionState::Denied => PermissionState::Denied,
            PermissionState::Granted => PermissionState::Granted,
            PermissionState::Default => self.surface.request_permission().await,
        };

        match state {
            PermissionState::Granted => {
                info!("Notification permission granted");
                Ok(())
            }
            _ => {
                info!("Notification permission denied");
                Err(ClientError::PermissionDenied)
            }
        }
    }

    /// Obtain a push credential and upload it to the backend
    ///
    /// An existing credential is reused (and uploaded again). The upload's
    /// outcome is logged and never fails this call.
    pub async fn subscribe(&self) -> Result<PushSubscriptionCredential> {
        if self.registration().is_none() {
            return Err(ClientError::Subscription(
                "background worker not registered".to_string(),
            ));
        }

        let credential = match self.platform.existing_subscription().await {
            Ok(Some(existing)) => {
                info!("Using existing push subscription");
                existing
            }
            Ok(None) => self.create_subscription().await?,
            Err(e) => {
                error!("Failed to subscribe to push notifications: {}", e);
                return Err(ClientError::Subscription(e.to_string()));
            }
        };

        *self.credential.write().unwrap_or_else(|e| e.into_inner()) = Some(credential.clone());
        self.send_subscription_to_backend(&credential).await;
        Ok(credential)
    }

    async fn create_subscription(&self) -> Result<PushSubscriptionCredential> {
        let key = match self.application_server_key.as_deref() {
            Some(key) => key,
            None => {
                error!("Application server key not configured");
                return Err(ClientError::Subscription(
                    "application server key not configured".to_string(),
                ));
            }
        };
        let key = decode_application_server_key(key)?;

        match self.platform.subscribe(key).await {
            Ok(credential) => {
                info!(endpoint = %credential.endpoint, "Created new push subscription");
                Ok(credential)
            }
            Err(e) => {
                error!("Failed to subscribe to push notifications: {}", e);
                Err(ClientError::Subscription(e.to_string()))
            }
        }
    }

    async fn send_subscription_to_backend(&self, credential: &PushSubscriptionCredential) {
        let identity = self.identity();
        let request = SubscribeRequest {
            subscription: credential.clone(),
            user_id: identity.user_id,
            restaurant_id: identity.restaurant_id,
            customer_id: identity.customer_id,
        };

        match self.backend.subscribe(&request).await {
            Ok(response) if response.success => info!("Push subscription saved on server"),
            Ok(response) => error!(
                "Failed to save push subscription: {}",
                response.message.unwrap_or_default()
            ),
            Err(e) => error!("Error sending push subscription to server: {}", e),
        }
    }

    /// Revoke the credential and tell the backend; no-op without a credential
    pub async fn unsubscribe(&self) -> Result<()> {
        let credential = match self.credential() {
            Some(credential) => credential,
            None => {
                debug!("No push subscription to revoke");
                return Ok(());
            }
        };

        let revoked = self.platform.unsubscribe(&credential).await.map_err(|e| {
            error!("Error unsubscribing from push notifications: {}", e);
            ClientError::Subscription(e.to_string())
        })?;
        if !revoked {
            warn!("Platform refused to revoke push subscription");
            return Ok(());
        }

        *self.credential.write().unwrap_or_else(|e| e.into_inner()) = None;
        info!("Unsubscribed from push notifications");

        let identity = self.identity();
        let request = UnsubscribeRequest {
            user_id: identity.user_id,
            restaurant_id: identity.restaurant_id,
            customer_id: identity.customer_id,
        };
        match self.backend.unsubscribe(&request).await {
            Ok(response) if response.success => debug!("Push subscription removed on server"),
            Ok(response) => error!(
                "Failed to remove push subscription: {}",
                response.message.unwrap_or_default()
            ),
            Err(e) => error!("Error sending push unsubscribe to server: {}", e),
        }
        Ok(())
    }

    /// Register, obtain permission and subscribe, logging every failure
    ///
    /// Returns whether push delivery ended up enabled.
    pub async fn enable(&self) -> bool {
        if self.register_background_worker().await.is_err() {
            return false;
        }
        if let Err(e) = self.request_permission().await {
            debug!("Push disabled: {}", e);
            return false;
        }
        self.subscribe().await.is_ok()
    }
}
