use crate::cache::CacheStorage;
use crate::click::{resolve_click, ClickTarget};
use crate::clients::{NotificationDisplay, WindowClients};
use crate::config::WorkerConfig;
use crate::errors::{Result, WorkerError};
use crate::fetch::{FetchOutcome, FetchRequest, FetchRouter, Network};
use crate::lifecycle::{Lifecycle, WorkerState};
use crate::render::{parse_push_payload, render};
use event_schema::Notification;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    Dismissed,
    /// An open page already showed the target
    Focused { client_id: String, url: String },
    Opened { url: String },
}

/// Background delivery worker
///
/// One instance per worker version. Platform events arrive through the
/// `install`, `activate`, `on_fetch`, `on_push` and `on_notification_click`
/// entry points.
pub struct BackgroundWorker {
    config: WorkerConfig,
    lifecycle: Mutex<Lifecycle>,
    cache: Arc<dyn CacheStorage>,
    router: FetchRouter,
    clients: Arc<dyn WindowClients>,
    display: Arc<dyn NotificationDisplay>,
}

impl BackgroundWorker {
    pub fn new(
        config: WorkerConfig,
        cache: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
        clients: Arc<dyn WindowClients>,
        display: Arc<dyn NotificationDisplay>,
    ) -> Self {
        let router = FetchRouter::new(
            cache.clone(),
            network,
            config.cache_name.clone(),
            config.api_marker.clone(),
        );
        Self {
            config,
            lifecycle: Mutex::new(Lifecycle::new()),
            cache,
            router,
            clients,
            display,
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub async fn state(&self) -> WorkerState {
        self.lifecycle.lock().await.state()
    }

    /// Pre-cache the offline shell
    ///
    /// Assets that fail to download are logged and skipped; installation
    /// still completes.
    pub async fn install(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle.state() != WorkerState::Installing {
            return Err(WorkerError::InvalidTransition {
                from: lifecycle.state(),
                to: WorkerState::Installed,
            });
        }
        info!(cache = %self.config.cache_name, "[Worker] Installing...");

        let mut cached = 0;
        for asset in &self.config.assets {
            match self.router.precache(asset).await {
                Ok(()) => cached += 1,
                Err(e) => error!(asset = %asset, "[Worker] Cache install error: {}", e),
            }
        }
        info!(
            cached,
            total = self.config.assets.len(),
            "[Worker] Cached app shell and content"
        );

        lifecycle.transition(WorkerState::Installed)
    }

    /// Drop caches of other versions, then take control of open pages
    pub async fn activate(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock().await;
        lifecycle.transition(WorkerState::Activating)?;
        info!("[Worker] Activating...");

        self.evict_old_caches().await;

        if let Err(e) = self.clients.claim().await {
            warn!("[Worker] Failed to claim clients: {}", e);
        }

        lifecycle.transition(WorkerState::Activated)
    }

    /// Eviction failures are logged; activation never waits on cleanup
    async fn evict_old_caches(&self) {
        let names = match self.cache.cache_names().await {
            Ok(names) => names,
            Err(e) => {
                error!("[Worker] Failed to list caches: {}", e);
                return;
            }
        };

        for name in names {
            if name == self.config.cache_name {
                continue;
            }
            info!(cache = %name, "[Worker] Removing old cache");
            if let Err(e) = self.cache.delete(&name).await {
                error!(cache = %name, "[Worker] Failed to remove old cache: {}", e);
            }
        }
    }

    pub async fn on_fetch(&self, request: &FetchRequest) -> Result<FetchOutcome> {
        self.router.handle(request).await
    }

    /// Show a push payload as a platform notification and relay it to open pages
    pub async fn on_push(&self, payload: Option<&[u8]>) -> Result<Notification> {
        info!("[Worker] Push received");
        let notification = parse_push_payload(payload, &self.config);
        let rendered = render(&notification, &self.config);

        self.display
            .show(&rendered)
            .await
            .map_err(|e| WorkerError::Display(e.to_string()))?;

        self.relay(&notification).await;
        Ok(notification)
    }

    async fn relay(&self, notification: &Notification) {
        let clients = match self.clients.list().await {
            Ok(clients) => clients,
            Err(e) => {
                warn!("[Worker] Cannot list clients for relay: {}", e);
                return;
            }
        };

        for client in clients {
            if let Err(e) = self.clients.post_message(&client.id, notification).await {
                warn!(client = %client.id, "[Worker] Relay to page failed: {}", e);
            }
        }
    }

    /// Close the notification and bring the user to its target page
    pub async fn on_notification_click(
        &self,
        notification: &Notification,
        action: Option<&str>,
    ) -> Result<ClickOutcome> {
        debug!(title = %notification.title, ?action, "[Worker] Notification click received");

        if let Err(e) = self.display.close(notification).await {
            warn!("[Worker] Failed to close notification: {}", e);
        }

        let url = match resolve_click(&notification.hints(), action) {
            ClickTarget::Dismiss => return Ok(ClickOutcome::Dismissed),
            ClickTarget::Open(url) => url,
        };

        let open = self.clients.list().await?;
        if let Some(client) = open.into_iter().find(|c| c.url == url) {
            self.clients.focus(&client.id).await?;
            return Ok(ClickOutcome::Focused {
                client_id: client.id,
                url,
            });
        }

        self.clients.open(&url).await?;
        Ok(ClickOutcome::Opened { url })
    }
}
