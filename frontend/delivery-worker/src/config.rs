use serde::{Deserialize, Serialize};

/// Static worker configuration
///
/// Bumping `cache_name` on release makes activation discard every older
/// asset cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkerConfig {
    pub cache_name: String,
    /// Pre-cached on install for offline shell rendering
    pub assets: Vec<String>,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub default_title: String,
    pub default_body: String,
    /// Requests whose URL contains this marker never touch the cache
    pub api_marker: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cache_name: "digital-waiter-cache-v1".to_string(),
            assets: [
                "/",
                "/static/css/style.css",
                "/static/js/main.js",
                "/static/js/socket_notifications.js",
                "/static/sounds/notification.mp3",
                "/static/img/logo.png",
                "/static/img/badge.png",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            icon: "/static/img/logo.png".to_string(),
            badge: "/static/img/badge.png".to_string(),
            vibrate: vec![200, 100, 200],
            default_title: "Digital Waiter".to_string(),
            default_body: "New notification".to_string(),
            api_marker: "/api/".to_string(),
        }
    }
}
