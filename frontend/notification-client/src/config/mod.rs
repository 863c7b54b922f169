use crate::error::{ClientError, Result};
use resilience::ReconnectPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub transport: TransportConfig,
    pub push: PushConfig,
    pub alerts: AlertConfig,
    pub topics: TopicConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub env: String,
    /// Key-value preference store file (customer id, sound toggle)
    pub preferences_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    pub server_url: String,
    pub reconnect_base_delay_ms: u64,
    pub reconnect_max_attempts: u32,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    pub api_base_url: String,
    /// Application server (VAPID) public key, URL-safe base64
    pub vapid_public_key: Option<String>,
    pub http_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    pub sound_url: String,
    pub silent_sound_url: String,
    pub icon_url: String,
}

/// Topics the binary subscribes to at start-up
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopicConfig {
    pub table_id: Option<String>,
    pub restaurant_id: Option<String>,
    pub user_id: Option<String>,
}

impl TransportConfig {
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            base_delay: Duration::from_millis(self.reconnect_base_delay_ms),
            max_attempts: self.reconnect_max_attempts,
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:5000".to_string(),
            reconnect_base_delay_ms: 2000,
            reconnect_max_attempts: 5,
            connect_timeout_secs: 10,
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            sound_url: "/static/sounds/notification.mp3".to_string(),
            silent_sound_url: "/static/sounds/silent.mp3".to_string(),
            icon_url: "/static/img/logo.png".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let transport_defaults = TransportConfig::default();
        let alert_defaults = AlertConfig::default();

        let server_url = lookup("NOTIFY_SERVER_URL").unwrap_or(transport_defaults.server_url);

        Ok(Config {
            app: AppConfig {
                env: lookup("APP_ENV").unwrap_or_else(|| "development".to_string()),
                preferences_path: lookup("NOTIFY_PREFERENCES_PATH")
                    .unwrap_or_else(|| "./notification-preferences.json".to_string()),
            },
            push: PushConfig {
                api_base_url: lookup("NOTIFY_API_BASE_URL").unwrap_or_else(|| server_url.clone()),
                vapid_public_key: lookup("NOTIFY_VAPID_PUBLIC_KEY").filter(|k| !k.is_empty()),
                http_timeout_secs: parse_or(&lookup, "NOTIFY_HTTP_TIMEOUT_SECS", 10)?,
            },
            transport: TransportConfig {
                server_url,
                reconnect_base_delay_ms: parse_or(
                    &lookup,
                    "NOTIFY_RECONNECT_BASE_DELAY_MS",
                    transport_defaults.reconnect_base_delay_ms,
                )?,
                reconnect_max_attempts: parse_or(
                    &lookup,
                    "NOTIFY_RECONNECT_MAX_ATTEMPTS",
                    transport_defaults.reconnect_max_attempts,
                )?,
                connect_timeout_secs: parse_or(
                    &lookup,
                    "NOTIFY_CONNECT_TIMEOUT_SECS",
                    transport_defaults.connect_timeout_secs,
                )?,
            },
            alerts: AlertConfig {
                sound_url: lookup("NOTIFY_SOUND_URL").unwrap_or(alert_defaults.sound_url),
                silent_sound_url: lookup("NOTIFY_SILENT_SOUND_URL")
                    .unwrap_or(alert_defaults.silent_sound_url),
                icon_url: lookup("NOTIFY_ICON_URL").unwrap_or(alert_defaults.icon_url),
            },
            topics: TopicConfig {
                table_id: lookup("NOTIFY_TABLE_ID"),
                restaurant_id: lookup("NOTIFY_RESTAURANT_ID"),
                user_id: lookup("NOTIFY_USER_ID"),
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| ClientError::Config(format!("{}={:?}: {}", key, raw, e))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.transport.server_url, "http://localhost:5000");
        assert_eq!(config.push.api_base_url, "http://localhost:5000");
        assert_eq!(
            config.transport.reconnect_policy(),
            ReconnectPolicy {
                base_delay: Duration::from_millis(2000),
                max_attempts: 5
            }
        );
        assert!(config.push.vapid_public_key.is_none());
        assert_eq!(config.alerts.sound_url, "/static/sounds/notification.mp3");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("NOTIFY_SERVER_URL", "https://waiter.example"),
            ("NOTIFY_RECONNECT_MAX_ATTEMPTS", "3"),
            ("NOTIFY_VAPID_PUBLIC_KEY", "BFr9Qol"),
            ("NOTIFY_TABLE_ID", "42"),
        ]))
        .unwrap();

        assert_eq!(config.push.api_base_url, "https://waiter.example");
        assert_eq!(config.transport.reconnect_max_attempts, 3);
        assert_eq!(config.push.vapid_public_key.as_deref(), Some("BFr9Qol"));
        assert_eq!(config.topics.table_id.as_deref(), Some("42"));
    }

    #[test]
    fn test_invalid_number_is_config_error() {
        let result = Config::from_lookup(lookup_from(&[("NOTIFY_CONNECT_TIMEOUT_SECS", "soon")]));
        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[test]
    fn test_empty_vapid_key_is_absent() {
        let config = Config::from_lookup(lookup_from(&[("NOTIFY_VAPID_PUBLIC_KEY", "")])).unwrap();
        assert!(config.push.vapid_public_key.is_none());
    }
}
