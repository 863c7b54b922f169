use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Distinguishes between retryable and permanent errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Retryable,
    Permanent,
}

#[derive(Debug, Error, Clone)]
pub enum ClientError {
    /// Transport-level failure; retried with backoff up to the cap
    #[error("connection error: {0}")]
    Connection(String),

    /// Platform refused notification permission; terminal for the session
    #[error("notification permission denied")]
    PermissionDenied,

    /// Push subscription exchange failed; logged, never blocking
    #[error("push subscription error: {0}")]
    Subscription(String),

    /// Audio playback rejected by an autoplay policy
    #[error("playback blocked by autoplay policy")]
    PlaybackBlocked,

    /// Any other audio playback failure
    #[error("playback failed: {0}")]
    Playback(String),

    /// Required platform capability is absent
    #[error("platform unsupported: {0}")]
    PlatformUnsupported(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("preference store error: {0}")]
    Preferences(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("http error: {0}")]
    Http(String),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Connection(_) => ErrorKind::Retryable,
            _ => ErrorKind::Permanent,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Retryable
    }
}

impl From<crate::platform::PlaybackError> for ClientError {
    fn from(e: crate::platform::PlaybackError) -> Self {
        use crate::platform::PlaybackError;
        match e {
            PlaybackError::AutoplayBlocked => ClientError::PlaybackBlocked,
            PlaybackError::Failed(reason) => ClientError::Playback(reason),
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Protocol(e.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        ClientError::Connection(e.to_string())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Http(e.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(e: std::io::Error) -> Self {
        ClientError::Preferences(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_connection_errors_are_retryable() {
        assert!(ClientError::Connection("reset".into()).is_retryable());
        assert!(!ClientError::PermissionDenied.is_retryable());
        assert!(!ClientError::Subscription("no key".into()).is_retryable());
        assert!(!ClientError::PlaybackBlocked.is_retryable());
        assert_eq!(
            ClientError::PlatformUnsupported("push".into()).kind(),
            ErrorKind::Permanent
        );
    }

    #[test]
    fn test_playback_errors_map_to_client_errors() {
        use crate::platform::PlaybackError;

        assert!(matches!(
            ClientError::from(PlaybackError::AutoplayBlocked),
            ClientError::PlaybackBlocked
        ));
        assert!(matches!(
            ClientError::from(PlaybackError::Failed("no device".into())),
            ClientError::Playback(reason) if reason == "no device"
        ));
    }
}
