use event_schema::Topic;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Transport connection status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
        }
    }
}

/// Channel a notification arrived on
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryChannel {
    /// Persistent socket connection
    Socket,
    /// Push message relayed by the background delivery worker
    Push,
}

impl DeliveryChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryChannel::Socket => "socket",
            DeliveryChannel::Push => "push",
        }
    }
}

/// Per-page client session state
///
/// Reset on every page load; only the sound preference survives, through
/// the preference store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub connection_status: ConnectionStatus,
    /// Topics replayed after every successful (re)connect
    pub active_topics: HashSet<Topic>,
    /// Most recent topic requested while disconnected
    pub pending_topic: Option<Topic>,
    pub reconnect_attempt: u32,
    /// Set once the reconnect cap is exhausted; cleared by an explicit connect
    pub gave_up: bool,
}

impl SessionState {
    pub fn is_connected(&self) -> bool {
        self.connection_status == ConnectionStatus::Connected
    }

    /// Move the pending topic into the active set and return every topic to replay
    pub fn take_replay_set(&mut self) -> Vec<Topic> {
        if let Some(topic) = self.pending_topic.take() {
            self.active_topics.insert(topic);
        }
        self.active_topics.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_disconnected() {
        let state = SessionState::default();
        assert_eq!(state.connection_status, ConnectionStatus::Disconnected);
        assert!(state.active_topics.is_empty());
        assert_eq!(state.reconnect_attempt, 0);
    }

    #[test]
    fn test_replay_set_includes_pending_once() {
        let mut state = SessionState::default();
        state.active_topics.insert(Topic::restaurant("1"));
        state.pending_topic = Some(Topic::table("42"));

        let mut replay = state.take_replay_set();
        replay.sort_by_key(|t| t.to_string());
        assert_eq!(replay, vec![Topic::restaurant("1"), Topic::table("42")]);
        assert!(state.pending_topic.is_none());

        // second replay has no duplicate of the former pending topic
        assert_eq!(state.take_replay_set().len(), 2);
    }
}
