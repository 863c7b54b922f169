/// Typed dispatcher events and the listener registry
use crate::metrics;
use crate::models::DeliveryChannel;
use crate::transport::TransportFailure;
use event_schema::Notification;
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Connected,
    Disconnected,
    Notification,
    Subscribed,
    Unsubscribed,
    Error,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Connected => "connected",
            EventKind::Disconnected => "disconnected",
            EventKind::Notification => "notification",
            EventKind::Subscribed => "subscribed",
            EventKind::Unsubscribed => "unsubscribed",
            EventKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchEvent {
    Connected,
    Disconnected,
    Notification {
        notification: Notification,
        channel: DeliveryChannel,
    },
    Subscribed(Value),
    Unsubscribed(Value),
    Error(TransportFailure),
}

impl DispatchEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            DispatchEvent::Connected => EventKind::Connected,
            DispatchEvent::Disconnected => EventKind::Disconnected,
            DispatchEvent::Notification { .. } => EventKind::Notification,
            DispatchEvent::Subscribed(_) => EventKind::Subscribed,
            DispatchEvent::Unsubscribed(_) => EventKind::Unsubscribed,
            DispatchEvent::Error(_) => EventKind::Error,
        }
    }
}

/// Event callback
///
/// Returning an error (or panicking) is logged and never stops delivery to
/// the remaining listeners.
pub trait Listener: Send + Sync {
    fn on_event(&self, event: &DispatchEvent) -> anyhow::Result<()>;
}

impl<F> Listener for F
where
    F: Fn(&DispatchEvent) -> anyhow::Result<()> + Send + Sync,
{
    fn on_event(&self, event: &DispatchEvent) -> anyhow::Result<()> {
        self(event)
    }
}

/// Handle returned on registration, used for removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type ListenerList = Vec<(ListenerId, Arc<dyn Listener>)>;

#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: RwLock<HashMap<EventKind, ListenerList>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, kind: EventKind, listener: Arc<dyn Listener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut listeners = self.listeners.write().unwrap_or_else(|e| e.into_inner());
        listeners.entry(kind).or_default().push((id, listener));
        id
    }

    /// Remove a listener; order of the remaining listeners may change
    pub fn remove(&self, kind: EventKind, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(|e| e.into_inner());
        match listeners.get_mut(&kind) {
            Some(list) => match list.iter().position(|(existing, _)| *existing == id) {
                Some(idx) => {
                    list.swap_remove(idx);
                    true
                }
                None => false,
            },
            None => false,
        }
    }

    pub fn count(&self, kind: EventKind) -> usize {
        let listeners = self.listeners.read().unwrap_or_else(|e| e.into_inner());
        listeners.get(&kind).map(|l| l.len()).unwrap_or(0)
    }

    /// Deliver to every listener of the event's kind; returns how many succeeded
    pub fn dispatch(&self, event: &DispatchEvent) -> usize {
        let kind = event.kind();
        // Snapshot so listeners may (un)register while being called
        let snapshot: ListenerList = {
            let listeners = self.listeners.read().unwrap_or_else(|e| e.into_inner());
            listeners.get(&kind).cloned().unwrap_or_default()
        };

        let mut delivered = 0;
        for (id, listener) in snapshot {
            match catch_unwind(AssertUnwindSafe(|| listener.on_event(event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => {
                    error!(listener = ?id, "Error in {} event handler: {:#}", kind.as_str(), e);
                    metrics::record_listener_failure(kind.as_str());
                }
                Err(_) => {
                    error!(listener = ?id, "Panic in {} event handler", kind.as_str());
                    metrics::record_listener_failure(kind.as_str());
                }
            }
        }
        delivered
    }
}
