/// Notification dispatch
///
/// Listeners register per event kind; every received notification also goes
/// through sound and platform-notification alerting.
pub mod events;
pub mod notifier;

pub use events::{DispatchEvent, EventKind, Listener, ListenerId, ListenerRegistry};
pub use notifier::NotificationDispatcher;
