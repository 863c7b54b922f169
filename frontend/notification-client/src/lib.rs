pub mod config;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod platform;
pub mod preferences;
pub mod push;
pub mod session;
pub mod socketio;
pub mod transport;

pub use config::Config;
pub use dispatcher::{DispatchEvent, EventKind, NotificationDispatcher};
pub use error::{ClientError, Result};
pub use models::{ConnectionStatus, DeliveryChannel, SessionState};
pub use preferences::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore};
pub use push::PushSubscriptionManager;
pub use session::NotificationSession;
pub use transport::{TransportClient, TransportEvent};
