/// Wire schema shared by the page context and the background delivery worker
///
/// The two execution contexts never share memory. Everything they exchange
/// with each other or with the backend (socket events, push payloads, push
/// subscription bodies) is defined here so both sides agree on the shape.
pub mod notification;
pub mod push;
pub mod socket;
pub mod topic;

// Re-export commonly used types
pub use notification::{Notification, NotificationAction, NotificationKind, RoutingHints};
pub use push::{
    BackendResponse, PushKeys, PushSubscriptionCredential, SubscribeRequest, UnsubscribeRequest,
    SUBSCRIBE_PATH, UNSUBSCRIBE_PATH,
};
pub use socket::{ClientEvent, ServerEvent};
pub use topic::{Topic, TopicKind};

/// Persisted client-side preference keys
pub mod keys {
    pub const CUSTOMER_ID: &str = "customerId";
    pub const SOUND_ENABLED: &str = "notificationSoundEnabled";
    pub const THEME: &str = "theme";
}
