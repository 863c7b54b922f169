/// Background Delivery Worker
///
/// Runs independently of any open page and survives page closure. It
/// handles:
/// - Install/activate lifecycle with a versioned offline asset cache
/// - Cache-first fetch routing for static assets (API calls bypass the cache)
/// - Rendering push payloads as platform notifications
/// - Routing notification clicks to the right in-app page
/// - Relaying push notifications to open pages

pub mod cache;
pub mod click;
pub mod clients;
pub mod config;
pub mod errors;
pub mod fetch;
pub mod lifecycle;
pub mod render;
pub mod worker;

pub use cache::{CacheStorage, CachedResponse, MemoryCacheStorage};
pub use click::{resolve_click, ClickTarget};
pub use clients::{NotificationDisplay, WindowClient, WindowClients};
pub use config::WorkerConfig;
pub use errors::{Result, WorkerError};
pub use fetch::{
    FetchOutcome, FetchRequest, FetchResponse, FetchRouter, HttpNetwork, Network, ResponseType,
};
pub use lifecycle::{Lifecycle, WorkerState};
pub use render::{parse_push_payload, render, NotificationOptions, RenderedNotification};
pub use worker::{BackgroundWorker, ClickOutcome};
