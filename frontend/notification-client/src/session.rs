/// Notification session
///
/// Composition root for one page: wires the transport client, the
/// dispatcher and the push subscription manager together and forwards
/// transport events into the dispatcher from a background task.
use crate::config::Config;
use crate::dispatcher::{DispatchEvent, NotificationDispatcher};
use crate::error::Result;
use crate::models::DeliveryChannel;
use crate::platform::PlatformServices;
use crate::preferences::{self, PreferenceStore};
use crate::push::{PushBackend, PushIdentity, PushSubscriptionManager};
use crate::transport::{Connector, TransportClient, TransportEvent};
use event_schema::{Notification, Topic, TopicKind};
use futures::StreamExt;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

pub struct NotificationSession {
    transport: Arc<TransportClient>,
    dispatcher: Arc<NotificationDispatcher>,
    push: Arc<PushSubscriptionManager>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl NotificationSession {
    pub fn new(
        config: &Config,
        connector: Arc<dyn Connector>,
        preferences: Arc<dyn PreferenceStore>,
        backend: Arc<dyn PushBackend>,
        platform: PlatformServices,
    ) -> Result<Self> {
        let customer_id = preferences::customer_id(preferences.as_ref())?;

        let transport = Arc::new(TransportClient::new(
            connector,
            config.transport.reconnect_policy(),
            config.transport.connect_timeout(),
            customer_id.clone(),
        ));

        let dispatcher = Arc::new(NotificationDispatcher::new(
            preferences,
            platform.audio,
            platform.surface.clone(),
            platform.interactions,
            config.alerts.clone(),
        ));

        let push = Arc::new(PushSubscriptionManager::new(
            platform.push,
            backend,
            platform.surface,
            config.push.vapid_public_key.clone(),
            PushIdentity {
                user_id: config.topics.user_id.clone(),
                restaurant_id: config.topics.restaurant_id.clone(),
                customer_id: Some(customer_id),
            },
        ));

        Ok(Self {
            transport,
            dispatcher,
            push,
            pump: Mutex::new(None),
        })
    }

    pub fn transport(&self) -> &Arc<TransportClient> {
        &self.transport
    }

    pub fn dispatcher(&self) -> &Arc<NotificationDispatcher> {
        &self.dispatcher
    }

    pub fn push(&self) -> &Arc<PushSubscriptionManager> {
        &self.push
    }

    /// Start forwarding events, connect, then set up push delivery
    pub async fn start(&self) {
        self.start_pump();
        self.transport.connect().await;

        if self.push.enable().await {
            info!("Push delivery enabled");
        } else {
            info!("Push delivery unavailable, continuing socket-only");
        }
    }

    fn start_pump(&self) {
        let mut pump = self.pump.lock().unwrap_or_else(|e| e.into_inner());
        if pump.as_ref().map(|h| !h.is_finished()).unwrap_or(false) {
            return;
        }

        let events = self.transport.events();
        let dispatcher = self.dispatcher.clone();
        *pump = Some(tokio::spawn(async move {
            futures::pin_mut!(events);
            while let Some(event) = events.next().await {
                route(&dispatcher, event).await;
            }
        }));
    }

    /// Subscribe to a topic; restaurant and user ids also travel with the push credential
    pub async fn subscribe(&self, topic: Topic) {
        self.track_push_identity(&topic);
        self.transport.subscribe(topic).await;
    }

    /// Subscribe to a batch of topics that must all survive a late connect
    pub async fn subscribe_all(&self, topics: Vec<Topic>) {
        for topic in &topics {
            self.track_push_identity(topic);
        }
        self.transport.subscribe_all(topics).await;
    }

    fn track_push_identity(&self, topic: &Topic) {
        match topic.kind() {
            TopicKind::Restaurant => self.push.set_restaurant_id(topic.id()),
            TopicKind::User => self.push.set_user_id(topic.id()),
            TopicKind::Table => {}
        }
    }

    pub async fn unsubscribe(&self, topic: &Topic) {
        self.transport.unsubscribe(topic).await;
    }

    /// Feed a notification relayed by the background delivery worker
    pub async fn deliver_push(&self, notification: Notification) {
        self.dispatcher
            .handle(notification, DeliveryChannel::Push)
            .await;
    }

    /// Disconnect, stop reconnecting and stop forwarding events
    pub async fn shutdown(&self) {
        self.transport.disconnect().await;

        let pump = self.pump.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(pump) = pump {
            pump.abort();
        }
        info!("Notification session shut down");
    }
}

async fn route(dispatcher: &NotificationDispatcher, event: TransportEvent) {
    match event {
        TransportEvent::Notification(notification) => {
            dispatcher
                .handle(notification, DeliveryChannel::Socket)
                .await
        }
        TransportEvent::PlaySound => dispatcher.play_alert().await,
        TransportEvent::Connected => {
            dispatcher.dispatch(&DispatchEvent::Connected);
        }
        TransportEvent::Disconnected => {
            dispatcher.dispatch(&DispatchEvent::Disconnected);
        }
        TransportEvent::Subscribed(data) => {
            dispatcher.dispatch(&DispatchEvent::Subscribed(data));
        }
        TransportEvent::Unsubscribed(data) => {
            dispatcher.dispatch(&DispatchEvent::Unsubscribed(data));
        }
        TransportEvent::Error(failure) => {
            dispatcher.dispatch(&DispatchEvent::Error(failure));
        }
        TransportEvent::ReconnectScheduled { attempt, delay } => {
            debug!(attempt, ?delay, "Reconnect scheduled");
        }
    }
}
