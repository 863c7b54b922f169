#![allow(dead_code)]

use async_trait::async_trait;
use event_schema::{
    BackendResponse, ClientEvent, PushSubscriptionCredential, ServerEvent, SubscribeRequest,
    UnsubscribeRequest,
};
use notification_client::error::{ClientError, Result};
use notification_client::platform::headless::UnsupportedPushPlatform;
use notification_client::platform::{
    AudioPlayer, Interaction, InteractionSource, NotificationSurface, PermissionState,
    PlatformNotification, PlatformServices, PlaybackError,
};
use notification_client::push::PushBackend;
use notification_client::transport::{Connection, Connector, TransportEvent};
use notification_client::Config;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, Notify};

/// Server side of a fake connection
pub struct ServerHandle {
    pub sent: mpsc::UnboundedReceiver<ClientEvent>,
    pub inbound: mpsc::UnboundedSender<Result<ServerEvent>>,
}

impl ServerHandle {
    pub fn push(&self, event: ServerEvent) {
        let _ = self.inbound.send(Ok(event));
    }

    pub fn drain(&mut self) -> Vec<ClientEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.sent.try_recv() {
            events.push(event);
        }
        events
    }
}

pub struct FakeConnection {
    sent: mpsc::UnboundedSender<ClientEvent>,
    inbound: mpsc::UnboundedReceiver<Result<ServerEvent>>,
}

pub fn connection_pair() -> (FakeConnection, ServerHandle) {
    let (sent_tx, sent_rx) = mpsc::unbounded_channel();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    (
        FakeConnection {
            sent: sent_tx,
            inbound: inbound_rx,
        },
        ServerHandle {
            sent: sent_rx,
            inbound: inbound_tx,
        },
    )
}

#[async_trait]
impl Connection for FakeConnection {
    async fn send(&mut self, event: &ClientEvent) -> Result<()> {
        self.sent
            .send(event.clone())
            .map_err(|_| ClientError::Connection("server gone".to_string()))
    }

    async fn recv(&mut self) -> Option<Result<ServerEvent>> {
        self.inbound.recv().await
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Hands out scripted connections; refuses once the script runs out
#[derive(Default)]
pub struct FakeConnector {
    attempts: AtomicUsize,
    script: Mutex<VecDeque<FakeConnection>>,
}

impl FakeConnector {
    pub fn refusing() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue one accepted connection and return its server side
    pub fn accept_next(&self) -> ServerHandle {
        let (conn, server) = connection_pair();
        self.script.lock().unwrap().push_back(conn);
        server
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self) -> Result<Box<dyn Connection>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().pop_front() {
            Some(conn) => Ok(Box::new(conn)),
            None => Err(ClientError::Connection("connection refused".to_string())),
        }
    }
}

#[derive(Default)]
pub struct RecordingAudio {
    pub played: Mutex<Vec<String>>,
    /// Reject non-silent clips as an autoplay policy would
    pub blocked: AtomicBool,
}

impl RecordingAudio {
    pub fn played(&self) -> Vec<String> {
        self.played.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioPlayer for RecordingAudio {
    async fn play(&self, source: &str) -> std::result::Result<(), PlaybackError> {
        self.played.lock().unwrap().push(source.to_string());
        if self.blocked.load(Ordering::SeqCst) && !source.contains("silent") {
            return Err(PlaybackError::AutoplayBlocked);
        }
        Ok(())
    }
}

pub struct RecordingSurface {
    pub permission: Mutex<PermissionState>,
    pub shown: Mutex<Vec<PlatformNotification>>,
}

impl RecordingSurface {
    pub fn new(permission: PermissionState) -> Self {
        Self {
            permission: Mutex::new(permission),
            shown: Mutex::new(Vec::new()),
        }
    }

    pub fn shown(&self) -> Vec<PlatformNotification> {
        self.shown.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSurface for RecordingSurface {
    fn is_supported(&self) -> bool {
        true
    }

    fn permission(&self) -> PermissionState {
        *self.permission.lock().unwrap()
    }

    async fn request_permission(&self) -> PermissionState {
        self.permission()
    }

    async fn show(&self, notification: PlatformNotification) -> Result<()> {
        self.shown.lock().unwrap().push(notification);
        Ok(())
    }
}

#[derive(Default)]
pub struct ManualInteractions {
    pub trigger: Notify,
}

#[async_trait]
impl InteractionSource for ManualInteractions {
    async fn next_interaction(&self) -> Interaction {
        self.trigger.notified().await;
        Interaction::Touch
    }
}

#[derive(Default)]
pub struct RecordingBackend {
    pub subscribed: Mutex<Vec<SubscribeRequest>>,
}

#[async_trait]
impl PushBackend for RecordingBackend {
    async fn subscribe(&self, request: &SubscribeRequest) -> Result<BackendResponse> {
        self.subscribed.lock().unwrap().push(request.clone());
        Ok(BackendResponse {
            success: true,
            message: None,
        })
    }

    async fn unsubscribe(&self, _request: &UnsubscribeRequest) -> Result<BackendResponse> {
        Ok(BackendResponse {
            success: true,
            message: None,
        })
    }
}

pub struct TestPlatform {
    pub audio: Arc<RecordingAudio>,
    pub surface: Arc<RecordingSurface>,
    pub interactions: Arc<ManualInteractions>,
}

impl TestPlatform {
    pub fn new(permission: PermissionState) -> Self {
        Self {
            audio: Arc::new(RecordingAudio::default()),
            surface: Arc::new(RecordingSurface::new(permission)),
            interactions: Arc::new(ManualInteractions::default()),
        }
    }

    pub fn services(&self) -> PlatformServices {
        PlatformServices {
            audio: self.audio.clone(),
            surface: self.surface.clone(),
            interactions: self.interactions.clone(),
            push: Arc::new(UnsupportedPushPlatform),
        }
    }
}

pub fn test_config() -> Config {
    Config::from_lookup(|_| None).unwrap()
}

pub fn credential() -> PushSubscriptionCredential {
    serde_json::from_value(serde_json::json!({
        "endpoint": "https://push.example/device",
        "keys": {"p256dh": "p256", "auth": "auth"}
    }))
    .unwrap()
}

/// Wait (on the test clock) for the first event matching `pred`
pub async fn wait_for<F>(rx: &mut broadcast::Receiver<TransportEvent>, pred: F) -> TransportEvent
where
    F: Fn(&TransportEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(120), async {
        loop {
            match rx.recv().await {
                Ok(event) if pred(&event) => return event,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("event channel closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for transport event")
}

/// Let spawned tasks run
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
