/// Transport client
///
/// Owns a single persistent connection to the notification server. Topic
/// subscriptions requested while disconnected are remembered and replayed
/// once the connection comes up; every successful reconnect replays the full
/// active topic set.
use super::{Connection, Connector, TransportEvent, TransportFailure};
use crate::error::ClientError;
use crate::metrics;
use crate::models::{ConnectionStatus, SessionState};
use event_schema::{ClientEvent, ServerEvent, Topic};
use futures::Stream;
use resilience::{with_timeout_result, Backoff, ReconnectPolicy};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const EVENT_CHANNEL_CAPACITY: usize = 256;
const GIVE_UP_MESSAGE: &str =
    "Failed to reconnect to notification server after maximum attempts";

#[derive(Debug)]
enum Command {
    Emit(ClientEvent),
    Disconnect,
}

enum Step {
    Command(Option<Command>),
    Inbound(Option<crate::error::Result<ServerEvent>>),
}

enum SessionEnd {
    Requested,
    Lost(String),
}

/// State shared between the public handle and the driver task
struct Shared {
    connector: Arc<dyn Connector>,
    policy: ReconnectPolicy,
    connect_timeout: Duration,
    customer_id: String,
    state: RwLock<SessionState>,
    commands: std::sync::Mutex<Option<mpsc::UnboundedSender<Command>>>,
    events: broadcast::Sender<TransportEvent>,
}

pub struct TransportClient {
    shared: Arc<Shared>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl TransportClient {
    pub fn new(
        connector: Arc<dyn Connector>,
        policy: ReconnectPolicy,
        connect_timeout: Duration,
        customer_id: impl Into<String>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                connector,
                policy,
                connect_timeout,
                customer_id: customer_id.into(),
                state: RwLock::new(SessionState::default()),
                commands: std::sync::Mutex::new(None),
                events,
            }),
            driver: Mutex::new(None),
        }
    }

    pub fn customer_id(&self) -> &str {
        &self.shared.customer_id
    }

    /// Establish the connection
    ///
    /// Idempotent while connected or connecting. Resolves once the first
    /// attempt has either connected or failed over to the reconnect schedule.
    /// After a terminal failure this is the explicit action that starts over.
    pub async fn connect(&self) {
        let mut driver = self.driver.lock().await;
        if let Some(handle) = driver.as_ref() {
            if !handle.is_finished() {
                debug!("Socket.IO: connect() ignored, connection already active");
                return;
            }
        }

        {
            let mut state = self.shared.state.write().await;
            state.gave_up = false;
            state.reconnect_attempt = 0;
            state.connection_status = ConnectionStatus::Connecting;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        *self.shared.lock_commands() = Some(tx);

        let (ready_tx, ready_rx) = oneshot::channel();
        *driver = Some(tokio::spawn(run(self.shared.clone(), rx, ready_tx)));
        drop(driver);

        let _ = ready_rx.await;
    }

    /// Close the connection and stop any pending reconnect
    pub async fn disconnect(&self) {
        if let Some(tx) = self.shared.lock_commands().take() {
            let _ = tx.send(Command::Disconnect);
        }

        if let Some(handle) = self.driver.lock().await.take() {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    error!("Socket.IO: driver task failed: {}", e);
                }
            }
        }

        self.shared.state.write().await.connection_status = ConnectionStatus::Disconnected;
    }

    /// Subscribe to a topic
    ///
    /// Never fails: while disconnected the topic is remembered (replacing any
    /// earlier pending request) and replayed once connected.
    pub async fn subscribe(&self, topic: Topic) {
        {
            let mut state = self.shared.state.write().await;
            if !state.is_connected() {
                warn!(%topic, "Socket.IO: Cannot subscribe, not connected; will subscribe on connect");
                state.pending_topic = Some(topic);
                return;
            }
            state.active_topics.insert(topic.clone());
        }

        info!(%topic, customer_id = %self.shared.customer_id, "Socket.IO: Subscribing");
        self.shared
            .emit(ClientEvent::subscribe(&topic, &self.shared.customer_id));
    }

    /// Subscribe to several topics at once
    ///
    /// While disconnected every topic joins the active set directly, so the
    /// whole batch is replayed together on connect instead of competing for
    /// the single pending slot.
    pub async fn subscribe_all(&self, topics: impl IntoIterator<Item = Topic>) {
        let mut to_emit = Vec::new();
        {
            let mut state = self.shared.state.write().await;
            let connected = state.is_connected();
            for topic in topics {
                if !connected {
                    warn!(%topic, "Socket.IO: Not connected; topic queued for replay on connect");
                } else if !state.active_topics.contains(&topic) {
                    to_emit.push(topic.clone());
                }
                state.active_topics.insert(topic);
            }
        }

        for topic in to_emit {
            info!(%topic, customer_id = %self.shared.customer_id, "Socket.IO: Subscribing");
            self.shared
                .emit(ClientEvent::subscribe(&topic, &self.shared.customer_id));
        }
    }

    /// Unsubscribe from a topic; no-op if not subscribed
    pub async fn unsubscribe(&self, topic: &Topic) {
        {
            let mut state = self.shared.state.write().await;
            let was_pending = state.pending_topic.as_ref() == Some(topic);
            if was_pending {
                state.pending_topic = None;
            }

            if !state.active_topics.remove(topic) {
                if !was_pending {
                    debug!(%topic, "Socket.IO: unsubscribe ignored, not subscribed");
                }
                return;
            }

            if !state.is_connected() {
                warn!(%topic, "Socket.IO: Cannot unsubscribe, not connected; dropped from replay set");
                return;
            }
        }

        match ClientEvent::unsubscribe(topic) {
            Some(event) => {
                info!(%topic, "Socket.IO: Unsubscribing");
                self.shared.emit(event);
            }
            None => debug!(%topic, "Socket.IO: topic has no server-side unsubscribe"),
        }
    }

    pub async fn status(&self) -> ConnectionStatus {
        self.shared.state.read().await.connection_status
    }

    /// Snapshot of the session state
    pub async fn state(&self) -> SessionState {
        self.shared.state.read().await.clone()
    }

    /// Raw receiver for every transport event emitted from now on
    pub fn subscribe_events(&self) -> broadcast::Receiver<TransportEvent> {
        self.shared.events.subscribe()
    }

    /// Lazy stream of transport events; lagging consumers skip what they missed
    pub fn events(&self) -> impl Stream<Item = TransportEvent> + Send + 'static {
        event_stream(self.shared.events.subscribe())
    }

    /// Lazy stream of inbound notifications only
    pub fn notifications(&self) -> impl Stream<Item = event_schema::Notification> + Send + 'static {
        use futures::StreamExt;
        self.events().filter_map(|event| async move {
            match event {
                TransportEvent::Notification(notification) => Some(notification),
                _ => None,
            }
        })
    }
}

impl Drop for TransportClient {
    fn drop(&mut self) {
        if let Ok(mut driver) = self.driver.try_lock() {
            if let Some(handle) = driver.take() {
                handle.abort();
            }
        }
    }
}

fn event_stream(
    receiver: broadcast::Receiver<TransportEvent>,
) -> impl Stream<Item = TransportEvent> + Send + 'static {
    futures::stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(event) => return Some((event, receiver)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Socket.IO: event consumer lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
}

impl Shared {
    fn lock_commands(&self) -> std::sync::MutexGuard<'_, Option<mpsc::UnboundedSender<Command>>> {
        self.commands.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: ClientEvent) {
        let sent = self
            .lock_commands()
            .as_ref()
            .map(|tx| tx.send(Command::Emit(event)).is_ok())
            .unwrap_or(false);
        if !sent {
            warn!("Socket.IO: driver not running, emission dropped");
        }
    }

    fn publish(&self, event: TransportEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }

    async fn set_status(&self, status: ConnectionStatus) {
        self.state.write().await.connection_status = status;
    }

    async fn on_connected(&self, conn: &mut dyn Connection) {
        let replay = {
            let mut state = self.state.write().await;
            state.connection_status = ConnectionStatus::Connected;
            state.reconnect_attempt = 0;
            state.gave_up = false;
            state.take_replay_set()
        };

        info!("Socket.IO: Connected to server");

        for topic in replay {
            debug!(%topic, "Socket.IO: replaying subscription");
            if let Err(e) = conn
                .send(&ClientEvent::subscribe(&topic, &self.customer_id))
                .await
            {
                warn!(%topic, "Socket.IO: failed to replay subscription: {}", e);
            }
        }

        self.publish(TransportEvent::Connected);
    }

    /// Drive a live connection until it ends
    async fn pump(
        &self,
        conn: &mut dyn Connection,
        commands: &mut mpsc::UnboundedReceiver<Command>,
    ) -> SessionEnd {
        loop {
            let step = tokio::select! {
                command = commands.recv() => Step::Command(command),
                inbound = conn.recv() => Step::Inbound(inbound),
            };

            match step {
                Step::Command(Some(Command::Emit(event))) => {
                    if let Err(e) = conn.send(&event).await {
                        return SessionEnd::Lost(e.to_string());
                    }
                }
                Step::Command(Some(Command::Disconnect)) | Step::Command(None) => {
                    return SessionEnd::Requested;
                }
                Step::Inbound(None) => return SessionEnd::Lost("connection closed".to_string()),
                Step::Inbound(Some(Err(e))) if e.is_retryable() => {
                    return SessionEnd::Lost(e.to_string());
                }
                Step::Inbound(Some(Err(e))) => {
                    warn!("Socket.IO: dropping malformed event: {}", e);
                }
                Step::Inbound(Some(Ok(event))) => match event {
                    ServerEvent::Disconnect => {
                        return SessionEnd::Lost("server closed the session".to_string())
                    }
                    ServerEvent::Connect => {}
                    ServerEvent::Notification(notification) => {
                        debug!(title = %notification.title, "Socket.IO: Received notification");
                        self.publish(TransportEvent::Notification(notification));
                    }
                    ServerEvent::Subscribed(data) => {
                        info!("Socket.IO: Subscribed: {}", data);
                        self.publish(TransportEvent::Subscribed(data));
                    }
                    ServerEvent::Unsubscribed(data) => {
                        info!("Socket.IO: Unsubscribed: {}", data);
                        self.publish(TransportEvent::Unsubscribed(data));
                    }
                    ServerEvent::PlaySound(_) => self.publish(TransportEvent::PlaySound),
                    ServerEvent::Error(data) => {
                        error!("Socket.IO: Error: {}", data);
                        self.publish(TransportEvent::Error(TransportFailure {
                            message: error_message(&data),
                            terminal: false,
                        }));
                    }
                    ServerEvent::Other { name, .. } => {
                        debug!(event = %name, "Socket.IO: ignoring unhandled event");
                    }
                },
            }
        }
    }
}

/// Await `future` unless a disconnect is requested first; emissions are dropped meanwhile
async fn until_disconnect<F: Future>(
    future: F,
    commands: &mut mpsc::UnboundedReceiver<Command>,
) -> Option<F::Output> {
    tokio::pin!(future);
    loop {
        tokio::select! {
            output = &mut future => return Some(output),
            command = commands.recv() => match command {
                Some(Command::Emit(event)) => {
                    debug!(event = event.name(), "Socket.IO: not connected, emission dropped");
                }
                Some(Command::Disconnect) | None => return None,
            },
        }
    }
}

async fn run(
    shared: Arc<Shared>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    ready: oneshot::Sender<()>,
) {
    let mut backoff = Backoff::new(shared.policy);
    let mut ready = Some(ready);

    loop {
        shared.set_status(ConnectionStatus::Connecting).await;

        let attempt = with_timeout_result(shared.connect_timeout, shared.connector.connect());
        let attempt = match until_disconnect(attempt, &mut commands).await {
            Some(result) => result.map_err(|e| {
                e.into_inner_or(|d| {
                    ClientError::Connection(format!("connect timed out after {:?}", d))
                })
            }),
            None => break,
        };

        match attempt {
            Ok(mut conn) => {
                backoff.reset();
                shared.on_connected(conn.as_mut()).await;
                if let Some(ready) = ready.take() {
                    let _ = ready.send(());
                }

                match shared.pump(conn.as_mut(), &mut commands).await {
                    SessionEnd::Requested => {
                        if let Err(e) = conn.close().await {
                            debug!("Socket.IO: close failed: {}", e);
                        }
                        break;
                    }
                    SessionEnd::Lost(reason) => {
                        info!("Socket.IO: Disconnected from server ({})", reason);
                        shared.set_status(ConnectionStatus::Disconnected).await;
                        shared.publish(TransportEvent::Disconnected);
                    }
                }
            }
            Err(e) => {
                warn!("Socket.IO: connection attempt failed: {}", e);
                shared.set_status(ConnectionStatus::Disconnected).await;
                shared.publish(TransportEvent::Error(TransportFailure {
                    message: e.to_string(),
                    terminal: false,
                }));
                if let Some(ready) = ready.take() {
                    let _ = ready.send(());
                }
            }
        }

        let delay = match backoff.next_delay() {
            Some(delay) => delay,
            None => {
                error!("Socket.IO: Maximum reconnection attempts reached");
                {
                    let mut state = shared.state.write().await;
                    state.gave_up = true;
                    state.connection_status = ConnectionStatus::Disconnected;
                }
                metrics::record_give_up();
                shared.publish(TransportEvent::Error(TransportFailure {
                    message: GIVE_UP_MESSAGE.to_string(),
                    terminal: true,
                }));
                return;
            }
        };

        let attempt = backoff.attempt();
        shared.state.write().await.reconnect_attempt = attempt;
        metrics::record_reconnect_attempt();
        info!(
            "Socket.IO: Attempting to reconnect in {:?} (attempt {}/{})",
            delay,
            attempt,
            shared.policy.max_attempts
        );
        shared.publish(TransportEvent::ReconnectScheduled { attempt, delay });

        if until_disconnect(tokio::time::sleep(delay), &mut commands)
            .await
            .is_none()
        {
            break;
        }
    }

    // Explicit disconnect
    shared.set_status(ConnectionStatus::Disconnected).await;
    shared.publish(TransportEvent::Disconnected);
    info!("Socket.IO: Disconnected by caller");
}

fn error_message(data: &serde_json::Value) -> String {
    data.get("message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| data.to_string())
}
