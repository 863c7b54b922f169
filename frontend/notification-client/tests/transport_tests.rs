mod common;

use common::{wait_for, FakeConnector};
use event_schema::{ClientEvent, Notification, ServerEvent, Topic};
use notification_client::models::ConnectionStatus;
use notification_client::transport::{TransportClient, TransportEvent};
use resilience::ReconnectPolicy;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

const CUSTOMER: &str = "customer_0123456789abc";

fn client(connector: Arc<FakeConnector>) -> TransportClient {
    TransportClient::new(
        connector,
        ReconnectPolicy::default(),
        Duration::from_secs(10),
        CUSTOMER,
    )
}

#[tokio::test]
async fn test_pending_subscription_emitted_once_on_connect() {
    let connector = Arc::new(FakeConnector::default());
    let mut server = connector.accept_next();
    let client = client(connector.clone());

    client.subscribe(Topic::table("42")).await;
    assert_eq!(client.state().await.pending_topic, Some(Topic::table("42")));

    client.connect().await;
    assert_eq!(client.status().await, ConnectionStatus::Connected);

    assert_eq!(
        server.drain(),
        vec![ClientEvent::SubscribeTable {
            table_id: "42".to_string(),
            customer_id: CUSTOMER.to_string(),
        }]
    );
    let state = client.state().await;
    assert!(state.pending_topic.is_none());
    assert!(state.active_topics.contains(&Topic::table("42")));
}

#[tokio::test]
async fn test_later_pending_topic_replaces_earlier() {
    let connector = Arc::new(FakeConnector::default());
    let mut server = connector.accept_next();
    let client = client(connector.clone());

    client.subscribe(Topic::table("1")).await;
    client.subscribe(Topic::table("2")).await;
    client.connect().await;

    assert_eq!(
        server.drain(),
        vec![ClientEvent::subscribe(&Topic::table("2"), CUSTOMER)]
    );
}

#[tokio::test]
async fn test_connect_is_idempotent() {
    let connector = Arc::new(FakeConnector::default());
    let _server = connector.accept_next();
    let client = client(connector.clone());

    client.connect().await;
    client.connect().await;
    assert_eq!(connector.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_gives_up_after_max_attempts() {
    let connector = FakeConnector::refusing();
    let client = client(connector.clone());
    let mut events = client.subscribe_events();

    let started = tokio::time::Instant::now();
    client.connect().await;

    let mut delays = Vec::new();
    let failure = loop {
        match wait_for(&mut events, |_| true).await {
            TransportEvent::ReconnectScheduled { delay, .. } => delays.push(delay),
            TransportEvent::Error(failure) if failure.terminal => break failure,
            _ => {}
        }
    };

    assert_eq!(
        failure.message,
        "Failed to reconnect to notification server after maximum attempts"
    );
    // Linear backoff: base × attempt
    assert_eq!(
        delays,
        (1..=5)
            .map(|n| Duration::from_millis(2000 * n))
            .collect::<Vec<_>>()
    );
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(30));
    assert!(elapsed < Duration::from_millis(30_100));

    // Initial attempt plus five reconnects, then nothing more
    assert_eq!(connector.attempts(), 6);
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(connector.attempts(), 6);

    let state = client.state().await;
    assert!(state.gave_up);
    assert_eq!(state.connection_status, ConnectionStatus::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn test_connect_after_give_up_starts_over() {
    let connector = FakeConnector::refusing();
    let client = client(connector.clone());
    let mut events = client.subscribe_events();

    client.connect().await;
    wait_for(&mut events, |e| matches!(e, TransportEvent::Error(f) if f.terminal)).await;
    common::settle().await;

    let _server = connector.accept_next();
    client.connect().await;

    assert_eq!(connector.attempts(), 7);
    let state = client.state().await;
    assert!(!state.gave_up);
    assert_eq!(state.reconnect_attempt, 0);
    assert!(state.is_connected());
}

#[tokio::test(start_paused = true)]
async fn test_active_topics_replayed_after_reconnect() {
    let connector = Arc::new(FakeConnector::default());
    let first = connector.accept_next();
    let client = client(connector.clone());
    let mut events = client.subscribe_events();

    client.connect().await;
    client.subscribe(Topic::table("1")).await;
    client.subscribe(Topic::restaurant("9")).await;

    let mut second = connector.accept_next();
    drop(first);

    wait_for(&mut events, |e| *e == TransportEvent::Disconnected).await;
    let scheduled = wait_for(&mut events, |e| {
        matches!(e, TransportEvent::ReconnectScheduled { .. })
    })
    .await;
    assert_eq!(
        scheduled,
        TransportEvent::ReconnectScheduled {
            attempt: 1,
            delay: Duration::from_secs(2)
        }
    );
    wait_for(&mut events, |e| *e == TransportEvent::Connected).await;

    let replayed: HashSet<_> = second.drain().into_iter().collect();
    let expected: HashSet<_> = [
        ClientEvent::subscribe(&Topic::table("1"), CUSTOMER),
        ClientEvent::subscribe(&Topic::restaurant("9"), CUSTOMER),
    ]
    .into_iter()
    .collect();
    assert_eq!(replayed, expected);
}

#[tokio::test]
async fn test_inbound_events_published_in_order() {
    let connector = Arc::new(FakeConnector::default());
    let server = connector.accept_next();
    let client = client(connector.clone());
    let mut events = client.subscribe_events();

    client.connect().await;
    wait_for(&mut events, |e| *e == TransportEvent::Connected).await;

    server.push(ServerEvent::Notification(Notification::new("First", "1")));
    server.push(ServerEvent::PlaySound(serde_json::Value::Null));
    server.push(ServerEvent::Notification(Notification::new("Second", "2")));

    let mut titles = Vec::new();
    while titles.len() < 2 {
        match wait_for(&mut events, |_| true).await {
            TransportEvent::Notification(n) => titles.push(n.title),
            TransportEvent::PlaySound => assert_eq!(titles.len(), 1),
            other => panic!("unexpected event {:?}", other),
        }
    }
    assert_eq!(titles, vec!["First", "Second"]);
}

#[tokio::test]
async fn test_unsubscribe_table_emits_and_drops_from_replay() {
    let connector = Arc::new(FakeConnector::default());
    let mut server = connector.accept_next();
    let client = client(connector.clone());

    client.connect().await;
    client.subscribe(Topic::table("3")).await;
    client.subscribe(Topic::user("u1")).await;
    client.unsubscribe(&Topic::table("3")).await;
    client.unsubscribe(&Topic::user("u1")).await;

    // Emissions go through the driver task
    tokio::task::yield_now().await;
    common::settle().await;

    assert_eq!(
        server.drain(),
        vec![
            ClientEvent::subscribe(&Topic::table("3"), CUSTOMER),
            ClientEvent::subscribe(&Topic::user("u1"), CUSTOMER),
            ClientEvent::UnsubscribeTable {
                table_id: "3".to_string()
            },
        ]
    );
    assert!(client.state().await.active_topics.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_stops_reconnecting() {
    let connector = FakeConnector::refusing();
    let client = client(connector.clone());
    let mut events = client.subscribe_events();

    client.connect().await;
    wait_for(&mut events, |e| {
        matches!(e, TransportEvent::ReconnectScheduled { .. })
    })
    .await;

    client.disconnect().await;
    let attempts = connector.attempts();
    tokio::time::sleep(Duration::from_secs(300)).await;

    assert_eq!(connector.attempts(), attempts);
    assert_eq!(client.status().await, ConnectionStatus::Disconnected);
}
