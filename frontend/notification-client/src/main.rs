use anyhow::Context;
use event_schema::Topic;
use notification_client::{
    logging, metrics,
    platform::{PermissionState, PlatformServices},
    push::HttpPushBackend,
    socketio::SocketIoConnector,
    Config, DispatchEvent, EventKind, FilePreferenceStore, NotificationSession,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init_tracing();

    let config = Config::from_env().context("invalid configuration")?;
    tracing::info!(
        env = %config.app.env,
        server = %config.transport.server_url,
        "Starting notification client"
    );

    let connector = Arc::new(SocketIoConnector::new(&config.transport.server_url)?);
    let preferences = Arc::new(
        FilePreferenceStore::open(&config.app.preferences_path)
            .context("failed to open preference store")?,
    );
    let backend = Arc::new(HttpPushBackend::new(
        &config.push.api_base_url,
        std::time::Duration::from_secs(config.push.http_timeout_secs),
    )?);

    let session = NotificationSession::new(
        &config,
        connector,
        preferences,
        backend,
        PlatformServices::headless(PermissionState::Granted),
    )?;

    let dispatcher = session.dispatcher();
    dispatcher.add_listener(EventKind::Connected, |_: &DispatchEvent| {
        tracing::info!("Connected to notification server");
        Ok(())
    });
    dispatcher.add_listener(EventKind::Disconnected, |_: &DispatchEvent| {
        tracing::info!("Disconnected from notification server");
        Ok(())
    });
    dispatcher.add_listener(EventKind::Notification, |event: &DispatchEvent| {
        if let DispatchEvent::Notification {
            notification,
            channel,
        } = event
        {
            tracing::info!(
                channel = channel.as_str(),
                title = %notification.title,
                body = %notification.body,
                "Notification"
            );
        }
        Ok(())
    });
    dispatcher.add_listener(EventKind::Subscribed, |event: &DispatchEvent| {
        tracing::info!(?event, "Subscription confirmed");
        Ok(())
    });
    dispatcher.add_listener(EventKind::Error, |event: &DispatchEvent| {
        if let DispatchEvent::Error(failure) = event {
            tracing::error!(terminal = failure.terminal, "{}", failure.message);
        }
        Ok(())
    });

    session.start().await;

    let topics: Vec<Topic> = [
        config.topics.table_id.clone().map(Topic::table),
        config.topics.restaurant_id.clone().map(Topic::restaurant),
        config.topics.user_id.clone().map(Topic::user),
    ]
    .into_iter()
    .flatten()
    .collect();
    session.subscribe_all(topics).await;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;

    tracing::info!("Shutting down");
    session.shutdown().await;
    tracing::debug!("Final metrics:\n{}", metrics::gather_text());

    Ok(())
}
