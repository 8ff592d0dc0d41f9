use std::sync::{Arc, Mutex};

use storefront_chat::clients::memory::{
    InMemoryDisplay, InMemoryIdentity, InMemoryMessageLog, InMemoryPushTransport, MemoryKvStore,
    RecordingNavigator,
};
use storefront_chat::clients::{ForegroundEvent, ForegroundEventKind};
use storefront_chat::models::{InAppNotice, OutboundNotice, RemoteMessage, RemoteNotificationPart};
use storefront_chat::services::TopicNotifier;
use storefront_chat::{
    ChatComposer, ChatFeedLoader, Config, InAppNoticeBus, NotificationGateway, NotificationRouter,
    NotificationSetup, NotificationStore, Session, SettingsStore, SetupOutcome,
};

/// Notifier that logs instead of calling a real endpoint.
struct LoggingNotifier;

#[async_trait::async_trait]
impl TopicNotifier for LoggingNotifier {
    async fn notify(&self, notice: &OutboundNotice) -> storefront_chat::Result<()> {
        tracing::info!(title = %notice.title, body = %notice.body, "topic notify");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    storefront_chat::logging::init_tracing();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("config: {e}"))?;
    tracing::info!("starting storefront-chat demo");

    // Collaborators: in-memory stand-ins for the device-side services.
    let kv = Arc::new(MemoryKvStore::new());
    let push = Arc::new(InMemoryPushTransport::new());
    let display = Arc::new(InMemoryDisplay::new());
    let log = Arc::new(InMemoryMessageLog::new());
    let identity = Arc::new(InMemoryIdentity::new());
    let navigator = Arc::new(RecordingNavigator::new());

    let settings = Arc::new(SettingsStore::load(kv.clone()));
    let notifications = Arc::new(NotificationStore::load(kv.clone()));
    let bus = Arc::new(InAppNoticeBus::new());
    let router = Arc::new(NotificationRouter::new(
        navigator.clone(),
        notifications.clone(),
    ));

    let gateway = NotificationGateway::new(
        push.clone(),
        display.clone(),
        settings.clone(),
        identity.clone(),
        notifications.clone(),
        bus.clone(),
        router,
        config.notifications.clone(),
        config.chat.room.clone(),
    );
    let setup = Arc::new(NotificationSetup::new(
        push.clone(),
        identity.clone(),
        settings.clone(),
        gateway.clone(),
        config.chat.topic.clone(),
    ));
    let session = Session::new(identity.clone(), notifications.clone(), setup.clone());

    // Render notices to the log the way the UI layer would render toasts.
    let shown = Arc::new(Mutex::new(Vec::<InAppNotice>::new()));
    let _subscription = {
        let shown = Arc::clone(&shown);
        bus.subscribe(Arc::new(move |notice: &InAppNotice| {
            tracing::info!(
                icon = notice.icon.as_str(),
                title = notice.title.as_deref().unwrap_or_default(),
                "in-app notice: {}",
                notice.message
            );
            shown.lock().unwrap().push(notice.clone());
            Ok(())
        }))
    };

    let user = session.sign_in("dana@example.com", "secret").await?;
    tracing::info!(user = %user.id, "signed in");

    match setup.run_startup().await {
        SetupOutcome::Ready { token } => tracing::info!(%token, "notifications ready"),
        SetupOutcome::Blocked => {
            // the one user-visible failure: point at system settings
            tracing::error!("notifications blocked - enable them in system settings");
        }
        outcome => tracing::warn!(?outcome, "notifications not enabled: {outcome:?}"),
    }

    // A friend posts a message; the duplicate delivery is dropped.
    let inbound = RemoteMessage {
        message_id: Some("m-1".to_string()),
        notification: Some(RemoteNotificationPart {
            title: Some("New Message".to_string()),
            body: Some("hey, the sale is live".to_string()),
        }),
        data: [
            ("type".to_string(), "text".to_string()),
            ("senderId".to_string(), "friend-1".to_string()),
        ]
        .into(),
    };
    push.emit_message(inbound.clone());
    push.emit_message(inbound);

    // Tapping the notice routes to chat and marks the record read.
    if let Some(notice) = shown.lock().unwrap().last().cloned() {
        display.emit_event(ForegroundEvent {
            kind: ForegroundEventKind::Press,
            data: notice.data.clone(),
        });
    }
    tracing::info!(
        records = notifications.len(),
        unread = notifications.unread_count(),
        last_navigation = ?navigator.last().map(|(d, _)| d),
        "after inbound delivery"
    );

    // Chat feed: attach the head window, send, page backwards.
    let feed = ChatFeedLoader::new(log.clone(), config.chat.page_size);
    feed.attach();

    let composer = ChatComposer::new(log.clone(), identity.clone(), Arc::new(LoggingNotifier));
    composer.send_message("got it, checking it out now").await?;
    composer.send_gift().await?;

    let fetched = feed.load_more().await?;
    tracing::info!(
        messages = feed.len(),
        fetched_more = fetched,
        reached_end = feed.reached_end(),
        "feed state"
    );

    // Toggle notifications off: teardown, token cleanup, silent inbound.
    setup.set_push_enabled(false).await;
    push.emit_message(RemoteMessage {
        message_id: Some("m-2".to_string()),
        ..RemoteMessage::default()
    });
    tracing::info!(
        records = notifications.len(),
        "after disable (unchanged by the dropped message)"
    );

    feed.detach();
    session.sign_out().await?;
    gateway.stop();
    tracing::info!("demo finished");
    Ok(())
}
