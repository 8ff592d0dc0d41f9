/// Notification gateway
///
/// Orchestrates the notification pipeline: owns the start/stop/reinitialize
/// lifecycle, subscribes to the remote transport and local display events,
/// applies suppression policy (enablement, dedup, self-origin), persists
/// durable records and publishes in-app notices.
///
/// The transport offers at-least-once, unordered delivery with no coupling
/// between "a message exists" and "a notification was shown"; everything
/// here exists to turn that into an at-most-once-displayed experience.
use crate::clients::{
    ChannelConfig, Destination, ForegroundEventKind, IdentityProvider, ListenerHandle,
    NotificationDisplay, PushTransport,
};
use crate::config::NotificationConfig;
use crate::error::Result;
use crate::models::{
    is_chat_payload, InAppNotice, NewNotification, NoticeData, NoticeIcon, NotificationKind,
    RemoteMessage, KEY_NOTIFICATION_ID, KEY_ROOM_ID, KEY_SCREEN, KEY_SENDER_ID, KEY_TYPE,
};
use crate::services::{DedupWindow, InAppNoticeBus, NotificationRouter};
use crate::stores::{NotificationStore, SettingsStore};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_TITLE: &str = "New Message";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayState {
    Stopped,
    Starting,
    Running,
}

pub struct NotificationGateway {
    push: Arc<dyn PushTransport>,
    display: Arc<dyn NotificationDisplay>,
    settings: Arc<SettingsStore>,
    identity: Arc<dyn IdentityProvider>,
    notifications: Arc<NotificationStore>,
    bus: Arc<InAppNoticeBus>,
    router: Arc<NotificationRouter>,
    dedup: DedupWindow,
    config: NotificationConfig,
    default_room: String,
    state: Mutex<GatewayState>,
    listeners: Mutex<Vec<ListenerHandle>>,
}

impl NotificationGateway {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        push: Arc<dyn PushTransport>,
        display: Arc<dyn NotificationDisplay>,
        settings: Arc<SettingsStore>,
        identity: Arc<dyn IdentityProvider>,
        notifications: Arc<NotificationStore>,
        bus: Arc<InAppNoticeBus>,
        router: Arc<NotificationRouter>,
        config: NotificationConfig,
        default_room: String,
    ) -> Arc<Self> {
        Arc::new(NotificationGateway {
            push,
            display,
            settings,
            identity,
            notifications,
            bus,
            router,
            dedup: DedupWindow::with_ttl(Duration::from_secs(config.dedup_ttl_secs)),
            config,
            default_room,
            state: Mutex::new(GatewayState::Stopped),
            listeners: Mutex::new(Vec::new()),
        })
    }

    pub fn state(&self) -> GatewayState {
        *self.state.lock().unwrap()
    }

    /// Start the pipeline. A no-op while notifications are disabled, and a
    /// re-entrant no-op while already starting or running.
    pub async fn start(self: &Arc<Self>) -> Result<()> {
        if !self.settings.push_enabled() {
            debug!("notifications disabled, gateway not started");
            return Ok(());
        }
        {
            let mut state = self.state.lock().unwrap();
            if *state != GatewayState::Stopped {
                return Ok(());
            }
            *state = GatewayState::Starting;
        }

        let channel = ChannelConfig {
            id: self.config.channel_id.clone(),
            name: self.config.channel_name.clone(),
            importance: 4,
        };
        if let Err(e) = self.display.create_channel(&channel).await {
            warn!("failed to create notification channel: {}", e);
        }

        // Handlers hold a weak reference; once detached (or the gateway is
        // gone) they can no longer mutate any state.
        let weak = Arc::downgrade(self);

        let on_message = {
            let weak = weak.clone();
            self.push.on_message(Arc::new(move |message| {
                if let Some(gateway) = weak.upgrade() {
                    gateway.handle_inbound(message);
                }
            }))
        };

        let on_opened = {
            let weak = weak.clone();
            self.push.on_notification_opened(Arc::new(move |message| {
                if let Some(gateway) = weak.upgrade() {
                    gateway.handle_opened(message);
                }
            }))
        };

        let on_press = {
            let weak = weak.clone();
            self.display.on_foreground_event(Arc::new(move |event| {
                let Some(gateway) = weak.upgrade() else {
                    return;
                };
                if matches!(
                    event.kind,
                    ForegroundEventKind::Press | ForegroundEventKind::ActionPress
                ) {
                    gateway.router.route(event.data.as_ref());
                }
            }))
        };

        // Cold-start replay: the tap that launched the app happened before
        // any listener existed. Abortable so a stop racing it wins.
        let replay = {
            let weak = weak.clone();
            let task = tokio::spawn(async move {
                let Some(gateway) = weak.upgrade() else {
                    return;
                };
                match gateway.push.initial_notification().await {
                    Ok(Some(message)) => gateway.router.route(Some(&message.data)),
                    Ok(None) => {}
                    Err(e) => warn!("initial remote notification fetch failed: {}", e),
                }
                match gateway.display.initial_notification().await {
                    Ok(Some(data)) => gateway.router.route(Some(&data)),
                    Ok(None) => {}
                    Err(e) => warn!("initial local notification fetch failed: {}", e),
                }
            });
            ListenerHandle::from_task("gateway.initial_replay", task)
        };

        *self.listeners.lock().unwrap() = vec![on_message, on_opened, on_press, replay];
        *self.state.lock().unwrap() = GatewayState::Running;
        info!("notification gateway started");
        Ok(())
    }

    /// Stop the pipeline: detach every listener (each failure logged
    /// independently), clear the dedup window, return to Stopped.
    pub fn stop(&self) {
        let handles: Vec<ListenerHandle> = std::mem::take(&mut *self.listeners.lock().unwrap());
        for handle in handles {
            let label = handle.label();
            if let Err(e) = handle.detach() {
                warn!("failed to detach {}: {}", label, e);
            }
        }
        self.dedup.clear();
        *self.state.lock().unwrap() = GatewayState::Stopped;
        info!("notification gateway stopped");
    }

    /// Stop, wait a short settle delay for native-side teardown, start.
    pub async fn reinitialize(self: &Arc<Self>) -> Result<()> {
        self.stop();
        tokio::time::sleep(Duration::from_millis(self.config.reinit_delay_ms)).await;
        self.start().await
    }

    /// Process a live-delivered remote message.
    ///
    /// Fully synchronous: enablement, dedup and identity are all read at
    /// the point of use, and the dedup check-and-insert has no suspension
    /// point, so overlapping deliveries cannot both pass the gate.
    pub fn handle_inbound(&self, message: RemoteMessage) {
        if !self.settings.push_enabled() {
            debug!("notifications disabled, dropping inbound message");
            return;
        }

        if let Some(id) = message.message_id.as_deref() {
            if !self.dedup.should_process(id) {
                debug!(message_id = id, "duplicate inbound message dropped");
                return;
            }
        }

        // never notify a user about their own action
        if let Some(sender) = message.data.get(KEY_SENDER_ID) {
            if let Some(me) = self.identity.current_user() {
                if *sender == me.id {
                    debug!("self-originated message suppressed");
                    return;
                }
            }
        }

        let title = message.title().unwrap_or(DEFAULT_TITLE).to_string();
        let body = message.body().unwrap_or_default().to_string();
        let kind = message
            .data
            .get(KEY_TYPE)
            .map(|t| NotificationKind::parse(t))
            .unwrap_or(NotificationKind::General);

        // Durable record and in-app notice are independent side effects;
        // there is no rollback coupling between them.
        let record = self.notifications.add(NewNotification {
            title: title.clone(),
            body: body.clone(),
            kind,
        });

        let data = self.augment_data(&message, record.id);
        let icon = Self::icon_for(&message);
        self.bus.publish(&InAppNotice {
            id: None,
            title: Some(title),
            message: body,
            icon,
            duration_ms: self.config.notice_duration_ms,
            data: Some(data),
            on_press: None,
        });
    }

    /// Process a notification that opened the app from background or
    /// terminated state. The record persists regardless of sender, and the
    /// tap navigates regardless of enablement.
    pub fn handle_opened(&self, message: RemoteMessage) {
        if self.settings.push_enabled() {
            let kind = message
                .data
                .get(KEY_TYPE)
                .map(|t| NotificationKind::parse(t))
                .unwrap_or(NotificationKind::General);
            self.notifications.add(NewNotification {
                title: message.title().unwrap_or(DEFAULT_TITLE).to_string(),
                body: message.body().unwrap_or_default().to_string(),
                kind,
            });
        }
        self.router.route(Some(&message.data));
    }

    /// Locally-originated notification event (promotions, order updates and
    /// other synthetic notices). Skips dedup and sender suppression, which
    /// only apply to remote delivery.
    pub fn handle_local(&self, draft: NewNotification, data: Option<NoticeData>) {
        if !self.settings.push_enabled() {
            debug!("notifications disabled, dropping local notification");
            return;
        }
        let record = self.notifications.add(draft.clone());

        let mut data = data.unwrap_or_default();
        data.entry(KEY_SCREEN.to_string())
            .or_insert_with(|| Destination::Notifications.as_str().to_string());
        data.insert(KEY_NOTIFICATION_ID.to_string(), record.id);

        self.bus.publish(&InAppNotice {
            id: None,
            title: Some(draft.title),
            message: draft.body,
            icon: NoticeIcon::Info,
            duration_ms: self.config.notice_duration_ms,
            data: Some(data),
            on_press: None,
        });
    }

    /// Original data map plus a routing hint and the durable record id, so
    /// a tap on the notice can mark it read and land on the right screen.
    fn augment_data(&self, message: &RemoteMessage, record_id: String) -> NoticeData {
        let mut data = message.data.clone();
        if is_chat_payload(&message.data) {
            data.insert(
                KEY_SCREEN.to_string(),
                Destination::Chat.as_str().to_string(),
            );
            data.entry(KEY_ROOM_ID.to_string())
                .or_insert_with(|| self.default_room.clone());
        } else {
            data.insert(
                KEY_SCREEN.to_string(),
                Destination::Notifications.as_str().to_string(),
            );
        }
        data.insert(KEY_NOTIFICATION_ID.to_string(), record_id);
        data
    }

    fn icon_for(message: &RemoteMessage) -> NoticeIcon {
        match message.data.get(KEY_TYPE).map(String::as_str) {
            Some("gift") => NoticeIcon::Gift,
            Some("text") | Some("chat") | Some("message") => NoticeIcon::Chat,
            _ => NoticeIcon::Info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::memory::{
        InMemoryDisplay, InMemoryIdentity, InMemoryPushTransport, MemoryKvStore,
        RecordingNavigator,
    };
    use crate::models::AuthUser;

    struct Fixture {
        gateway: Arc<NotificationGateway>,
        push: Arc<InMemoryPushTransport>,
        display: Arc<InMemoryDisplay>,
        settings: Arc<SettingsStore>,
        identity: Arc<InMemoryIdentity>,
        notifications: Arc<NotificationStore>,
        bus: Arc<InAppNoticeBus>,
        navigator: Arc<RecordingNavigator>,
    }

    fn fixture() -> Fixture {
        let push = Arc::new(InMemoryPushTransport::new());
        let display = Arc::new(InMemoryDisplay::new());
        let settings = Arc::new(SettingsStore::load(Arc::new(MemoryKvStore::new())));
        let identity = Arc::new(InMemoryIdentity::signed_in(AuthUser {
            id: "me".to_string(),
            email: Some("me@example.com".to_string()),
            display_name: None,
        }));
        let notifications = Arc::new(NotificationStore::load(Arc::new(MemoryKvStore::new())));
        let bus = Arc::new(InAppNoticeBus::new());
        let navigator = Arc::new(RecordingNavigator::new());
        let router = Arc::new(NotificationRouter::new(
            navigator.clone(),
            notifications.clone(),
        ));
        let config = NotificationConfig {
            dedup_ttl_secs: 60,
            notice_duration_ms: 3500,
            reinit_delay_ms: 1,
            channel_id: "default".to_string(),
            channel_name: "Default".to_string(),
        };
        let gateway = NotificationGateway::new(
            push.clone(),
            display.clone(),
            settings.clone(),
            identity.clone(),
            notifications.clone(),
            bus.clone(),
            router,
            config,
            "global".to_string(),
        );
        Fixture {
            gateway,
            push,
            display,
            settings,
            identity,
            notifications,
            bus,
            navigator,
        }
    }

    fn remote(id: Option<&str>, pairs: &[(&str, &str)]) -> RemoteMessage {
        RemoteMessage {
            message_id: id.map(str::to_string),
            notification: None,
            data: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_start_registers_listeners_and_channel() {
        let f = fixture();
        f.gateway.start().await.unwrap();

        assert_eq!(f.gateway.state(), GatewayState::Running);
        assert_eq!(f.push.message_handler_count(), 1);
        assert_eq!(f.push.opened_handler_count(), 1);
        assert_eq!(f.display.handler_count(), 1);
        assert_eq!(f.display.channel_count(), 1);
    }

    #[tokio::test]
    async fn test_start_is_a_no_op_while_disabled() {
        let f = fixture();
        f.settings.set_push_enabled(false);
        f.gateway.start().await.unwrap();

        assert_eq!(f.gateway.state(), GatewayState::Stopped);
        assert_eq!(f.push.message_handler_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_start_does_not_double_register() {
        let f = fixture();
        f.gateway.start().await.unwrap();
        f.gateway.start().await.unwrap();

        assert_eq!(f.push.message_handler_count(), 1);
    }

    #[tokio::test]
    async fn test_stop_detaches_everything_and_clears_dedup() {
        let f = fixture();
        f.gateway.start().await.unwrap();
        f.push.emit_message(remote(Some("m1"), &[]));

        f.gateway.stop();
        assert_eq!(f.gateway.state(), GatewayState::Stopped);
        assert_eq!(f.push.message_handler_count(), 0);
        assert_eq!(f.push.opened_handler_count(), 0);
        assert_eq!(f.display.handler_count(), 0);

        // dedup window was cleared: the same id processes again
        f.gateway.start().await.unwrap();
        let before = f.notifications.len();
        f.push.emit_message(remote(Some("m1"), &[]));
        assert_eq!(f.notifications.len(), before + 1);
    }

    #[tokio::test]
    async fn test_reinitialize_round_trips() {
        let f = fixture();
        f.gateway.start().await.unwrap();
        f.gateway.reinitialize().await.unwrap();

        assert_eq!(f.gateway.state(), GatewayState::Running);
        assert_eq!(f.push.message_handler_count(), 1);
    }

    #[tokio::test]
    async fn test_inbound_persists_and_publishes() {
        let f = fixture();
        let notices = Arc::new(Mutex::new(Vec::new()));
        {
            let notices = Arc::clone(&notices);
            f.bus.subscribe(Arc::new(move |n: &InAppNotice| {
                notices.lock().unwrap().push(n.clone());
                Ok(())
            }));
        }
        f.gateway.start().await.unwrap();

        f.push.emit_message(RemoteMessage {
            message_id: Some("m1".to_string()),
            notification: Some(crate::models::RemoteNotificationPart {
                title: Some("Hello".to_string()),
                body: Some("from a friend".to_string()),
            }),
            data: [("type".to_string(), "text".to_string())].into(),
        });

        assert_eq!(f.notifications.len(), 1);
        let notices = notices.lock().unwrap();
        assert_eq!(notices.len(), 1);
        let notice = &notices[0];
        assert_eq!(notice.title.as_deref(), Some("Hello"));
        assert_eq!(notice.message, "from a friend");
        assert_eq!(notice.icon, NoticeIcon::Chat);
        assert_eq!(notice.duration_ms, 3500);

        let data = notice.data.as_ref().unwrap();
        assert_eq!(data.get(KEY_SCREEN).unwrap(), "Chat");
        assert_eq!(data.get(KEY_ROOM_ID).unwrap(), "global");
        assert_eq!(
            data.get(KEY_NOTIFICATION_ID).unwrap(),
            &f.notifications.list()[0].id
        );
    }

    #[tokio::test]
    async fn test_inbound_defaults_title_and_maps_icon() {
        let f = fixture();
        let notices = Arc::new(Mutex::new(Vec::new()));
        {
            let notices = Arc::clone(&notices);
            f.bus.subscribe(Arc::new(move |n: &InAppNotice| {
                notices.lock().unwrap().push(n.clone());
                Ok(())
            }));
        }
        f.gateway.start().await.unwrap();

        f.push.emit_message(remote(Some("m1"), &[("type", "gift")]));
        f.push.emit_message(remote(Some("m2"), &[("campaign", "x")]));

        let notices = notices.lock().unwrap();
        assert_eq!(notices[0].title.as_deref(), Some(DEFAULT_TITLE));
        assert_eq!(notices[0].icon, NoticeIcon::Gift);
        assert_eq!(notices[1].icon, NoticeIcon::Info);
        let generic = notices[1].data.as_ref().unwrap();
        assert_eq!(generic.get(KEY_SCREEN).unwrap(), "Notifications");
        assert!(!generic.contains_key(KEY_ROOM_ID));
    }

    #[tokio::test]
    async fn test_disabled_inbound_is_fully_dropped() {
        let f = fixture();
        let delivered = Arc::new(Mutex::new(0));
        {
            let delivered = Arc::clone(&delivered);
            f.bus.subscribe(Arc::new(move |_| {
                *delivered.lock().unwrap() += 1;
                Ok(())
            }));
        }
        f.gateway.start().await.unwrap();
        // toggled off after start; enablement is re-read per message
        f.settings.set_push_enabled(false);

        f.push.emit_message(remote(Some("m1"), &[]));

        assert_eq!(f.notifications.len(), 0);
        assert_eq!(*delivered.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_ids_create_one_record() {
        let f = fixture();
        f.gateway.start().await.unwrap();

        f.push.emit_message(remote(Some("m1"), &[]));
        f.push.emit_message(remote(Some("m1"), &[]));

        assert_eq!(f.notifications.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_message_id_is_never_deduped() {
        let f = fixture();
        f.gateway.start().await.unwrap();

        f.push.emit_message(remote(None, &[]));
        f.push.emit_message(remote(None, &[]));

        assert_eq!(f.notifications.len(), 2);
    }

    #[tokio::test]
    async fn test_own_messages_are_suppressed_live() {
        let f = fixture();
        let delivered = Arc::new(Mutex::new(0));
        {
            let delivered = Arc::clone(&delivered);
            f.bus.subscribe(Arc::new(move |_| {
                *delivered.lock().unwrap() += 1;
                Ok(())
            }));
        }
        f.gateway.start().await.unwrap();

        f.push
            .emit_message(remote(Some("m1"), &[("senderId", "me")]));

        assert_eq!(f.notifications.len(), 0);
        assert_eq!(*delivered.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_opened_event_persists_even_for_own_messages() {
        let f = fixture();
        f.gateway.start().await.unwrap();

        f.push.emit_opened(remote(Some("m1"), &[("senderId", "me"), ("type", "text")]));

        assert_eq!(f.notifications.len(), 1);
        assert_eq!(f.navigator.last().unwrap().0, Destination::Chat);
    }

    #[tokio::test]
    async fn test_opened_event_routes_even_while_disabled() {
        let f = fixture();
        f.gateway.start().await.unwrap();
        f.settings.set_push_enabled(false);

        f.push.emit_opened(remote(Some("m1"), &[("screen", "Notifications")]));

        assert_eq!(f.notifications.len(), 0);
        assert_eq!(f.navigator.last().unwrap().0, Destination::Notifications);
    }

    #[tokio::test]
    async fn test_press_event_routes_and_marks_read() {
        let f = fixture();
        let notices = Arc::new(Mutex::new(Vec::new()));
        {
            let notices = Arc::clone(&notices);
            f.bus.subscribe(Arc::new(move |n: &InAppNotice| {
                notices.lock().unwrap().push(n.clone());
                Ok(())
            }));
        }
        f.gateway.start().await.unwrap();
        f.push.emit_message(remote(Some("m1"), &[("type", "text")]));
        assert_eq!(f.notifications.unread_count(), 1);

        // user taps the displayed notification; its data carries the hint
        let data = notices.lock().unwrap()[0].data.clone().unwrap();
        f.display.emit_event(crate::clients::ForegroundEvent {
            kind: ForegroundEventKind::Press,
            data: Some(data),
        });

        assert_eq!(f.navigator.last().unwrap().0, Destination::Chat);
        assert_eq!(f.notifications.unread_count(), 0);
    }

    #[tokio::test]
    async fn test_dismiss_event_does_not_route() {
        let f = fixture();
        f.gateway.start().await.unwrap();

        f.display.emit_event(crate::clients::ForegroundEvent {
            kind: ForegroundEventKind::Dismissed,
            data: Some(NoticeData::new()),
        });

        assert!(f.navigator.is_empty());
    }

    #[tokio::test]
    async fn test_cold_start_replays_route() {
        let f = fixture();
        f.push
            .set_initial_notification(Some(remote(None, &[("screen", "Chat")])));
        f.display.set_initial_notification(Some(
            [("screen".to_string(), "Notifications".to_string())].into(),
        ));

        f.gateway.start().await.unwrap();
        tokio::task::yield_now().await;

        let calls = f.navigator.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, Destination::Chat);
        assert_eq!(calls[1].0, Destination::Notifications);
    }

    #[tokio::test]
    async fn test_handle_local_persists_and_publishes() {
        let f = fixture();
        let notices = Arc::new(Mutex::new(Vec::new()));
        {
            let notices = Arc::clone(&notices);
            f.bus.subscribe(Arc::new(move |n: &InAppNotice| {
                notices.lock().unwrap().push(n.clone());
                Ok(())
            }));
        }

        f.gateway.handle_local(
            NewNotification {
                title: "Special Offer".to_string(),
                body: "50% off electronics".to_string(),
                kind: NotificationKind::Promotion,
            },
            None,
        );

        assert_eq!(f.notifications.len(), 1);
        let notices = notices.lock().unwrap();
        let data = notices[0].data.as_ref().unwrap();
        assert_eq!(data.get(KEY_SCREEN).unwrap(), "Notifications");
        assert!(data.contains_key(KEY_NOTIFICATION_ID));
    }

    #[tokio::test]
    async fn test_handle_local_respects_enablement() {
        let f = fixture();
        f.settings.set_push_enabled(false);

        f.gateway.handle_local(
            NewNotification {
                title: "t".to_string(),
                body: "b".to_string(),
                kind: NotificationKind::Info,
            },
            None,
        );

        assert!(f.notifications.is_empty());
    }

    #[tokio::test]
    async fn test_no_delivery_after_stop() {
        let f = fixture();
        f.gateway.start().await.unwrap();
        f.gateway.stop();

        f.push.emit_message(remote(Some("m1"), &[]));
        assert!(f.notifications.is_empty());
    }

    #[tokio::test]
    async fn test_identity_change_applies_to_next_message() {
        let f = fixture();
        f.gateway.start().await.unwrap();

        f.identity.set_user(Some(AuthUser {
            id: "someone-else".to_string(),
            email: None,
            display_name: None,
        }));
        f.push
            .emit_message(remote(Some("m1"), &[("senderId", "me")]));

        // "me" is no longer the current user, so the message notifies
        assert_eq!(f.notifications.len(), 1);
    }
}
