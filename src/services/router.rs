/// Notification routing
///
/// Maps an inbound notification's data map to at most one navigation
/// command. Payload shape varies by message origin, so unmatched data is a
/// silent no-op rather than an error.
use crate::clients::{Destination, Navigator};
use crate::models::{
    is_chat_payload, NoticeData, KEY_NOTIFICATION_ID, KEY_ROOM_ID, KEY_SCREEN,
};
use crate::stores::NotificationStore;
use std::sync::Arc;
use tracing::debug;

pub struct NotificationRouter {
    navigator: Arc<dyn Navigator>,
    notifications: Arc<NotificationStore>,
}

impl NotificationRouter {
    pub fn new(navigator: Arc<dyn Navigator>, notifications: Arc<NotificationStore>) -> Self {
        NotificationRouter {
            navigator,
            notifications,
        }
    }

    /// Resolve a payload to a navigation command.
    ///
    /// Priority: explicit `screen` value, then chat-shaped structural hints
    /// (a room id or a chat message type), then a bare notification id,
    /// which lands on the notification list. A carried notification id is
    /// marked read before any navigation is issued.
    pub fn route(&self, data: Option<&NoticeData>) {
        let Some(data) = data else {
            return;
        };

        if let Some(id) = data.get(KEY_NOTIFICATION_ID) {
            self.notifications.mark_as_read(id);
        }

        if let Some(destination) = data.get(KEY_SCREEN).and_then(|s| Destination::from_screen(s)) {
            self.navigator.navigate(destination, self.params_for(destination, data));
            return;
        }

        if is_chat_payload(data) {
            self.navigator
                .navigate(Destination::Chat, self.params_for(Destination::Chat, data));
            return;
        }

        if data.contains_key(KEY_NOTIFICATION_ID) {
            self.navigator.navigate(Destination::Notifications, None);
            return;
        }

        debug!("unrecognized notification payload, ignoring");
    }

    fn params_for(&self, destination: Destination, data: &NoticeData) -> Option<NoticeData> {
        if destination != Destination::Chat {
            return None;
        }
        data.get(KEY_ROOM_ID).map(|room| {
            let mut params = NoticeData::new();
            params.insert(KEY_ROOM_ID.to_string(), room.clone());
            params
        })
    }
}
