use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Payload data-map keys recognized across the pipeline.
///
/// These are the wire names used by the push payloads; routing, the gateway
/// and the in-app notice augmentation all read and write the same keys.
pub const KEY_SCREEN: &str = "screen";
pub const KEY_ROOM_ID: &str = "roomId";
pub const KEY_TYPE: &str = "type";
pub const KEY_NOTIFICATION_ID: &str = "notificationId";
pub const KEY_SENDER_ID: &str = "senderId";

/// Untyped payload data map carried by remote messages and notices.
pub type NoticeData = HashMap<String, String>;

/// Whether a payload structurally looks like a chat message: it names a
/// room, or carries a chat message type.
pub fn is_chat_payload(data: &NoticeData) -> bool {
    data.contains_key(KEY_ROOM_ID)
        || matches!(
            data.get(KEY_TYPE).map(String::as_str),
            Some("text") | Some("gift") | Some("chat")
        )
}

/// Icon shown on an ephemeral in-app notice
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NoticeIcon {
    Chat,
    Gift,
    Info,
}

impl NoticeIcon {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeIcon::Chat => "chat",
            NoticeIcon::Gift => "gift",
            NoticeIcon::Info => "info",
        }
    }
}

impl Default for NoticeIcon {
    fn default() -> Self {
        NoticeIcon::Info
    }
}

/// Callback invoked when the user presses a notice.
pub type NoticeAction = Arc<dyn Fn() + Send + Sync>;

/// Ephemeral, user-visible notice. Never persisted; broadcast by value and
/// gone after one display cycle.
#[derive(Clone, Default)]
pub struct InAppNotice {
    pub id: Option<String>,
    pub title: Option<String>,
    pub message: String,
    pub icon: NoticeIcon,
    /// Display duration in milliseconds before auto-hide.
    pub duration_ms: u64,
    pub data: Option<NoticeData>,
    pub on_press: Option<NoticeAction>,
}

impl InAppNotice {
    pub fn new(message: impl Into<String>) -> Self {
        InAppNotice {
            message: message.into(),
            duration_ms: 3500,
            ..Default::default()
        }
    }
}

impl fmt::Debug for InAppNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InAppNotice")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("message", &self.message)
            .field("icon", &self.icon)
            .field("duration_ms", &self.duration_ms)
            .field("data", &self.data)
            .field("on_press", &self.on_press.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

/// Category of a durable notification record
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Promotion,
    Order,
    General,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Info => "info",
            NotificationKind::Promotion => "promotion",
            NotificationKind::Order => "order",
            NotificationKind::General => "general",
        }
    }

    /// Parse a payload `type` value, defaulting unknown values to General.
    pub fn parse(s: &str) -> NotificationKind {
        match s.to_lowercase().as_str() {
            "info" => NotificationKind::Info,
            "promotion" => NotificationKind::Promotion,
            "order" => NotificationKind::Order,
            _ => NotificationKind::General,
        }
    }
}

/// Persisted, user-visible notification record surviving across sessions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredNotification {
    /// Unique, time+random derived id
    pub id: String,

    pub title: String,

    pub body: String,

    /// Creation time, epoch milliseconds
    pub timestamp: i64,

    pub is_read: bool,

    #[serde(rename = "type")]
    pub kind: NotificationKind,
}

/// Draft for a new durable notification
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub title: String,
    pub body: String,
    pub kind: NotificationKind,
}

/// Chat message kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Gift,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Gift => "gift",
        }
    }
}

/// A message in the remote ordered log. Immutable once created; the local
/// feed only ever holds a read-only cached window of these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,

    pub text: String,

    #[serde(rename = "type")]
    pub kind: MessageKind,

    pub sender_id: String,

    pub sender_email: String,

    pub sender_name: Option<String>,

    /// Server-assigned creation time; None until the server stamps it
    pub created_at: Option<DateTime<Utc>>,
}

/// Draft for appending a new message to the remote log
#[derive(Debug, Clone)]
pub struct NewChatMessage {
    pub text: String,
    pub kind: MessageKind,
    pub sender_id: String,
    pub sender_email: String,
    pub sender_name: Option<String>,
}

/// Title/body block of an inbound push payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteNotificationPart {
    pub title: Option<String>,
    pub body: Option<String>,
}

/// Inbound push payload as delivered by the remote transport
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteMessage {
    pub message_id: Option<String>,
    pub notification: Option<RemoteNotificationPart>,
    #[serde(default)]
    pub data: NoticeData,
}

impl RemoteMessage {
    pub fn title(&self) -> Option<&str> {
        self.notification.as_ref().and_then(|n| n.title.as_deref())
    }

    pub fn body(&self) -> Option<&str> {
        self.notification.as_ref().and_then(|n| n.body.as_deref())
    }
}

/// Read-only identity snapshot supplied by the identity collaborator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// Outbound body of the fire-and-forget topic-notify POST
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundNotice {
    pub title: String,
    pub body: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub sender_id: String,
}
