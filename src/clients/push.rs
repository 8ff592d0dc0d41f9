use super::ListenerHandle;
use crate::error::Result;
use crate::models::RemoteMessage;
use async_trait::async_trait;
use std::sync::Arc;

/// Callback invoked with each delivered remote message.
pub type MessageHandler = Arc<dyn Fn(RemoteMessage) + Send + Sync>;

/// Outcome of a notification permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Authorized,
    Provisional,
    Denied,
    /// Denied at the system level; only resolvable from system settings.
    Blocked,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Authorized | PermissionStatus::Provisional)
    }
}

impl Default for PermissionStatus {
    fn default() -> Self {
        PermissionStatus::Authorized
    }
}

/// Remote push message transport.
///
/// Delivery is at-least-once and unordered; the gateway layers dedup and
/// suppression on top. Listener registrations return a [`ListenerHandle`]
/// whose detach is synchronous.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Foreground delivery of a remote message.
    fn on_message(&self, handler: MessageHandler) -> ListenerHandle;

    /// A notification opened the app from background/terminated state.
    fn on_notification_opened(&self, handler: MessageHandler) -> ListenerHandle;

    /// The notification that launched the app, if any. One-shot; covers the
    /// cold-start case where the tap happened before listeners existed.
    async fn initial_notification(&self) -> Result<Option<RemoteMessage>>;

    async fn request_permission(&self) -> Result<PermissionStatus>;

    async fn token(&self) -> Result<String>;

    async fn delete_token(&self) -> Result<()>;

    async fn register_device(&self) -> Result<()>;

    async fn unregister_device(&self) -> Result<()>;

    async fn subscribe_topic(&self, topic: &str) -> Result<()>;

    async fn unsubscribe_topic(&self, topic: &str) -> Result<()>;
}
