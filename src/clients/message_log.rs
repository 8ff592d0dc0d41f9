use super::ListenerHandle;
use crate::error::Result;
use crate::models::{ChatMessage, NewChatMessage};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Callback invoked with each head snapshot, newest-first, in emission order.
pub type SnapshotHandler = Arc<dyn Fn(Vec<ChatMessage>) + Send + Sync>;

/// Marker identifying the oldest message loaded so far; pages fetched through
/// it are strictly older than the message it points at.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageCursor {
    pub created_at: Option<DateTime<Utc>>,
    pub id: String,
}

impl MessageCursor {
    pub fn of(message: &ChatMessage) -> Self {
        MessageCursor {
            created_at: message.created_at,
            id: message.id.clone(),
        }
    }
}

/// Ordered remote message log (creation time descending). Append-only; the
/// log is the source of truth and the local feed a read-only window.
#[async_trait]
pub trait MessageLog: Send + Sync {
    /// Realtime subscription to the newest `limit` messages. The current
    /// head is delivered immediately, then again on every change.
    fn subscribe_head(&self, limit: usize, handler: SnapshotHandler) -> ListenerHandle;

    /// Fetch up to `limit` messages strictly older than `cursor`.
    async fn messages_before(&self, cursor: &MessageCursor, limit: usize)
        -> Result<Vec<ChatMessage>>;

    /// Append a new message; the server assigns id and creation time.
    async fn append(&self, draft: NewChatMessage) -> Result<ChatMessage>;
}
