/// In-memory collaborator implementations
///
/// In-process stand-ins for the external systems behind the client traits.
/// The demo binary and the test suites drive the pipeline through these;
/// each carries injection points (`emit_*`, `push_remote`, `set_*`) so
/// scenarios can be scripted without a device or a backend.
use super::display::{
    ChannelConfig, DisplayRequest, ForegroundEvent, ForegroundHandler, NotificationDisplay,
};
use super::identity::IdentityProvider;
use super::kv::KeyValueStore;
use super::message_log::{MessageCursor, MessageLog, SnapshotHandler};
use super::navigation::{Destination, Navigator};
use super::push::{MessageHandler, PermissionStatus, PushTransport};
use super::ListenerHandle;
use crate::error::{AppError, Result};
use crate::models::{AuthUser, ChatMessage, NewChatMessage, NoticeData, RemoteMessage};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

type HandlerRegistry<T> = Arc<Mutex<Vec<(Uuid, T)>>>;

fn register<T>(registry: &HandlerRegistry<T>, label: &'static str, handler: T) -> ListenerHandle
where
    T: Send + 'static,
{
    let id = Uuid::new_v4();
    registry.lock().unwrap().push((id, handler));
    let registry = Arc::clone(registry);
    ListenerHandle::new(label, move || {
        registry.lock().unwrap().retain(|(entry, _)| *entry != id);
        Ok(())
    })
}

/// In-memory push transport with scriptable delivery.
#[derive(Default)]
pub struct InMemoryPushTransport {
    message_handlers: HandlerRegistry<MessageHandler>,
    opened_handlers: HandlerRegistry<MessageHandler>,
    initial: Mutex<Option<RemoteMessage>>,
    permission: Mutex<PermissionStatus>,
    registered: AtomicBool,
    topics: Mutex<HashSet<String>>,
    fail_token_ops: AtomicBool,
    fail_topic_ops: AtomicBool,
}

impl InMemoryPushTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a foreground message to every registered handler, in
    /// registration order.
    pub fn emit_message(&self, message: RemoteMessage) {
        let handlers: Vec<MessageHandler> = self
            .message_handlers
            .lock()
            .unwrap()
            .iter()
            .map(|(_, h)| Arc::clone(h))
            .collect();
        for handler in handlers {
            handler(message.clone());
        }
    }

    /// Deliver a notification-opened event.
    pub fn emit_opened(&self, message: RemoteMessage) {
        let handlers: Vec<MessageHandler> = self
            .opened_handlers
            .lock()
            .unwrap()
            .iter()
            .map(|(_, h)| Arc::clone(h))
            .collect();
        for handler in handlers {
            handler(message.clone());
        }
    }

    pub fn set_initial_notification(&self, message: Option<RemoteMessage>) {
        *self.initial.lock().unwrap() = message;
    }

    pub fn set_permission(&self, status: PermissionStatus) {
        *self.permission.lock().unwrap() = status;
    }

    pub fn set_fail_token_ops(&self, fail: bool) {
        self.fail_token_ops.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_topic_ops(&self, fail: bool) {
        self.fail_topic_ops.store(fail, Ordering::SeqCst);
    }

    pub fn message_handler_count(&self) -> usize {
        self.message_handlers.lock().unwrap().len()
    }

    pub fn opened_handler_count(&self) -> usize {
        self.opened_handlers.lock().unwrap().len()
    }

    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::SeqCst)
    }

    pub fn subscribed_topics(&self) -> HashSet<String> {
        self.topics.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushTransport for InMemoryPushTransport {
    fn on_message(&self, handler: MessageHandler) -> ListenerHandle {
        register(&self.message_handlers, "push.on_message", handler)
    }

    fn on_notification_opened(&self, handler: MessageHandler) -> ListenerHandle {
        register(&self.opened_handlers, "push.on_notification_opened", handler)
    }

    async fn initial_notification(&self) -> Result<Option<RemoteMessage>> {
        Ok(self.initial.lock().unwrap().take())
    }

    async fn request_permission(&self) -> Result<PermissionStatus> {
        Ok(*self.permission.lock().unwrap())
    }

    async fn token(&self) -> Result<String> {
        if self.fail_token_ops.load(Ordering::SeqCst) {
            return Err(AppError::Transport("token fetch unavailable".to_string()));
        }
        Ok("push-token-dev".to_string())
    }

    async fn delete_token(&self) -> Result<()> {
        if self.fail_token_ops.load(Ordering::SeqCst) {
            return Err(AppError::Transport("token delete unavailable".to_string()));
        }
        Ok(())
    }

    async fn register_device(&self) -> Result<()> {
        self.registered.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn unregister_device(&self) -> Result<()> {
        if self.fail_token_ops.load(Ordering::SeqCst) {
            return Err(AppError::Transport("unregister unavailable".to_string()));
        }
        self.registered.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn subscribe_topic(&self, topic: &str) -> Result<()> {
        if self.fail_topic_ops.load(Ordering::SeqCst) {
            return Err(AppError::Transport("topic subscribe failed".to_string()));
        }
        self.topics.lock().unwrap().insert(topic.to_string());
        Ok(())
    }

    async fn unsubscribe_topic(&self, topic: &str) -> Result<()> {
        if self.fail_topic_ops.load(Ordering::SeqCst) {
            return Err(AppError::Transport("topic unsubscribe failed".to_string()));
        }
        self.topics.lock().unwrap().remove(topic);
        Ok(())
    }
}

/// In-memory notification display recording everything shown.
#[derive(Default)]
pub struct InMemoryDisplay {
    channels: Mutex<Vec<ChannelConfig>>,
    displayed: Mutex<Vec<DisplayRequest>>,
    handlers: HandlerRegistry<ForegroundHandler>,
    initial: Mutex<Option<NoticeData>>,
}

impl InMemoryDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit_event(&self, event: ForegroundEvent) {
        let handlers: Vec<ForegroundHandler> = self
            .handlers
            .lock()
            .unwrap()
            .iter()
            .map(|(_, h)| Arc::clone(h))
            .collect();
        for handler in handlers {
            handler(event.clone());
        }
    }

    pub fn set_initial_notification(&self, data: Option<NoticeData>) {
        *self.initial.lock().unwrap() = data;
    }

    pub fn channel_count(&self) -> usize {
        self.channels.lock().unwrap().len()
    }

    pub fn displayed(&self) -> Vec<DisplayRequest> {
        self.displayed.lock().unwrap().clone()
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationDisplay for InMemoryDisplay {
    async fn create_channel(&self, channel: &ChannelConfig) -> Result<()> {
        let mut channels = self.channels.lock().unwrap();
        if !channels.iter().any(|c| c.id == channel.id) {
            channels.push(channel.clone());
        }
        Ok(())
    }

    async fn display(&self, request: DisplayRequest) -> Result<()> {
        self.displayed.lock().unwrap().push(request);
        Ok(())
    }

    fn on_foreground_event(&self, handler: ForegroundHandler) -> ListenerHandle {
        register(&self.handlers, "display.on_foreground_event", handler)
    }

    async fn initial_notification(&self) -> Result<Option<NoticeData>> {
        Ok(self.initial.lock().unwrap().take())
    }
}

/// In-memory ordered message log with live head snapshots, newest-first.
#[derive(Default)]
pub struct InMemoryMessageLog {
    messages: Arc<Mutex<Vec<ChatMessage>>>,
    subscribers: Arc<Mutex<Vec<(Uuid, usize, SnapshotHandler)>>>,
}

impl InMemoryMessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the log without notifying subscribers (fixture setup).
    pub fn seed(&self, messages: Vec<ChatMessage>) {
        *self.messages.lock().unwrap() = messages;
    }

    /// Insert a message as if another client appended it, then re-emit the
    /// head window to every subscriber.
    pub fn push_remote(&self, message: ChatMessage) {
        self.messages.lock().unwrap().insert(0, message);
        self.emit_all();
    }

    pub fn len(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().unwrap().is_empty()
    }

    /// Full log contents, newest-first.
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.messages.lock().unwrap().clone()
    }

    fn head(&self, limit: usize) -> Vec<ChatMessage> {
        let messages = self.messages.lock().unwrap();
        messages.iter().take(limit).cloned().collect()
    }

    fn emit_all(&self) {
        let subscribers: Vec<(usize, SnapshotHandler)> = self
            .subscribers
            .lock()
            .unwrap()
            .iter()
            .map(|(_, limit, handler)| (*limit, Arc::clone(handler)))
            .collect();
        for (limit, handler) in subscribers {
            handler(self.head(limit));
        }
    }
}

#[async_trait]
impl MessageLog for InMemoryMessageLog {
    fn subscribe_head(&self, limit: usize, handler: SnapshotHandler) -> ListenerHandle {
        let id = Uuid::new_v4();
        self.subscribers
            .lock()
            .unwrap()
            .push((id, limit, Arc::clone(&handler)));
        // the current head is delivered immediately on subscribe
        handler(self.head(limit));
        let subscribers = Arc::clone(&self.subscribers);
        ListenerHandle::new("message_log.subscribe_head", move || {
            subscribers.lock().unwrap().retain(|(entry, _, _)| *entry != id);
            Ok(())
        })
    }

    async fn messages_before(
        &self,
        cursor: &MessageCursor,
        limit: usize,
    ) -> Result<Vec<ChatMessage>> {
        let messages = self.messages.lock().unwrap();
        let older = match messages.iter().position(|m| m.id == cursor.id) {
            Some(index) => messages.iter().skip(index + 1),
            // cursor no longer in the window; fall back to timestamp order
            None => {
                let cutoff = cursor.created_at;
                return Ok(messages
                    .iter()
                    .filter(|m| m.created_at < cutoff)
                    .take(limit)
                    .cloned()
                    .collect());
            }
        };
        Ok(older.take(limit).cloned().collect())
    }

    async fn append(&self, draft: NewChatMessage) -> Result<ChatMessage> {
        let message = ChatMessage {
            id: Uuid::new_v4().to_string(),
            text: draft.text,
            kind: draft.kind,
            sender_id: draft.sender_id,
            sender_email: draft.sender_email,
            sender_name: draft.sender_name,
            created_at: Some(Utc::now()),
        };
        self.messages.lock().unwrap().insert(0, message.clone());
        self.emit_all();
        Ok(message)
    }
}

/// In-memory identity provider.
#[derive(Default)]
pub struct InMemoryIdentity {
    user: Mutex<Option<AuthUser>>,
}

impl InMemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(user: AuthUser) -> Self {
        InMemoryIdentity {
            user: Mutex::new(Some(user)),
        }
    }

    pub fn set_user(&self, user: Option<AuthUser>) {
        *self.user.lock().unwrap() = user;
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentity {
    fn current_user(&self) -> Option<AuthUser> {
        self.user.lock().unwrap().clone()
    }

    async fn sign_in(&self, email: &str, _password: &str) -> Result<AuthUser> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AppError::Transport("email required".to_string()));
        }
        let local = email.split('@').next().unwrap_or(email).to_string();
        let user = AuthUser {
            id: Uuid::new_v4().to_string(),
            email: Some(email.to_string()),
            display_name: Some(local),
        };
        *self.user.lock().unwrap() = Some(user.clone());
        Ok(user)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser> {
        self.sign_in(email, password).await
    }

    async fn sign_out(&self) -> Result<()> {
        *self.user.lock().unwrap() = None;
        Ok(())
    }
}

/// Navigator that records every issued command.
#[derive(Default)]
pub struct RecordingNavigator {
    calls: Mutex<Vec<(Destination, Option<NoticeData>)>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(Destination, Option<NoticeData>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<(Destination, Option<NoticeData>)> {
        self.calls.lock().unwrap().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.lock().unwrap().is_empty()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, destination: Destination, params: Option<NoticeData>) {
        self.calls.lock().unwrap().push((destination, params));
    }
}

/// In-memory key-value store with optional write-failure injection.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Storage("write unavailable".to_string()));
        }
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}
