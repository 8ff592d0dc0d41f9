/// In-app notice bus
///
/// Process-wide publish/subscribe channel for ephemeral, user-visible
/// notices, decoupled from their origin. Fan-out is synchronous and
/// best-effort: a notice published with no active subscriber is lost.
use crate::models::InAppNotice;
use std::sync::{Arc, Mutex, Weak};
use tracing::warn;
use uuid::Uuid;

/// Subscriber callback. A returned error is logged and dropped; it never
/// reaches the publisher or the remaining subscribers.
pub type NoticeHandler = Arc<dyn Fn(&InAppNotice) -> anyhow::Result<()> + Send + Sync>;

struct Subscriber {
    id: Uuid,
    handler: NoticeHandler,
}

#[derive(Default)]
pub struct InAppNoticeBus {
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
}

impl InAppNoticeBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fan out to all current subscribers, in subscription order. The
    /// subscriber list is released before any handler runs, so handlers may
    /// subscribe or unsubscribe reentrantly.
    pub fn publish(&self, notice: &InAppNotice) {
        let handlers: Vec<NoticeHandler> = self
            .subscribers
            .lock()
            .unwrap()
            .iter()
            .map(|s| Arc::clone(&s.handler))
            .collect();
        for handler in handlers {
            if let Err(e) = handler(notice) {
                warn!("in-app notice subscriber failed: {:#}", e);
            }
        }
    }

    pub fn subscribe(&self, handler: NoticeHandler) -> NoticeSubscription {
        let id = Uuid::new_v4();
        self.subscribers
            .lock()
            .unwrap()
            .push(Subscriber { id, handler });
        NoticeSubscription {
            id,
            subscribers: Arc::downgrade(&self.subscribers),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }
}

/// Explicit subscription token; dropping it does not unsubscribe.
pub struct NoticeSubscription {
    id: Uuid,
    subscribers: Weak<Mutex<Vec<Subscriber>>>,
}

impl NoticeSubscription {
    pub fn unsubscribe(self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            subscribers.lock().unwrap().retain(|s| s.id != self.id);
        }
    }
}
