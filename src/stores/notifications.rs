/// Durable notification store
///
/// Holds the persisted, newest-first notification list. The store is the
/// single writer of this state; all mutations are persisted to the key-value
/// collaborator as a JSON snapshot, best-effort.
use crate::clients::KeyValueStore;
use crate::models::{NewNotification, StoredNotification};
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

const STORAGE_KEY: &str = "notifications-storage";

/// Time+random derived record id.
fn generate_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(char::from)
        .collect();
    format!("{}-{}", Utc::now().timestamp_millis(), suffix.to_lowercase())
}

pub struct NotificationStore {
    kv: Arc<dyn KeyValueStore>,
    items: Mutex<Vec<StoredNotification>>,
}

impl NotificationStore {
    /// Load the persisted list, discarding unreadable snapshots.
    pub fn load(kv: Arc<dyn KeyValueStore>) -> Self {
        let items = match kv.get(STORAGE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(items) => items,
                Err(e) => {
                    warn!("corrupt notification snapshot discarded: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("failed to read notification snapshot: {}", e);
                Vec::new()
            }
        };
        NotificationStore {
            kv,
            items: Mutex::new(items),
        }
    }

    /// Create a record and prepend it, keeping the list newest-first.
    pub fn add(&self, draft: NewNotification) -> StoredNotification {
        let record = StoredNotification {
            id: generate_id(),
            title: draft.title,
            body: draft.body,
            timestamp: Utc::now().timestamp_millis(),
            is_read: false,
            kind: draft.kind,
        };
        self.items.lock().unwrap().insert(0, record.clone());
        debug!(id = %record.id, "notification record created");
        self.persist();
        record
    }

    pub fn mark_as_read(&self, id: &str) -> bool {
        let changed = {
            let mut items = self.items.lock().unwrap();
            match items.iter_mut().find(|n| n.id == id) {
                Some(record) if !record.is_read => {
                    record.is_read = true;
                    true
                }
                _ => false,
            }
        };
        if changed {
            self.persist();
        }
        changed
    }

    pub fn mark_all_read(&self) {
        let changed = {
            let mut items = self.items.lock().unwrap();
            let mut changed = false;
            for record in items.iter_mut() {
                if !record.is_read {
                    record.is_read = true;
                    changed = true;
                }
            }
            changed
        };
        if changed {
            self.persist();
        }
    }

    pub fn remove(&self, id: &str) -> bool {
        let changed = {
            let mut items = self.items.lock().unwrap();
            let before = items.len();
            items.retain(|n| n.id != id);
            items.len() != before
        };
        if changed {
            self.persist();
        }
        changed
    }

    pub fn clear(&self) {
        self.items.lock().unwrap().clear();
        self.persist();
    }

    pub fn unread_count(&self) -> usize {
        self.items.lock().unwrap().iter().filter(|n| !n.is_read).count()
    }

    pub fn list(&self) -> Vec<StoredNotification> {
        self.items.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().unwrap().is_empty()
    }

    // Best-effort: a failed write leaves the in-memory list authoritative
    // until the next successful snapshot.
    fn persist(&self) {
        let snapshot = {
            let items = self.items.lock().unwrap();
            serde_json::to_string(&*items)
        };
        match snapshot {
            Ok(snapshot) => {
                if let Err(e) = self.kv.set(STORAGE_KEY, &snapshot) {
                    warn!("failed to persist notification list: {}", e);
                }
            }
            Err(e) => warn!("failed to serialize notification list: {}", e),
        }
    }
}
