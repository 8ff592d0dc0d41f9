/// Settings store
///
/// Persisted push enablement flag with change notification. The store is
/// the single writer; everyone else reads the latest value at the point of
/// use rather than caching it.
use crate::clients::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::warn;

const STORAGE_KEY: &str = "settings-storage";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsSnapshot {
    push_notifications_enabled: bool,
}

pub struct SettingsStore {
    kv: Arc<dyn KeyValueStore>,
    enabled: Mutex<bool>,
    changes: watch::Sender<bool>,
}

impl SettingsStore {
    /// Load the persisted flag; defaults to enabled.
    pub fn load(kv: Arc<dyn KeyValueStore>) -> Self {
        let enabled = match kv.get(STORAGE_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<SettingsSnapshot>(&raw)
                .map(|s| s.push_notifications_enabled)
                .unwrap_or_else(|e| {
                    warn!("corrupt settings snapshot discarded: {}", e);
                    true
                }),
            Ok(None) => true,
            Err(e) => {
                warn!("failed to read settings snapshot: {}", e);
                true
            }
        };
        let (changes, _) = watch::channel(enabled);
        SettingsStore {
            kv,
            enabled: Mutex::new(enabled),
            changes,
        }
    }

    pub fn push_enabled(&self) -> bool {
        *self.enabled.lock().unwrap()
    }

    pub fn set_push_enabled(&self, enabled: bool) {
        {
            let mut current = self.enabled.lock().unwrap();
            if *current == enabled {
                return;
            }
            *current = enabled;
        }
        self.persist(enabled);
        let _ = self.changes.send(enabled);
    }

    /// Change notification channel; receivers see the latest value.
    pub fn watch(&self) -> watch::Receiver<bool> {
        self.changes.subscribe()
    }

    fn persist(&self, enabled: bool) {
        let snapshot = SettingsSnapshot {
            push_notifications_enabled: enabled,
        };
        match serde_json::to_string(&snapshot) {
            Ok(raw) => {
                if let Err(e) = self.kv.set(STORAGE_KEY, &raw) {
                    warn!("failed to persist settings: {}", e);
                }
            }
            Err(e) => warn!("failed to serialize settings: {}", e),
        }
    }
}
