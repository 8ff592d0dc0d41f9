/// Message deduplication window
///
/// Time-bounded membership set preventing the same inbound message from
/// being processed twice. The transport only guarantees at-least-once,
/// unordered delivery; this is the at-most-once gate in front of it.
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub const DEFAULT_DEDUP_TTL: Duration = Duration::from_secs(60);

pub struct DedupWindow {
    ttl: Duration,
    seen: Mutex<HashMap<String, Instant>>,
}

impl DedupWindow {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_DEDUP_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        DedupWindow {
            ttl,
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// True exactly once per id per retention window. An empty id always
    /// processes, since uniqueness cannot be established for it.
    ///
    /// Check and insert happen under one lock acquisition; two rapid calls
    /// for the same id can never both observe it absent.
    pub fn should_process(&self, id: &str) -> bool {
        if id.is_empty() {
            return true;
        }
        let mut seen = self.seen.lock().unwrap();
        let now = Instant::now();
        seen.retain(|_, inserted| now.duration_since(*inserted) < self.ttl);
        match seen.entry(id.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(now);
                true
            }
        }
    }

    pub fn clear(&self) {
        self.seen.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.lock().unwrap().is_empty()
    }
}

impl Default for DedupWindow {
    fn default() -> Self {
        Self::new()
    }
}
