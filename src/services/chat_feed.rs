/// Chat feed loader
///
/// Maintains two cursors over the server-ordered (creation time descending)
/// message log: a realtime head window mirroring the newest N messages, and
/// a backward cursor through which strictly older pages are fetched. The
/// in-memory sequence is always newest-first with no duplicate ids.
use crate::clients::{ListenerHandle, MessageCursor, MessageLog};
use crate::error::Result;
use crate::models::ChatMessage;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct FeedState {
    messages: Vec<ChatMessage>,
    /// Length of the head-visible slice at the front of `messages`.
    head_len: usize,
    cursor: Option<MessageCursor>,
    loading: bool,
    loading_more: bool,
    reached_end: bool,
}

pub struct ChatFeedLoader {
    log: Arc<dyn MessageLog>,
    page_size: usize,
    state: Arc<Mutex<FeedState>>,
    head: Mutex<Option<ListenerHandle>>,
}

impl ChatFeedLoader {
    pub fn new(log: Arc<dyn MessageLog>, page_size: usize) -> Self {
        ChatFeedLoader {
            log,
            page_size,
            state: Arc::new(Mutex::new(FeedState {
                loading: true,
                ..FeedState::default()
            })),
            head: Mutex::new(None),
        }
    }

    /// Open the realtime head subscription. Snapshots are applied in
    /// emission order; each one replaces the head-visible slice while
    /// previously paged-in older messages stay appended after it.
    pub fn attach(&self) {
        let state = Arc::clone(&self.state);
        let handle = self.log.subscribe_head(
            self.page_size,
            Arc::new(move |snapshot| Self::apply_head_snapshot(&state, snapshot)),
        );

        let mut slot = self.head.lock().unwrap();
        if let Some(previous) = slot.take() {
            if let Err(e) = previous.detach() {
                warn!("failed to detach previous head subscription: {}", e);
            }
        }
        *slot = Some(handle);
    }

    /// Close the head subscription; no snapshot can mutate state afterwards.
    pub fn detach(&self) {
        if let Some(handle) = self.head.lock().unwrap().take() {
            if let Err(e) = handle.detach() {
                warn!("failed to detach head subscription: {}", e);
            }
        }
    }

    fn apply_head_snapshot(state: &Mutex<FeedState>, snapshot: Vec<ChatMessage>) {
        let mut st = state.lock().unwrap();

        // The cursor pins to the oldest item of the first population only;
        // later snapshots must not rewind it forward.
        if st.cursor.is_none() {
            if let Some(oldest) = snapshot.last() {
                st.cursor = Some(MessageCursor::of(oldest));
            }
        }

        let head_len = st.head_len.min(st.messages.len());
        let tail = st.messages.split_off(head_len);
        let snapshot_ids: HashSet<&str> = snapshot.iter().map(|m| m.id.as_str()).collect();
        let tail: Vec<ChatMessage> = tail
            .into_iter()
            .filter(|m| !snapshot_ids.contains(m.id.as_str()))
            .collect();

        st.head_len = snapshot.len();
        st.messages = snapshot;
        st.messages.extend(tail);
        st.loading = false;
    }

    /// Fetch the next page of strictly older messages. Returns false when
    /// nothing was fetched: a load is already in flight, the end was
    /// reached, or no cursor is established yet. The in-flight guard is a
    /// single flag checked synchronously before the fetch, so concurrent
    /// calls collapse to one request.
    pub async fn load_more(&self) -> Result<bool> {
        let cursor = {
            let mut st = self.state.lock().unwrap();
            if st.loading_more || st.reached_end {
                return Ok(false);
            }
            let Some(cursor) = st.cursor.clone() else {
                return Ok(false);
            };
            st.loading_more = true;
            cursor
        };

        let fetched = self.log.messages_before(&cursor, self.page_size).await;

        let mut st = self.state.lock().unwrap();
        st.loading_more = false;
        let batch = fetched?;

        if batch.is_empty() {
            debug!("reached the end of the message log");
            st.reached_end = true;
            return Ok(false);
        }

        // Advance off the raw batch so a fully-duplicate page still makes
        // progress instead of refetching the same window.
        if let Some(oldest) = batch.last() {
            st.cursor = Some(MessageCursor::of(oldest));
        }
        let existing: HashSet<String> = st.messages.iter().map(|m| m.id.clone()).collect();
        st.messages
            .extend(batch.into_iter().filter(|m| !existing.contains(&m.id)));
        Ok(true)
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.state.lock().unwrap().messages.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().unwrap().messages.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().unwrap().loading
    }

    pub fn is_loading_more(&self) -> bool {
        self.state.lock().unwrap().loading_more
    }

    pub fn reached_end(&self) -> bool {
        self.state.lock().unwrap().reached_end
    }
}
