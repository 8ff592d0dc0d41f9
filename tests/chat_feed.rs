/// Feed-level properties: head window mirroring, backward pagination,
/// ordering and duplicate-freedom across both.
use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use storefront_chat::clients::memory::{InMemoryIdentity, InMemoryMessageLog};
use storefront_chat::models::{AuthUser, ChatMessage, MessageKind, OutboundNotice};
use storefront_chat::services::TopicNotifier;
use storefront_chat::{ChatComposer, ChatFeedLoader};

fn message(id: &str, age_secs: i64) -> ChatMessage {
    ChatMessage {
        id: id.to_string(),
        text: format!("message {id}"),
        kind: MessageKind::Text,
        sender_id: "friend".to_string(),
        sender_email: "friend@example.com".to_string(),
        sender_name: None,
        created_at: Some(Utc::now() - Duration::seconds(age_secs)),
    }
}

fn seeded_log(count: usize) -> Arc<InMemoryMessageLog> {
    let log = Arc::new(InMemoryMessageLog::new());
    log.seed(
        (0..count)
            .map(|i| message(&format!("m{i}"), i as i64))
            .collect(),
    );
    log
}

fn assert_newest_first_no_dups(messages: &[ChatMessage]) {
    let ids: HashSet<&str> = messages.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids.len(), messages.len(), "duplicate ids in feed");
    for pair in messages.windows(2) {
        assert!(
            pair[0].created_at >= pair[1].created_at,
            "feed not newest-first"
        );
    }
}

#[tokio::test]
async fn head_plus_page_is_newest_first_with_first_n_unchanged() {
    let log = seeded_log(12);
    let loader = ChatFeedLoader::new(log.clone(), 5);
    loader.attach();

    let head = loader.messages();
    assert_eq!(head.len(), 5);

    assert!(loader.load_more().await.unwrap());
    let all = loader.messages();

    // N + M entries, newest-first, no duplicates, first N unchanged
    assert_eq!(all.len(), 10);
    assert_newest_first_no_dups(&all);
    assert_eq!(&all[..5], &head[..]);
}

#[tokio::test]
async fn pagination_walks_to_the_end_and_stays_there() {
    let log = seeded_log(9);
    let loader = ChatFeedLoader::new(log.clone(), 4);
    loader.attach();

    assert!(loader.load_more().await.unwrap());
    assert!(loader.load_more().await.unwrap());
    assert_eq!(loader.len(), 9);
    assert!(!loader.reached_end());

    // next page is empty: terminal state
    assert!(!loader.load_more().await.unwrap());
    assert!(loader.reached_end());

    // reached_end short-circuits: state unchanged
    assert!(!loader.load_more().await.unwrap());
    assert_eq!(loader.len(), 9);
    assert_newest_first_no_dups(&loader.messages());
}

#[tokio::test]
async fn live_arrivals_update_the_head_without_touching_the_tail() {
    let log = seeded_log(12);
    let loader = ChatFeedLoader::new(log.clone(), 5);
    loader.attach();
    loader.load_more().await.unwrap();

    let tail_before: Vec<String> = loader.messages()[5..]
        .iter()
        .map(|m| m.id.clone())
        .collect();

    log.push_remote(message("fresh-1", 0));
    log.push_remote(message("fresh-2", 0));

    let all = loader.messages();
    assert_eq!(all[0].id, "fresh-2");
    let tail_after: Vec<String> = all
        .iter()
        .filter(|m| tail_before.contains(&m.id))
        .map(|m| m.id.clone())
        .collect();
    assert_eq!(tail_after, tail_before, "paged-in tail was reordered");
    assert_newest_first_no_dups(&all);
}

#[tokio::test]
async fn sent_messages_appear_at_the_head_of_the_feed() {
    let log = seeded_log(3);
    let loader = ChatFeedLoader::new(log.clone(), 10);
    loader.attach();

    struct NullNotifier;

    #[async_trait::async_trait]
    impl TopicNotifier for NullNotifier {
        async fn notify(&self, _notice: &OutboundNotice) -> storefront_chat::Result<()> {
            Ok(())
        }
    }

    let identity = Arc::new(InMemoryIdentity::signed_in(AuthUser {
        id: "me".to_string(),
        email: Some("me@example.com".to_string()),
        display_name: Some("me".to_string()),
    }));
    let composer = ChatComposer::new(log.clone(), identity, Arc::new(NullNotifier));

    composer.send_message("fresh off the keyboard").await.unwrap();

    let all = loader.messages();
    assert_eq!(all[0].text, "fresh off the keyboard");
    assert_eq!(all[0].sender_id, "me");
    assert!(all[0].created_at.is_some());
    assert_newest_first_no_dups(&all);
}
