pub mod chat_feed;
pub mod chat_send;
pub mod dedup;
pub mod gateway;
pub mod notice_bus;
pub mod router;
pub mod session;
pub mod setup;

pub use chat_feed::ChatFeedLoader;
pub use chat_send::{ChatComposer, HttpTopicNotifier, TopicNotifier};
pub use dedup::DedupWindow;
pub use gateway::{GatewayState, NotificationGateway};
pub use notice_bus::{InAppNoticeBus, NoticeSubscription};
pub use router::NotificationRouter;
pub use session::Session;
pub use setup::{NotificationSetup, SetupOutcome};
