pub mod clients;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod stores;

pub use config::Config;
pub use error::{AppError, Result};
pub use services::{
    ChatComposer, ChatFeedLoader, DedupWindow, InAppNoticeBus, NotificationGateway,
    NotificationRouter, NotificationSetup, Session, SetupOutcome,
};
pub use stores::{NotificationStore, SettingsStore};
