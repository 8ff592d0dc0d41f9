use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub notify: NotifyConfig,
    pub chat: ChatConfig,
    pub notifications: NotificationConfig,
}

/// Outbound topic-notify endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    pub url: String,
    pub app_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Push topic toggled on sign-in/sign-out.
    pub topic: String,
    /// Default chat room routed to when a payload carries none.
    pub room: String,
    /// Head window size and pagination page size for the message feed.
    pub page_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Retention window for inbound message deduplication, in seconds.
    pub dedup_ttl_secs: u64,
    /// Default in-app notice display duration, in milliseconds.
    pub notice_duration_ms: u64,
    /// Settle delay between stop and start on reinitialize, in milliseconds.
    pub reinit_delay_ms: u64,
    pub channel_id: String,
    pub channel_name: String,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Config {
            notify: NotifyConfig {
                url: std::env::var("NOTIFY_URL")
                    .unwrap_or_else(|_| "http://localhost:8787/notify".to_string()),
                app_key: std::env::var("NOTIFY_APP_KEY").unwrap_or_default(),
            },
            chat: ChatConfig {
                topic: std::env::var("CHAT_TOPIC")
                    .unwrap_or_else(|_| "global-chat".to_string()),
                room: std::env::var("CHAT_ROOM").unwrap_or_else(|_| "global".to_string()),
                page_size: std::env::var("CHAT_PAGE_SIZE")
                    .unwrap_or_else(|_| "40".to_string())
                    .parse()?,
            },
            notifications: NotificationConfig {
                dedup_ttl_secs: std::env::var("NOTIFICATION_DEDUP_TTL_SECS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()?,
                notice_duration_ms: std::env::var("NOTICE_DURATION_MS")
                    .unwrap_or_else(|_| "3500".to_string())
                    .parse()?,
                reinit_delay_ms: std::env::var("GATEWAY_REINIT_DELAY_MS")
                    .unwrap_or_else(|_| "250".to_string())
                    .parse()?,
                channel_id: std::env::var("NOTIFICATION_CHANNEL_ID")
                    .unwrap_or_else(|_| "default".to_string()),
                channel_name: std::env::var("NOTIFICATION_CHANNEL_NAME")
                    .unwrap_or_else(|_| "Default".to_string()),
            },
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            notify: NotifyConfig {
                url: "http://localhost:8787/notify".to_string(),
                app_key: String::new(),
            },
            chat: ChatConfig {
                topic: "global-chat".to_string(),
                room: "global".to_string(),
                page_size: 40,
            },
            notifications: NotificationConfig {
                dedup_ttl_secs: 60,
                notice_duration_ms: 3500,
                reinit_delay_ms: 250,
                channel_id: "default".to_string(),
                channel_name: "Default".to_string(),
            },
        }
    }
}
