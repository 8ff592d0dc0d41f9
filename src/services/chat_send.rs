/// Message sending
///
/// Appending to the remote log is the send; notifying other recipients is a
/// detached follow-up. The append resolves independently of whether the
/// notify call ever succeeds.
use crate::clients::{IdentityProvider, MessageLog};
use crate::config::NotifyConfig;
use crate::error::Result;
use crate::models::{MessageKind, NewChatMessage, OutboundNotice};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outbound "notify others" call about a just-sent message.
#[async_trait]
pub trait TopicNotifier: Send + Sync {
    async fn notify(&self, notice: &OutboundNotice) -> Result<()>;
}

/// Fire-and-forget POST of the notice payload to the notify endpoint.
pub struct HttpTopicNotifier {
    client: reqwest::Client,
    config: NotifyConfig,
}

impl HttpTopicNotifier {
    pub fn new(config: NotifyConfig) -> Self {
        HttpTopicNotifier {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl TopicNotifier for HttpTopicNotifier {
    async fn notify(&self, notice: &OutboundNotice) -> Result<()> {
        self.client
            .post(&self.config.url)
            .header("x-app-key", &self.config.app_key)
            .json(notice)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

pub struct ChatComposer {
    log: Arc<dyn MessageLog>,
    identity: Arc<dyn IdentityProvider>,
    notifier: Arc<dyn TopicNotifier>,
}

impl ChatComposer {
    pub fn new(
        log: Arc<dyn MessageLog>,
        identity: Arc<dyn IdentityProvider>,
        notifier: Arc<dyn TopicNotifier>,
    ) -> Self {
        ChatComposer {
            log,
            identity,
            notifier,
        }
    }

    /// Append a text message. Signed-out or blank input is a silent no-op.
    pub async fn send_message(&self, text: &str) -> Result<()> {
        let Some(user) = self.identity.current_user() else {
            debug!("send_message ignored, no signed-in user");
            return Ok(());
        };
        let clean = text.trim();
        if clean.is_empty() {
            return Ok(());
        }

        self.log
            .append(NewChatMessage {
                text: clean.to_string(),
                kind: MessageKind::Text,
                sender_id: user.id.clone(),
                sender_email: user.email.clone().unwrap_or_default(),
                sender_name: user.display_name.clone(),
            })
            .await?;

        self.notify_detached(OutboundNotice {
            title: "New Message".to_string(),
            body: clean.to_string(),
            kind: MessageKind::Text,
            sender_id: user.id,
        });
        Ok(())
    }

    /// Append a gift message.
    pub async fn send_gift(&self) -> Result<()> {
        let Some(user) = self.identity.current_user() else {
            debug!("send_gift ignored, no signed-in user");
            return Ok(());
        };

        self.log
            .append(NewChatMessage {
                text: "sent a gift 🎁".to_string(),
                kind: MessageKind::Gift,
                sender_id: user.id.clone(),
                sender_email: user.email.clone().unwrap_or_default(),
                sender_name: user.display_name.clone(),
            })
            .await?;

        let from = user.email.unwrap_or_else(|| "Someone".to_string());
        self.notify_detached(OutboundNotice {
            title: "🎁 Gift received".to_string(),
            body: format!("{from} sent a gift"),
            kind: MessageKind::Gift,
            sender_id: user.id,
        });
        Ok(())
    }

    // Detached on purpose: the sender's UI never waits on, or hears about,
    // the notify outcome.
    fn notify_detached(&self, notice: OutboundNotice) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(e) = notifier.notify(&notice).await {
                warn!("topic notify failed: {}", e);
            }
        });
    }
}
