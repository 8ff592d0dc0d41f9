/// Session wiring
///
/// Sign-in/up/out delegate to the external identity collaborator; this
/// layer only owns the side effects tied to identity changes — the chat
/// topic subscription and the durable notification list, which an account
/// logout destroys.
use crate::clients::IdentityProvider;
use crate::error::Result;
use crate::models::AuthUser;
use crate::services::NotificationSetup;
use crate::stores::NotificationStore;
use std::sync::Arc;
use tracing::info;

pub struct Session {
    identity: Arc<dyn IdentityProvider>,
    notifications: Arc<NotificationStore>,
    setup: Arc<NotificationSetup>,
}

impl Session {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        notifications: Arc<NotificationStore>,
        setup: Arc<NotificationSetup>,
    ) -> Self {
        Session {
            identity,
            notifications,
            setup,
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        let user = self.identity.sign_in(email, password).await?;
        self.setup.sync_topic_subscription().await;
        Ok(user)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser> {
        let user = self.identity.sign_up(email, password).await?;
        self.setup.sync_topic_subscription().await;
        Ok(user)
    }

    pub async fn sign_out(&self) -> Result<()> {
        self.identity.sign_out().await?;
        self.notifications.clear();
        self.setup.sync_topic_subscription().await;
        info!("signed out");
        Ok(())
    }
}
