/// Notification enrollment and settings toggle
///
/// Startup permission flow, the enable/disable toggle orchestration over the
/// push transport, and the chat topic subscription that tracks sign-in
/// state. Transport failures degrade silently to the disabled state; only a
/// system-level block surfaces to the caller, which shows exactly one alert
/// pointing at system settings.
use crate::clients::{IdentityProvider, PermissionStatus, PushTransport};
use crate::services::NotificationGateway;
use crate::stores::SettingsStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupOutcome {
    /// Listeners are live and a push token was obtained.
    Ready { token: String },
    /// Denied at the system level; the caller surfaces the single
    /// "enable notifications in system settings" alert.
    Blocked,
    /// Denied interactively; no alert.
    Denied,
    /// Transport unavailable; retried on the next startup.
    Unavailable,
}

pub struct NotificationSetup {
    push: Arc<dyn PushTransport>,
    identity: Arc<dyn IdentityProvider>,
    settings: Arc<SettingsStore>,
    gateway: Arc<NotificationGateway>,
    topic: String,
}

impl NotificationSetup {
    pub fn new(
        push: Arc<dyn PushTransport>,
        identity: Arc<dyn IdentityProvider>,
        settings: Arc<SettingsStore>,
        gateway: Arc<NotificationGateway>,
        topic: String,
    ) -> Self {
        NotificationSetup {
            push,
            identity,
            settings,
            gateway,
            topic,
        }
    }

    /// App-startup flow: permission, token, gateway start.
    pub async fn run_startup(&self) -> SetupOutcome {
        let status = match self.push.request_permission().await {
            Ok(status) => status,
            Err(e) => {
                warn!("permission request failed: {}", e);
                return SetupOutcome::Unavailable;
            }
        };

        if status == PermissionStatus::Blocked {
            return SetupOutcome::Blocked;
        }
        if !status.is_granted() {
            info!("notification permission denied");
            return SetupOutcome::Denied;
        }

        let token = match self.push.token().await {
            Ok(token) => token,
            Err(e) => {
                warn!("push token fetch failed: {}", e);
                return SetupOutcome::Unavailable;
            }
        };
        debug!("push token acquired");

        if let Err(e) = self.gateway.start().await {
            warn!("gateway start failed: {}", e);
        }
        SetupOutcome::Ready { token }
    }

    /// User toggle. Returns the effective flag value, which is forced to
    /// false whenever enabling cannot complete.
    pub async fn set_push_enabled(&self, enabled: bool) -> bool {
        if enabled {
            self.enable().await
        } else {
            self.disable().await;
            false
        }
    }

    async fn enable(&self) -> bool {
        let granted = match self.push.request_permission().await {
            Ok(status) => status.is_granted(),
            Err(e) => {
                warn!("permission request failed: {}", e);
                false
            }
        };
        if !granted {
            info!("push notification permission not granted");
            self.settings.set_push_enabled(false);
            return false;
        }

        if let Err(e) = self.push.register_device().await {
            warn!("device registration failed: {}", e);
            self.settings.set_push_enabled(false);
            return false;
        }
        match self.push.token().await {
            Ok(_) => debug!("push token refreshed"),
            Err(e) => {
                warn!("push token fetch failed: {}", e);
                self.settings.set_push_enabled(false);
                return false;
            }
        }

        self.settings.set_push_enabled(true);
        if let Err(e) = self.gateway.reinitialize().await {
            warn!("gateway reinitialize failed: {}", e);
        }
        true
    }

    async fn disable(&self) {
        // stop first so no listener observes the half-disabled state
        self.gateway.stop();

        if let Err(e) = self.push.delete_token().await {
            warn!("failed to delete push token: {}", e);
        }
        if let Err(e) = self.push.unregister_device().await {
            warn!("failed to unregister device: {}", e);
        }

        self.settings.set_push_enabled(false);
        info!("push notifications disabled");
    }

    /// Keep the chat topic subscription in line with sign-in state.
    pub async fn sync_topic_subscription(&self) {
        let result = if self.identity.current_user().is_some() {
            self.push.subscribe_topic(&self.topic).await
        } else {
            self.push.unsubscribe_topic(&self.topic).await
        };
        if let Err(e) = result {
            warn!("topic toggle error: {}", e);
        }
    }
}
