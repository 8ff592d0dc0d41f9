use super::ListenerHandle;
use crate::error::Result;
use crate::models::NoticeData;
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub id: String,
    pub name: String,
    pub importance: u8,
}

/// A platform-level notification to display.
#[derive(Debug, Clone)]
pub struct DisplayRequest {
    pub title: String,
    pub body: String,
    pub data: NoticeData,
    pub channel_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForegroundEventKind {
    Press,
    ActionPress,
    Dismissed,
    Delivered,
}

/// Interaction with a displayed platform notification while foregrounded.
#[derive(Debug, Clone)]
pub struct ForegroundEvent {
    pub kind: ForegroundEventKind,
    pub data: Option<NoticeData>,
}

pub type ForegroundHandler = Arc<dyn Fn(ForegroundEvent) + Send + Sync>;

/// Local platform notification display surface.
#[async_trait]
pub trait NotificationDisplay: Send + Sync {
    async fn create_channel(&self, channel: &ChannelConfig) -> Result<()>;

    async fn display(&self, request: DisplayRequest) -> Result<()>;

    fn on_foreground_event(&self, handler: ForegroundHandler) -> ListenerHandle;

    /// Data of the displayed notification that launched the app, if any.
    async fn initial_notification(&self) -> Result<Option<NoticeData>>;
}
