use crate::models::NoticeData;

/// Named navigation destinations reachable from a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Landing,
    Home,
    Chat,
    Cart,
    Notifications,
    Settings,
}

impl Destination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::Landing => "Landing",
            Destination::Home => "Home",
            Destination::Chat => "Chat",
            Destination::Cart => "Cart",
            Destination::Notifications => "Notifications",
            Destination::Settings => "Settings",
        }
    }

    /// Resolve an explicit `screen` payload value. Unknown names resolve to
    /// None so the caller can fall through to structural hints.
    pub fn from_screen(name: &str) -> Option<Destination> {
        match name {
            "Landing" => Some(Destination::Landing),
            "Home" => Some(Destination::Home),
            "Chat" => Some(Destination::Chat),
            "Cart" => Some(Destination::Cart),
            "Notifications" => Some(Destination::Notifications),
            "Settings" => Some(Destination::Settings),
            _ => None,
        }
    }
}

/// Navigation collaborator. Implementations are expected to drop commands
/// issued before the navigation surface is ready.
pub trait Navigator: Send + Sync {
    fn navigate(&self, destination: Destination, params: Option<NoticeData>);
}
