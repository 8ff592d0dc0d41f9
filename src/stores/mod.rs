pub mod notifications;
pub mod settings;

pub use notifications::NotificationStore;
pub use settings::SettingsStore;
