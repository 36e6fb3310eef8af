mod settings_service;

pub use settings_service::{Logo, SettingsService};
