pub mod services;

pub use services::{NotificationService, RncEvent};
