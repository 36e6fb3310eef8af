//! Modules layer - Infrastructure components for external integrations
//!
//! Contains clients and adapters for the photo bucket and outgoing email.

pub mod mailer;
pub mod storage;
