//! Outgoing email
//!
//! The `Mailer` seam lets notification logic be tested without an SMTP
//! server; `SmtpMailer` is the production implementation.

mod smtp_mailer;

use async_trait::async_trait;

use crate::core::error::AppError;

pub use smtp_mailer::SmtpMailer;

/// A rendered message; recipients are fixed by the mailer configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), AppError>;
}
