use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info};

use super::{Mailer, OutgoingEmail};
use crate::core::config::SmtpConfig;
use crate::core::error::AppError;

/// Port that speaks TLS from the first byte instead of STARTTLS
const IMPLICIT_TLS_PORT: u16 = 465;

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, AppError> {
        let builder = if config.port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        }
        .map_err(|e| AppError::Internal(format!("Invalid SMTP host '{}': {}", config.host, e)))?
        .port(config.port);

        let builder = match (&config.username, &config.password) {
            (Some(user), Some(pass)) => {
                builder.credentials(Credentials::new(user.clone(), pass.clone()))
            }
            _ => builder,
        };

        let from = parse_mailbox(&config.from)?;
        let to = config
            .to
            .iter()
            .map(|addr| parse_mailbox(addr))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "SMTP mailer configured for {}:{} ({} recipient(s))",
            config.host,
            config.port,
            to.len()
        );

        Ok(Self {
            transport: builder.build(),
            from,
            to,
        })
    }

    fn build_message(&self, email: OutgoingEmail) -> Result<Message, AppError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(email.subject);

        for recipient in &self.to {
            builder = builder.to(recipient.clone());
        }

        builder
            .multipart(MultiPart::alternative_plain_html(email.text, email.html))
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, AppError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| AppError::Internal(format!("Invalid email address '{}': {}", address, e)))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), AppError> {
        let subject = email.subject.clone();
        let message = self.build_message(email)?;

        self.transport.send(message).await.map_err(|e| {
            AppError::ExternalServiceError(format!("Failed to send email: {}", e))
        })?;

        debug!("Sent email '{}'", subject);
        Ok(())
    }
}
