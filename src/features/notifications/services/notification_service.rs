use std::sync::Arc;

use minijinja::{context, Value};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::features::rncs::models::Rnc;
use crate::modules::mailer::{Mailer, OutgoingEmail};
use crate::shared::templates::{render_template, TemplateError};

/// Lifecycle events that trigger an email
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RncEvent {
    Opened,
    Closed,
    Reopened,
    Cancelled,
}

impl RncEvent {
    pub fn label(self) -> &'static str {
        match self {
            RncEvent::Opened => "Nova RNC aberta",
            RncEvent::Closed => "RNC encerrada",
            RncEvent::Reopened => "RNC reaberta",
            RncEvent::Cancelled => "RNC cancelada",
        }
    }
}

/// Sends best-effort emails about RNC lifecycle events.
///
/// Delivery runs on a spawned task; failures are logged and never reach
/// the caller.
pub struct NotificationService {
    mailer: Option<Arc<dyn Mailer>>,
}

impl NotificationService {
    pub fn new(mailer: Option<Arc<dyn Mailer>>) -> Self {
        if mailer.is_none() {
            info!("Email notifications disabled (SMTP not configured)");
        }
        Self { mailer }
    }

    pub fn is_enabled(&self) -> bool {
        self.mailer.is_some()
    }

    /// Render the message for an event
    pub fn compose(event: RncEvent, rnc: &Rnc) -> Result<OutgoingEmail, TemplateError> {
        let ctx = context! {
            event_label => event.label(),
            rnc => context! {
                rnc_number => &rnc.rnc_number,
                title => &rnc.title,
                status => rnc.status.label(),
                inspection_date => rnc.inspection_date.map(|d| d.format("%d/%m/%Y").to_string()),
                issuer => &rnc.issuer,
                area => &rnc.area,
                pep => &rnc.pep,
                responsible => &rnc.responsible,
                severity => &rnc.severity,
                category => &rnc.category,
                description => &rnc.description,
            },
            details => event_details(event, rnc),
        };

        Ok(OutgoingEmail {
            subject: format!("[RNC {}] {}: {}", rnc.rnc_number, event.label(), rnc.title),
            text: render_template("email/rnc_event.txt.jinja", ctx.clone())?,
            html: render_template("email/rnc_event.html.jinja", ctx)?,
        })
    }

    /// Fire and forget. Returns the delivery task when email is enabled.
    pub fn notify(&self, event: RncEvent, rnc: &Rnc) -> Option<JoinHandle<()>> {
        let mailer = self.mailer.clone()?;

        let email = match Self::compose(event, rnc) {
            Ok(email) => email,
            Err(e) => {
                warn!("Failed to render {:?} email for {}: {}", event, rnc.rnc_number, e);
                return None;
            }
        };

        let rnc_number = rnc.rnc_number.clone();
        Some(tokio::spawn(async move {
            match mailer.send(email).await {
                Ok(()) => info!("Sent {:?} notification for RNC {}", event, rnc_number),
                Err(e) => warn!(
                    "Failed to send {:?} notification for RNC {}: {}",
                    event, rnc_number, e
                ),
            }
        }))
    }
}

/// Extra rows shown for the event that just happened
fn event_details(event: RncEvent, rnc: &Rnc) -> Vec<Value> {
    let mut rows: Vec<(&str, Option<String>)> = Vec::new();

    match event {
        RncEvent::Opened => {
            rows.push(("Ações", Some(rnc.actions.clone())));
            rows.push(("Responsável pela ação", Some(rnc.action_responsible.clone())));
        }
        RncEvent::Closed => {
            rows.push(("Encerrada por", rnc.closed_by.clone()));
            rows.push(("Eficácia", rnc.effectiveness.clone()));
            rows.push(("Observações", rnc.closing_notes.clone()));
            rows.push(("Descrição do encerramento", rnc.closing_description.clone()));
        }
        RncEvent::Reopened => {
            rows.push(("Reaberta por", rnc.reopened_by.clone()));
            rows.push(("Motivo", rnc.reopening_reason.clone()));
            rows.push(("Descrição da reabertura", rnc.reopening_description.clone()));
        }
        RncEvent::Cancelled => {
            rows.push(("Cancelada por", rnc.cancelled_by.clone()));
            rows.push(("Motivo", rnc.cancellation_reason.clone()));
        }
    }

    rows.into_iter()
        .filter_map(|(label, value)| {
            value
                .filter(|v| !v.trim().is_empty())
                .map(|value| context! { label => label, value => value })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::rncs::models::RncStatus;
    use crate::shared::test_helpers::{sample_rnc, RecordingMailer};

    #[test]
    fn test_compose_opened() {
        let rnc = sample_rnc("2026-007");
        let email = NotificationService::compose(RncEvent::Opened, &rnc).unwrap();

        assert_eq!(
            email.subject,
            format!("[RNC 2026-007] Nova RNC aberta: {}", rnc.title)
        );
        assert!(email.text.contains("Status: Aberta"));
        assert!(email.html.contains("2026-007"));
    }

    #[test]
    fn test_compose_closed_includes_closing_details() {
        let mut rnc = sample_rnc("2026-008");
        rnc.status = RncStatus::Closed;
        rnc.closed_by = Some("Ana".to_string());
        rnc.effectiveness = Some("Eficaz".to_string());

        let email = NotificationService::compose(RncEvent::Closed, &rnc).unwrap();
        assert!(email.text.contains("Encerrada por: Ana"));
        assert!(email.text.contains("Eficácia: Eficaz"));
    }

    #[test]
    fn test_disabled_does_nothing() {
        let service = NotificationService::new(None);
        assert!(!service.is_enabled());
        assert!(service
            .notify(RncEvent::Opened, &sample_rnc("2026-001"))
            .is_none());
    }

    #[tokio::test]
    async fn test_notify_sends_through_mailer() {
        let mailer = Arc::new(RecordingMailer::default());
        let service = NotificationService::new(Some(mailer.clone()));

        let handle = service
            .notify(RncEvent::Cancelled, &sample_rnc("2026-002"))
            .unwrap();
        handle.await.unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].subject.starts_with("[RNC 2026-002] RNC cancelada"));
    }

    #[tokio::test]
    async fn test_mailer_failure_is_swallowed() {
        let mailer = Arc::new(RecordingMailer::failing());
        let service = NotificationService::new(Some(mailer.clone()));

        let handle = service
            .notify(RncEvent::Opened, &sample_rnc("2026-003"))
            .unwrap();
        tokio_test::assert_ok!(handle.await);
        assert!(mailer.sent().is_empty());
    }
}
