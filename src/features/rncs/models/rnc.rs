use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// RNC lifecycle status matching the `rnc_status` database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "rnc_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RncStatus {
    Open,
    Closed,
    Reopened,
    Cancelled,
}

/// Lifecycle actions that move an RNC between statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    Close,
    Reopen,
    Cancel,
}

impl std::fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleAction::Close => write!(f, "close"),
            LifecycleAction::Reopen => write!(f, "reopen"),
            LifecycleAction::Cancel => write!(f, "cancel"),
        }
    }
}

impl RncStatus {
    /// Status reached by applying `action`, or `None` when not allowed.
    ///
    /// Open/Reopened close or cancel; only Closed reopens; Cancelled is final.
    pub fn apply(self, action: LifecycleAction) -> Option<RncStatus> {
        use LifecycleAction::*;
        use RncStatus::*;

        match (self, action) {
            (Open | Reopened, Close) => Some(Closed),
            (Open | Reopened, Cancel) => Some(Cancelled),
            (Closed, Reopen) => Some(Reopened),
            _ => None,
        }
    }

    /// Whether the non-conformance still awaits treatment
    pub fn is_open(self) -> bool {
        matches!(self, RncStatus::Open | RncStatus::Reopened)
    }

    /// Label used in exports, reports and emails
    pub fn label(self) -> &'static str {
        match self {
            RncStatus::Open => "Aberta",
            RncStatus::Closed => "Encerrada",
            RncStatus::Reopened => "Em ação",
            RncStatus::Cancelled => "Cancelada",
        }
    }

    /// Parse either the API name (`closed`) or the label (`Encerrada`)
    pub fn parse(value: &str) -> Option<RncStatus> {
        let v = value.trim().to_lowercase();
        match v.as_str() {
            "open" | "aberta" => Some(RncStatus::Open),
            "closed" | "encerrada" => Some(RncStatus::Closed),
            "reopened" | "em ação" | "em acao" | "reaberta" => Some(RncStatus::Reopened),
            "cancelled" | "canceled" | "cancelada" => Some(RncStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for RncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RncStatus::Open => write!(f, "open"),
            RncStatus::Closed => write!(f, "closed"),
            RncStatus::Reopened => write!(f, "reopened"),
            RncStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Database model for an RNC record
#[derive(Debug, Clone, FromRow)]
pub struct Rnc {
    pub id: Uuid,
    pub rnc_number: String,
    pub inspection_date: Option<NaiveDate>,
    pub issuer: String,
    pub area: String,
    pub pep: String,
    pub title: String,
    pub responsible: String,
    pub description: String,
    pub reference_docs: String,
    pub cause: String,
    pub process: String,
    pub origin: String,
    pub severity: String,
    pub category: String,
    pub actions: String,
    pub action_responsible: String,
    pub status: RncStatus,
    pub closed_at: Option<DateTime<Utc>>,
    pub closed_by: Option<String>,
    pub closing_notes: Option<String>,
    pub closing_description: Option<String>,
    pub effectiveness: Option<String>,
    pub reopened_at: Option<DateTime<Utc>>,
    pub reopened_by: Option<String>,
    pub reopening_reason: Option<String>,
    pub reopening_description: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub status_changed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for inserting a new RNC (the number is allocated separately)
#[derive(Debug, Clone, Default)]
pub struct NewRnc {
    pub inspection_date: Option<NaiveDate>,
    pub issuer: String,
    pub area: String,
    pub pep: String,
    pub title: String,
    pub responsible: String,
    pub description: String,
    pub reference_docs: String,
    pub cause: String,
    pub process: String,
    pub origin: String,
    pub severity: String,
    pub category: String,
    pub actions: String,
    pub action_responsible: String,
    /// Initial status; `Open` except for CSV imports
    pub status: Option<RncStatus>,
    /// Closing, reopening and cancellation details restored by a CSV import
    pub history: LifecycleHistory,
}

/// Lifecycle columns carried over when a record is restored from a backup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LifecycleHistory {
    pub closed_at: Option<DateTime<Utc>>,
    pub closed_by: Option<String>,
    pub closing_notes: Option<String>,
    pub closing_description: Option<String>,
    pub effectiveness: Option<String>,
    pub reopened_at: Option<DateTime<Utc>>,
    pub reopened_by: Option<String>,
    pub reopening_reason: Option<String>,
    pub reopening_description: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<String>,
    pub cancellation_reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CloseRnc {
    pub closed_by: String,
    pub notes: Option<String>,
    pub description: Option<String>,
    pub effectiveness: String,
}

#[derive(Debug, Clone)]
pub struct ReopenRnc {
    pub reopened_by: String,
    pub reason: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CancelRnc {
    pub cancelled_by: String,
    pub reason: String,
}

/// A status transition together with the fields it stamps
#[derive(Debug, Clone)]
pub enum StatusChange {
    Close(CloseRnc),
    Reopen(ReopenRnc),
    Cancel(CancelRnc),
}

impl StatusChange {
    pub fn action(&self) -> LifecycleAction {
        match self {
            StatusChange::Close(_) => LifecycleAction::Close,
            StatusChange::Reopen(_) => LifecycleAction::Reopen,
            StatusChange::Cancel(_) => LifecycleAction::Cancel,
        }
    }
}

/// List filters
#[derive(Debug, Clone, Default)]
pub struct RncFilter {
    pub status: Option<RncStatus>,
    /// Case-insensitive match on number, title or area
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use LifecycleAction::*;

    #[test]
    fn test_open_close_reopen_round_trip() {
        let status = RncStatus::Open;
        let closed = status.apply(Close).unwrap();
        assert_eq!(closed, RncStatus::Closed);
        assert!(!closed.is_open());

        let reopened = closed.apply(Reopen).unwrap();
        assert_eq!(reopened, RncStatus::Reopened);
        assert!(reopened.is_open());

        assert_eq!(reopened.apply(Close), Some(RncStatus::Closed));
    }

    #[test]
    fn test_disallowed_transitions() {
        assert_eq!(RncStatus::Open.apply(Reopen), None);
        assert_eq!(RncStatus::Reopened.apply(Reopen), None);
        assert_eq!(RncStatus::Closed.apply(Close), None);
        assert_eq!(RncStatus::Closed.apply(Cancel), None);
        assert_eq!(RncStatus::Cancelled.apply(Close), None);
        assert_eq!(RncStatus::Cancelled.apply(Reopen), None);
        assert_eq!(RncStatus::Cancelled.apply(Cancel), None);
    }

    #[test]
    fn test_parse_accepts_names_and_labels() {
        assert_eq!(RncStatus::parse("Aberta"), Some(RncStatus::Open));
        assert_eq!(RncStatus::parse("closed"), Some(RncStatus::Closed));
        assert_eq!(RncStatus::parse("Em ação"), Some(RncStatus::Reopened));
        assert_eq!(RncStatus::parse(" CANCELADA "), Some(RncStatus::Cancelled));
        assert_eq!(RncStatus::parse("pendente"), None);
    }

    #[test]
    fn test_label_round_trips_through_parse() {
        for status in [
            RncStatus::Open,
            RncStatus::Closed,
            RncStatus::Reopened,
            RncStatus::Cancelled,
        ] {
            assert_eq!(RncStatus::parse(status.label()), Some(status));
            assert_eq!(RncStatus::parse(&status.to_string()), Some(status));
        }
    }
}
