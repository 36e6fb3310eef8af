use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Project (PEP) code offered on the RNC form
#[derive(Debug, Clone, FromRow)]
pub struct Pep {
    pub id: Uuid,
    pub code: String,
    pub created_at: DateTime<Utc>,
}
