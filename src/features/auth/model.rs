use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Subject placed in every session token
pub const QUALITY_SUBJECT: &str = "quality";

/// An authenticated quality-team session
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QualitySession {
    pub subject: String,
    pub expires_at: DateTime<Utc>,
}

/// JWT claims of a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}
