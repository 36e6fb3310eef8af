use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::peps::models::Pep;

/// Response DTO for a PEP code
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PepResponseDto {
    pub id: Uuid,
    pub code: String,
    pub created_at: DateTime<Utc>,
}

impl From<Pep> for PepResponseDto {
    fn from(p: Pep) -> Self {
        Self {
            id: p.id,
            code: p.code,
            created_at: p.created_at,
        }
    }
}

/// Request DTO for adding PEP codes in bulk
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AddPepsDto {
    /// Codes to add; blanks and duplicates are skipped
    #[validate(length(min = 1, max = 5000, message = "Provide between 1 and 5000 codes"))]
    pub codes: Vec<String>,
}

/// Result of a bulk add or CSV import
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PepImportResultDto {
    /// Codes that were not in the catalog yet
    pub added: u64,
    /// Distinct non-blank codes received
    pub received: usize,
}

/// Multipart form for PEP CSV import (documentation only)
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct ImportPepsDto {
    /// CSV file with a `code` column, or codes in the first column
    #[schema(format = Binary, content_media_type = "text/csv")]
    pub file: String,
}
