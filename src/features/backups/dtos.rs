use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Outcome of a CSV import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ImportResultDto {
    /// Rows stored as new RNCs
    pub inserted: usize,
    /// Inserted rows whose number was generated (missing, malformed or taken)
    pub auto_numbered: usize,
    /// Rows without any usable value
    pub skipped: usize,
}

/// Multipart form for the RNC CSV import (documentation only)
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct ImportRncsDto {
    /// CSV using the export column names; `,` or `;` separated
    #[schema(format = Binary, content_media_type = "text/csv")]
    pub file: String,
}
