use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle stage a photo documents, matching the `photo_stage` enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "photo_stage", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PhotoStage {
    Opening,
    Closing,
    Reopening,
}

impl PhotoStage {
    /// Path segment used in bucket object keys
    pub fn key_segment(self) -> &'static str {
        match self {
            PhotoStage::Opening => "abertura",
            PhotoStage::Closing => "encerramento",
            PhotoStage::Reopening => "reabertura",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PhotoStage::Opening => "Abertura",
            PhotoStage::Closing => "Encerramento",
            PhotoStage::Reopening => "Reabertura",
        }
    }

    pub fn parse(value: &str) -> Option<PhotoStage> {
        match value.trim().to_lowercase().as_str() {
            "opening" | "abertura" => Some(PhotoStage::Opening),
            "closing" | "encerramento" => Some(PhotoStage::Closing),
            "reopening" | "reabertura" => Some(PhotoStage::Reopening),
            _ => None,
        }
    }
}

/// Database model for a photo linked to an RNC
///
/// Only the link and metadata live here; the bytes stay in the bucket.
#[derive(Debug, Clone, FromRow)]
pub struct Photo {
    pub id: Uuid,
    pub seq: i64,
    pub rnc_id: Uuid,
    pub stage: PhotoStage,
    pub url: String,
    pub object_key: String,
    pub filename: String,
    pub content_type: String,
    pub file_size: i64,
    pub sha256: String,
    pub created_at: DateTime<Utc>,
}

/// Data for linking an uploaded object to an RNC
#[derive(Debug, Clone)]
pub struct NewPhoto {
    pub stage: PhotoStage,
    pub url: String,
    pub object_key: String,
    pub filename: String,
    pub content_type: String,
    pub file_size: i64,
    pub sha256: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_parse() {
        assert_eq!(PhotoStage::parse("abertura"), Some(PhotoStage::Opening));
        assert_eq!(PhotoStage::parse("Closing"), Some(PhotoStage::Closing));
        assert_eq!(PhotoStage::parse("reabertura"), Some(PhotoStage::Reopening));
        assert_eq!(PhotoStage::parse("other"), None);
    }
}
