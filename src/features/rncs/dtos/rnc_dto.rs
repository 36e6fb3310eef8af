use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::rncs::models::{
    CancelRnc, CloseRnc, NewRnc, Photo, PhotoStage, ReopenRnc, Rnc, RncFilter, RncStatus,
};
use crate::features::rncs::services::RncDetail;
use crate::shared::constants::DEFAULT_EFFECTIVENESS;
use crate::shared::validation::{
    validate_category, validate_cause, validate_effectiveness, validate_origin, validate_process,
    validate_severity,
};

fn trimmed(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// REQUESTS
// =============================================================================

/// Request DTO for opening an RNC
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateRncDto {
    /// Inspection date (YYYY-MM-DD)
    pub inspection_date: Option<NaiveDate>,
    #[validate(length(max = 200))]
    pub issuer: Option<String>,
    #[validate(length(max = 200))]
    pub area: Option<String>,
    #[validate(length(max = 100))]
    pub pep: Option<String>,
    #[validate(length(min = 1, max = 300, message = "Title is required"))]
    pub title: String,
    #[validate(length(max = 200))]
    pub responsible: Option<String>,
    pub description: Option<String>,
    pub reference_docs: Option<String>,
    #[validate(custom(function = "validate_cause"))]
    pub cause: Option<String>,
    #[validate(custom(function = "validate_process"))]
    pub process: Option<String>,
    #[validate(custom(function = "validate_origin"))]
    pub origin: Option<String>,
    #[validate(custom(function = "validate_severity"))]
    pub severity: Option<String>,
    #[validate(custom(function = "validate_category"))]
    pub category: Option<String>,
    pub actions: Option<String>,
    #[validate(length(max = 200))]
    pub action_responsible: Option<String>,
}

impl From<CreateRncDto> for NewRnc {
    fn from(dto: CreateRncDto) -> Self {
        Self {
            inspection_date: dto.inspection_date,
            issuer: trimmed(dto.issuer),
            area: trimmed(dto.area),
            pep: trimmed(dto.pep),
            title: dto.title.trim().to_string(),
            responsible: trimmed(dto.responsible),
            description: trimmed(dto.description),
            reference_docs: trimmed(dto.reference_docs),
            cause: trimmed(dto.cause),
            process: trimmed(dto.process),
            origin: trimmed(dto.origin),
            severity: trimmed(dto.severity),
            category: trimmed(dto.category),
            actions: trimmed(dto.actions),
            action_responsible: trimmed(dto.action_responsible),
            status: None,
            history: Default::default(),
        }
    }
}

/// Request DTO for closing an RNC
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CloseRncDto {
    #[validate(length(min = 1, max = 200, message = "closed_by is required"))]
    pub closed_by: String,
    pub notes: Option<String>,
    pub description: Option<String>,
    /// Defaults to "A verificar"
    #[validate(custom(function = "validate_effectiveness"))]
    pub effectiveness: Option<String>,
}

impl From<CloseRncDto> for CloseRnc {
    fn from(dto: CloseRncDto) -> Self {
        Self {
            closed_by: dto.closed_by.trim().to_string(),
            notes: non_blank(dto.notes),
            description: non_blank(dto.description),
            effectiveness: non_blank(dto.effectiveness)
                .unwrap_or_else(|| DEFAULT_EFFECTIVENESS.to_string()),
        }
    }
}

/// Request DTO for reopening a closed RNC
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReopenRncDto {
    #[validate(length(min = 1, max = 200, message = "reopened_by is required"))]
    pub reopened_by: String,
    #[validate(length(min = 1, message = "A reason is required"))]
    pub reason: String,
    pub description: Option<String>,
}

impl From<ReopenRncDto> for ReopenRnc {
    fn from(dto: ReopenRncDto) -> Self {
        Self {
            reopened_by: dto.reopened_by.trim().to_string(),
            reason: dto.reason.trim().to_string(),
            description: non_blank(dto.description),
        }
    }
}

/// Request DTO for cancelling an RNC
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CancelRncDto {
    #[validate(length(min = 1, max = 200, message = "cancelled_by is required"))]
    pub cancelled_by: String,
    #[validate(length(min = 1, message = "A reason is required"))]
    pub reason: String,
}

impl From<CancelRncDto> for CancelRnc {
    fn from(dto: CancelRncDto) -> Self {
        Self {
            cancelled_by: dto.cancelled_by.trim().to_string(),
            reason: dto.reason.trim().to_string(),
        }
    }
}

/// Request DTO for permanently deleting an RNC
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteRncDto {
    /// Must be the word CONFIRMAR
    #[schema(example = "CONFIRMAR")]
    pub confirmation: String,
}

/// Multipart form for photo uploads (documentation only)
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadPhotosDto {
    /// opening, closing or reopening
    #[schema(example = "opening")]
    pub stage: String,
    /// JPEG/PNG file; repeat the `file` part to send several
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
}

/// Query parameters for listing RNCs
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct RncListQuery {
    /// Page number (1-indexed)
    #[param(minimum = 1)]
    pub page: Option<i64>,
    /// Items per page
    #[param(minimum = 1, maximum = 100)]
    pub page_size: Option<i64>,
    /// Filter by status
    pub status: Option<RncStatus>,
    /// Search in number, title and area
    pub search: Option<String>,
}

impl RncListQuery {
    pub fn filter(&self) -> RncFilter {
        RncFilter {
            status: self.status,
            search: non_blank(self.search.clone()),
        }
    }
}

// =============================================================================
// RESPONSES
// =============================================================================

/// Response DTO for an RNC
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RncResponseDto {
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
    /// Display label, e.g. "Encerrada"
    pub status_label: String,
    /// True while Open or Reopened
    pub is_open: bool,
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

impl From<Rnc> for RncResponseDto {
    fn from(r: Rnc) -> Self {
        Self {
            id: r.id,
            rnc_number: r.rnc_number,
            inspection_date: r.inspection_date,
            issuer: r.issuer,
            area: r.area,
            pep: r.pep,
            title: r.title,
            responsible: r.responsible,
            description: r.description,
            reference_docs: r.reference_docs,
            cause: r.cause,
            process: r.process,
            origin: r.origin,
            severity: r.severity,
            category: r.category,
            actions: r.actions,
            action_responsible: r.action_responsible,
            status: r.status,
            status_label: r.status.label().to_string(),
            is_open: r.status.is_open(),
            closed_at: r.closed_at,
            closed_by: r.closed_by,
            closing_notes: r.closing_notes,
            closing_description: r.closing_description,
            effectiveness: r.effectiveness,
            reopened_at: r.reopened_at,
            reopened_by: r.reopened_by,
            reopening_reason: r.reopening_reason,
            reopening_description: r.reopening_description,
            cancelled_at: r.cancelled_at,
            cancelled_by: r.cancelled_by,
            cancellation_reason: r.cancellation_reason,
            created_at: r.created_at,
            status_changed_at: r.status_changed_at,
            updated_at: r.updated_at,
        }
    }
}

/// Response DTO for a photo link
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PhotoResponseDto {
    pub id: Uuid,
    pub stage: PhotoStage,
    pub url: String,
    pub filename: String,
    pub content_type: String,
    pub file_size: i64,
    pub sha256: String,
    pub created_at: DateTime<Utc>,
}

impl From<Photo> for PhotoResponseDto {
    fn from(p: Photo) -> Self {
        Self {
            id: p.id,
            stage: p.stage,
            url: p.url,
            filename: p.filename,
            content_type: p.content_type,
            file_size: p.file_size,
            sha256: p.sha256,
            created_at: p.created_at,
        }
    }
}

/// Photos of one RNC grouped by lifecycle stage, each in upload order
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PhotosByStageDto {
    pub opening: Vec<PhotoResponseDto>,
    pub closing: Vec<PhotoResponseDto>,
    pub reopening: Vec<PhotoResponseDto>,
}

impl From<Vec<Photo>> for PhotosByStageDto {
    fn from(photos: Vec<Photo>) -> Self {
        let mut grouped = Self::default();
        for photo in photos {
            let bucket = match photo.stage {
                PhotoStage::Opening => &mut grouped.opening,
                PhotoStage::Closing => &mut grouped.closing,
                PhotoStage::Reopening => &mut grouped.reopening,
            };
            bucket.push(photo.into());
        }
        grouped
    }
}

/// Response DTO for an RNC with its photos
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RncDetailResponseDto {
    #[serde(flatten)]
    pub rnc: RncResponseDto,
    pub photos: PhotosByStageDto,
}

impl From<RncDetail> for RncDetailResponseDto {
    fn from(detail: RncDetail) -> Self {
        Self {
            rnc: detail.rnc.into(),
            photos: detail.photos.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusOptionDto {
    pub value: RncStatus,
    pub label: String,
}

/// Choice lists for the RNC form
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RncOptionsDto {
    pub categories: Vec<String>,
    pub severities: Vec<String>,
    pub causes: Vec<String>,
    pub processes: Vec<String>,
    pub origins: Vec<String>,
    pub effectiveness: Vec<String>,
    pub statuses: Vec<StatusOptionDto>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{sample_photo, sample_rnc};

    #[test]
    fn test_create_dto_validation() {
        let dto = CreateRncDto {
            title: "Solda trincada".to_string(),
            severity: Some("Alta".to_string()),
            ..Default::default()
        };
        assert!(dto.validate().is_ok());

        let dto = CreateRncDto {
            title: "".to_string(),
            ..Default::default()
        };
        assert!(dto.validate().is_err());

        let dto = CreateRncDto {
            title: "x".to_string(),
            category: Some("Inexistente".to_string()),
            ..Default::default()
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_create_dto_trims_into_new_rnc() {
        let dto = CreateRncDto {
            title: "  Pintura  ".to_string(),
            area: Some(" Galpão 2 ".to_string()),
            ..Default::default()
        };
        let new: NewRnc = dto.into();
        assert_eq!(new.title, "Pintura");
        assert_eq!(new.area, "Galpão 2");
        assert_eq!(new.issuer, "");
        assert!(new.status.is_none());
    }

    #[test]
    fn test_close_defaults_effectiveness() {
        let close: CloseRnc = CloseRncDto {
            closed_by: "Ana".to_string(),
            notes: Some("   ".to_string()),
            description: None,
            effectiveness: None,
        }
        .into();
        assert_eq!(close.effectiveness, DEFAULT_EFFECTIVENESS);
        assert!(close.notes.is_none());
    }

    #[test]
    fn test_photos_grouped_by_stage_keep_order() {
        let rnc = sample_rnc("2026-001");
        let photos = vec![
            sample_photo(rnc.id, PhotoStage::Opening, 1, "a.jpg"),
            sample_photo(rnc.id, PhotoStage::Closing, 2, "b.jpg"),
            sample_photo(rnc.id, PhotoStage::Opening, 3, "c.jpg"),
        ];

        let grouped: PhotosByStageDto = photos.into();
        assert_eq!(grouped.opening.len(), 2);
        assert_eq!(grouped.opening[0].filename, "a.jpg");
        assert_eq!(grouped.opening[1].filename, "c.jpg");
        assert_eq!(grouped.closing.len(), 1);
        assert!(grouped.reopening.is_empty());
    }
}
