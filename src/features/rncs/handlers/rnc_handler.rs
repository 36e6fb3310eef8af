use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::auth::model::QualitySession;
use crate::features::rncs::dtos::{
    CancelRncDto, CloseRncDto, CreateRncDto, DeleteRncDto, ReopenRncDto, RncDetailResponseDto,
    RncListQuery, RncOptionsDto, RncResponseDto, StatusOptionDto,
};
use crate::features::rncs::models::RncStatus;
use crate::features::rncs::services::RncService;
use crate::shared::constants::{CATEGORIES, CAUSES, EFFECTIVENESS, ORIGINS, PROCESSES, SEVERITIES};
use crate::shared::types::{ApiResponse, Meta, PageWindow};

/// State for RNC handlers
#[derive(Clone)]
pub struct RncState {
    pub rnc_service: Arc<RncService>,
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Choice lists for the RNC form
#[utoipa::path(
    get,
    path = "/api/rncs/options",
    responses(
        (status = 200, description = "Form options", body = ApiResponse<RncOptionsDto>)
    ),
    tag = "rncs"
)]
pub async fn get_options() -> Result<Json<ApiResponse<RncOptionsDto>>> {
    let statuses = [
        RncStatus::Open,
        RncStatus::Reopened,
        RncStatus::Closed,
        RncStatus::Cancelled,
    ]
    .into_iter()
    .map(|status| StatusOptionDto {
        value: status,
        label: status.label().to_string(),
    })
    .collect();

    let dto = RncOptionsDto {
        categories: to_strings(CATEGORIES),
        severities: to_strings(SEVERITIES),
        causes: to_strings(CAUSES),
        processes: to_strings(PROCESSES),
        origins: to_strings(ORIGINS),
        effectiveness: to_strings(EFFECTIVENESS),
        statuses,
    };

    Ok(Json(ApiResponse::success(Some(dto), None, None)))
}

/// List RNCs, newest first
#[utoipa::path(
    get,
    path = "/api/rncs",
    params(RncListQuery),
    responses(
        (status = 200, description = "Page of RNCs", body = ApiResponse<Vec<RncResponseDto>>)
    ),
    tag = "rncs"
)]
pub async fn list_rncs(
    State(state): State<RncState>,
    Query(query): Query<RncListQuery>,
) -> Result<Json<ApiResponse<Vec<RncResponseDto>>>> {
    let window = PageWindow::new(query.page, query.page_size);
    let (rncs, total) = state.rnc_service.list(&query.filter(), window).await?;

    let dtos: Vec<RncResponseDto> = rncs.into_iter().map(|r| r.into()).collect();
    Ok(Json(ApiResponse::success(
        Some(dtos),
        None,
        Some(Meta { total }),
    )))
}

/// Open a new RNC
#[utoipa::path(
    post,
    path = "/api/rncs",
    request_body = CreateRncDto,
    responses(
        (status = 201, description = "RNC opened", body = ApiResponse<RncResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Quality session required"),
        (status = 409, description = "Could not allocate a number")
    ),
    security(("bearer_auth" = [])),
    tag = "rncs"
)]
pub async fn create_rnc(
    _session: QualitySession,
    State(state): State<RncState>,
    AppJson(dto): AppJson<CreateRncDto>,
) -> Result<(StatusCode, Json<ApiResponse<RncResponseDto>>)> {
    dto.validate()?;

    let rnc = state.rnc_service.create(dto.into()).await?;
    let message = format!("RNC {} opened", rnc.rnc_number);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(rnc.into()), Some(message), None)),
    ))
}

/// Get an RNC with its photos
#[utoipa::path(
    get,
    path = "/api/rncs/{id}",
    params(
        ("id" = Uuid, Path, description = "RNC ID")
    ),
    responses(
        (status = 200, description = "RNC found", body = ApiResponse<RncDetailResponseDto>),
        (status = 404, description = "RNC not found")
    ),
    tag = "rncs"
)]
pub async fn get_rnc(
    State(state): State<RncState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RncDetailResponseDto>>> {
    let detail = state.rnc_service.get(id).await?;
    Ok(Json(ApiResponse::success(Some(detail.into()), None, None)))
}

/// Close an open or reopened RNC
#[utoipa::path(
    post,
    path = "/api/rncs/{id}/close",
    params(
        ("id" = Uuid, Path, description = "RNC ID")
    ),
    request_body = CloseRncDto,
    responses(
        (status = 200, description = "RNC closed", body = ApiResponse<RncResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Quality session required"),
        (status = 404, description = "RNC not found"),
        (status = 409, description = "RNC cannot be closed in its current status")
    ),
    security(("bearer_auth" = [])),
    tag = "rncs"
)]
pub async fn close_rnc(
    _session: QualitySession,
    State(state): State<RncState>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<CloseRncDto>,
) -> Result<Json<ApiResponse<RncResponseDto>>> {
    dto.validate()?;

    let rnc = state.rnc_service.close(id, dto.into()).await?;
    Ok(Json(ApiResponse::success(Some(rnc.into()), None, None)))
}

/// Reopen a closed RNC
#[utoipa::path(
    post,
    path = "/api/rncs/{id}/reopen",
    params(
        ("id" = Uuid, Path, description = "RNC ID")
    ),
    request_body = ReopenRncDto,
    responses(
        (status = 200, description = "RNC reopened", body = ApiResponse<RncResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Quality session required"),
        (status = 404, description = "RNC not found"),
        (status = 409, description = "Only closed RNCs can be reopened")
    ),
    security(("bearer_auth" = [])),
    tag = "rncs"
)]
pub async fn reopen_rnc(
    _session: QualitySession,
    State(state): State<RncState>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<ReopenRncDto>,
) -> Result<Json<ApiResponse<RncResponseDto>>> {
    dto.validate()?;

    let rnc = state.rnc_service.reopen(id, dto.into()).await?;
    Ok(Json(ApiResponse::success(Some(rnc.into()), None, None)))
}

/// Cancel an open or reopened RNC
#[utoipa::path(
    post,
    path = "/api/rncs/{id}/cancel",
    params(
        ("id" = Uuid, Path, description = "RNC ID")
    ),
    request_body = CancelRncDto,
    responses(
        (status = 200, description = "RNC cancelled", body = ApiResponse<RncResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Quality session required"),
        (status = 404, description = "RNC not found"),
        (status = 409, description = "RNC cannot be cancelled in its current status")
    ),
    security(("bearer_auth" = [])),
    tag = "rncs"
)]
pub async fn cancel_rnc(
    _session: QualitySession,
    State(state): State<RncState>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<CancelRncDto>,
) -> Result<Json<ApiResponse<RncResponseDto>>> {
    dto.validate()?;

    let rnc = state.rnc_service.cancel(id, dto.into()).await?;
    Ok(Json(ApiResponse::success(Some(rnc.into()), None, None)))
}

/// Permanently delete an RNC and its photos
#[utoipa::path(
    delete,
    path = "/api/rncs/{id}",
    params(
        ("id" = Uuid, Path, description = "RNC ID")
    ),
    request_body = DeleteRncDto,
    responses(
        (status = 200, description = "RNC deleted"),
        (status = 400, description = "Missing confirmation"),
        (status = 401, description = "Quality session required"),
        (status = 404, description = "RNC not found")
    ),
    security(("bearer_auth" = [])),
    tag = "rncs"
)]
pub async fn delete_rnc(
    _session: QualitySession,
    State(state): State<RncState>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<DeleteRncDto>,
) -> Result<Json<ApiResponse<()>>> {
    state.rnc_service.delete(id, &dto.confirmation).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("RNC deleted".to_string()),
        None,
    )))
}
