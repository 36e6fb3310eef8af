use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::auth::dtos::{LoginRequestDto, SessionInfoDto, SessionTokenDto};
use crate::features::auth::model::QualitySession;
use crate::features::auth::services::SessionService;
use crate::shared::types::ApiResponse;
use axum::{extract::State, Json};
use std::sync::Arc;
use validator::Validate;

/// Log in with the shared quality password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequestDto,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<SessionTokenDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Incorrect password")
    ),
    tag = "auth"
)]
pub async fn login(
    State(service): State<Arc<SessionService>>,
    AppJson(dto): AppJson<LoginRequestDto>,
) -> Result<Json<ApiResponse<SessionTokenDto>>> {
    dto.validate()?;

    let token = service.login(&dto.password)?;
    Ok(Json(ApiResponse::success(Some(token), None, None)))
}

/// Describe the current quality session
#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses(
        (status = 200, description = "Session is valid", body = ApiResponse<SessionInfoDto>),
        (status = 401, description = "Missing or invalid token")
    ),
    tag = "auth",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_session(session: QualitySession) -> Result<Json<ApiResponse<SessionInfoDto>>> {
    Ok(Json(ApiResponse::success(
        Some(SessionInfoDto {
            subject: session.subject,
            expires_at: session.expires_at,
        }),
        None,
        None,
    )))
}
