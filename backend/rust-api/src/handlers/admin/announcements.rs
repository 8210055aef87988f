use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::{
    extractors::AppJson,
    handlers::ApiError,
    middlewares::auth::JwtClaims,
    models::announcement::{Audience, CreateAnnouncementRequest, UpdateAnnouncementRequest},
    services::{announcement_service::AnnouncementService, AppState},
};

/// POST /admin/announcements
pub async fn create_announcement(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    AppJson(req): AppJson<CreateAnnouncementRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::bad_request(format!("Validation error: {}", e)))?;

    let service = AnnouncementService::new(state.mongo.clone());
    let announcement = service.create(req, &claims.sub).await?;

    Ok((StatusCode::CREATED, Json(announcement)))
}

/// GET /admin/announcements - Everything, regardless of audience
pub async fn list_announcements(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let service = AnnouncementService::new(state.mongo.clone());
    let announcements = service.list_for_audience(Audience::All).await?;

    Ok(Json(announcements))
}

/// PATCH /admin/announcements/{id}
pub async fn update_announcement(
    State(state): State<Arc<AppState>>,
    Path(announcement_id): Path<String>,
    AppJson(req): AppJson<UpdateAnnouncementRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::bad_request(format!("Validation error: {}", e)))?;

    let service = AnnouncementService::new(state.mongo.clone());
    let announcement = service.update(&announcement_id, req).await?;

    Ok(Json(announcement))
}

/// DELETE /admin/announcements/{id}
pub async fn delete_announcement(
    State(state): State<Arc<AppState>>,
    Path(announcement_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = AnnouncementService::new(state.mongo.clone());
    service.delete(&announcement_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
