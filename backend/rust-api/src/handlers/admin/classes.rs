use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::{
    extractors::AppJson,
    handlers::ApiError,
    models::class::{CreateClassRequest, RosterUpdateRequest, UpdateClassRequest},
    services::{class_service::ClassService, AppState},
};

/// POST /admin/classes
pub async fn create_class(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CreateClassRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::bad_request(format!("Validation error: {}", e)))?;

    let service = ClassService::new(state.mongo.clone());
    let class = service.create_class(req).await?;

    Ok((StatusCode::CREATED, Json(class)))
}

/// GET /admin/classes
pub async fn list_classes(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let service = ClassService::new(state.mongo.clone());
    let classes = service.list_classes().await?;

    Ok(Json(classes))
}

/// GET /admin/classes/{id} - Class with its roster
pub async fn get_class(
    State(state): State<Arc<AppState>>,
    Path(class_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = ClassService::new(state.mongo.clone());
    let roster = service.roster(&class_id).await?;

    Ok(Json(roster))
}

/// PATCH /admin/classes/{id}
pub async fn update_class(
    State(state): State<Arc<AppState>>,
    Path(class_id): Path<String>,
    AppJson(req): AppJson<UpdateClassRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::bad_request(format!("Validation error: {}", e)))?;

    let service = ClassService::new(state.mongo.clone());
    let class = service.update_class(&class_id, req).await?;

    Ok(Json(class))
}

/// DELETE /admin/classes/{id}
pub async fn delete_class(
    State(state): State<Arc<AppState>>,
    Path(class_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = ClassService::new(state.mongo.clone());
    service.delete_class(&class_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /admin/classes/{id}/students - Add students to the roster
pub async fn add_students_to_class(
    State(state): State<Arc<AppState>>,
    Path(class_id): Path<String>,
    AppJson(req): AppJson<RosterUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::bad_request(format!("Validation error: {}", e)))?;

    let service = ClassService::new(state.mongo.clone());
    let roster = service.add_students(&class_id, &req.student_ids).await?;

    Ok(Json(roster))
}

/// DELETE /admin/classes/{id}/students - Remove students from the roster
pub async fn remove_students_from_class(
    State(state): State<Arc<AppState>>,
    Path(class_id): Path<String>,
    AppJson(req): AppJson<RosterUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::bad_request(format!("Validation error: {}", e)))?;

    let service = ClassService::new(state.mongo.clone());
    let roster = service.remove_students(&class_id, &req.student_ids).await?;

    Ok(Json(roster))
}
