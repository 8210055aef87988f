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
    models::exam::{
        CreateCategoryRequest, CreateSubjectRequest, TransitionRequest, UpdateCategoryRequest,
    },
    services::{audit_service::AuditService, exam_service::ExamService, AppState},
};

/// POST /admin/exam-categories - New category in draft state
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CreateCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::bad_request(format!("Validation error: {}", e)))?;

    let service = ExamService::new(state.mongo.clone());
    let category = service.create_category(req).await?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// GET /admin/exam-categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let service = ExamService::new(state.mongo.clone());
    let categories = service.list_categories().await?;

    Ok(Json(categories))
}

/// GET /admin/exam-categories/{id}
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(category_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = ExamService::new(state.mongo.clone());
    let category = service.get_category(&category_id).await?;

    Ok(Json(crate::models::exam::CategoryDetail::from(category)))
}

/// PATCH /admin/exam-categories/{id} - Edit a draft category
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Path(category_id): Path<String>,
    AppJson(req): AppJson<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::bad_request(format!("Validation error: {}", e)))?;

    let service = ExamService::new(state.mongo.clone());
    let category = service.update_category(&category_id, req).await?;

    Ok(Json(category))
}

/// DELETE /admin/exam-categories/{id} - Delete a draft category and its
/// subjects
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Path(category_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = ExamService::new(state.mongo.clone());
    service.delete_category(&category_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /admin/subjects/{id} - Delete a subject while its category is in
/// draft
pub async fn delete_subject(
    State(state): State<Arc<AppState>>,
    Path(subject_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = ExamService::new(state.mongo.clone());
    service.delete_subject(&subject_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /admin/exam-categories/{id}/transition - Advance the lifecycle one
/// step; publishing is what exposes results to the public lookup.
pub async fn transition_category(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(category_id): Path<String>,
    AppJson(req): AppJson<TransitionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let service = ExamService::new(state.mongo.clone());
    let before = service.get_category(&category_id).await?;
    let category = service.transition_category(&category_id, req.to).await?;

    let audit_service = AuditService::new(state.mongo.clone());
    let _ = audit_service
        .log_category_transition(
            &claims.sub,
            &category_id,
            before.status.as_str(),
            req.to.as_str(),
        )
        .await;

    Ok(Json(category))
}

/// POST /admin/exam-categories/{id}/subjects
pub async fn create_subject(
    State(state): State<Arc<AppState>>,
    Path(category_id): Path<String>,
    AppJson(req): AppJson<CreateSubjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::bad_request(format!("Validation error: {}", e)))?;

    let service = ExamService::new(state.mongo.clone());
    let subject = service.create_subject(&category_id, req).await?;

    Ok((StatusCode::CREATED, Json(subject)))
}

/// GET /admin/exam-categories/{id}/subjects
pub async fn list_subjects(
    State(state): State<Arc<AppState>>,
    Path(category_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = ExamService::new(state.mongo.clone());
    let subjects = service.list_subjects(&category_id).await?;

    Ok(Json(subjects))
}
