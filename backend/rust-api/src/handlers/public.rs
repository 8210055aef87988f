use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::{
    extractors::AppJson,
    handlers::ApiError,
    models::{admission::ApplyRequest, result::PublicResultsQuery},
    services::{
        admission_service::AdmissionService, exam_service::ExamService,
        student_service::StudentService, AppState,
    },
};

/// POST /api/v1/public/admissions - Submit an admission application
pub async fn apply_for_admission(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<ApplyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::bad_request(format!("Validation error: {}", e)))?;

    let service = AdmissionService::new(
        state.mongo.clone(),
        state.config.registration_scheme.clone(),
    );
    let application = service.apply(req).await?;

    Ok((StatusCode::CREATED, Json(application)))
}

/// GET /api/v1/public/results - Published-results lookup by registration
/// number. Only categories that reached `published` are visible here.
pub async fn lookup_results(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PublicResultsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let student_service = StudentService::new(
        state.mongo.clone(),
        state.config.registration_scheme.clone(),
    );
    let student = student_service
        .find_by_registration_number(&query.registration_number)
        .await?;

    let exam_service = ExamService::new(state.mongo.clone());
    let results = exam_service
        .published_results(&student, &query.category_id)
        .await?;

    Ok(Json(results))
}
