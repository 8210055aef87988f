use axum::{
    extract::{Path, Query, State},
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
    models::audit_log::AuditEventType,
    models::student::{CreateStudentRequest, ListStudentsQuery, UpdateStudentRequest},
    services::{
        audit_service::{AuditEventParams, AuditService},
        student_service::StudentService,
        AppState,
    },
};

/// POST /admin/students - Create a student, assigning the next registration
/// number. A concurrent-creation clash surfaces as 409; retry the request.
pub async fn create_student(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    AppJson(req): AppJson<CreateStudentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::bad_request(format!("Validation error: {}", e)))?;

    let service = StudentService::new(
        state.mongo.clone(),
        state.config.registration_scheme.clone(),
    );
    let student = service.create_student(req).await?;

    let audit_service = AuditService::new(state.mongo.clone());
    let _ = audit_service
        .log_event(
            AuditEventType::CreateStudent,
            true,
            AuditEventParams {
                user_id: Some(claims.sub.clone()),
                subject_id: Some(student.id.clone()),
                details: Some(student.registration_number.clone()),
                ..Default::default()
            },
        )
        .await;

    Ok((StatusCode::CREATED, Json(student)))
}

/// GET /admin/students
pub async fn list_students(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListStudentsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let service = StudentService::new(
        state.mongo.clone(),
        state.config.registration_scheme.clone(),
    );
    let students = service.list_students(query).await?;

    Ok(Json(students))
}

/// GET /admin/students/{id}
pub async fn get_student(
    State(state): State<Arc<AppState>>,
    Path(student_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = StudentService::new(
        state.mongo.clone(),
        state.config.registration_scheme.clone(),
    );
    let student = service.get_student(&student_id).await?;

    Ok(Json(student))
}

/// PATCH /admin/students/{id}
pub async fn update_student(
    State(state): State<Arc<AppState>>,
    Path(student_id): Path<String>,
    AppJson(req): AppJson<UpdateStudentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::bad_request(format!("Validation error: {}", e)))?;

    let service = StudentService::new(
        state.mongo.clone(),
        state.config.registration_scheme.clone(),
    );
    let student = service.update_student(&student_id, req).await?;

    Ok(Json(student))
}

/// DELETE /admin/students/{id}
pub async fn delete_student(
    State(state): State<Arc<AppState>>,
    Path(student_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = StudentService::new(
        state.mongo.clone(),
        state.config.registration_scheme.clone(),
    );
    service.delete_student(&student_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
