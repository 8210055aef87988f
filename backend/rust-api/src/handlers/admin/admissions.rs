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
    metrics::record_admission_decision,
    middlewares::auth::{JwtClaims, JwtService},
    models::admission::{ListApplicationsQuery, RejectRequest},
    services::{
        admission_service::AdmissionService, audit_service::AuditService,
        auth_service::AuthService, AppState,
    },
};

/// GET /admin/admissions - List applications
pub async fn list_applications(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListApplicationsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let service = AdmissionService::new(
        state.mongo.clone(),
        state.config.registration_scheme.clone(),
    );
    let applications = service.list(query).await?;

    Ok(Json(applications))
}

/// POST /admin/admissions/{id}/approve - Approve: creates the student record
/// (assigning a registration number) and, when an email was given, a student
/// login whose password is returned once.
pub async fn approve_application(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(application_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = AdmissionService::new(
        state.mongo.clone(),
        state.config.registration_scheme.clone(),
    );
    let jwt_service = JwtService::new(&state.config.jwt_secret);
    let auth_service = AuthService::new(state.mongo.clone(), jwt_service);

    let response = service
        .approve(&application_id, &claims.sub, &auth_service)
        .await?;

    record_admission_decision(true);
    let audit_service = AuditService::new(state.mongo.clone());
    let _ = audit_service
        .log_admission_decided(&claims.sub, &application_id, true)
        .await;

    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /admin/admissions/{id}/reject
pub async fn reject_application(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(application_id): Path<String>,
    AppJson(req): AppJson<RejectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::bad_request(format!("Validation error: {}", e)))?;

    let service = AdmissionService::new(
        state.mongo.clone(),
        state.config.registration_scheme.clone(),
    );
    let application = service
        .reject(&application_id, &claims.sub, req.note)
        .await?;

    record_admission_decision(false);
    let audit_service = AuditService::new(state.mongo.clone());
    let _ = audit_service
        .log_admission_decided(&claims.sub, &application_id, false)
        .await;

    Ok(Json(application))
}
