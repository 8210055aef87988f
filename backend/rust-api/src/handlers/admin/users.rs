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
    models::user::{CreateUserRequest, ListUsersQuery, UpdateUserRequest},
    services::{
        audit_service::{AuditEventParams, AuditService},
        user_service::UserService,
        AppState,
    },
};

/// POST /admin/users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    AppJson(req): AppJson<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::bad_request(format!("Validation error: {}", e)))?;

    let service = UserService::new(state.mongo.clone());
    let user = service.create_user(req).await?;

    let audit_service = AuditService::new(state.mongo.clone());
    let _ = audit_service
        .log_event(
            AuditEventType::CreateUser,
            true,
            AuditEventParams {
                user_id: Some(claims.sub.clone()),
                email: Some(user.email.clone()),
                subject_id: Some(user.id.clone()),
                ..Default::default()
            },
        )
        .await;

    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /admin/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListUsersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let service = UserService::new(state.mongo.clone());
    let users = service.list_users(query).await?;

    Ok(Json(users))
}

/// GET /admin/users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = UserService::new(state.mongo.clone());
    let user = service.get_user(&user_id).await?;

    Ok(Json(user))
}

/// PATCH /admin/users/{id}
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(user_id): Path<String>,
    AppJson(req): AppJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::bad_request(format!("Validation error: {}", e)))?;

    let service = UserService::new(state.mongo.clone());
    let user = service.update_user(&user_id, req).await?;

    let audit_service = AuditService::new(state.mongo.clone());
    let _ = audit_service
        .log_event(
            AuditEventType::UpdateUser,
            true,
            AuditEventParams {
                user_id: Some(claims.sub.clone()),
                subject_id: Some(user_id),
                ..Default::default()
            },
        )
        .await;

    Ok(Json(user))
}

/// DELETE /admin/users/{id}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = UserService::new(state.mongo.clone());
    let user = service.get_user(&user_id).await?;

    service.delete_user(&user_id).await?;

    let audit_service = AuditService::new(state.mongo.clone());
    let _ = audit_service
        .log_event(
            AuditEventType::DeleteUser,
            true,
            AuditEventParams {
                user_id: Some(claims.sub.clone()),
                email: Some(user.email),
                subject_id: Some(user_id),
                ..Default::default()
            },
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}
