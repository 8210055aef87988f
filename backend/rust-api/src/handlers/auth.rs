use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use std::sync::Arc;
use validator::Validate;

use crate::{
    extractors::AppJson,
    middlewares::auth::{JwtClaims, JwtService},
    models::user::{ChangePasswordRequest, LoginRequest, UserProfile},
    services::{audit_service::AuditService, auth_service::AuthService, AppState},
};

/// POST /api/v1/auth/login - Login with email and password
pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if let Err(e) = req.validate() {
        return Err((StatusCode::BAD_REQUEST, format!("Validation error: {}", e)));
    }

    tracing::info!("Login attempt for user: {}", req.email);

    let jwt_service = JwtService::new(&state.config.jwt_secret);
    let service = AuthService::new(state.mongo.clone(), jwt_service);
    let audit_service = AuditService::new(state.mongo.clone());

    let email = req.email.clone();

    match service.login(req).await {
        Ok(response) => {
            tracing::info!("User logged in successfully");

            let _ = audit_service
                .log_login_success(&response.user.id, &response.user.email)
                .await;

            Ok((StatusCode::OK, Json(response)))
        }
        Err(e) => {
            tracing::warn!("Failed login: {}", e);

            let _ = audit_service.log_login_failed(&email, &e.to_string()).await;

            Err((StatusCode::UNAUTHORIZED, e.to_string()))
        }
    }
}

/// GET /api/v1/auth/me - Profile of the authenticated user
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<Json<UserProfile>, (StatusCode, String)> {
    let jwt_service = JwtService::new(&state.config.jwt_secret);
    let service = AuthService::new(state.mongo.clone(), jwt_service);

    let profile = service.current_user(&claims.sub).await.map_err(|e| {
        tracing::warn!("Failed to load current user: {}", e);
        (StatusCode::UNAUTHORIZED, e.to_string())
    })?;

    Ok(Json(profile))
}

/// POST /api/v1/auth/change-password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    AppJson(req): AppJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if let Err(e) = req.validate() {
        return Err((StatusCode::BAD_REQUEST, format!("Validation error: {}", e)));
    }

    let jwt_service = JwtService::new(&state.config.jwt_secret);
    let service = AuthService::new(state.mongo.clone(), jwt_service);

    match service.change_password(&claims.sub, req).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            tracing::warn!("Failed password change for {}: {}", claims.sub, e);
            Err((StatusCode::BAD_REQUEST, e.to_string()))
        }
    }
}
