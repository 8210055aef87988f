use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::{
    handlers::ApiError,
    models::audit_log::AuditLogQuery,
    services::{audit_service::AuditService, AppState},
};

/// GET /admin/audit - List audit events, newest first
pub async fn list_audit_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AuditLogQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let service = AuditService::new(state.mongo.clone());
    let entries = service.list(query).await?;

    Ok(Json(entries))
}
