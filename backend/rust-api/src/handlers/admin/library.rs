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
    models::library::{
        CreateBookRequest, IssueBookRequest, ListBooksQuery, ReturnBookRequest, UpdateBookRequest,
    },
    services::{audit_service::AuditService, library_service::LibraryService, AppState},
};

/// POST /admin/books
pub async fn create_book(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CreateBookRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::bad_request(format!("Validation error: {}", e)))?;

    let service = LibraryService::new(state.mongo.clone());
    let book = service.create_book(req).await?;

    Ok((StatusCode::CREATED, Json(book)))
}

/// GET /admin/books
pub async fn list_books(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListBooksQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let service = LibraryService::new(state.mongo.clone());
    let books = service.list_books(query).await?;

    Ok(Json(books))
}

/// GET /admin/books/{id}
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = LibraryService::new(state.mongo.clone());
    let book = service.get_book(&book_id).await?;

    Ok(Json(crate::models::library::BookDetail::from(book)))
}

/// PATCH /admin/books/{id}
pub async fn update_book(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<String>,
    AppJson(req): AppJson<UpdateBookRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::bad_request(format!("Validation error: {}", e)))?;

    let service = LibraryService::new(state.mongo.clone());
    let book = service.update_book(&book_id, req).await?;

    Ok(Json(book))
}

/// DELETE /admin/books/{id}
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = LibraryService::new(state.mongo.clone());
    service.delete_book(&book_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /admin/books/{id}/issue - Issue a copy to a student. No copies left
/// or an already-open loan surface as 409.
pub async fn issue_book(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(book_id): Path<String>,
    AppJson(req): AppJson<IssueBookRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let service = LibraryService::new(state.mongo.clone());
    let loan = service
        .issue_book(&book_id, &req.student_id, req.days)
        .await?;

    let audit_service = AuditService::new(state.mongo.clone());
    let _ = audit_service
        .log_book_event(
            AuditEventType::BookIssued,
            &claims.sub,
            &book_id,
            &req.student_id,
        )
        .await;

    Ok((StatusCode::CREATED, Json(loan)))
}

/// POST /admin/books/{id}/return
pub async fn return_book(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(book_id): Path<String>,
    AppJson(req): AppJson<ReturnBookRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let service = LibraryService::new(state.mongo.clone());
    service.return_book(&book_id, &req.student_id).await?;

    let audit_service = AuditService::new(state.mongo.clone());
    let _ = audit_service
        .log_book_event(
            AuditEventType::BookReturned,
            &claims.sub,
            &book_id,
            &req.student_id,
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}
