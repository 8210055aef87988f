use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::{
    extractors::AppJson,
    handlers::ApiError,
    middlewares::auth::JwtClaims,
    models::{announcement::Audience, quiz::SubmitQuizRequest},
    services::{
        announcement_service::AnnouncementService, exam_service::ExamService,
        library_service::LibraryService, quiz_service::QuizService,
        student_service::StudentService, AppState,
    },
};

fn ensure_student(claims: &JwtClaims) -> Result<String, ApiError> {
    if claims.role != "student" {
        return Err(ApiError::forbidden("Student role required"));
    }
    claims
        .student_id
        .clone()
        .ok_or_else(|| ApiError::forbidden("No student record linked to this account"))
}

/// GET /api/v1/student/profile
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<impl IntoResponse, ApiError> {
    let student_id = ensure_student(&claims)?;

    let service = StudentService::new(
        state.mongo.clone(),
        state.config.registration_scheme.clone(),
    );
    let profile = service.get_student(&student_id).await?;

    Ok(Json(profile))
}

#[derive(Debug, Deserialize)]
pub struct MyResultsQuery {
    pub category_id: String,
}

/// GET /api/v1/student/results?category_id=... - Own results for a category.
/// Students see their marks only once the category is published, same as the
/// public lookup.
pub async fn get_my_results(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Query(query): Query<MyResultsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let student_id = ensure_student(&claims)?;

    let student_service = StudentService::new(
        state.mongo.clone(),
        state.config.registration_scheme.clone(),
    );
    let student = student_service.get_record(&student_id).await?;

    let exam_service = ExamService::new(state.mongo.clone());
    let results = exam_service
        .published_results(&student, &query.category_id)
        .await?;

    Ok(Json(results))
}

/// GET /api/v1/student/quizzes - Published quizzes
pub async fn list_quizzes(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_student(&claims)?;

    let service = QuizService::new(state.mongo.clone());
    let quizzes = service.list_published().await?;

    Ok(Json(quizzes))
}

/// GET /api/v1/student/quizzes/{id} - Questions without answers
pub async fn get_quiz(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(quiz_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_student(&claims)?;

    let service = QuizService::new(state.mongo.clone());
    let quiz = service.quiz_for_student(&quiz_id).await?;

    Ok(Json(quiz))
}

/// POST /api/v1/student/quizzes/{id}/attempt - Submit the one allowed
/// attempt; a second submission conflicts.
pub async fn submit_quiz_attempt(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(quiz_id): Path<String>,
    AppJson(req): AppJson<SubmitQuizRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let student_id = ensure_student(&claims)?;

    let service = QuizService::new(state.mongo.clone());
    let (attempt, errors) = service.submit_attempt(&quiz_id, &student_id, req).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "attempt": attempt,
            "errors": errors,
        })),
    ))
}

/// GET /api/v1/student/quizzes/{id}/attempt - The recorded attempt
pub async fn get_quiz_attempt(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(quiz_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let student_id = ensure_student(&claims)?;

    let service = QuizService::new(state.mongo.clone());
    let attempt = service.get_attempt(&quiz_id, &student_id).await?;

    Ok(Json(attempt))
}

/// GET /api/v1/student/announcements
pub async fn list_announcements(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_student(&claims)?;

    let service = AnnouncementService::new(state.mongo.clone());
    let announcements = service.list_for_audience(Audience::Students).await?;

    Ok(Json(announcements))
}

/// GET /api/v1/student/loans - Own open library loans
pub async fn list_loans(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<impl IntoResponse, ApiError> {
    let student_id = ensure_student(&claims)?;

    let service = LibraryService::new(state.mongo.clone());
    let loans = service.student_loans(&student_id).await?;

    Ok(Json(loans))
}
