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
    models::{
        announcement::Audience,
        audit_log::AuditEventType,
        quiz::CreateQuizRequest,
        result::{BulkMarksRequest, EnterMarkRequest},
    },
    services::{
        announcement_service::AnnouncementService, audit_service::AuditService,
        class_service::ClassService, exam_service::ExamService, quiz_service::QuizService,
        AppState,
    },
};

/// GET /api/v1/teacher/classes - Classes assigned to the teacher
pub async fn list_classes(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<impl IntoResponse, ApiError> {
    let service = ClassService::new(state.mongo.clone());
    let classes = service.list_for_teacher(&claims.sub).await?;

    Ok(Json(classes))
}

/// GET /api/v1/teacher/classes/{id}/roster
pub async fn get_roster(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(class_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = ClassService::new(state.mongo.clone());
    let class = service.get_class(&class_id).await?;

    // Teachers see only their own rosters; admins see all
    if claims.role == "teacher" {
        let owns = class
            .teacher_id
            .map(|id| id.to_hex() == claims.sub)
            .unwrap_or(false);
        if !owns {
            return Err(ApiError::forbidden("Not your class"));
        }
    }

    let roster = service.roster(&class_id).await?;
    Ok(Json(roster))
}

/// POST /api/v1/teacher/results - Enter one mark. The category must be in
/// its scoring window; re-submission overwrites the stored result.
pub async fn enter_mark(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    AppJson(req): AppJson<EnterMarkRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::bad_request(format!("Validation error: {}", e)))?;

    let service = ExamService::new(state.mongo.clone());
    let result = service.enter_mark(req, &claims.sub).await?;

    Ok((StatusCode::CREATED, Json(result)))
}

/// POST /api/v1/teacher/results/bulk - Enter marks for many students;
/// invalid entries are reported per-item while the rest are saved.
pub async fn enter_marks_bulk(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    AppJson(req): AppJson<BulkMarksRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::bad_request(format!("Validation error: {}", e)))?;

    let service = ExamService::new(state.mongo.clone());
    let response = service.enter_marks_bulk(req, &claims.sub).await?;

    Ok(Json(response))
}

/// POST /api/v1/teacher/quizzes - Create an unpublished quiz
pub async fn create_quiz(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    AppJson(req): AppJson<CreateQuizRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::bad_request(format!("Validation error: {}", e)))?;

    let service = QuizService::new(state.mongo.clone());
    let quiz = service.create_quiz(req, &claims.sub).await?;

    Ok((StatusCode::CREATED, Json(quiz)))
}

/// GET /api/v1/teacher/quizzes - Own quizzes, published or not
pub async fn list_quizzes(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<impl IntoResponse, ApiError> {
    let service = QuizService::new(state.mongo.clone());
    let quizzes = service.list_by_creator(&claims.sub).await?;

    Ok(Json(quizzes))
}

/// POST /api/v1/teacher/quizzes/{id}/publish
pub async fn publish_quiz(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(quiz_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = QuizService::new(state.mongo.clone());
    let quiz = service.publish_quiz(&quiz_id).await?;

    let audit_service = AuditService::new(state.mongo.clone());
    let _ = audit_service
        .log_event(
            AuditEventType::QuizPublished,
            true,
            crate::services::audit_service::AuditEventParams {
                user_id: Some(claims.sub.clone()),
                subject_id: Some(quiz_id),
                ..Default::default()
            },
        )
        .await;

    Ok(Json(quiz))
}

/// GET /api/v1/teacher/quizzes/{id}/attempts
pub async fn list_quiz_attempts(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(quiz_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = QuizService::new(state.mongo.clone());
    let quiz = service.get_quiz(&quiz_id).await?;

    if claims.role == "teacher" && quiz.created_by != claims.sub {
        return Err(ApiError::forbidden("Not your quiz"));
    }

    let attempts = service.list_attempts(&quiz_id).await?;
    Ok(Json(attempts))
}

/// GET /api/v1/teacher/announcements
pub async fn list_announcements(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let service = AnnouncementService::new(state.mongo.clone());
    let announcements = service.list_for_audience(Audience::Teachers).await?;

    Ok(Json(announcements))
}
