use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::models::bson_datetime_as_chrono;

/// Audit log entry for authentication and administrative events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub event_type: AuditEventType,

    /// User id if authenticated (None for failed login attempts)
    pub user_id: Option<String>,

    /// Email/username used in the operation
    pub email: Option<String>,

    pub success: bool,

    /// Entity the event touched (student id, category id, book id, ...)
    pub subject_id: Option<String>,

    /// Additional details about the event
    pub details: Option<String>,

    /// Error message if the operation failed
    pub error_message: Option<String>,

    #[serde(rename = "createdAt", with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    Login,
    LoginFailed,
    ChangePassword,

    // Admin actions
    CreateUser,
    UpdateUser,
    DeleteUser,
    CreateStudent,
    AdmissionApproved,
    AdmissionRejected,
    CategoryTransition,
    QuizPublished,
    BookIssued,
    BookReturned,
}

impl AuditEventType {
    pub fn as_str(&self) -> &str {
        match self {
            AuditEventType::Login => "login",
            AuditEventType::LoginFailed => "login_failed",
            AuditEventType::ChangePassword => "change_password",
            AuditEventType::CreateUser => "create_user",
            AuditEventType::UpdateUser => "update_user",
            AuditEventType::DeleteUser => "delete_user",
            AuditEventType::CreateStudent => "create_student",
            AuditEventType::AdmissionApproved => "admission_approved",
            AuditEventType::AdmissionRejected => "admission_rejected",
            AuditEventType::CategoryTransition => "category_transition",
            AuditEventType::QuizPublished => "quiz_published",
            AuditEventType::BookIssued => "book_issued",
            AuditEventType::BookReturned => "book_returned",
        }
    }
}

/// Query params for listing audit events
#[derive(Debug, Deserialize)]
pub struct AuditLogQuery {
    pub event_type: Option<String>,
    pub user_id: Option<String>,
    pub success: Option<bool>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Audit entry returned to clients
#[derive(Debug, Serialize)]
pub struct AuditLogEntry {
    pub id: String,
    pub event_type: AuditEventType,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub success: bool,
    pub subject_id: Option<String>,
    pub details: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<AuditLog> for AuditLogEntry {
    fn from(log: AuditLog) -> Self {
        AuditLogEntry {
            id: log.id.map(|id| id.to_hex()).unwrap_or_default(),
            event_type: log.event_type,
            user_id: log.user_id,
            email: log.email,
            success: log.success,
            subject_id: log.subject_id,
            details: log.details,
            error_message: log.error_message,
            created_at: log.created_at,
        }
    }
}
