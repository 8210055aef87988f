use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::bson_datetime_as_chrono;
use crate::models::student::StudentProfile;

/// Admission application stored in "admission_applications".
///
/// Approval is the point where a student record is created and a
/// registration number is assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionApplication {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub applicant_name: String,
    pub date_of_birth: String,
    pub guardian_name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired_class_id: Option<ObjectId>,
    pub status: ApplicationStatus,
    /// Admin user id that decided the application
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_note: Option<String>,
    #[serde(rename = "createdAt", with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "bson_datetime_as_chrono")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

/// Public request to submit an admission application
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ApplyRequest {
    #[validate(length(min = 1, max = 120))]
    pub applicant_name: String,

    #[validate(length(min = 8, max = 10, message = "Date of birth must be an ISO date"))]
    pub date_of_birth: String,

    #[validate(length(min = 1, max = 120))]
    pub guardian_name: String,

    #[validate(length(min = 5, max = 20))]
    pub phone: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub desired_class_id: Option<String>,
}

/// Admin request to reject an application
#[derive(Debug, Deserialize, Validate)]
pub struct RejectRequest {
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

/// Application view returned to clients
#[derive(Debug, Serialize)]
pub struct ApplicationDetail {
    pub id: String,
    pub applicant_name: String,
    pub date_of_birth: String,
    pub guardian_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub desired_class_id: Option<String>,
    pub status: ApplicationStatus,
    pub decided_by: Option<String>,
    pub decision_note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<AdmissionApplication> for ApplicationDetail {
    fn from(app: AdmissionApplication) -> Self {
        ApplicationDetail {
            id: app.id.map(|id| id.to_hex()).unwrap_or_default(),
            applicant_name: app.applicant_name,
            date_of_birth: app.date_of_birth,
            guardian_name: app.guardian_name,
            phone: app.phone,
            email: app.email,
            desired_class_id: app.desired_class_id.map(|id| id.to_hex()),
            status: app.status,
            decided_by: app.decided_by,
            decision_note: app.decision_note,
            created_at: app.created_at,
        }
    }
}

/// Response after approving an application: the created student plus the
/// generated login credentials (shown once).
#[derive(Debug, Serialize)]
pub struct ApprovalResponse {
    pub application_id: String,
    pub student: StudentProfile,
    pub login_email: Option<String>,
    pub initial_password: Option<String>,
}

/// Query params for listing applications
#[derive(Debug, Deserialize)]
pub struct ListApplicationsQuery {
    pub status: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}
