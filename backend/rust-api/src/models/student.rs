use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::bson_datetime_as_chrono;

/// Student record stored in MongoDB "students" collection.
///
/// The registration number is assigned exactly once at creation and never
/// reused; a unique index on it is created at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub full_name: String,
    pub registration_number: String,
    /// ISO date string, e.g. "2012-04-17"
    pub date_of_birth: String,
    pub guardian_name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<ObjectId>,
    #[serde(rename = "createdAt", with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "bson_datetime_as_chrono")]
    pub updated_at: DateTime<Utc>,
}

/// Student view returned to clients
#[derive(Debug, Serialize)]
pub struct StudentProfile {
    pub id: String,
    pub full_name: String,
    pub registration_number: String,
    pub date_of_birth: String,
    pub guardian_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub class_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Student> for StudentProfile {
    fn from(student: Student) -> Self {
        StudentProfile {
            id: student.id.map(|id| id.to_hex()).unwrap_or_default(),
            full_name: student.full_name,
            registration_number: student.registration_number,
            date_of_birth: student.date_of_birth,
            guardian_name: student.guardian_name,
            phone: student.phone,
            email: student.email,
            class_id: student.class_id.map(|id| id.to_hex()),
            created_at: student.created_at,
        }
    }
}

/// Request to create a student directly (admin only)
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateStudentRequest {
    #[validate(length(
        min = 1,
        max = 120,
        message = "Full name must be between 1 and 120 characters"
    ))]
    pub full_name: String,

    #[validate(length(min = 8, max = 10, message = "Date of birth must be an ISO date"))]
    pub date_of_birth: String,

    #[validate(length(min = 1, max = 120))]
    pub guardian_name: String,

    #[validate(length(min = 5, max = 20, message = "Phone must be between 5 and 20 characters"))]
    pub phone: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub class_id: Option<String>,
}

/// Request to update a student (admin only)
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateStudentRequest {
    #[validate(length(min = 1, max = 120))]
    pub full_name: Option<String>,
    #[validate(length(min = 1, max = 120))]
    pub guardian_name: Option<String>,
    #[validate(length(min = 5, max = 20))]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub class_id: Option<String>,
}

/// Query params for listing students
#[derive(Debug, Deserialize)]
pub struct ListStudentsQuery {
    pub class_id: Option<String>,
    pub search: Option<String>, // search by name or registration number
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}
