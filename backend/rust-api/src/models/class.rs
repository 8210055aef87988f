use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::bson_datetime_as_chrono;
use crate::models::student::StudentProfile;

/// Class record stored in "classes". The roster is the list of student ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchoolClass {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub academic_year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<ObjectId>,
    #[serde(default)]
    pub student_ids: Vec<ObjectId>,
    #[serde(rename = "createdAt", with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "bson_datetime_as_chrono")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ClassSummary {
    pub id: String,
    pub name: String,
    pub academic_year: i32,
    pub teacher_id: Option<String>,
    pub student_count: usize,
}

impl From<SchoolClass> for ClassSummary {
    fn from(class: SchoolClass) -> Self {
        ClassSummary {
            id: class.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: class.name,
            academic_year: class.academic_year,
            teacher_id: class.teacher_id.map(|id| id.to_hex()),
            student_count: class.student_ids.len(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RosterResponse {
    pub class: ClassSummary,
    pub students: Vec<StudentProfile>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateClassRequest {
    #[validate(length(min = 1, max = 60))]
    pub name: String,

    #[validate(range(min = 2000, max = 2100))]
    pub academic_year: i32,

    pub teacher_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateClassRequest {
    #[validate(length(min = 1, max = 60))]
    pub name: Option<String>,
    pub teacher_id: Option<String>,
}

/// Request to add or remove students from a roster
#[derive(Debug, Deserialize, Validate)]
pub struct RosterUpdateRequest {
    #[validate(length(min = 1, message = "At least one student id is required"))]
    pub student_ids: Vec<String>,
}
