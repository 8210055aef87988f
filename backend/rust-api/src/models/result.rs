use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::bson_datetime_as_chrono;

/// Per-subject result stored in "subject_results".
///
/// `_id` is the composite "{student}:{category}:{subject}", so re-submission
/// replaces the existing document instead of creating a second one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectResult {
    #[serde(rename = "_id")]
    pub id: String,
    pub student_id: String,
    pub category_id: String,
    pub subject_id: String,
    pub marks_obtained: f64,
    pub max_marks: f64,
    pub percentage: f64,
    pub grade: String,
    pub passed: bool,
    /// Teacher user id that entered the mark
    pub recorded_by: String,
    #[serde(rename = "createdAt", with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "bson_datetime_as_chrono")]
    pub updated_at: DateTime<Utc>,
}

impl SubjectResult {
    pub fn composite_id(student_id: &str, category_id: &str, subject_id: &str) -> String {
        format!("{}:{}:{}", student_id, category_id, subject_id)
    }
}

/// Request to enter a single mark
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EnterMarkRequest {
    pub student_id: String,
    pub category_id: String,
    pub subject_id: String,

    #[validate(range(min = 0.0, message = "marks_obtained must not be negative"))]
    pub marks_obtained: f64,
}

/// One entry of a bulk submission
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BulkMarkEntry {
    pub student_id: String,
    pub marks_obtained: f64,
}

/// Request to enter marks for a whole class in one call
#[derive(Debug, Deserialize, Validate)]
pub struct BulkMarksRequest {
    pub category_id: String,
    pub subject_id: String,

    #[validate(length(min = 1, message = "At least one entry is required"))]
    pub entries: Vec<BulkMarkEntry>,
}

/// Per-item failure collected during a bulk submission; the valid entries
/// are still saved.
#[derive(Debug, Serialize)]
pub struct BulkMarkError {
    pub student_id: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct BulkMarksResponse {
    pub saved: usize,
    pub errors: Vec<BulkMarkError>,
}

/// One graded row of a results listing
#[derive(Debug, Serialize)]
pub struct ResultRow {
    pub subject_id: String,
    pub subject_name: String,
    pub marks_obtained: f64,
    pub max_marks: f64,
    pub percentage: f64,
    pub grade: String,
    pub passed: bool,
}

#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    pub student_id: String,
    pub registration_number: String,
    pub category_id: String,
    pub category_name: String,
    pub rows: Vec<ResultRow>,
}

/// Query for the public published-results lookup
#[derive(Debug, Deserialize)]
pub struct PublicResultsQuery {
    pub registration_number: String,
    pub category_id: String,
}
