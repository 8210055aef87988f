use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::bson_datetime_as_chrono;

/// Default pass threshold applied to a category when none is supplied,
/// expressed as a percentage of a subject's max marks.
pub const DEFAULT_PASSING_PERCENT: f64 = 40.0;

/// Exam category (e.g. "Term 1 2025"): a gradable grouping of subjects and
/// results, governed by a forward-only lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamCategory {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub academic_year: i32,
    pub status: CategoryStatus,
    /// Percentage used to derive a subject's passing marks when the subject
    /// does not set an absolute value
    pub passing_percent: f64,
    #[serde(rename = "createdAt", with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "bson_datetime_as_chrono")]
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle: draft -> open -> closed -> scoring -> published, one step at a
/// time, never backwards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CategoryStatus {
    Draft,
    Open,
    Closed,
    Scoring,
    Published,
}

impl CategoryStatus {
    pub fn as_str(&self) -> &str {
        match self {
            CategoryStatus::Draft => "draft",
            CategoryStatus::Open => "open",
            CategoryStatus::Closed => "closed",
            CategoryStatus::Scoring => "scoring",
            CategoryStatus::Published => "published",
        }
    }

    /// The only state that may follow this one
    pub fn next(&self) -> Option<CategoryStatus> {
        match self {
            CategoryStatus::Draft => Some(CategoryStatus::Open),
            CategoryStatus::Open => Some(CategoryStatus::Closed),
            CategoryStatus::Closed => Some(CategoryStatus::Scoring),
            CategoryStatus::Scoring => Some(CategoryStatus::Published),
            CategoryStatus::Published => None,
        }
    }

    /// Mark entry is permitted only in the scoring window
    pub fn allows_mark_entry(&self) -> bool {
        matches!(self, CategoryStatus::Scoring | CategoryStatus::Published)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("Cannot transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
    #[error("Mark entry is not allowed while category status is {0}")]
    MarkEntryClosed(String),
    #[error("Results are not public while category status is {0}")]
    NotPublished(String),
}

/// Validate a requested transition: exactly one step forward.
pub fn validate_transition(
    from: CategoryStatus,
    to: CategoryStatus,
) -> Result<(), LifecycleError> {
    match from.next() {
        Some(next) if next == to => Ok(()),
        _ => Err(LifecycleError::InvalidTransition {
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        }),
    }
}

/// Subject within an exam category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub category_id: ObjectId,
    pub name: String,
    pub max_marks: f64,
    /// Absolute pass threshold for this subject
    pub passing_marks: f64,
    #[serde(rename = "createdAt", with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "bson_datetime_as_chrono")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SubjectDetail {
    pub id: String,
    pub category_id: String,
    pub name: String,
    pub max_marks: f64,
    pub passing_marks: f64,
}

impl From<Subject> for SubjectDetail {
    fn from(subject: Subject) -> Self {
        SubjectDetail {
            id: subject.id.map(|id| id.to_hex()).unwrap_or_default(),
            category_id: subject.category_id.to_hex(),
            name: subject.name,
            max_marks: subject.max_marks,
            passing_marks: subject.passing_marks,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryDetail {
    pub id: String,
    pub name: String,
    pub academic_year: i32,
    pub status: CategoryStatus,
    pub passing_percent: f64,
    pub created_at: DateTime<Utc>,
}

impl From<ExamCategory> for CategoryDetail {
    fn from(category: ExamCategory) -> Self {
        CategoryDetail {
            id: category.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: category.name,
            academic_year: category.academic_year,
            status: category.status,
            passing_percent: category.passing_percent,
            created_at: category.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 80))]
    pub name: String,

    #[validate(range(min = 2000, max = 2100))]
    pub academic_year: i32,

    #[validate(range(min = 0.0, max = 100.0))]
    pub passing_percent: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 80))]
    pub name: Option<String>,

    #[validate(range(min = 0.0, max = 100.0))]
    pub passing_percent: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub to: CategoryStatus,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSubjectRequest {
    #[validate(length(min = 1, max = 80))]
    pub name: String,

    #[validate(range(min = 1.0, message = "max_marks must be positive"))]
    pub max_marks: f64,

    /// Absolute passing marks; derived from the category's passing percent
    /// when omitted
    pub passing_marks: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_moves_forward_one_step() {
        assert!(validate_transition(CategoryStatus::Draft, CategoryStatus::Open).is_ok());
        assert!(validate_transition(CategoryStatus::Open, CategoryStatus::Closed).is_ok());
        assert!(validate_transition(CategoryStatus::Closed, CategoryStatus::Scoring).is_ok());
        assert!(validate_transition(CategoryStatus::Scoring, CategoryStatus::Published).is_ok());
    }

    #[test]
    fn lifecycle_rejects_skips_and_reversals() {
        assert!(validate_transition(CategoryStatus::Draft, CategoryStatus::Scoring).is_err());
        assert!(validate_transition(CategoryStatus::Open, CategoryStatus::Draft).is_err());
        assert!(validate_transition(CategoryStatus::Published, CategoryStatus::Draft).is_err());
        assert!(validate_transition(CategoryStatus::Scoring, CategoryStatus::Scoring).is_err());
    }

    #[test]
    fn mark_entry_window() {
        assert!(!CategoryStatus::Draft.allows_mark_entry());
        assert!(!CategoryStatus::Open.allows_mark_entry());
        assert!(!CategoryStatus::Closed.allows_mark_entry());
        assert!(CategoryStatus::Scoring.allows_mark_entry());
        assert!(CategoryStatus::Published.allows_mark_entry());
    }
}
