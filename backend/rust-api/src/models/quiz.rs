use std::collections::HashMap;

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::bson_datetime_as_chrono;

/// Pass threshold applied when a quiz does not set one, as a percentage of
/// total points
pub const DEFAULT_QUIZ_PASSING_PERCENT: f64 = 25.0;

/// Quiz stored in "quizzes". Questions carry their own points; the pass
/// threshold is a percentage of the summed points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Pass threshold as a percentage of total points
    pub passing_score: f64,
    pub questions: Vec<QuizQuestion>,
    pub published: bool,
    /// Teacher user id
    pub created_by: String,
    #[serde(rename = "createdAt", with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "bson_datetime_as_chrono")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: String,
    pub text: String,
    pub kind: QuestionKind,
    pub points: f64,
    /// Choice texts, empty for subjective questions
    #[serde(default)]
    pub options: Vec<String>,
    /// Index into `options`, None for subjective questions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_option: Option<u32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice,
    Subjective,
}

/// One submitted answer: either a selected option (multiple choice) or an
/// entered score (subjective)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnswerInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_option: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Request to submit a quiz attempt, keyed by question id
#[derive(Debug, Deserialize)]
pub struct SubmitQuizRequest {
    pub answers: HashMap<String, AnswerInput>,
}

/// Per-question outcome stored with the attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_option: Option<u32>,
    pub correct: bool,
    pub points_earned: f64,
    pub points_possible: f64,
}

/// Quiz attempt stored in "quiz_attempts".
///
/// `_id` is "{student}:{quiz}"; the unique insert enforces the one-attempt
/// rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAttempt {
    #[serde(rename = "_id")]
    pub id: String,
    pub student_id: String,
    pub quiz_id: String,
    pub answers: Vec<AnswerRecord>,
    pub earned_points: f64,
    pub possible_points: f64,
    pub percentage: f64,
    pub passed: bool,
    #[serde(rename = "submittedAt", with = "bson_datetime_as_chrono")]
    pub submitted_at: DateTime<Utc>,
}

impl QuizAttempt {
    pub fn composite_id(student_id: &str, quiz_id: &str) -> String {
        format!("{}:{}", student_id, quiz_id)
    }
}

#[derive(Debug, Serialize)]
pub struct QuizSummary {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub passing_score: f64,
    pub question_count: usize,
    pub published: bool,
}

impl From<Quiz> for QuizSummary {
    fn from(quiz: Quiz) -> Self {
        QuizSummary {
            id: quiz.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: quiz.title,
            description: quiz.description,
            passing_score: quiz.passing_score,
            question_count: quiz.questions.len(),
            published: quiz.published,
        }
    }
}

/// Question view shown to students: no correct answer
#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub id: String,
    pub text: String,
    pub kind: QuestionKind,
    pub points: f64,
    pub options: Vec<String>,
}

impl From<&QuizQuestion> for QuestionView {
    fn from(question: &QuizQuestion) -> Self {
        QuestionView {
            id: question.id.clone(),
            text: question.text.clone(),
            kind: question.kind,
            points: question.points,
            options: question.options.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QuizDetailForStudent {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub passing_score: f64,
    pub questions: Vec<QuestionView>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 120))]
    pub title: String,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    /// Defaults to 25 when omitted
    #[validate(range(min = 0.0, max = 100.0))]
    pub passing_score: Option<f64>,

    #[validate(length(min = 1, message = "At least one question is required"))]
    pub questions: Vec<CreateQuestionRequest>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateQuestionRequest {
    pub text: String,
    pub kind: QuestionKind,
    pub points: f64,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct_option: Option<u32>,
}
