use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Database;
use uuid::Uuid;

use crate::metrics::record_quiz_attempt;
use crate::models::quiz::{
    CreateQuizRequest, QuestionKind, Quiz, QuizAttempt, QuizDetailForStudent, QuizQuestion,
    QuizSummary, SubmitQuizRequest, DEFAULT_QUIZ_PASSING_PERCENT,
};
use crate::services::grading::{score_quiz, QuizItemError};
use crate::utils::db::is_duplicate_key_error;
use crate::utils::time::chrono_to_bson;

pub struct QuizService {
    mongo: Database,
}

impl QuizService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    /// Create a quiz in unpublished state
    pub async fn create_quiz(&self, req: CreateQuizRequest, created_by: &str) -> Result<QuizSummary> {
        let mut questions = Vec::with_capacity(req.questions.len());
        for question in req.questions {
            if question.points <= 0.0 {
                return Err(anyhow!("Question points must be positive"));
            }
            match question.kind {
                QuestionKind::MultipleChoice => {
                    if question.options.len() < 2 {
                        return Err(anyhow!(
                            "Multiple-choice questions need at least two options"
                        ));
                    }
                    let correct = question
                        .correct_option
                        .ok_or_else(|| anyhow!("Multiple-choice questions need a correct option"))?;
                    if correct as usize >= question.options.len() {
                        return Err(anyhow!("correct_option is out of range"));
                    }
                }
                QuestionKind::Subjective => {
                    if question.correct_option.is_some() || !question.options.is_empty() {
                        return Err(anyhow!("Subjective questions take no options"));
                    }
                }
            }

            questions.push(QuizQuestion {
                id: Uuid::new_v4().to_string(),
                text: question.text,
                kind: question.kind,
                points: question.points,
                options: question.options,
                correct_option: question.correct_option,
            });
        }

        let quizzes = self.mongo.collection::<Quiz>("quizzes");
        let now = Utc::now();
        let quiz = Quiz {
            id: None,
            title: req.title,
            description: req.description,
            passing_score: req.passing_score.unwrap_or(DEFAULT_QUIZ_PASSING_PERCENT),
            questions,
            published: false,
            created_by: created_by.to_string(),
            created_at: now,
            updated_at: now,
        };

        let insert_result = quizzes
            .insert_one(&quiz)
            .await
            .context("Failed to insert quiz")?;

        let quiz_id = insert_result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| anyhow!("Failed to get inserted quiz ID"))?;

        let created = quizzes
            .find_one(doc! { "_id": quiz_id })
            .await
            .context("Failed to fetch created quiz")?
            .ok_or_else(|| anyhow!("Quiz not found after creation"))?;

        Ok(QuizSummary::from(created))
    }

    pub async fn get_quiz(&self, quiz_id: &str) -> Result<Quiz> {
        let quizzes = self.mongo.collection::<Quiz>("quizzes");
        let object_id = ObjectId::parse_str(quiz_id).context("Invalid quiz ID format")?;

        quizzes
            .find_one(doc! { "_id": object_id })
            .await
            .context("Failed to query quiz")?
            .ok_or_else(|| anyhow!("Quiz not found"))
    }

    pub async fn publish_quiz(&self, quiz_id: &str) -> Result<QuizSummary> {
        let quizzes = self.mongo.collection::<Quiz>("quizzes");
        let object_id = ObjectId::parse_str(quiz_id).context("Invalid quiz ID format")?;

        let result = quizzes
            .update_one(
                doc! { "_id": object_id },
                doc! { "$set": {
                    "published": true,
                    "updatedAt": chrono_to_bson(Utc::now()),
                } },
            )
            .await
            .context("Failed to publish quiz")?;

        if result.matched_count == 0 {
            return Err(anyhow!("Quiz not found"));
        }

        let quiz = self.get_quiz(quiz_id).await?;
        Ok(QuizSummary::from(quiz))
    }

    /// Published quizzes, as seen by students (no correct answers)
    pub async fn list_published(&self) -> Result<Vec<QuizSummary>> {
        let quizzes = self.mongo.collection::<Quiz>("quizzes");

        let mut cursor = quizzes
            .find(doc! { "published": true })
            .sort(doc! { "createdAt": -1 })
            .await
            .context("Failed to query quizzes")?;

        let mut rows = Vec::new();
        while let Some(quiz) = cursor.try_next().await.context("Quiz cursor error")? {
            rows.push(QuizSummary::from(quiz));
        }

        Ok(rows)
    }

    /// Quizzes created by a teacher, published or not
    pub async fn list_by_creator(&self, created_by: &str) -> Result<Vec<QuizSummary>> {
        let quizzes = self.mongo.collection::<Quiz>("quizzes");

        let mut cursor = quizzes
            .find(doc! { "created_by": created_by })
            .sort(doc! { "createdAt": -1 })
            .await
            .context("Failed to query quizzes")?;

        let mut rows = Vec::new();
        while let Some(quiz) = cursor.try_next().await.context("Quiz cursor error")? {
            rows.push(QuizSummary::from(quiz));
        }

        Ok(rows)
    }

    pub async fn quiz_for_student(&self, quiz_id: &str) -> Result<QuizDetailForStudent> {
        let quiz = self.get_quiz(quiz_id).await?;
        if !quiz.published {
            return Err(anyhow!("Quiz not found"));
        }

        Ok(QuizDetailForStudent {
            id: quiz.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: quiz.title,
            description: quiz.description,
            passing_score: quiz.passing_score,
            questions: quiz.questions.iter().map(Into::into).collect(),
        })
    }

    /// Submit an attempt. Scoring is delegated to the quiz percent policy;
    /// the insert on the composite `_id` enforces at most one attempt per
    /// (student, quiz) without a read-then-write gap. Out-of-range items
    /// earn nothing and are reported back per-item; they do not abort the
    /// rest of the submission.
    pub async fn submit_attempt(
        &self,
        quiz_id: &str,
        student_id: &str,
        req: SubmitQuizRequest,
    ) -> Result<(QuizAttempt, Vec<QuizItemError>)> {
        let quiz = self.get_quiz(quiz_id).await?;
        if !quiz.published {
            return Err(anyhow!("Quiz not found"));
        }

        let breakdown = score_quiz(&quiz.questions, &req.answers, quiz.passing_score);

        let attempts = self.mongo.collection::<QuizAttempt>("quiz_attempts");
        let attempt = QuizAttempt {
            id: QuizAttempt::composite_id(student_id, quiz_id),
            student_id: student_id.to_string(),
            quiz_id: quiz_id.to_string(),
            answers: breakdown.answers,
            earned_points: breakdown.earned_points,
            possible_points: breakdown.possible_points,
            percentage: breakdown.percentage,
            passed: breakdown.passed,
            submitted_at: Utc::now(),
        };

        attempts.insert_one(&attempt).await.map_err(|e| {
            let context = if is_duplicate_key_error(&e) {
                "Quiz was already attempted".to_string()
            } else {
                "Failed to insert quiz attempt".to_string()
            };
            anyhow::Error::new(e).context(context)
        })?;

        record_quiz_attempt(attempt.passed);
        tracing::info!(
            "Quiz attempt recorded: student={}, quiz={}, percentage={}, passed={}",
            student_id,
            quiz_id,
            attempt.percentage,
            attempt.passed
        );

        Ok((attempt, breakdown.errors))
    }

    pub async fn get_attempt(&self, quiz_id: &str, student_id: &str) -> Result<QuizAttempt> {
        let attempts = self.mongo.collection::<QuizAttempt>("quiz_attempts");
        let attempt_id = QuizAttempt::composite_id(student_id, quiz_id);

        attempts
            .find_one(doc! { "_id": attempt_id })
            .await
            .context("Failed to query attempt")?
            .ok_or_else(|| anyhow!("Attempt not found"))
    }

    /// All attempts for a quiz, newest first (teacher view)
    pub async fn list_attempts(&self, quiz_id: &str) -> Result<Vec<QuizAttempt>> {
        // Validate the quiz id and existence first
        self.get_quiz(quiz_id).await?;

        let attempts = self.mongo.collection::<QuizAttempt>("quiz_attempts");
        let mut cursor = attempts
            .find(doc! { "quiz_id": quiz_id })
            .sort(doc! { "submittedAt": -1 })
            .await
            .context("Failed to query attempts")?;

        let mut rows = Vec::new();
        while let Some(attempt) = cursor.try_next().await.context("Attempt cursor error")? {
            rows.push(attempt);
        }

        Ok(rows)
    }
}
