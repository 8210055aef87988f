//! Score aggregation and grading.
//!
//! Two deliberately distinct policies live here. Exam marks pass or fail
//! against an absolute threshold (`marks_obtained >= passing_marks`); quiz
//! attempts pass or fail against a percentage of total points. The two must
//! not be unified: formal exams and quizzes carry different grading rules.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::quiz::{AnswerInput, AnswerRecord, QuestionKind, QuizQuestion};

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// percentage = marks / max * 100, rounded to two decimals
pub fn exam_percentage(marks_obtained: f64, total_marks: f64) -> f64 {
    if total_marks <= 0.0 {
        return 0.0;
    }
    round2(marks_obtained / total_marks * 100.0)
}

/// Letter grade from a percentage, fixed breakpoints
pub fn letter_grade(percentage: f64) -> &'static str {
    if percentage >= 90.0 {
        "A+"
    } else if percentage >= 80.0 {
        "A"
    } else if percentage >= 70.0 {
        "B+"
    } else if percentage >= 60.0 {
        "B"
    } else if percentage >= 50.0 {
        "C"
    } else if percentage >= 40.0 {
        "D"
    } else {
        "F"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkBreakdown {
    pub percentage: f64,
    pub grade: &'static str,
    pub passed: bool,
}

/// Exam mark policy: percentage and grade are derived from the max, but the
/// pass decision compares the raw mark to the absolute passing threshold.
pub fn grade_exam_mark(marks_obtained: f64, total_marks: f64, passing_marks: f64) -> MarkBreakdown {
    let percentage = exam_percentage(marks_obtained, total_marks);
    MarkBreakdown {
        percentage,
        grade: letter_grade(percentage),
        passed: marks_obtained >= passing_marks,
    }
}

/// A submitted mark must lie in [0, max] inclusive
pub fn mark_in_range(marks_obtained: f64, max_marks: f64) -> bool {
    marks_obtained >= 0.0 && marks_obtained <= max_marks
}

/// Per-question rejection collected while scoring a quiz; the rest of the
/// submission is still scored.
#[derive(Debug, Clone, Serialize)]
pub struct QuizItemError {
    pub question_id: String,
    pub message: String,
}

#[derive(Debug)]
pub struct QuizBreakdown {
    pub answers: Vec<AnswerRecord>,
    pub earned_points: f64,
    pub possible_points: f64,
    /// Rounded to the nearest whole percent
    pub percentage: f64,
    pub passed: bool,
    pub errors: Vec<QuizItemError>,
}

/// Quiz percent policy.
///
/// Every authoritative question counts toward the denominator whether it was
/// answered or not; submitted ids with no matching question earn nothing and
/// raise no error. Multiple-choice answers are compared to the correct
/// option; subjective scores are bound-checked against the question's points.
pub fn score_quiz(
    questions: &[QuizQuestion],
    answers: &HashMap<String, AnswerInput>,
    passing_score: f64,
) -> QuizBreakdown {
    let mut records = Vec::with_capacity(questions.len());
    let mut errors = Vec::new();
    let mut earned = 0.0;
    let mut possible = 0.0;

    for question in questions {
        possible += question.points;

        let submitted = answers.get(&question.id);
        let (selected_option, points_earned) = match (question.kind, submitted) {
            (_, None) => (None, 0.0),
            (QuestionKind::MultipleChoice, Some(answer)) => match answer.selected_option {
                Some(selected) if Some(selected) == question.correct_option => {
                    (Some(selected), question.points)
                }
                Some(selected) => (Some(selected), 0.0),
                None => (None, 0.0),
            },
            (QuestionKind::Subjective, Some(answer)) => match answer.score {
                Some(score) if mark_in_range(score, question.points) => (None, score),
                Some(score) => {
                    errors.push(QuizItemError {
                        question_id: question.id.clone(),
                        message: format!(
                            "Score {} is out of range [0, {}]",
                            score, question.points
                        ),
                    });
                    (None, 0.0)
                }
                None => (None, 0.0),
            },
        };

        earned += points_earned;
        records.push(AnswerRecord {
            question_id: question.id.clone(),
            selected_option,
            correct: points_earned > 0.0,
            points_earned,
            points_possible: question.points,
        });
    }

    // Whole-percent rounding here, unlike the two-decimal exam form
    let percentage = if possible > 0.0 {
        (earned / possible * 100.0).round()
    } else {
        0.0
    };

    QuizBreakdown {
        answers: records,
        earned_points: earned,
        possible_points: possible,
        percentage,
        passed: percentage >= passing_score,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mc_question(id: &str, points: f64, correct: u32) -> QuizQuestion {
        QuizQuestion {
            id: id.to_string(),
            text: format!("Question {}", id),
            kind: QuestionKind::MultipleChoice,
            points,
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_option: Some(correct),
        }
    }

    fn subjective_question(id: &str, points: f64) -> QuizQuestion {
        QuizQuestion {
            id: id.to_string(),
            text: format!("Question {}", id),
            kind: QuestionKind::Subjective,
            points,
            options: Vec::new(),
            correct_option: None,
        }
    }

    fn selected(option: u32) -> AnswerInput {
        AnswerInput {
            selected_option: Some(option),
            score: None,
        }
    }

    fn scored(score: f64) -> AnswerInput {
        AnswerInput {
            selected_option: None,
            score: Some(score),
        }
    }

    #[test]
    fn percentage_rounds_to_two_decimals() {
        assert_eq!(exam_percentage(1.0, 3.0), 33.33);
        assert_eq!(exam_percentage(2.0, 3.0), 66.67);
        assert_eq!(exam_percentage(55.0, 100.0), 55.0);
        assert_eq!(exam_percentage(10.0, 0.0), 0.0);
    }

    #[test]
    fn grade_breakpoints_are_exact() {
        assert_eq!(letter_grade(90.0), "A+");
        assert_eq!(letter_grade(89.99), "A");
        assert_eq!(letter_grade(80.0), "A");
        assert_eq!(letter_grade(79.99), "B+");
        assert_eq!(letter_grade(70.0), "B+");
        assert_eq!(letter_grade(60.0), "B");
        assert_eq!(letter_grade(50.0), "C");
        assert_eq!(letter_grade(40.0), "D");
        assert_eq!(letter_grade(39.99), "F");
        assert_eq!(letter_grade(0.0), "F");
    }

    #[test]
    fn exam_pass_is_absolute_not_percentage() {
        // passing_marks = 60 out of 150 means 40% would pass percentage-wise,
        // but a raw 59 still fails
        let breakdown = grade_exam_mark(59.0, 150.0, 60.0);
        assert!(!breakdown.passed);
        let breakdown = grade_exam_mark(60.0, 150.0, 60.0);
        assert!(breakdown.passed);
    }

    #[test]
    fn worked_example_from_the_grading_policy() {
        // total=100, passing=40, obtained=55 -> 55.00%, grade C, passed
        let breakdown = grade_exam_mark(55.0, 100.0, 40.0);
        assert_eq!(breakdown.percentage, 55.0);
        assert_eq!(breakdown.grade, "C");
        assert!(breakdown.passed);
    }

    #[test]
    fn unanswered_questions_count_toward_the_denominator() {
        let questions = vec![
            mc_question("q1", 10.0, 1),
            mc_question("q2", 10.0, 2),
            subjective_question("q3", 20.0),
        ];
        // only q1 answered, correctly
        let answers = HashMap::from([("q1".to_string(), selected(1))]);

        let breakdown = score_quiz(&questions, &answers, 50.0);
        assert_eq!(breakdown.possible_points, 40.0);
        assert_eq!(breakdown.earned_points, 10.0);
        assert_eq!(breakdown.percentage, 25.0);
        assert!(!breakdown.passed);
        assert_eq!(breakdown.answers.len(), 3);
    }

    #[test]
    fn unknown_question_ids_earn_nothing_without_error() {
        let questions = vec![mc_question("q1", 10.0, 0)];
        let answers = HashMap::from([
            ("q1".to_string(), selected(0)),
            ("ghost".to_string(), selected(3)),
        ]);

        let breakdown = score_quiz(&questions, &answers, 50.0);
        assert_eq!(breakdown.earned_points, 10.0);
        assert_eq!(breakdown.possible_points, 10.0);
        assert!(breakdown.errors.is_empty());
    }

    #[test]
    fn quiz_pass_uses_the_percentage_threshold() {
        let questions = vec![mc_question("q1", 10.0, 0), mc_question("q2", 10.0, 1)];
        let answers = HashMap::from([("q1".to_string(), selected(0))]);

        // 50% earned, threshold 50 -> passed
        let breakdown = score_quiz(&questions, &answers, 50.0);
        assert_eq!(breakdown.percentage, 50.0);
        assert!(breakdown.passed);

        // threshold 51 -> failed
        let breakdown = score_quiz(&questions, &answers, 51.0);
        assert!(!breakdown.passed);
    }

    #[test]
    fn subjective_scores_are_bound_checked_per_item() {
        let questions = vec![
            subjective_question("q1", 10.0),
            subjective_question("q2", 10.0),
        ];
        let answers = HashMap::from([
            ("q1".to_string(), scored(7.5)),
            ("q2".to_string(), scored(12.0)), // out of range
        ]);

        let breakdown = score_quiz(&questions, &answers, 50.0);
        assert_eq!(breakdown.earned_points, 7.5);
        assert_eq!(breakdown.errors.len(), 1);
        assert_eq!(breakdown.errors[0].question_id, "q2");
    }

    #[test]
    fn quiz_percentage_rounds_to_whole_percent() {
        let questions = vec![
            mc_question("q1", 1.0, 0),
            mc_question("q2", 1.0, 0),
            mc_question("q3", 1.0, 0),
        ];
        let answers = HashMap::from([("q1".to_string(), selected(0))]);

        // 1/3 -> 33.33... -> 33
        let breakdown = score_quiz(&questions, &answers, 33.0);
        assert_eq!(breakdown.percentage, 33.0);
        assert!(breakdown.passed);
    }

    #[test]
    fn empty_quiz_scores_zero() {
        let breakdown = score_quiz(&[], &HashMap::new(), 50.0);
        assert_eq!(breakdown.percentage, 0.0);
        assert!(!breakdown.passed);
    }
}
