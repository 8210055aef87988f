mod common;

use axum::http::StatusCode;
use serde_json::json;

struct Fixture {
    app: common::TestApp,
    teacher_token: String,
    student_token: String,
    quiz_id: String,
}

/// Published two-question multiple-choice quiz (10 points each, pass at 50%)
/// and a student account
async fn setup() -> Option<Fixture> {
    let app = common::create_test_app().await?;
    let admin_token = common::token_for(&app.config, "admin", None);
    let teacher_token = common::token_for(&app.config, "teacher", None);

    let (status, student) = common::send_json(
        &app.router,
        "POST",
        "/admin/students",
        Some(&admin_token),
        Some(json!({
            "full_name": "Quiz Taker",
            "date_of_birth": "2012-01-01",
            "guardian_name": "A Guardian",
            "phone": "555-0103",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let student_id = student["id"].as_str().unwrap().to_string();
    let student_token = common::token_for(&app.config, "student", Some(student_id));

    let (status, quiz) = common::send_json(
        &app.router,
        "POST",
        "/api/v1/teacher/quizzes",
        Some(&teacher_token),
        Some(json!({
            "title": "Fractions",
            "passing_score": 50.0,
            "questions": [
                {
                    "text": "1/2 + 1/4 = ?",
                    "kind": "multiple_choice",
                    "points": 10.0,
                    "options": ["1/2", "3/4", "2/6"],
                    "correct_option": 1,
                },
                {
                    "text": "1/3 of 9 = ?",
                    "kind": "multiple_choice",
                    "points": 10.0,
                    "options": ["3", "6", "9"],
                    "correct_option": 0,
                },
            ],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let quiz_id = quiz["id"].as_str().unwrap().to_string();

    let (status, _) = common::send_json(
        &app.router,
        "POST",
        &format!("/api/v1/teacher/quizzes/{}/publish", quiz_id),
        Some(&teacher_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    Some(Fixture {
        teacher_token,
        student_token,
        quiz_id,
        app,
    })
}

/// Question ids as served to the student, in order
async fn question_ids(fixture: &Fixture) -> Vec<String> {
    let (status, quiz) = common::send_json(
        &fixture.app.router,
        "GET",
        &format!("/api/v1/student/quizzes/{}", fixture.quiz_id),
        Some(&fixture.student_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let questions = quiz["questions"].as_array().unwrap();
    // Students never see the answer key
    for question in questions {
        assert!(question.get("correct_option").is_none());
    }
    questions
        .iter()
        .map(|q| q["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn unpublished_quizzes_are_invisible_to_students() {
    let Some(fixture) = setup().await else {
        return;
    };

    let (_, draft) = common::send_json(
        &fixture.app.router,
        "POST",
        "/api/v1/teacher/quizzes",
        Some(&fixture.teacher_token),
        Some(json!({
            "title": "Draft quiz",
            "passing_score": 50.0,
            "questions": [
                { "text": "q", "kind": "subjective", "points": 5.0 },
            ],
        })),
    )
    .await;
    let draft_id = draft["id"].as_str().unwrap().to_string();

    let (status, _) = common::send_json(
        &fixture.app.router,
        "GET",
        &format!("/api/v1/student/quizzes/{}", draft_id),
        Some(&fixture.student_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, listed) = common::send_json(
        &fixture.app.router,
        "GET",
        "/api/v1/student/quizzes",
        Some(&fixture.student_token),
        None,
    )
    .await;
    let titles: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|quiz| quiz["title"].as_str().unwrap())
        .collect();
    assert!(titles.contains(&"Fractions"));
    assert!(!titles.contains(&"Draft quiz"));
}

#[tokio::test]
async fn unanswered_questions_still_count_toward_the_total() {
    let Some(fixture) = setup().await else {
        return;
    };
    let ids = question_ids(&fixture).await;

    // Answer only the first question, correctly: 10 of 20 points
    let (status, response) = common::send_json(
        &fixture.app.router,
        "POST",
        &format!("/api/v1/student/quizzes/{}/attempt", fixture.quiz_id),
        Some(&fixture.student_token),
        Some(json!({
            "answers": { &ids[0]: { "selected_option": 1 } },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let attempt = &response["attempt"];
    assert_eq!(attempt["possible_points"], 20.0);
    assert_eq!(attempt["earned_points"], 10.0);
    assert_eq!(attempt["percentage"], 50.0);
    // Quiz passing is percentage-based: 50 >= 50
    assert_eq!(attempt["passed"], true);
    assert_eq!(attempt["answers"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn second_attempt_conflicts() {
    let Some(fixture) = setup().await else {
        return;
    };
    let ids = question_ids(&fixture).await;
    let attempt_uri = format!("/api/v1/student/quizzes/{}/attempt", fixture.quiz_id);
    let body = json!({
        "answers": { &ids[0]: { "selected_option": 0 } },
    });

    let (status, _) = common::send_json(
        &fixture.app.router,
        "POST",
        &attempt_uri,
        Some(&fixture.student_token),
        Some(body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = common::send_json(
        &fixture.app.router,
        "POST",
        &attempt_uri,
        Some(&fixture.student_token),
        Some(body),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // The stored attempt is still readable
    let (status, attempt) = common::send_json(
        &fixture.app.router,
        "GET",
        &attempt_uri,
        Some(&fixture.student_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(attempt["quiz_id"], fixture.quiz_id);

    // And the teacher sees it in the attempt list
    let (status, attempts) = common::send_json(
        &fixture.app.router,
        "GET",
        &format!("/api/v1/teacher/quizzes/{}/attempts", fixture.quiz_id),
        Some(&fixture.teacher_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(attempts.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn out_of_range_subjective_scores_are_reported_per_item() {
    let Some(app) = common::create_test_app().await else {
        return;
    };
    let admin_token = common::token_for(&app.config, "admin", None);
    let teacher_token = common::token_for(&app.config, "teacher", None);

    let (_, student) = common::send_json(
        &app.router,
        "POST",
        "/admin/students",
        Some(&admin_token),
        Some(json!({
            "full_name": "Essay Writer",
            "date_of_birth": "2012-02-02",
            "guardian_name": "A Guardian",
            "phone": "555-0104",
        })),
    )
    .await;
    let student_token = common::token_for(
        &app.config,
        "student",
        Some(student["id"].as_str().unwrap().to_string()),
    );

    let (_, quiz) = common::send_json(
        &app.router,
        "POST",
        "/api/v1/teacher/quizzes",
        Some(&teacher_token),
        Some(json!({
            "title": "Essays",
            "passing_score": 40.0,
            "questions": [
                { "text": "Essay A", "kind": "subjective", "points": 10.0 },
                { "text": "Essay B", "kind": "subjective", "points": 10.0 },
            ],
        })),
    )
    .await;
    let quiz_id = quiz["id"].as_str().unwrap().to_string();
    common::send_json(
        &app.router,
        "POST",
        &format!("/api/v1/teacher/quizzes/{}/publish", quiz_id),
        Some(&teacher_token),
        None,
    )
    .await;

    let (_, detail) = common::send_json(
        &app.router,
        "GET",
        &format!("/api/v1/student/quizzes/{}", quiz_id),
        Some(&student_token),
        None,
    )
    .await;
    let ids: Vec<String> = detail["questions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["id"].as_str().unwrap().to_string())
        .collect();

    let (status, response) = common::send_json(
        &app.router,
        "POST",
        &format!("/api/v1/student/quizzes/{}/attempt", quiz_id),
        Some(&student_token),
        Some(json!({
            "answers": {
                &ids[0]: { "score": 7.5 },
                &ids[1]: { "score": 12.0 },
            },
        })),
    )
    .await;

    // The in-range item is kept, the out-of-range one is listed
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(response["attempt"]["earned_points"], 7.5);
    let errors = response["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["question_id"], ids[1]);
}
