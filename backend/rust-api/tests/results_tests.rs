mod common;

use axum::http::StatusCode;
use serde_json::json;

struct Fixture {
    app: common::TestApp,
    admin_token: String,
    teacher_token: String,
    category_id: String,
    subject_id: String,
    student_id: String,
    registration_number: String,
}

/// Category in draft with one subject (max 100, passing 40) and one student
async fn setup() -> Option<Fixture> {
    let app = common::create_test_app().await?;
    let admin_token = common::token_for(&app.config, "admin", None);
    let teacher_token = common::token_for(&app.config, "teacher", None);

    let (status, category) = common::send_json(
        &app.router,
        "POST",
        "/admin/exam-categories",
        Some(&admin_token),
        Some(json!({ "name": "Term 1", "academic_year": 2025 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(category["status"], "draft");
    let category_id = category["id"].as_str().unwrap().to_string();

    let (status, subject) = common::send_json(
        &app.router,
        "POST",
        &format!("/admin/exam-categories/{}/subjects", category_id),
        Some(&admin_token),
        Some(json!({ "name": "Mathematics", "max_marks": 100.0, "passing_marks": 40.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let subject_id = subject["id"].as_str().unwrap().to_string();

    let (status, student) = common::send_json(
        &app.router,
        "POST",
        "/admin/students",
        Some(&admin_token),
        Some(json!({
            "full_name": "Grace Hopper",
            "date_of_birth": "2011-12-09",
            "guardian_name": "A Guardian",
            "phone": "555-0102",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    Some(Fixture {
        admin_token,
        teacher_token,
        category_id,
        subject_id,
        student_id: student["id"].as_str().unwrap().to_string(),
        registration_number: student["registration_number"].as_str().unwrap().to_string(),
        app,
    })
}

async fn transition(fixture: &Fixture, to: &str) -> StatusCode {
    let (status, _) = common::send_json(
        &fixture.app.router,
        "POST",
        &format!("/admin/exam-categories/{}/transition", fixture.category_id),
        Some(&fixture.admin_token),
        Some(json!({ "to": to })),
    )
    .await;
    status
}

fn mark_body(fixture: &Fixture, marks: f64) -> serde_json::Value {
    json!({
        "student_id": fixture.student_id,
        "category_id": fixture.category_id,
        "subject_id": fixture.subject_id,
        "marks_obtained": marks,
    })
}

#[tokio::test]
async fn mark_entry_is_rejected_outside_the_scoring_window() {
    let Some(fixture) = setup().await else {
        return;
    };

    // draft
    let (status, body) = common::send_json(
        &fixture.app.router,
        "POST",
        "/api/v1/teacher/results",
        Some(&fixture.teacher_token),
        Some(mark_body(&fixture, 55.0)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("draft"));

    // open
    assert_eq!(transition(&fixture, "open").await, StatusCode::OK);
    let (status, _) = common::send_json(
        &fixture.app.router,
        "POST",
        "/api/v1/teacher/results",
        Some(&fixture.teacher_token),
        Some(mark_body(&fixture, 55.0)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn lifecycle_rejects_skips() {
    let Some(fixture) = setup().await else {
        return;
    };

    // draft -> scoring skips two states
    assert_eq!(transition(&fixture, "scoring").await, StatusCode::BAD_REQUEST);
    // draft -> open -> closed is fine, then backwards is not
    assert_eq!(transition(&fixture, "open").await, StatusCode::OK);
    assert_eq!(transition(&fixture, "closed").await, StatusCode::OK);
    assert_eq!(transition(&fixture, "open").await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn worked_example_and_id_stable_resubmission() {
    let Some(fixture) = setup().await else {
        return;
    };

    assert_eq!(transition(&fixture, "open").await, StatusCode::OK);
    assert_eq!(transition(&fixture, "closed").await, StatusCode::OK);
    assert_eq!(transition(&fixture, "scoring").await, StatusCode::OK);

    // total=100, passing=40, obtained=55 -> 55.00%, C, passed
    let (status, first) = common::send_json(
        &fixture.app.router,
        "POST",
        "/api/v1/teacher/results",
        Some(&fixture.teacher_token),
        Some(mark_body(&fixture, 55.0)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["percentage"], 55.0);
    assert_eq!(first["grade"], "C");
    assert_eq!(first["passed"], true);

    // Re-submission overwrites the same record
    let (status, second) = common::send_json(
        &fixture.app.router,
        "POST",
        "/api/v1/teacher/results",
        Some(&fixture.teacher_token),
        Some(mark_body(&fixture, 91.0)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(second["_id"], first["_id"]);
    assert_eq!(second["grade"], "A+");

    // Out-of-range marks are rejected
    let (status, _) = common::send_json(
        &fixture.app.router,
        "POST",
        "/api/v1/teacher/results",
        Some(&fixture.teacher_token),
        Some(mark_body(&fixture, 101.0)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bulk_entry_saves_valid_rows_and_reports_the_rest() {
    let Some(fixture) = setup().await else {
        return;
    };

    assert_eq!(transition(&fixture, "open").await, StatusCode::OK);
    assert_eq!(transition(&fixture, "closed").await, StatusCode::OK);
    assert_eq!(transition(&fixture, "scoring").await, StatusCode::OK);

    let ghost_id = mongodb::bson::oid::ObjectId::new().to_hex();
    let (status, response) = common::send_json(
        &fixture.app.router,
        "POST",
        "/api/v1/teacher/results/bulk",
        Some(&fixture.teacher_token),
        Some(json!({
            "category_id": fixture.category_id,
            "subject_id": fixture.subject_id,
            "entries": [
                { "student_id": fixture.student_id, "marks_obtained": 70.0 },
                { "student_id": fixture.student_id, "marks_obtained": 150.0 },
                { "student_id": ghost_id, "marks_obtained": 30.0 },
            ],
        })),
    )
    .await;

    // The overall call succeeds even though two rows were rejected
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["saved"], 1);
    assert_eq!(response["errors"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn results_become_public_only_when_published() {
    let Some(fixture) = setup().await else {
        return;
    };

    assert_eq!(transition(&fixture, "open").await, StatusCode::OK);
    assert_eq!(transition(&fixture, "closed").await, StatusCode::OK);
    assert_eq!(transition(&fixture, "scoring").await, StatusCode::OK);

    let (status, _) = common::send_json(
        &fixture.app.router,
        "POST",
        "/api/v1/teacher/results",
        Some(&fixture.teacher_token),
        Some(mark_body(&fixture, 84.0)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let lookup_uri = format!(
        "/api/v1/public/results?registration_number={}&category_id={}",
        fixture.registration_number, fixture.category_id
    );

    // Still in scoring: nothing public
    let (status, _) = common::send_json(&fixture.app.router, "GET", &lookup_uri, None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(transition(&fixture, "published").await, StatusCode::OK);

    let (status, results) =
        common::send_json(&fixture.app.router, "GET", &lookup_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(results["registration_number"], fixture.registration_number);
    let rows = results["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["subject_name"], "Mathematics");
    assert_eq!(rows[0]["grade"], "A");
    assert_eq!(rows[0]["passed"], true);
}
