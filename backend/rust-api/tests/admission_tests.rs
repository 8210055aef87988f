mod common;

use axum::http::StatusCode;
use serde_json::json;

fn application_body(name: &str, email: Option<&str>) -> serde_json::Value {
    let mut body = json!({
        "applicant_name": name,
        "date_of_birth": "2012-04-17",
        "guardian_name": "A Guardian",
        "phone": "555-0101",
    });
    if let Some(email) = email {
        body["email"] = json!(email);
    }
    body
}

#[tokio::test]
async fn application_validation_is_enforced() {
    let Some(app) = common::create_test_app().await else {
        return;
    };

    let (status, _) = common::send_json(
        &app.router,
        "POST",
        "/api/v1/public/admissions",
        None,
        Some(json!({ "applicant_name": "" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn first_approved_student_gets_the_scheme_minimum() {
    let Some(app) = common::create_test_app().await else {
        return;
    };
    let admin_token = common::token_for(&app.config, "admin", None);

    let (status, application) = common::send_json(
        &app.router,
        "POST",
        "/api/v1/public/admissions",
        None,
        Some(application_body("First Student", None)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(application["status"], "pending");
    let application_id = application["id"].as_str().unwrap().to_string();

    let (status, approval) = common::send_json(
        &app.router,
        "POST",
        &format!("/admin/admissions/{}/approve", application_id),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    // Empty store: the fixed scheme starts at 10001
    assert_eq!(approval["student"]["registration_number"], "10001");

    // A second student continues the sequence
    let (_, application2) = common::send_json(
        &app.router,
        "POST",
        "/api/v1/public/admissions",
        None,
        Some(application_body("Second Student", None)),
    )
    .await;
    let application2_id = application2["id"].as_str().unwrap().to_string();

    let (status, approval2) = common::send_json(
        &app.router,
        "POST",
        &format!("/admin/admissions/{}/approve", application2_id),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(approval2["student"]["registration_number"], "10002");
}

#[tokio::test]
async fn approval_is_not_repeatable() {
    let Some(app) = common::create_test_app().await else {
        return;
    };
    let admin_token = common::token_for(&app.config, "admin", None);

    let (_, application) = common::send_json(
        &app.router,
        "POST",
        "/api/v1/public/admissions",
        None,
        Some(application_body("Only Once", None)),
    )
    .await;
    let application_id = application["id"].as_str().unwrap().to_string();
    let approve_uri = format!("/admin/admissions/{}/approve", application_id);

    let (status, _) =
        common::send_json(&app.router, "POST", &approve_uri, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) =
        common::send_json(&app.router, "POST", &approve_uri, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn approval_with_email_creates_a_working_login() {
    let Some(app) = common::create_test_app().await else {
        return;
    };
    let admin_token = common::token_for(&app.config, "admin", None);

    let (_, application) = common::send_json(
        &app.router,
        "POST",
        "/api/v1/public/admissions",
        None,
        Some(application_body("With Login", Some("newstudent@example.com"))),
    )
    .await;
    let application_id = application["id"].as_str().unwrap().to_string();

    let (status, approval) = common::send_json(
        &app.router,
        "POST",
        &format!("/admin/admissions/{}/approve", application_id),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let password = approval["initial_password"].as_str().unwrap().to_string();
    let (status, login) = common::send_json(
        &app.router,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({
            "email": "newstudent@example.com",
            "password": password,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["user"]["role"], "student");
    assert!(login["user"]["student_id"].is_string());
}

#[tokio::test]
async fn rejected_application_stays_rejected() {
    let Some(app) = common::create_test_app().await else {
        return;
    };
    let admin_token = common::token_for(&app.config, "admin", None);

    let (_, application) = common::send_json(
        &app.router,
        "POST",
        "/api/v1/public/admissions",
        None,
        Some(application_body("Not This Year", None)),
    )
    .await;
    let application_id = application["id"].as_str().unwrap().to_string();

    let (status, rejected) = common::send_json(
        &app.router,
        "POST",
        &format!("/admin/admissions/{}/reject", application_id),
        Some(&admin_token),
        Some(json!({ "note": "Class is full" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rejected["status"], "rejected");
    assert_eq!(rejected["decision_note"], "Class is full");

    // Approving afterwards is a state error
    let (status, _) = common::send_json(
        &app.router,
        "POST",
        &format!("/admin/admissions/{}/approve", application_id),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
