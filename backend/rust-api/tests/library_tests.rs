mod common;

use axum::http::StatusCode;
use serde_json::json;

async fn create_student(
    app: &common::TestApp,
    admin_token: &str,
    name: &str,
    phone: &str,
) -> String {
    let (status, student) = common::send_json(
        &app.router,
        "POST",
        "/admin/students",
        Some(admin_token),
        Some(json!({
            "full_name": name,
            "date_of_birth": "2012-03-03",
            "guardian_name": "A Guardian",
            "phone": phone,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    student["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn single_copy_is_never_oversubscribed() {
    let Some(app) = common::create_test_app().await else {
        return;
    };
    let admin_token = common::token_for(&app.config, "admin", None);

    let (status, book) = common::send_json(
        &app.router,
        "POST",
        "/admin/books",
        Some(&admin_token),
        Some(json!({
            "title": "The Rust Programming Language",
            "author": "Klabnik & Nichols",
            "copies_total": 1,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let book_id = book["id"].as_str().unwrap().to_string();

    let reader = create_student(&app, &admin_token, "First Reader", "555-0105").await;
    let latecomer = create_student(&app, &admin_token, "Second Reader", "555-0106").await;

    let issue_uri = format!("/admin/books/{}/issue", book_id);

    // First issue claims the only copy
    let (status, loan) = common::send_json(
        &app.router,
        "POST",
        &issue_uri,
        Some(&admin_token),
        Some(json!({ "student_id": reader })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(loan["student_id"], reader);

    // Same student again: already on loan
    let (status, _) = common::send_json(
        &app.router,
        "POST",
        &issue_uri,
        Some(&admin_token),
        Some(json!({ "student_id": reader })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Another student: no copies left
    let (status, body) = common::send_json(
        &app.router,
        "POST",
        &issue_uri,
        Some(&admin_token),
        Some(json!({ "student_id": latecomer })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("No copies"));

    // Return frees the copy for the second student
    let (status, _) = common::send_json(
        &app.router,
        "POST",
        &format!("/admin/books/{}/return", book_id),
        Some(&admin_token),
        Some(json!({ "student_id": reader })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = common::send_json(
        &app.router,
        "POST",
        &issue_uri,
        Some(&admin_token),
        Some(json!({ "student_id": latecomer })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn students_see_their_own_loans() {
    let Some(app) = common::create_test_app().await else {
        return;
    };
    let admin_token = common::token_for(&app.config, "admin", None);

    let (_, book) = common::send_json(
        &app.router,
        "POST",
        "/admin/books",
        Some(&admin_token),
        Some(json!({
            "title": "A Wizard of Earthsea",
            "author": "Ursula K. Le Guin",
            "copies_total": 3,
        })),
    )
    .await;
    let book_id = book["id"].as_str().unwrap().to_string();

    let student_id = create_student(&app, &admin_token, "Borrower", "555-0107").await;
    let student_token = common::token_for(&app.config, "student", Some(student_id.clone()));

    let (status, _) = common::send_json(
        &app.router,
        "POST",
        &format!("/admin/books/{}/issue", book_id),
        Some(&admin_token),
        Some(json!({ "student_id": student_id, "days": 7 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, loans) = common::send_json(
        &app.router,
        "GET",
        "/api/v1/student/loans",
        Some(&student_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let loans = loans.as_array().unwrap();
    assert_eq!(loans.len(), 1);
    assert_eq!(loans[0]["book_id"], book_id);

    // Returning a book that was never issued to this student is a 404
    let other = create_student(&app, &admin_token, "No Loan", "555-0108").await;
    let (status, _) = common::send_json(
        &app.router,
        "POST",
        &format!("/admin/books/{}/return", book_id),
        Some(&admin_token),
        Some(json!({ "student_id": other })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
