mod common;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn login_with_unknown_user_is_rejected() {
    let Some(app) = common::create_test_app().await else {
        return;
    };

    let (status, _) = common::send_json(
        &app.router,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({
            "email": "nobody@example.com",
            "password": "whatever123",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn created_user_can_login_and_fetch_profile() {
    let Some(app) = common::create_test_app().await else {
        return;
    };
    let admin_token = common::token_for(&app.config, "admin", None);

    let (status, user) = common::send_json(
        &app.router,
        "POST",
        "/admin/users",
        Some(&admin_token),
        Some(json!({
            "email": "teacher@example.com",
            "password": "correct-horse",
            "name": "Ada Lovelace",
            "role": "teacher",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["email"], "teacher@example.com");

    let (status, login) = common::send_json(
        &app.router,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({
            "email": "teacher@example.com",
            "password": "correct-horse",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = login["access_token"].as_str().unwrap().to_string();

    let (status, me) =
        common::send_json(&app.router, "GET", "/api/v1/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "teacher@example.com");
    assert_eq!(me["role"], "teacher");
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let Some(app) = common::create_test_app().await else {
        return;
    };
    let admin_token = common::token_for(&app.config, "admin", None);

    let body = json!({
        "email": "dup@example.com",
        "password": "password123",
        "name": "First",
    });

    let (status, _) = common::send_json(
        &app.router,
        "POST",
        "/admin/users",
        Some(&admin_token),
        Some(body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = common::send_json(
        &app.router,
        "POST",
        "/admin/users",
        Some(&admin_token),
        Some(body),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn admin_routes_enforce_role() {
    let Some(app) = common::create_test_app().await else {
        return;
    };

    // No token at all
    let (status, _) = common::send_json(&app.router, "GET", "/admin/students", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Student token
    let student_token = common::token_for(&app.config, "student", None);
    let (status, _) = common::send_json(
        &app.router,
        "GET",
        "/admin/students",
        Some(&student_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Teacher routes reject students too
    let (status, _) = common::send_json(
        &app.router,
        "GET",
        "/api/v1/teacher/classes",
        Some(&student_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
