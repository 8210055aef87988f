mod common;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn audiences_are_respected() {
    let Some(app) = common::create_test_app().await else {
        return;
    };
    let admin_token = common::token_for(&app.config, "admin", None);
    let teacher_token = common::token_for(&app.config, "teacher", None);
    let student_token = common::token_for(
        &app.config,
        "student",
        Some(mongodb::bson::oid::ObjectId::new().to_hex()),
    );

    for (title, audience) in [
        ("For everyone", "all"),
        ("Staff meeting", "teachers"),
        ("Sports day", "students"),
    ] {
        let (status, _) = common::send_json(
            &app.router,
            "POST",
            "/admin/announcements",
            Some(&admin_token),
            Some(json!({
                "title": title,
                "body": "Details follow.",
                "audience": audience,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let titles = |json: &serde_json::Value| -> Vec<String> {
        json.as_array()
            .unwrap()
            .iter()
            .map(|a| a["title"].as_str().unwrap().to_string())
            .collect()
    };

    let (status, listed) = common::send_json(
        &app.router,
        "GET",
        "/api/v1/student/announcements",
        Some(&student_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let student_titles = titles(&listed);
    assert!(student_titles.contains(&"For everyone".to_string()));
    assert!(student_titles.contains(&"Sports day".to_string()));
    assert!(!student_titles.contains(&"Staff meeting".to_string()));

    let (status, listed) = common::send_json(
        &app.router,
        "GET",
        "/api/v1/teacher/announcements",
        Some(&teacher_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let teacher_titles = titles(&listed);
    assert!(teacher_titles.contains(&"For everyone".to_string()));
    assert!(teacher_titles.contains(&"Staff meeting".to_string()));
    assert!(!teacher_titles.contains(&"Sports day".to_string()));

    // Admin sees everything
    let (status, listed) = common::send_json(
        &app.router,
        "GET",
        "/admin/announcements",
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&listed).len(), 3);
}

#[tokio::test]
async fn announcements_can_be_updated_and_deleted() {
    let Some(app) = common::create_test_app().await else {
        return;
    };
    let admin_token = common::token_for(&app.config, "admin", None);

    let (_, created) = common::send_json(
        &app.router,
        "POST",
        "/admin/announcements",
        Some(&admin_token),
        Some(json!({
            "title": "Holidai notice",
            "body": "School closed on Friday.",
            "audience": "all",
        })),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, updated) = common::send_json(
        &app.router,
        "PATCH",
        &format!("/admin/announcements/{}", id),
        Some(&admin_token),
        Some(json!({ "title": "Holiday notice" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Holiday notice");

    let (status, _) = common::send_json(
        &app.router,
        "DELETE",
        &format!("/admin/announcements/{}", id),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = common::send_json(
        &app.router,
        "PATCH",
        &format!("/admin/announcements/{}", id),
        Some(&admin_token),
        Some(json!({ "title": "Too late" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
