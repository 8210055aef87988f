use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use campus_api::{
    config::Config,
    create_router,
    middlewares::auth::{JwtClaims, JwtService},
    services::AppState,
};

pub struct TestApp {
    pub router: Router,
    pub config: Config,
}

/// Build the app against a throwaway test database. Returns None (and the
/// test skips) when no MongoDB is reachable.
pub async fn create_test_app() -> Option<TestApp> {
    // Initialize tracing for tests
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::WARN)
        .try_init();

    // Load test environment from .env.test
    dotenvy::from_filename(".env.test").ok();

    let mut config = Config::load().expect("Failed to load test configuration");

    // Fresh database per test so registration-number sequences start empty
    config.mongo_database = format!("campus_test_{}", uuid::Uuid::new_v4().simple());

    let mongo_client = mongodb::Client::with_uri_str(&config.mongo_uri).await.ok()?;

    let ping = tokio::time::timeout(
        std::time::Duration::from_secs(2),
        mongo_client
            .database("admin")
            .run_command(mongodb::bson::doc! { "ping": 1 }),
    )
    .await;
    if !matches!(ping, Ok(Ok(_))) {
        eprintln!(
            "Skipping integration test: MongoDB not reachable at {}",
            config.mongo_uri
        );
        return None;
    }

    let app_state = Arc::new(
        AppState::new(config.clone(), mongo_client)
            .await
            .expect("Failed to initialize test app state"),
    );

    Some(TestApp {
        router: create_router(app_state),
        config,
    })
}

/// Mint a bearer token directly; role guards only look at the claims
pub fn token_for(config: &Config, role: &str, student_id: Option<String>) -> String {
    let service = JwtService::new(&config.jwt_secret);
    let now = chrono::Utc::now().timestamp();
    let claims = JwtClaims {
        sub: mongodb::bson::oid::ObjectId::new().to_hex(),
        role: role.to_string(),
        student_id,
        exp: (now + 3600) as usize,
        iat: now as usize,
    };
    service
        .generate_token(claims)
        .expect("Failed to mint test token")
}

/// Fire one request and decode the JSON response (Null for empty bodies)
pub async fn send_json(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");

    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let request = builder
        .body(Body::from(
            body.map(|value| value.to_string()).unwrap_or_default(),
        ))
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, json)
}
