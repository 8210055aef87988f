use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use services::AppState;

/// CSP middleware adds Content-Security-Policy header to all responses
async fn csp_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    response.headers_mut().insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(
            "default-src 'self'; \
             script-src 'self' 'unsafe-inline'; \
             style-src 'self' 'unsafe-inline'; \
             img-src 'self' data: https:; \
             connect-src 'self'",
        ),
    );
    response
}

pub fn create_router(app_state: std::sync::Arc<services::AppState>) -> Router {
    // CORS for the public endpoints (admission form, result lookup)
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_origin(tower_http::cors::Any); // TODO: restrict to specific origins in production

    Router::new()
        // Public endpoints (no auth required)
        .route("/health", get(handlers::health_check))
        // Metrics endpoint with Basic Auth protection
        .route(
            "/metrics",
            get(handlers::metrics_handler)
                .layer(middleware::from_fn(handlers::metrics_auth_middleware)),
        )
        .nest("/api/v1/auth", auth_routes(app_state.clone()))
        .nest("/api/v1/public", public_routes().layer(cors))
        // Protected portals (require JWT)
        .nest(
            "/api/v1/student",
            student_routes().layer(middleware::from_fn_with_state(
                app_state.clone(),
                middlewares::auth::auth_middleware,
            )),
        )
        .nest(
            "/api/v1/teacher",
            teacher_routes()
                .route_layer(middleware::from_fn(
                    middlewares::auth::teacher_guard_middleware,
                ))
                .layer(middleware::from_fn_with_state(
                    app_state.clone(),
                    middlewares::auth::auth_middleware,
                )),
        )
        .nest(
            "/admin",
            admin_routes()
                .route_layer(middleware::from_fn(
                    middlewares::auth::admin_guard_middleware,
                ))
                .layer(middleware::from_fn_with_state(
                    app_state.clone(),
                    middlewares::auth::auth_middleware,
                )),
        )
        .with_state(app_state)
        .layer(middleware::from_fn(csp_middleware)) // Apply CSP to all responses
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

fn public_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route("/admissions", post(handlers::public::apply_for_admission))
        .route("/results", get(handlers::public::lookup_results))
}

fn student_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route("/profile", get(handlers::student::get_profile))
        .route("/results", get(handlers::student::get_my_results))
        .route("/quizzes", get(handlers::student::list_quizzes))
        .route("/quizzes/{id}", get(handlers::student::get_quiz))
        .route(
            "/quizzes/{id}/attempt",
            get(handlers::student::get_quiz_attempt).post(handlers::student::submit_quiz_attempt),
        )
        .route(
            "/announcements",
            get(handlers::student::list_announcements),
        )
        .route("/loans", get(handlers::student::list_loans))
}

fn teacher_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route("/classes", get(handlers::teacher::list_classes))
        .route("/classes/{id}/roster", get(handlers::teacher::get_roster))
        .route("/results", post(handlers::teacher::enter_mark))
        .route("/results/bulk", post(handlers::teacher::enter_marks_bulk))
        .route(
            "/quizzes",
            get(handlers::teacher::list_quizzes).post(handlers::teacher::create_quiz),
        )
        .route(
            "/quizzes/{id}/publish",
            post(handlers::teacher::publish_quiz),
        )
        .route(
            "/quizzes/{id}/attempts",
            get(handlers::teacher::list_quiz_attempts),
        )
        .route(
            "/announcements",
            get(handlers::teacher::list_announcements),
        )
}

fn admin_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        // User management
        .route(
            "/users",
            get(handlers::admin::list_users).post(handlers::admin::create_user),
        )
        .route(
            "/users/{id}",
            get(handlers::admin::get_user)
                .patch(handlers::admin::update_user)
                .delete(handlers::admin::delete_user),
        )
        // Students
        .route(
            "/students",
            get(handlers::admin::list_students).post(handlers::admin::create_student),
        )
        .route(
            "/students/{id}",
            get(handlers::admin::get_student)
                .patch(handlers::admin::update_student)
                .delete(handlers::admin::delete_student),
        )
        // Admissions
        .route("/admissions", get(handlers::admin::list_applications))
        .route(
            "/admissions/{id}/approve",
            post(handlers::admin::approve_application),
        )
        .route(
            "/admissions/{id}/reject",
            post(handlers::admin::reject_application),
        )
        // Classes and rosters
        .route(
            "/classes",
            get(handlers::admin::list_classes).post(handlers::admin::create_class),
        )
        .route(
            "/classes/{id}",
            get(handlers::admin::get_class)
                .patch(handlers::admin::update_class)
                .delete(handlers::admin::delete_class),
        )
        .route(
            "/classes/{id}/students",
            post(handlers::admin::add_students_to_class)
                .delete(handlers::admin::remove_students_from_class),
        )
        // Exam categories, lifecycle, subjects
        .route(
            "/exam-categories",
            get(handlers::admin::list_categories).post(handlers::admin::create_category),
        )
        .route(
            "/exam-categories/{id}",
            get(handlers::admin::get_category)
                .patch(handlers::admin::update_category)
                .delete(handlers::admin::delete_category),
        )
        .route(
            "/exam-categories/{id}/transition",
            post(handlers::admin::transition_category),
        )
        .route(
            "/exam-categories/{id}/subjects",
            get(handlers::admin::list_subjects).post(handlers::admin::create_subject),
        )
        .route(
            "/subjects/{id}",
            axum::routing::delete(handlers::admin::delete_subject),
        )
        // Library
        .route(
            "/books",
            get(handlers::admin::list_books).post(handlers::admin::create_book),
        )
        .route(
            "/books/{id}",
            get(handlers::admin::get_book)
                .patch(handlers::admin::update_book)
                .delete(handlers::admin::delete_book),
        )
        .route("/books/{id}/issue", post(handlers::admin::issue_book))
        .route("/books/{id}/return", post(handlers::admin::return_book))
        // Announcements
        .route(
            "/announcements",
            get(handlers::admin::list_announcements).post(handlers::admin::create_announcement),
        )
        .route(
            "/announcements/{id}",
            axum::routing::patch(handlers::admin::update_announcement)
                .delete(handlers::admin::delete_announcement),
        )
        // Audit logs
        .route("/audit", get(handlers::admin::list_audit_logs))
}

fn auth_routes(
    app_state: std::sync::Arc<services::AppState>,
) -> Router<std::sync::Arc<services::AppState>> {
    let public_routes = Router::new().route("/login", post(handlers::auth::login));

    // Protected routes (require JWT auth)
    let protected_routes = Router::new()
        .route("/me", get(handlers::auth::get_current_user))
        .route("/change-password", post(handlers::auth::change_password))
        .route_layer(middleware::from_fn_with_state(
            app_state,
            middlewares::auth::auth_middleware,
        ));

    public_routes.merge(protected_routes)
}
