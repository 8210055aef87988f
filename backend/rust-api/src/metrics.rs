use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // Business Metrics
    pub static ref ADMISSIONS_DECIDED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "admissions_decided_total",
        "Total number of admission applications decided",
        &["decision"]
    )
    .unwrap();

    pub static ref MARKS_RECORDED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "marks_recorded_total",
        "Total number of subject marks recorded",
        &["passed"]
    )
    .unwrap();

    pub static ref QUIZ_ATTEMPTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "quiz_attempts_total",
        "Total number of quiz attempts submitted",
        &["passed"]
    )
    .unwrap();

    pub static ref BOOK_LOANS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "book_loans_total",
        "Total number of library loan operations",
        &["operation"]
    )
    .unwrap();
}

/// Render all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

pub fn record_admission_decision(approved: bool) {
    let label = if approved { "approved" } else { "rejected" };
    ADMISSIONS_DECIDED_TOTAL.with_label_values(&[label]).inc();
}

pub fn record_mark(passed: bool) {
    let label = if passed { "true" } else { "false" };
    MARKS_RECORDED_TOTAL.with_label_values(&[label]).inc();
}

pub fn record_quiz_attempt(passed: bool) {
    let label = if passed { "true" } else { "false" };
    QUIZ_ATTEMPTS_TOTAL.with_label_values(&[label]).inc();
}

pub fn record_book_loan(operation: &str) {
    BOOK_LOANS_TOTAL.with_label_values(&[operation]).inc();
}
