use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
    routing::get,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

static OBSERVABILITY_ENABLED: OnceLock<bool> = OnceLock::new();

const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

fn parse_enabled(value: Option<&str>) -> bool {
    match value {
        Some(v) => !v.eq_ignore_ascii_case("false") && v != "0",
        None => true,
    }
}

/// `OBSERVABILITY_ENABLED`, read once. Enabled unless set to `false` or `0`.
pub fn is_observability_enabled() -> bool {
    *OBSERVABILITY_ENABLED
        .get_or_init(|| parse_enabled(std::env::var("OBSERVABILITY_ENABLED").ok().as_deref()))
}

/// Installs the Prometheus recorder and its upkeep task. `None` when
/// observability is disabled.
pub fn init_metrics() -> anyhow::Result<Option<PrometheusHandle>> {
    if !is_observability_enabled() {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )?
        .install_recorder()?;

    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep_handle.run_upkeep();
        }
    });

    Ok(Some(handle))
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_observability_enabled() {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());

    gauge!("http_requests_active").increment(1.0);

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16();

    counter!("http_requests_total", "method" => method.clone(), "path" => path.clone(), "status" => status.to_string()).increment(1);
    histogram!("http_request_duration_seconds", "method" => method, "path" => path).record(latency);
    counter!("http_requests_by_status", "status_category" => status_category(status)).increment(1);

    gauge!("http_requests_active").decrement(1.0);

    response
}

pub fn status_category(status: u16) -> &'static str {
    match status {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}

pub fn metrics_app(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

// Domain counters

pub fn track_registration(user_type: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("registrations_total", "user_type" => user_type.to_string()).increment(1);
}

pub fn track_login_success(user_type: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("user_logins_total", "user_type" => user_type.to_string(), "status" => "success")
        .increment(1);
}

pub fn track_login_failure(reason: &'static str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("user_logins_total", "user_type" => "unknown", "status" => "failure", "reason" => reason)
        .increment(1);
}

pub fn track_attendance_marked(records: usize) {
    if !is_observability_enabled() {
        return;
    }
    counter!("attendance_records_marked_total").increment(records as u64);
}

pub fn track_learning_session_recorded() {
    if !is_observability_enabled() {
        return;
    }
    counter!("learning_sessions_recorded_total").increment(1);
}

pub fn track_story_created() {
    if !is_observability_enabled() {
        return;
    }
    counter!("stories_created_total").increment(1);
}

pub fn track_email(kind: &'static str, delivered: bool) {
    if !is_observability_enabled() {
        return;
    }
    let status = if delivered { "sent" } else { "failed" };
    counter!("emails_total", "kind" => kind, "status" => status).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_enabled() {
        assert!(parse_enabled(None));
        assert!(parse_enabled(Some("true")));
        assert!(parse_enabled(Some("1")));
        assert!(!parse_enabled(Some("false")));
        assert!(!parse_enabled(Some("FALSE")));
        assert!(!parse_enabled(Some("0")));
    }

    #[test]
    fn test_status_category() {
        assert_eq!(status_category(201), "2xx");
        assert_eq!(status_category(304), "3xx");
        assert_eq!(status_category(404), "4xx");
        assert_eq!(status_category(503), "5xx");
        assert_eq!(status_category(101), "other");
    }

    #[test]
    fn test_trackers_without_recorder_are_noops() {
        track_registration("parent");
        track_login_success("teacher");
        track_login_failure("invalid_credentials");
        track_attendance_marked(3);
        track_story_created();
        track_email("verification", false);
    }
}
