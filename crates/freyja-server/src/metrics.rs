//! Prometheus metrics: request counters and the store's live-key gauge.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::state::AppState;

pub struct Metrics {
    registry: Registry,
    requests_total: IntCounterVec,
    live_keys: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("freyja_requests_total", "Total HTTP requests handled"),
            &["method", "path", "status"],
        )
        .expect("valid metric opts");
        registry
            .register(Box::new(requests_total.clone()))
            .expect("requests_total registers once");

        let live_keys = IntGauge::new("freyja_live_keys", "Number of live keys in the store")
            .expect("valid metric opts");
        registry
            .register(Box::new(live_keys.clone()))
            .expect("live_keys registers once");

        Metrics {
            registry,
            requests_total,
            live_keys,
        }
    }

    pub fn record_request(&self, method: &str, path: &str, status: u16) {
        self.requests_total
            .with_label_values(&[method, path, &status.to_string()])
            .inc();
    }

    fn render(&self) -> String {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .expect("prometheus text encoding never fails");
        String::from_utf8(buffer).expect("prometheus output is valid utf-8")
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// `GET /metrics`: refreshes the live-key gauge from the store, then
/// renders the registry in Prometheus text exposition format.
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    if let Ok(stats) = state.store.stats() {
        state.metrics.live_keys.set(stats.key_count as i64);
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        state.metrics.render(),
    )
}

/// Records every request's method, path, and status in `requests_total`.
pub async fn track_metrics(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    state
        .metrics
        .record_request(&method, &path, response.status().as_u16());
    response
}
