//! API key authentication middleware.
//!
//! When `state.api_key` is set, every request (except `/health`,
//! `/swagger-ui`, and `/api-docs`) must carry a matching
//! `Authorization: Bearer <key>` or `X-Api-Key: <key>` header. When unset,
//! authentication is disabled (development mode).

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use subtle::ConstantTimeEq;

use crate::state::AppState;

const BYPASS_PATHS: &[&str] = &["/health", "/swagger-ui", "/api-docs", "/metrics"];

/// Whether `path` is, or is nested under, one of the unauthenticated
/// bypass paths — matched on `/`-delimited segments so e.g.
/// `/health-check-admin` does not piggyback on the `/health` bypass.
fn is_bypass_path(path: &str) -> bool {
    BYPASS_PATHS
        .iter()
        .any(|p| path == *p || path.starts_with(&format!("{p}/")))
}

/// Constant-time equality, so a wrong guess can't be narrowed down by
/// measuring how many leading bytes matched.
fn keys_match(provided: &str, expected: &str) -> bool {
    provided.len() == expected.len()
        && bool::from(provided.as_bytes().ct_eq(expected.as_bytes()))
}

pub async fn api_key_auth(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, impl IntoResponse> {
    let Some(expected) = state.api_key.as_deref() else {
        return Ok(next.run(request).await);
    };

    if is_bypass_path(request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    let api_key_header = request
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok());

    match bearer.or(api_key_header) {
        Some(key) if keys_match(key, expected) => Ok(next.run(request).await),
        Some(_) => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid API key" })),
        )),
        None => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "missing API key: set Authorization: Bearer <key> or X-Api-Key: <key>"
            })),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use axum::Router;
    use freyja_core::{Config, KvStore};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn ok_handler() -> &'static str {
        "ok"
    }

    fn build_app(api_key: Option<&str>) -> Router {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = KvStore::open(Config::new(dir.path())).unwrap();
        let state = AppState {
            store: Arc::new(store),
            api_key: api_key.map(str::to_string),
            metrics: Arc::new(crate::metrics::Metrics::new()),
        };
        Router::new()
            .route("/v1/keys/x", get(ok_handler))
            .route("/health", get(ok_handler))
            .layer(axum::middleware::from_fn_with_state(
                state.clone(),
                api_key_auth,
            ))
            .with_state(state)
    }

    #[tokio::test]
    async fn no_api_key_allows_all() {
        let app = build_app(None);
        let req = Request::builder().uri("/v1/keys/x").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_bypasses_auth() {
        let app = build_app(Some("secret"));
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn bypass_match_is_segment_exact() {
        assert!(is_bypass_path("/health"));
        assert!(is_bypass_path("/health/"));
        assert!(!is_bypass_path("/health-check-admin"));
        assert!(!is_bypass_path("/apidocs-internal"));
    }

    #[tokio::test]
    async fn missing_key_returns_401() {
        let app = build_app(Some("secret"));
        let req = Request::builder().uri("/v1/keys/x").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_bearer_token_passes() {
        let app = build_app(Some("secret"));
        let req = Request::builder()
            .uri("/v1/keys/x")
            .header("Authorization", "Bearer secret")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn valid_x_api_key_passes() {
        let app = build_app(Some("secret"));
        let req = Request::builder()
            .uri("/v1/keys/x")
            .header("x-api-key", "secret")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn wrong_key_returns_401() {
        let app = build_app(Some("secret"));
        let req = Request::builder()
            .uri("/v1/keys/x")
            .header("Authorization", "Bearer wrong")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
