//! HTTP/REST facade for FreyjaDB.
//!
//! Maps HTTP requests onto `freyja_core::KvStore` calls and back; this
//! crate has no independent business logic of its own. Grounded on the
//! sibling vector-database example's `velesdb-server` crate, since the
//! teacher's own server speaks a custom binary wire protocol rather than
//! REST.

mod auth;
mod error;
mod handlers;
mod metrics;
mod openapi;
mod state;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use freyja_core::{Config, KvStore};

pub use error::ApiError;
pub use openapi::ApiDoc;
pub use state::AppState;

/// Builds the full router: CRUD, relationships, diagnostics, `/health`,
/// `/metrics`, and the Swagger UI, wrapped in the auth middleware.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/v1/keys/{key}",
            get(handlers::get_key)
                .put(handlers::put_key)
                .delete(handlers::delete_key),
        )
        .route("/v1/keys", get(handlers::list_keys))
        .route("/v1/scan", get(handlers::scan_prefix))
        .route("/v1/stats", get(handlers::stats))
        .route("/v1/explain", get(handlers::explain))
        .route(
            "/v1/relationships",
            post(handlers::put_relationship)
                .delete(handlers::delete_relationship)
                .get(handlers::get_relationships),
        );

    let swagger_ui =
        SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi());

    Router::new()
        .route("/health", get(handlers::health))
        .merge(api)
        .merge(swagger_ui)
        .route("/metrics", get(metrics::metrics_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::api_key_auth,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            metrics::track_metrics,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Opens the store per `store_config`, binds `address`, and serves the
/// REST facade until the process is interrupted.
pub async fn serve(
    address: &str,
    store_config: Config,
    api_key: Option<String>,
) -> anyhow::Result<()> {
    let data_dir = store_config.data_dir.display().to_string();
    let (store, recovery) = KvStore::open(store_config)?;
    tracing::info!(
        records_truncated = recovery.records_truncated,
        "opened store at {data_dir}"
    );

    if api_key.is_some() {
        tracing::info!("authentication: enabled (api key configured)");
    } else {
        tracing::warn!("authentication: DISABLED (dev mode). Pass --api-key to enable.");
    }

    let state = AppState {
        store: Arc::new(store),
        api_key,
        metrics: Arc::new(metrics::Metrics::new()),
    };

    let app = router(state);
    let addr: SocketAddr = address
        .parse()
        .or_else(|_| format!("0.0.0.0:{address}").parse())
        .map_err(|e| anyhow::anyhow!("invalid bind address {address:?}: {e}"))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("freyja-server listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
