//! HTTP handlers: translate requests into `freyja_core::KvStore` calls.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use freyja_core::{Direction, RelationshipQuery};

use crate::error::ApiError;
use crate::state::AppState;
use crate::types::{
    ExplainResponse, ExplainSummaryResponse, KeysResponse, ListQueryParams, PutRequest,
    RecordSampleResponse, RelationshipQueryParams, RelationshipRequest, RelationshipResponse,
    RelationshipsResponse, ScanEntry, ScanResponse, StatsResponse, ValueResponse,
};

#[utoipa::path(get, path = "/health", responses((status = 200, description = "Service is up")))]
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

#[utoipa::path(
    get,
    path = "/v1/keys/{key}",
    params(("key" = String, Path)),
    responses(
        (status = 200, body = ValueResponse),
        (status = 404, description = "Key not found"),
    )
)]
pub async fn get_key(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ValueResponse>, ApiError> {
    let value = state.store.get(key.as_bytes())?;
    Ok(Json(ValueResponse {
        value: BASE64.encode(value),
    }))
}

#[utoipa::path(
    put,
    path = "/v1/keys/{key}",
    params(("key" = String, Path)),
    request_body = PutRequest,
    responses((status = 204, description = "Value written"), (status = 400))
)]
pub async fn put_key(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<PutRequest>,
) -> Result<StatusCode, ApiError> {
    let value = BASE64
        .decode(req.value)
        .map_err(|_| ApiError(freyja_core::Error::InvalidKey))?;
    state.store.put(key.as_bytes(), &value)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/v1/keys/{key}",
    params(("key" = String, Path)),
    responses((status = 204, description = "Key removed"))
)]
pub async fn delete_key(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete(key.as_bytes())?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/v1/keys",
    params(("prefix" = Option<String>, Query)),
    responses((status = 200, body = KeysResponse))
)]
pub async fn list_keys(
    State(state): State<AppState>,
    Query(params): Query<ListQueryParams>,
) -> Result<Json<KeysResponse>, ApiError> {
    let prefix = params.prefix.unwrap_or_default();
    let mut keys = state.store.list_keys(prefix.as_bytes())?;
    keys.sort();
    Ok(Json(KeysResponse {
        keys: keys
            .into_iter()
            .map(|k| String::from_utf8_lossy(&k).into_owned())
            .collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/v1/scan",
    params(("prefix" = Option<String>, Query)),
    responses((status = 200, body = ScanResponse))
)]
pub async fn scan_prefix(
    State(state): State<AppState>,
    Query(params): Query<ListQueryParams>,
) -> Result<Json<ScanResponse>, ApiError> {
    let prefix = params.prefix.unwrap_or_default();
    let mut entries = state.store.scan_prefix(prefix.as_bytes())?;
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(Json(ScanResponse {
        entries: entries
            .into_iter()
            .map(|(k, v)| ScanEntry {
                key: String::from_utf8_lossy(&k).into_owned(),
                value: BASE64.encode(v),
            })
            .collect(),
    }))
}

#[utoipa::path(get, path = "/v1/stats", responses((status = 200, body = StatsResponse)))]
pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state.store.stats()?;
    Ok(Json(StatsResponse {
        key_count: stats.key_count,
        log_size_bytes: stats.log_size_bytes,
    }))
}

#[utoipa::path(
    get,
    path = "/v1/explain",
    params(("samples" = Option<usize>, Query)),
    responses((status = 200, body = ExplainResponse))
)]
pub async fn explain(
    State(state): State<AppState>,
    Query(params): Query<ExplainQueryParams>,
) -> Result<Json<ExplainResponse>, ApiError> {
    let samples = params.samples.unwrap_or(10);
    let report = state.store.explain(samples)?;
    Ok(Json(ExplainResponse {
        summary: ExplainSummaryResponse {
            total_keys: report.summary.total_keys,
            live_keys: report.summary.live_keys,
            tombstones: report.summary.tombstones,
            total_size_mib: report.summary.total_size_mib,
            live_size_mib: report.summary.live_size_mib,
        },
        samples: report
            .samples
            .into_iter()
            .map(|s| RecordSampleResponse {
                key: String::from_utf8_lossy(&s.key).into_owned(),
                value_size: s.value_size,
                timestamp: s.timestamp,
                is_tombstone: s.is_tombstone,
            })
            .collect(),
        elapsed_ms: report.elapsed.as_millis(),
    }))
}

#[derive(serde::Deserialize)]
pub struct ExplainQueryParams {
    pub samples: Option<usize>,
}

#[utoipa::path(
    post,
    path = "/v1/relationships",
    request_body = RelationshipRequest,
    responses((status = 201, description = "Relationship recorded"), (status = 404))
)]
pub async fn put_relationship(
    State(state): State<AppState>,
    Json(req): Json<RelationshipRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .put_relationship(&req.from, &req.to, &req.relation)?;
    Ok(StatusCode::CREATED)
}

#[utoipa::path(
    delete,
    path = "/v1/relationships",
    request_body = RelationshipRequest,
    responses((status = 204, description = "Relationship removed"))
)]
pub async fn delete_relationship(
    State(state): State<AppState>,
    Json(req): Json<RelationshipRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .delete_relationship(&req.from, &req.to, &req.relation)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/v1/relationships",
    params(
        ("key" = String, Query),
        ("direction" = Option<String>, Query),
        ("relation" = Option<String>, Query),
        ("limit" = Option<usize>, Query),
    ),
    responses((status = 200, body = RelationshipsResponse), (status = 400))
)]
pub async fn get_relationships(
    State(state): State<AppState>,
    Query(params): Query<RelationshipQueryParams>,
) -> Result<Json<RelationshipsResponse>, ApiError> {
    let mut query = RelationshipQuery::new(params.key);
    if let Some(raw) = params.direction {
        query.direction = parse_direction(&raw)?;
    }
    query.relation = params.relation;
    if let Some(limit) = params.limit {
        query.limit = limit;
    }

    let results = state.store.get_relationships(&query)?;
    Ok(Json(RelationshipsResponse {
        relationships: results
            .into_iter()
            .map(|r| RelationshipResponse {
                direction: match r.direction {
                    Direction::Outgoing => "outgoing".to_string(),
                    Direction::Incoming => "incoming".to_string(),
                    Direction::Both => "both".to_string(),
                },
                other_key: r.other_key,
                relation: r.relationship.relation,
                created_at: r.relationship.created_at,
            })
            .collect(),
    }))
}

fn parse_direction(raw: &str) -> Result<Direction, ApiError> {
    match raw {
        "outgoing" | "out" => Ok(Direction::Outgoing),
        "incoming" | "in" => Ok(Direction::Incoming),
        "both" => Ok(Direction::Both),
        _ => Err(ApiError(freyja_core::Error::InvalidKey)),
    }
}
