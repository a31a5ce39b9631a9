//! OpenAPI document served at `/api-docs/openapi.json`, paired with the
//! Swagger UI mounted at `/swagger-ui`.

use utoipa::OpenApi;

use crate::handlers;
use crate::types;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::get_key,
        handlers::put_key,
        handlers::delete_key,
        handlers::list_keys,
        handlers::scan_prefix,
        handlers::stats,
        handlers::explain,
        handlers::put_relationship,
        handlers::delete_relationship,
        handlers::get_relationships,
    ),
    components(schemas(
        types::PutRequest,
        types::ValueResponse,
        types::KeysResponse,
        types::ScanEntry,
        types::ScanResponse,
        types::StatsResponse,
        types::ExplainSummaryResponse,
        types::RecordSampleResponse,
        types::ExplainResponse,
        types::RelationshipRequest,
        types::RelationshipResponse,
        types::RelationshipsResponse,
        crate::error::ErrorResponse,
    )),
    tags(
        (name = "keys", description = "Single-key read/write/delete"),
        (name = "relationships", description = "Directed edges between keys"),
        (name = "diagnostics", description = "Stats and explain"),
    )
)]
pub struct ApiDoc;
