//! Request/response DTOs for the REST facade.
//!
//! Values are arbitrary bytes in `freyja-core`, so every value crossing
//! the JSON boundary is base64-encoded.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct PutRequest {
    /// Base64-encoded value bytes.
    pub value: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ValueResponse {
    /// Base64-encoded value bytes.
    pub value: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct KeysResponse {
    pub keys: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ScanEntry {
    pub key: String,
    /// Base64-encoded value bytes.
    pub value: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ScanResponse {
    pub entries: Vec<ScanEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    pub key_count: usize,
    pub log_size_bytes: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExplainSummaryResponse {
    pub total_keys: usize,
    pub live_keys: usize,
    pub tombstones: usize,
    pub total_size_mib: f64,
    pub live_size_mib: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecordSampleResponse {
    pub key: String,
    pub value_size: usize,
    pub timestamp: u64,
    pub is_tombstone: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExplainResponse {
    pub summary: ExplainSummaryResponse,
    pub samples: Vec<RecordSampleResponse>,
    pub elapsed_ms: u128,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RelationshipRequest {
    pub from: String,
    pub to: String,
    pub relation: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RelationshipQueryParams {
    pub key: String,
    pub direction: Option<String>,
    pub relation: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RelationshipResponse {
    pub direction: String,
    pub other_key: String,
    pub relation: String,
    pub created_at: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RelationshipsResponse {
    pub relationships: Vec<RelationshipResponse>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListQueryParams {
    pub prefix: Option<String>,
}
