//! Shared application state injected into every handler.

use std::sync::Arc;

use freyja_core::KvStore;

use crate::metrics::Metrics;

/// Cloned into every request; all fields are cheap `Arc` handles.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<KvStore>,
    /// When set, requests must present this value as a bearer token or
    /// `X-Api-Key` header. `None` disables authentication (dev mode).
    pub api_key: Option<String>,
    pub metrics: Arc<Metrics>,
}
