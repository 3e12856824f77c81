use serde::{Deserialize, Serialize};

use crate::services::storage::PresignedGrant;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub urls: Vec<String>,
}

/// Object URLs previously returned by an upload, as stored on project records.
#[derive(Debug, Deserialize)]
pub struct PresignRequest {
    pub urls: Vec<String>,
    /// Overrides the configured TTL for this batch.
    #[serde(default)]
    pub ttl_seconds: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct PresignResponse {
    pub grants: Vec<PresignedGrant>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub urls: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub keys: Vec<ResolvedKey>,
}

/// One entry per requested URL, in request order. Exactly one of `key` / `error` is set.
#[derive(Debug, Serialize)]
pub struct ResolvedKey {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
