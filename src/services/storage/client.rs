//! Object store client interface used by `StorageService`.
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use axum::body::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

/// Storage-layer errors.
///
/// Kept independent from `AppError` so the HTTP layer decides the status mapping.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object store unavailable: {0}")]
    Unavailable(String),
    #[error("object not found: {key}")]
    NotFound { key: String },
    #[error("invalid object reference: {reference}")]
    InvalidReference { reference: String },
    #[error("invalid presign ttl: {seconds}s")]
    InvalidTtl { seconds: u64 },
}

impl StorageError {
    pub fn invalid_reference(reference: impl Into<String>) -> Self {
        Self::InvalidReference {
            reference: reference.into(),
        }
    }
}

/// Time-boxed, GET-only access to a single object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresignedGrant {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Thin handle to the backing object store, bound to one bucket.
///
/// One instance lives for the whole process and is shared across requests,
/// so implementations must be safe to call concurrently.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync + 'static {
    // Backend name for logging.
    fn backend_name(&self) -> &'static str;

    async fn put(&self, key: &str, body: Bytes) -> StorageResult<()>;

    // Full object content. Missing key => `NotFound`.
    async fn get(&self, key: &str) -> StorageResult<Bytes>;

    // HEAD. `Ok(false)` when the key does not exist.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    // Signed GET URL for `key`, valid from `issued_at` for `ttl`.
    // Does not check existence; callers that care use `exists` first.
    async fn presign_get(
        &self,
        key: &str,
        issued_at: SystemTime,
        ttl: Duration,
    ) -> StorageResult<String>;
}
