use std::sync::Arc;
use std::time::{Duration, SystemTime};

use axum::body::Bytes;
use chrono::{DateTime, Utc};

use crate::services::storage::client::{
    ObjectStoreClient, PresignedGrant, StorageError, StorageResult,
};
use crate::services::storage::reference::ObjectUrl;

/// SigV4 presigned URLs cannot outlive seven days.
const MAX_PRESIGN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Upload, download, and time-boxed read grants on top of an [`ObjectStoreClient`].
///
/// Never retries; the caller owns retry policy.
#[derive(Clone)]
pub struct StorageService {
    client: Arc<dyn ObjectStoreClient>,
    urls: ObjectUrl,
    default_ttl: Duration,
}

impl std::fmt::Debug for StorageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageService")
            .field("backend", &self.client.backend_name())
            .field("urls", &self.urls)
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

impl StorageService {
    pub fn new(
        client: Arc<dyn ObjectStoreClient>,
        endpoint: &str,
        bucket: &str,
        default_ttl: Duration,
    ) -> Self {
        Self {
            client,
            urls: ObjectUrl::new(endpoint, bucket),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Store `content` under `file_name` and return its `{endpoint}/{bucket}/{key}` URL.
    ///
    /// Names the URL format could not resolve back (blank, or carrying the object URL
    /// prefix) are refused before anything is written.
    pub async fn upload(&self, file_name: &str, content: Bytes) -> StorageResult<String> {
        if !self.urls.accepts_key(file_name) {
            return Err(StorageError::invalid_reference(file_name));
        }

        let size = content.len();
        self.client.put(file_name, content).await.inspect_err(|err| {
            tracing::error!(key = %file_name, error = %err, "object upload failed");
        })?;

        tracing::info!(key = %file_name, size, backend = self.client.backend_name(), "object stored");
        Ok(self.urls.url_for(file_name))
    }

    pub async fn download(&self, key: &str) -> StorageResult<Bytes> {
        if key.is_empty() {
            return Err(StorageError::invalid_reference(key));
        }
        self.client.get(key).await
    }

    /// Recover bare keys from previously issued object URLs, one result per input, in order.
    pub fn resolve_keys(&self, urls: &[String]) -> Vec<StorageResult<String>> {
        urls.iter()
            .map(|url| {
                self.urls.resolve(url).map(|r| {
                    tracing::trace!(bucket = %r.bucket, key = %r.key, "object url resolved");
                    r.key
                })
            })
            .collect()
    }

    /// Like [`resolve_keys`](Self::resolve_keys) but fails on the first invalid entry.
    pub fn resolve_all(&self, urls: &[String]) -> StorageResult<Vec<String>> {
        self.resolve_keys(urls).into_iter().collect()
    }

    /// Mint one GET grant per key, in input order.
    ///
    /// All or nothing: the first key that is missing or cannot be signed aborts the batch
    /// and no grants are returned.
    pub async fn presign(
        &self,
        keys: &[String],
        ttl: Duration,
    ) -> StorageResult<Vec<PresignedGrant>> {
        if ttl.is_zero() || ttl > MAX_PRESIGN_TTL {
            return Err(StorageError::InvalidTtl {
                seconds: ttl.as_secs(),
            });
        }

        let mut grants = Vec::with_capacity(keys.len());
        for key in keys {
            if !self.client.exists(key).await? {
                tracing::warn!(key = %key, "presign batch aborted: object missing");
                return Err(StorageError::NotFound { key: key.clone() });
            }

            let issued_at = SystemTime::now();
            let url = self.client.presign_get(key, issued_at, ttl).await?;
            grants.push(PresignedGrant {
                url,
                expires_at: DateTime::<Utc>::from(issued_at + ttl),
            });
        }

        Ok(grants)
    }

    /// Resolve stored object URLs, then presign them. Used by the project pages to
    /// render screenshots without exposing the bucket.
    pub async fn presign_urls(
        &self,
        urls: &[String],
        ttl: Duration,
    ) -> StorageResult<Vec<PresignedGrant>> {
        let keys = self.resolve_all(urls)?;
        self.presign(&keys, ttl).await
    }
}
