use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use axum::body::Bytes;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use url::Url;

use crate::services::storage::client::{ObjectStoreClient, StorageError, StorageResult};

/// In-process object store for local runs and tests.
///
/// Presigned URLs have the S3 query shape but are signed with a process-local key;
/// nothing outside this process can verify them.
#[derive(Debug)]
pub struct MemoryObjectStore {
    endpoint: String,
    bucket: String,
    signing_key: String,
    objects: RwLock<HashMap<String, Bytes>>,
}

impl MemoryObjectStore {
    pub fn new(endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            signing_key: "memory-store".to_string(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_signing_key(mut self, key: impl Into<String>) -> Self {
        self.signing_key = key.into();
        self
    }

    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }
}

#[async_trait]
impl ObjectStoreClient for MemoryObjectStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn put(&self, key: &str, body: Bytes) -> StorageResult<()> {
        self.objects.write().await.insert(key.to_string(), body);
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound { key: key.into() })
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.objects.read().await.contains_key(key))
    }

    async fn presign_get(
        &self,
        key: &str,
        issued_at: SystemTime,
        ttl: Duration,
    ) -> StorageResult<String> {
        let date = DateTime::<Utc>::from(issued_at)
            .format("%Y%m%dT%H%M%SZ")
            .to_string();
        let expires = ttl.as_secs();

        let mut hasher = Sha256::new();
        hasher.update(self.signing_key.as_bytes());
        hasher.update(b"GET\n");
        hasher.update(key.as_bytes());
        hasher.update(format!("\n{date}\n{expires}").as_bytes());
        let signature = hex::encode(hasher.finalize());

        let mut url = Url::parse(&self.endpoint).map_err(|e| {
            StorageError::Unavailable(format!("invalid endpoint {}: {e}", self.endpoint))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                StorageError::Unavailable(format!("endpoint {} cannot carry a path", self.endpoint))
            })?
            .pop_if_empty()
            .push(&self.bucket)
            .extend(key.split('/'));
        url.query_pairs_mut()
            .append_pair("X-Amz-Date", &date)
            .append_pair("X-Amz-Expires", &expires.to_string())
            .append_pair("X-Amz-Signature", &signature);

        Ok(url.to_string())
    }
}
