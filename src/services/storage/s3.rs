use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use aws_sdk_s3::{
    Client,
    config::{BehaviorVersion, Builder, Credentials, Region},
    error::DisplayErrorContext,
    presigning::PresigningConfig,
    primitives::ByteStream,
};
use axum::body::Bytes;

use crate::config::StorageConfig;
use crate::services::storage::client::{ObjectStoreClient, StorageError, StorageResult};

/// S3-backed object store client.
///
/// Static credentials stay inside the SDK client; callers only ever see signed URLs.
#[derive(Clone, Debug)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(config: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "project-gate-config",
        );

        let mut builder = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials);

        // S3-compatible stores (MinIO etc.) generally need path-style addressing
        if let Some(endpoint) = &config.client_endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
        }
    }
}

fn unavailable<E: std::error::Error>(err: E) -> StorageError {
    StorageError::Unavailable(DisplayErrorContext(err).to_string())
}

#[async_trait]
impl ObjectStoreClient for S3ObjectStore {
    fn backend_name(&self) -> &'static str {
        "s3"
    }

    async fn put(&self, key: &str, body: Bytes) -> StorageResult<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(unavailable)?;

        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) if err.as_service_error().is_some_and(|e| e.is_no_such_key()) => {
                return Err(StorageError::NotFound { key: key.into() });
            }
            Err(err) => return Err(unavailable(err)),
        };

        let data = output.body.collect().await.map_err(unavailable)?;
        Ok(data.into_bytes())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) if err.as_service_error().is_some_and(|e| e.is_not_found()) => Ok(false),
            Err(err) => Err(unavailable(err)),
        }
    }

    async fn presign_get(
        &self,
        key: &str,
        issued_at: SystemTime,
        ttl: Duration,
    ) -> StorageResult<String> {
        let presigning = PresigningConfig::builder()
            .start_time(issued_at)
            .expires_in(ttl)
            .build()
            .map_err(|_| StorageError::InvalidTtl {
                seconds: ttl.as_secs(),
            })?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(unavailable)?;

        Ok(request.uri().to_string())
    }
}
