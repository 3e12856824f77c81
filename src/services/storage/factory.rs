/// Factory: build `StorageService` from application `Config`.
use std::sync::Arc;

use crate::config::{StorageBackend, StorageConfig};
use crate::services::storage::{
    MemoryObjectStore, ObjectStoreClient, S3ObjectStore, StorageService,
};

pub fn build_storage_service(config: &StorageConfig) -> Arc<StorageService> {
    let client: Arc<dyn ObjectStoreClient> = match config.backend {
        StorageBackend::S3 => Arc::new(S3ObjectStore::new(config)),
        StorageBackend::Memory => {
            let store = MemoryObjectStore::new(&config.endpoint, &config.bucket);
            let store = if config.secret_access_key.is_empty() {
                store
            } else {
                store.with_signing_key(&config.secret_access_key)
            };
            Arc::new(store)
        }
    };

    tracing::info!(
        backend = client.backend_name(),
        bucket = %config.bucket,
        endpoint = %config.endpoint,
        "object store client ready"
    );

    Arc::new(StorageService::new(
        client,
        &config.endpoint,
        &config.bucket,
        config.presign_ttl,
    ))
}
