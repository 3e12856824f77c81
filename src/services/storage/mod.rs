pub mod client;
pub mod factory;
pub mod memory;
pub mod reference;
pub mod s3;
pub mod service;

pub use client::{ObjectStoreClient, PresignedGrant, StorageError};
pub use factory::build_storage_service;
pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;
pub use service::StorageService;
