//! Object URL format: `{endpoint}/{bucket}/{key}`.
//!
//! Uploads hand out URLs in this form and they get stored with project records.
//! Anything turning those URLs back into keys must agree on the exact prefix.

use crate::services::storage::client::{StorageError, StorageResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectReference {
    pub bucket: String,
    pub key: String,
}

#[derive(Debug, Clone)]
pub struct ObjectUrl {
    bucket: String,
    prefix: String,
}

impl ObjectUrl {
    pub fn new(endpoint: &str, bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            prefix: format!("{}/{}/", endpoint.trim_end_matches('/'), bucket),
        }
    }

    pub fn url_for(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Whether `key` survives a `url_for` / `resolve` round trip.
    pub fn accepts_key(&self, key: &str) -> bool {
        !key.trim().is_empty() && !key.contains(self.prefix.as_str())
    }

    /// Strip the endpoint/bucket prefix. Rejects rather than guesses: a URL for another
    /// bucket or host, an empty key, or a key that still carries the prefix is invalid.
    pub fn resolve(&self, url: &str) -> StorageResult<ObjectReference> {
        let key = url
            .strip_prefix(self.prefix.as_str())
            .filter(|key| self.accepts_key(key))
            .ok_or_else(|| StorageError::invalid_reference(url))?;

        Ok(ObjectReference {
            bucket: self.bucket.clone(),
            key: key.to_string(),
        })
    }
}
