/*
 * Responsibility
 * - Load environment configuration once at startup (gateway credential, object store, server)
 * - Validate values; anything missing or malformed fails startup
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderName;
use url::Url;

use crate::services::auth::digest::DigestAlgorithm;

const DEFAULT_ACTUATOR_PATH: &str = "/project/actuator";
const DEFAULT_PRESIGN_TTL_SECONDS: u64 = 30;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<String>) -> Self {
        match raw
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
    UnsupportedDigest(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
            ConfigError::UnsupportedDigest(name) => {
                write!(f, "unsupported digest algorithm: {}", name)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Shared-secret proof expected from the upstream gateway.
#[derive(Clone)]
pub struct GatewayConfig {
    pub header_name: HeaderName,
    pub secret: String,
    pub salt: String,
    pub digest: DigestAlgorithm,
    /// Requests whose path contains this are let through as actuator probes.
    pub actuator_path: String,
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("header_name", &self.header_name)
            .field("secret", &"<redacted>")
            .field("salt", &"<redacted>")
            .field("digest", &self.digest)
            .field("actuator_path", &self.actuator_path)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    S3,
    Memory,
}

#[derive(Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket: String,
    pub region: String,
    /// Public endpoint used to build object URLs, without trailing slash.
    pub endpoint: String,
    /// Endpoint the SDK talks to, for S3-compatible stores.
    pub client_endpoint: Option<String>,
    pub presign_ttl: Duration,
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("backend", &self.backend)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("client_endpoint", &self.client_endpoint)
            .field("presign_ttl", &self.presign_ttl)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub max_upload_bytes: usize,
    pub gateway: GatewayConfig,
    pub storage: StorageConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| -> Result<String, ConfigError> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let port: u16 = match lookup("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };
        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(lookup("APP_ENV"));

        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::Invalid("MAX_UPLOAD_BYTES"))?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let header_name = HeaderName::from_str(&required("GATEWAY_HEADER")?)
            .map_err(|_| ConfigError::Invalid("GATEWAY_HEADER"))?;
        let digest = match lookup("GATEWAY_DIGEST") {
            Some(raw) => DigestAlgorithm::from_str(&raw)
                .map_err(|e| ConfigError::UnsupportedDigest(e.0))?,
            None => DigestAlgorithm::default(),
        };
        // an empty probe path would exempt every request
        let actuator_path = lookup("ACTUATOR_PATH").unwrap_or_else(|| DEFAULT_ACTUATOR_PATH.into());
        if actuator_path.trim().is_empty() {
            return Err(ConfigError::Invalid("ACTUATOR_PATH"));
        }

        let gateway = GatewayConfig {
            header_name,
            secret: required("GATEWAY_SECRET")?,
            salt: required("GATEWAY_SALT")?,
            digest,
            actuator_path,
        };

        let backend = match lookup("STORAGE_BACKEND")
            .unwrap_or_else(|| "s3".into())
            .to_ascii_lowercase()
            .as_str()
        {
            "s3" => StorageBackend::S3,
            "memory" => StorageBackend::Memory,
            _ => return Err(ConfigError::Invalid("STORAGE_BACKEND")),
        };

        // credentials are only needed when talking to a real store
        let credential = |key: &'static str| match backend {
            StorageBackend::S3 => required(key),
            StorageBackend::Memory => Ok(lookup(key).unwrap_or_default()),
        };

        let endpoint = required("S3_ENDPOINT")?;
        Url::parse(&endpoint).map_err(|_| ConfigError::Invalid("S3_ENDPOINT"))?;
        let endpoint = endpoint.trim_end_matches('/').to_string();

        let client_endpoint = match lookup("S3_CLIENT_ENDPOINT").filter(|v| !v.trim().is_empty()) {
            Some(raw) => {
                Url::parse(&raw).map_err(|_| ConfigError::Invalid("S3_CLIENT_ENDPOINT"))?;
                Some(raw)
            }
            None => None,
        };

        let presign_ttl = match lookup("PRESIGN_TTL_SECONDS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|n| *n > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::Invalid("PRESIGN_TTL_SECONDS"))?,
            None => Duration::from_secs(DEFAULT_PRESIGN_TTL_SECONDS),
        };

        let storage = StorageConfig {
            backend,
            access_key_id: credential("ACCESS_KEY_ID")?,
            secret_access_key: credential("SECRET_ACCESS_KEY")?,
            bucket: required("BUCKET_NAME")?,
            region: lookup("BUCKET_REGION").unwrap_or_else(|| "us-east-1".into()),
            endpoint,
            client_endpoint,
            presign_ttl,
        };

        Ok(Self {
            addr,
            app_env,
            max_upload_bytes,
            gateway,
            storage,
        })
    }
}
