//! Gateway identity digest.
//!
//! The upstream gateway proves itself by sending `hex(H(salt || secret))` in a shared header.
//! This module computes that value. The algorithm is chosen by name at startup; an unknown
//! name is a configuration error, never an empty digest.

use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256, Sha512};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigestAlgorithm {
    Sha256,
    #[default]
    Sha512,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported digest algorithm: {0}")]
pub struct UnsupportedDigest(pub String);

impl FromStr for DigestAlgorithm {
    type Err = UnsupportedDigest;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "sha-512" | "sha512" => Ok(Self::Sha512),
            "sha-256" | "sha256" => Ok(Self::Sha256),
            other => Err(UnsupportedDigest(other.to_string())),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha256 => f.write_str("sha-256"),
            Self::Sha512 => f.write_str("sha-512"),
        }
    }
}

impl DigestAlgorithm {
    /// Length of the hex rendering produced by [`DigestAlgorithm::hash`].
    pub fn hex_len(&self) -> usize {
        match self {
            Self::Sha256 => 64,
            Self::Sha512 => 128,
        }
    }

    /// Digest of `salt || secret` as lowercase hex.
    pub fn hash(&self, secret: &str, salt: &str) -> String {
        match self {
            Self::Sha256 => salted::<Sha256>(secret, salt),
            Self::Sha512 => salted::<Sha512>(secret, salt),
        }
    }
}

fn salted<D: Digest>(secret: &str, salt: &str) -> String {
    let mut hasher = D::new();
    hasher.update(salt.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}
