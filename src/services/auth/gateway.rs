//! Gateway trust decision.
//!
//! Decides, from the request path and headers alone, whether a request came through the
//! upstream gateway. HTTP wiring (extensions, response status) lives in
//! `middleware::auth::gateway`; this type stays framework-free so it can be tested directly.

use std::fmt;
use std::net::SocketAddr;

use axum::http::{HeaderMap, HeaderName};
use subtle::ConstantTimeEq;

use crate::config::GatewayConfig;

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Outcome of inspecting one request. Terminal: a request gets exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Health/metadata probe path. Header is not checked.
    Actuator { header_value: Option<String> },
    /// Header matches the expected gateway digest.
    User { header_value: String },
    /// Header missing or wrong outside the probe path.
    Rejected(SubversionAttempt),
}

/// A request that tried to reach protected logic without the gateway header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubversionAttempt {
    pub header_value: Option<String>,
    pub caller: String,
}

impl fmt::Display for SubversionAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.header_value {
            Some(v) => write!(f, "gateway header mismatch from {} (header: {:?})", self.caller, v),
            None => write!(f, "gateway header missing from {}", self.caller),
        }
    }
}

/// Precomputed gateway check. Built once from the immutable [`GatewayConfig`].
#[derive(Clone)]
pub struct GatewayGate {
    header_name: HeaderName,
    expected: String,
    actuator_path: String,
}

impl fmt::Debug for GatewayGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // expected digest is a credential
        f.debug_struct("GatewayGate")
            .field("header_name", &self.header_name)
            .field("actuator_path", &self.actuator_path)
            .finish()
    }
}

impl GatewayGate {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            header_name: config.header_name.clone(),
            expected: config.digest.hash(&config.secret, &config.salt),
            actuator_path: config.actuator_path.clone(),
        }
    }

    pub fn header_name(&self) -> &HeaderName {
        &self.header_name
    }

    pub fn decide(
        &self,
        path: &str,
        headers: &HeaderMap,
        remote: Option<SocketAddr>,
    ) -> GateDecision {
        let header_value = headers
            .get(&self.header_name)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());

        if path.contains(&self.actuator_path) {
            return GateDecision::Actuator { header_value };
        }

        match header_value {
            Some(value) if self.matches(&value) => GateDecision::User {
                header_value: value,
            },
            header_value => GateDecision::Rejected(SubversionAttempt {
                header_value,
                caller: caller_address(headers, remote),
            }),
        }
    }

    fn matches(&self, value: &str) -> bool {
        self.expected.as_bytes().ct_eq(value.as_bytes()).into()
    }
}

/// Caller address for audit: first `X-Forwarded-For` hop, else the socket peer.
pub fn caller_address(headers: &HeaderMap, remote: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    match (forwarded, remote) {
        (Some(ip), _) => ip.to_string(),
        (None, Some(addr)) => addr.ip().to_string(),
        (None, None) => "unknown".to_string(),
    }
}
