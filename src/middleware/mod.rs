/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth::gateway: trust boundary (every request)
 * - http / security_headers: transport-level concerns
 */
pub mod auth;
pub mod http;
pub mod security_headers;
