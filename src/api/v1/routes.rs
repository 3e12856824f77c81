/*
 * Responsibility
 * - v1 の URL 構造を定義 (mounted under /project by app.rs)
 * - The gateway check wraps all of it in app.rs; actuator routes rely on the exempt path
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use crate::api::v1::handlers::{
    actuator::{health, info},
    files::{download_file, presign_files, resolve_files, upload_files},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/actuator/health", get(health))
        .route("/actuator/info", get(info))
        .route("/files", post(upload_files))
        .route("/files/{*key}", get(download_file))
        .route("/presign", post(presign_files))
        .route("/resolve", post(resolve_files))
}
