/*
 * Responsibility
 * - Screenshot / data model files: upload, download, presigned read grants
 * - Every handler requires an authenticated gateway context (AuthCtxExtractor)
 */
use std::time::Duration;

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
};

use crate::{
    api::v1::{
        dto::files::{
            PresignRequest, PresignResponse, ResolveRequest, ResolveResponse, ResolvedKey,
            UploadResponse,
        },
        extractors::AuthCtxExtractor,
    },
    error::AppError,
    state::AppState,
};

/// Multipart upload. Every part with a file name is stored under that name;
/// plain form fields are ignored.
///
/// Stops at the first rejected name or failed write and returns only the error. Parts
/// stored before that point stay in the bucket; re-uploading under the same names
/// overwrites them.
pub async fn upload_files(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    tracing::debug!(role = ?ctx.role, via_gateway = ctx.principal.is_some(), "upload requested");
    let mut urls = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request("INVALID_MULTIPART", e.body_text()))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::bad_request("INVALID_MULTIPART", e.body_text()))?;

        match state.storage.upload(&file_name, data).await {
            Ok(url) => urls.push(url),
            Err(err) => {
                if !urls.is_empty() {
                    tracing::warn!(
                        stored = urls.len(),
                        failed = %file_name,
                        "upload aborted, earlier parts remain stored"
                    );
                }
                return Err(err.into());
            }
        }
    }

    if urls.is_empty() {
        return Err(AppError::bad_request(
            "NO_FILES",
            "request contained no file parts",
        ));
    }

    Ok((StatusCode::CREATED, Json(UploadResponse { urls })))
}

pub async fn download_file(
    State(state): State<AppState>,
    AuthCtxExtractor(_ctx): AuthCtxExtractor,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let content = state.storage.download(&key).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    if let Some(disposition) = attachment_disposition(&key) {
        headers.insert(header::CONTENT_DISPOSITION, disposition);
    }

    Ok((headers, content))
}

/// `attachment; filename="..."` from the last key segment. Quotes and control characters
/// are dropped; `None` if nothing usable is left.
fn attachment_disposition(key: &str) -> Option<HeaderValue> {
    let file_name: String = key
        .rsplit('/')
        .next()
        .unwrap_or(key)
        .chars()
        .filter(|c| *c != '"' && *c != '\\' && !c.is_control())
        .collect();
    if file_name.trim().is_empty() {
        return None;
    }

    HeaderValue::from_str(&format!("attachment; filename=\"{file_name}\"")).ok()
}

/// Resolve stored object URLs and mint read grants for them. All or nothing.
pub async fn presign_files(
    State(state): State<AppState>,
    AuthCtxExtractor(_ctx): AuthCtxExtractor,
    Json(req): Json<PresignRequest>,
) -> Result<Json<PresignResponse>, AppError> {
    let ttl = req
        .ttl_seconds
        .map(Duration::from_secs)
        .unwrap_or_else(|| state.storage.default_ttl());

    let grants = state.storage.presign_urls(&req.urls, ttl).await?;

    Ok(Json(PresignResponse { grants }))
}

pub async fn resolve_files(
    State(state): State<AppState>,
    AuthCtxExtractor(_ctx): AuthCtxExtractor,
    Json(req): Json<ResolveRequest>,
) -> Result<Json<ResolveResponse>, AppError> {
    let keys = state
        .storage
        .resolve_keys(&req.urls)
        .into_iter()
        .zip(req.urls)
        .map(|(result, url)| match result {
            Ok(key) => ResolvedKey {
                url,
                key: Some(key),
                error: None,
            },
            Err(err) => ResolvedKey {
                url,
                key: None,
                error: Some(err.to_string()),
            },
        })
        .collect();

    Ok(Json(ResolveResponse { keys }))
}
