use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::services::auth::SubversionAttempt;
use crate::state::AppState;

use super::AuthCtx;

/// Handler で、認証済みの AuthCtx を受け取るための extractor
///
/// The gateway middleware never short-circuits; this is where an unauthenticated request
/// actually gets turned away. A missing context (middleware not applied) is treated the same.
#[derive(Debug)]
pub struct AuthCtxExtractor(pub AuthCtx);

impl FromRequestParts<AppState> for AuthCtxExtractor
where
    AppState: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<AuthCtx>() {
            Some(ctx) if ctx.is_authenticated() => Ok(AuthCtxExtractor(ctx.clone())),
            _ => {
                let attempt = parts
                    .extensions
                    .get::<SubversionAttempt>()
                    .cloned()
                    .unwrap_or_else(|| SubversionAttempt {
                        header_value: None,
                        caller: "unknown".into(),
                    });
                Err(AppError::SubversionAttempt(attempt))
            }
        }
    }
}
