//! Gateway trust middleware → AuthCtx を extensions に入れる
//!
//! Every request passes through here exactly once and always continues down the stack:
//! - actuator path: `Role::Actuator`, header not checked (ELB health checks must get through,
//!   or the instance gets replaced)
//! - correct gateway header: `Role::User`
//! - anything else: `Role::None` + `SubversionAttempt` in extensions, response forced to 401
//!
//! Rejection does not short-circuit. Handlers that need an authenticated caller take
//! `AuthCtxExtractor`, which refuses `Role::None`.

use std::net::SocketAddr;

use axum::{
    Router,
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::{AuthCtx, Role};
use crate::services::auth::GateDecision;
use crate::state::AppState;

/// Put the gateway check in front of every route of `router`.
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, gateway_middleware))
}

async fn gateway_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let remote = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let decision = state.gate.decide(req.uri().path(), req.headers(), remote);

    // whatever was there before, this layer owns the decision
    req.extensions_mut().remove::<AuthCtx>();

    let rejected = match decision {
        GateDecision::Actuator { header_value } => {
            req.extensions_mut()
                .insert(AuthCtx::new(header_value, Role::Actuator));
            false
        }
        GateDecision::User { header_value } => {
            req.extensions_mut()
                .insert(AuthCtx::new(Some(header_value), Role::User));
            false
        }
        GateDecision::Rejected(attempt) => {
            tracing::warn!(
                caller = %attempt.caller,
                header = ?attempt.header_value,
                path = %req.uri().path(),
                "gateway subversion attempt"
            );
            req.extensions_mut().insert(AuthCtx::unauthenticated());
            req.extensions_mut().insert(attempt);
            true
        }
    };

    let mut response = next.run(req).await;
    if rejected {
        *response.status_mut() = StatusCode::UNAUTHORIZED;
    }
    response
}
