/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - The gateway middleware decides and inserts it into request extensions;
 *   handlers only ever receive this type
 */

/// Coarse role assigned by the gateway trust check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Load balancer / orchestrator probe on the actuator path.
    Actuator,
    /// Traffic that carried the correct gateway header.
    User,
    /// Rejected. Downstream must treat the request as unauthenticated.
    None,
}

/// Per-request authentication context. Lives exactly as long as the request.
///
/// - `principal` is the gateway header value as received (absent on probes without it)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCtx {
    pub principal: Option<String>,
    pub role: Role,
}

impl AuthCtx {
    pub fn new(principal: Option<String>, role: Role) -> Self {
        Self { principal, role }
    }

    pub fn unauthenticated() -> Self {
        Self {
            principal: None,
            role: Role::None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !matches!(self.role, Role::None)
    }
}
