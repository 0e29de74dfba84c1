//! Authentication collaborator boundary: session lookup and admin gating.
//!
//! The engine never sees credentials; it consumes an injected session-lookup
//! capability and reads the session's role string.

use crate::access::ADMIN_ROLE;
use crate::error::EngineError;
use crate::state::AppState;
use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    /// A role name or comma-separated list of role names.
    pub role: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub user: SessionUser,
}

/// Injected session-lookup capability.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn get_session(&self, headers: &HeaderMap) -> Option<Session>;
}

/// True when `role_value` (a single role or comma-separated list) carries
/// `wanted`.
pub fn carries_role(role_value: &str, wanted: &str) -> bool {
    role_value.split(',').any(|r| r.trim() == wanted)
}

/// Gate for `__admin/*` introspection routes: requires a session whose role
/// carries `admin`. Open when no session provider is configured.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, EngineError> {
    if let Some(provider) = &state.sessions {
        let session = provider
            .get_session(req.headers())
            .await
            .ok_or(EngineError::Unauthorized)?;
        if !carries_role(&session.user.role, ADMIN_ROLE) {
            return Err(EngineError::Forbidden);
        }
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carries_role_handles_lists() {
        assert!(carries_role("admin", "admin"));
        assert!(carries_role("user,admin", "admin"));
        assert!(carries_role("user, admin", "admin"));
        assert!(!carries_role("user", "admin"));
        assert!(!carries_role("administrator", "admin"));
    }
}
