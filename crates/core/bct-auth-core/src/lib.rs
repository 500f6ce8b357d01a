//! Authentication and authorization primitives for the BCT admin console.
//!
//! This crate holds everything the route guard and the request authorizer
//! need to agree on: typed realm roles, the authorization predicate, and the
//! two seams ([`SessionContext`], [`TokenSource`]) through which they read the
//! session owned by the identity layer.

mod role;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use role::{ROLE_PREFIX, Role, RoleSet};

/// Errors that can occur during authentication or authorization.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthError {
    /// The identity-provider handshake failed at startup.
    #[error("Identity provider initialization failed: {0}")]
    InitFailure(String),

    /// No authenticated session is present.
    #[error("Authentication required")]
    Unauthenticated,

    /// The session lacks every one of the required roles.
    #[error("Insufficient roles: required any of {required:?}, has {has:?}")]
    Forbidden {
        required: Vec<String>,
        has: Vec<String>,
    },

    /// The token refresh round-trip failed.
    #[error("Token refresh failed: {0}")]
    TokenRefresh(String),
}

/// Result type for authentication operations.
pub type AuthResult<T = ()> = Result<T, AuthError>;

/// Outcome of authorizing a navigation. Derived, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizationDecision {
    Allow,
    RedirectLogin,
    RedirectUnauthorized,
}

/// Read access to the cached session plus the login side effect.
///
/// Every read is synchronous and answers from already-cached state; no
/// implementation may perform a network round trip here.
pub trait SessionContext: Send + Sync {
    fn is_authenticated(&self) -> bool;

    /// Realm roles exactly as issued by the provider.
    fn current_roles(&self) -> RoleSet;

    fn current_username(&self) -> Option<String>;

    /// Starts an interactive login. Fire-and-forget: failures are logged by
    /// the implementation.
    fn login(&self);
}

/// Source of bearer tokens for outbound requests.
#[async_trait]
pub trait TokenSource: Send + Sync {
    fn is_authenticated(&self) -> bool;

    /// Returns the current access token, refreshing it first when its
    /// remaining lifetime is below `min_validity`. `Ok(None)` means there is no
    /// session to take a token from.
    async fn ensure_fresh_token(&self, min_validity: Duration) -> AuthResult<Option<String>>;
}

/// True when the session is logged in.
pub fn is_logged_in<S: SessionContext + ?Sized>(session: &S) -> bool {
    session.is_authenticated()
}

/// True when `required` is empty or shares a role with the session.
pub fn has_any_role<S: SessionContext + ?Sized>(session: &S, required: &RoleSet) -> bool {
    required.is_empty() || required.intersects(&session.current_roles())
}

/// Pure authorization decision for a set of required roles.
pub fn authorize<S: SessionContext + ?Sized>(
    session: &S,
    required: &RoleSet,
) -> AuthorizationDecision {
    if !is_logged_in(session) {
        AuthorizationDecision::RedirectLogin
    } else if has_any_role(session, required) {
        AuthorizationDecision::Allow
    } else {
        AuthorizationDecision::RedirectUnauthorized
    }
}

/// Error-returning variant of [`authorize`].
pub fn require_any_role<S: SessionContext + ?Sized>(session: &S, required: &RoleSet) -> AuthResult {
    match authorize(session, required) {
        AuthorizationDecision::Allow => Ok(()),
        AuthorizationDecision::RedirectLogin => Err(AuthError::Unauthenticated),
        AuthorizationDecision::RedirectUnauthorized => Err(AuthError::Forbidden {
            required: required.wire_names(),
            has: session.current_roles().wire_names(),
        }),
    }
}
