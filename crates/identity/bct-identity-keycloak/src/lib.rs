//! Keycloak-backed session provider for the BCT admin console.
//!
//! [`SessionProvider::initialize`] runs the OpenID Connect handshake
//! (authorization code with PKCE) once at startup and hands back the shared
//! session handle. The handle answers synchronous questions about the current
//! user for route guards, and hands out access tokens refreshed on demand for
//! outbound requests.

mod claims;
mod client;
mod config;
mod error;
mod redirect;
mod session;
mod state;
mod store;
mod types;

#[cfg(test)]
mod tests;

pub use claims::{RealmAccess, TokenClaims};
pub use client::{IdentityClient, KeycloakClient, PkceChallenge};
pub use config::{InitOptions, KeycloakConfig, OnLoad, PkceMethod};
pub use error::{IdentityError, IdentityResult};
pub use redirect::{RecordingRedirector, Redirector};
pub use session::{Session, SessionProvider};
pub use state::PendingLogin;
pub use store::{FileSessionStore, MemorySessionStore, SessionStore, StoredSession};
pub use types::{AuthAction, AuthorizationCallback, TokenResponse, TokenSet};
