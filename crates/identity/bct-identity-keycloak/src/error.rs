//! Identity-provider error types.

use bct_auth_core::AuthError;
use thiserror::Error;

pub type IdentityResult<T> = Result<T, IdentityError>;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Invalid state parameter")]
    InvalidState,

    #[error("Pending login not found or expired")]
    StateNotFound,

    #[error("Missing authorization code")]
    MissingAuthorizationCode,

    #[error("Callback error: {0}")]
    CallbackError(String),

    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    #[error("Invalid token response: {0}")]
    InvalidTokenResponse(String),

    #[error("Invalid token claims: {0}")]
    Claims(#[from] jsonwebtoken::errors::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Session store error: {0}")]
    StoreError(#[from] std::io::Error),
}

impl From<IdentityError> for AuthError {
    fn from(error: IdentityError) -> Self {
        AuthError::TokenRefresh(error.to_string())
    }
}
