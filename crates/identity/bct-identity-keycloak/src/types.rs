//! OpenID Connect protocol types.

use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::claims::TokenClaims;
use crate::error::{IdentityError, IdentityResult};

/// Which provider page an interactive flow starts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAction {
    Login,
    Register,
}

/// Redirect parameters handed back by the provider after login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationCallback {
    pub code: Option<String>,
    pub state: String,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl AuthorizationCallback {
    pub fn new(code: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            state: state.into(),
            error: None,
            error_description: None,
        }
    }

    /// Extracts callback parameters from a redirect URL. Keycloak answers in
    /// the fragment by default and in the query with `response_mode=query`;
    /// both are accepted.
    pub fn from_redirect_url(url: &Url) -> Option<Self> {
        let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        if let Some(fragment) = url.fragment() {
            pairs.extend(url::form_urlencoded::parse(fragment.as_bytes()).into_owned());
        }

        let get = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        };

        let state = get("state")?;
        Some(Self {
            code: get("code"),
            state,
            error: get("error"),
            error_description: get("error_description"),
        })
    }
}

/// Token endpoint response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: Option<u64>,
    pub refresh_token: Option<String>,
    pub refresh_expires_in: Option<u64>,
    pub scope: Option<String>,
    pub id_token: Option<String>,
}

/// Tokens held for the current session, with absolute expiry times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub refresh_expires_at: Option<DateTime<Utc>>,
}

/// `issued_at + seconds`, rejecting lifetimes no timestamp can hold.
fn lifetime_end(issued_at: DateTime<Utc>, seconds: u64, field: &str) -> IdentityResult<DateTime<Utc>> {
    i64::try_from(seconds)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
        .ok_or_else(|| {
            IdentityError::InvalidTokenResponse(format!("{} out of range: {}", field, seconds))
        })
}

impl TokenSet {
    /// Builds a token set from a token endpoint response received at
    /// `issued_at`. Fields the response leaves out are carried over from
    /// `previous` (Keycloak omits the id token on refresh).
    pub fn from_response(
        response: TokenResponse,
        issued_at: DateTime<Utc>,
        previous: Option<&TokenSet>,
    ) -> IdentityResult<Self> {
        let expires_at = match response.expires_in {
            Some(seconds) => lifetime_end(issued_at, seconds, "expires_in")?,
            None => TokenClaims::decode(&response.access_token)?
                .expires_at()
                .ok_or_else(|| {
                    IdentityError::InvalidTokenResponse(
                        "no expires_in and no exp claim".to_string(),
                    )
                })?,
        };

        let refresh_rotated = response.refresh_token.is_some();
        let refresh_token = response
            .refresh_token
            .or_else(|| previous.and_then(|p| p.refresh_token.clone()));

        // A refresh lifetime of zero marks an offline token without expiry.
        let refresh_expires_at = match response.refresh_expires_in {
            Some(0) => None,
            Some(seconds) => Some(lifetime_end(issued_at, seconds, "refresh_expires_in")?),
            None if !refresh_rotated => previous.and_then(|p| p.refresh_expires_at),
            None => None,
        };

        Ok(Self {
            access_token: response.access_token,
            refresh_token,
            id_token: response
                .id_token
                .or_else(|| previous.and_then(|p| p.id_token.clone())),
            expires_at,
            refresh_expires_at,
        })
    }

    /// Remaining access-token lifetime, zero once expired.
    pub fn remaining(&self, now: DateTime<Utc>) -> StdDuration {
        (self.expires_at - now).to_std().unwrap_or(StdDuration::ZERO)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// The refresh token, if there is one and it has not expired.
    pub fn usable_refresh_token(&self, now: DateTime<Utc>) -> Option<&str> {
        match self.refresh_expires_at {
            Some(expiry) if expiry <= now => None,
            _ => self.refresh_token.as_deref(),
        }
    }
}
