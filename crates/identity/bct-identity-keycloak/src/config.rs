//! Keycloak client and init configuration.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{IdentityError, IdentityResult};
use crate::types::AuthorizationCallback;

/// Connection settings for one Keycloak realm and public client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeycloakConfig {
    /// Base URL of the Keycloak server, without the `/realms` suffix.
    pub server_url: String,
    pub realm: String,
    pub client_id: String,
    /// Where the provider sends the browser back after login.
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub http_timeout_seconds: u64,
    /// How long a started login may wait for its callback.
    pub pending_login_ttl_seconds: u64,
}

impl Default for KeycloakConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8080".to_string(),
            realm: "bct".to_string(),
            client_id: "bct-frontend".to_string(),
            redirect_uri: "http://localhost:4200".to_string(),
            scopes: vec!["openid".to_string()],
            http_timeout_seconds: 30,
            pending_login_ttl_seconds: 600, // 10 minutes
        }
    }
}

impl KeycloakConfig {
    pub fn new(
        server_url: impl Into<String>,
        realm: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            realm: realm.into(),
            client_id: client_id.into(),
            ..Self::default()
        }
    }

    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = redirect_uri.into();
        self
    }

    pub fn with_http_timeout(mut self, seconds: u64) -> Self {
        self.http_timeout_seconds = seconds;
        self
    }

    /// `{server}/realms/{realm}/protocol/openid-connect/{endpoint}`
    pub fn endpoint(&self, endpoint: &str) -> IdentityResult<Url> {
        let base = self.server_url.trim_end_matches('/');
        let url = Url::parse(&format!(
            "{}/realms/{}/protocol/openid-connect/{}",
            base, self.realm, endpoint
        ))?;
        Ok(url)
    }

    pub fn validate(&self) -> IdentityResult<()> {
        if self.realm.is_empty() {
            return Err(IdentityError::ConfigError("realm cannot be empty".to_string()));
        }
        if self.client_id.is_empty() {
            return Err(IdentityError::ConfigError(
                "client_id cannot be empty".to_string(),
            ));
        }
        Url::parse(&self.server_url)?;
        Url::parse(&self.redirect_uri)?;
        Ok(())
    }
}

/// What the handshake does when no session exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnLoad {
    /// Restore a session silently if one exists.
    #[default]
    CheckSso,
    /// Start an interactive login immediately.
    LoginRequired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PkceMethod {
    #[default]
    S256,
}

impl PkceMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PkceMethod::S256 => "S256",
        }
    }
}

/// Options for the one-time startup handshake.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InitOptions {
    pub on_load: OnLoad,
    /// Session-status iframe polling. Accepted for compatibility, never used
    /// outside a browser.
    pub check_login_iframe: bool,
    pub pkce_method: PkceMethod,
    /// Redirect parameters received from the provider, when the console is
    /// being loaded as the end of a login.
    #[serde(skip)]
    pub callback: Option<AuthorizationCallback>,
}

impl InitOptions {
    pub fn check_sso() -> Self {
        Self::default()
    }

    pub fn login_required() -> Self {
        Self {
            on_load: OnLoad::LoginRequired,
            ..Self::default()
        }
    }

    pub fn with_callback(mut self, callback: AuthorizationCallback) -> Self {
        self.callback = Some(callback);
        self
    }
}
