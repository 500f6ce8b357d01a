//! Keycloak OpenID Connect client with PKCE support.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, thread_rng};
use reqwest::Client;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info};
use url::Url;

use crate::config::{KeycloakConfig, PkceMethod};
use crate::error::{IdentityError, IdentityResult};
use crate::state::PendingLogin;
use crate::types::{AuthAction, TokenResponse};

/// PKCE code challenge and verifier
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    pub code_verifier: String,
    pub code_challenge: String,
    pub code_challenge_method: PkceMethod,
}

impl Default for PkceChallenge {
    fn default() -> Self {
        Self::new()
    }
}

impl PkceChallenge {
    /// Generate a new PKCE challenge
    pub fn new() -> Self {
        Self::from_verifier(Self::generate_code_verifier())
    }

    /// Rebuild the challenge for a stored verifier.
    pub fn from_verifier(code_verifier: String) -> Self {
        let code_challenge = Self::generate_code_challenge(&code_verifier);
        Self {
            code_verifier,
            code_challenge,
            code_challenge_method: PkceMethod::S256,
        }
    }

    fn generate_code_verifier() -> String {
        let mut rng = thread_rng();
        let bytes: Vec<u8> = (0..64).map(|_| rng.r#gen::<u8>()).collect();
        URL_SAFE_NO_PAD.encode(bytes)
    }

    fn generate_code_challenge(verifier: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(verifier.as_bytes());
        let result = hasher.finalize();
        URL_SAFE_NO_PAD.encode(result)
    }
}

/// The identity-provider surface the session provider depends on.
#[async_trait]
pub trait IdentityClient: Send + Sync {
    /// Creates the state and PKCE verifier for a new interactive flow.
    fn prepare_login(&self) -> PendingLogin;

    /// URL of the provider's login or registration page.
    fn authorization_url(&self, pending: &PendingLogin, action: AuthAction)
    -> IdentityResult<Url>;

    /// Exchanges an authorization code for tokens.
    async fn exchange_code(&self, code: &str, pending: &PendingLogin)
    -> IdentityResult<TokenResponse>;

    /// Trades a refresh token for a new token set.
    async fn refresh(&self, refresh_token: &str) -> IdentityResult<TokenResponse>;

    /// URL that ends the provider session and comes back to `redirect_target`.
    fn logout_url(&self, id_token_hint: Option<&str>, redirect_target: &str)
    -> IdentityResult<Url>;
}

/// HTTP client for one Keycloak realm.
#[derive(Clone)]
pub struct KeycloakClient {
    http_client: Client,
    config: KeycloakConfig,
}

impl KeycloakClient {
    pub fn new(config: KeycloakConfig) -> IdentityResult<Self> {
        config.validate()?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .build()?;

        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn config(&self) -> &KeycloakConfig {
        &self.config
    }

    async fn token_request(
        &self,
        params: &HashMap<&str, &str>,
    ) -> IdentityResult<Result<TokenResponse, String>> {
        let response = self
            .http_client
            .post(self.config.endpoint("token")?)
            .form(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Ok(Err(format!("{}: {}", status, error_text)));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::InvalidTokenResponse(e.to_string()))?;

        Ok(Ok(token_response))
    }
}

#[async_trait]
impl IdentityClient for KeycloakClient {
    fn prepare_login(&self) -> PendingLogin {
        PendingLogin::new(
            self.config.redirect_uri.clone(),
            PkceChallenge::new().code_verifier,
            self.config.pending_login_ttl_seconds,
        )
    }

    fn authorization_url(
        &self,
        pending: &PendingLogin,
        action: AuthAction,
    ) -> IdentityResult<Url> {
        let endpoint = match action {
            AuthAction::Login => "auth",
            AuthAction::Register => "registrations",
        };
        let mut url = self.config.endpoint(endpoint)?;
        let pkce = PkceChallenge::from_verifier(pending.code_verifier.clone());

        {
            let mut params = url.query_pairs_mut();
            params.append_pair("client_id", &self.config.client_id);
            params.append_pair("redirect_uri", &pending.redirect_uri);
            params.append_pair("state", &pending.state);
            params.append_pair("response_mode", "query");
            params.append_pair("response_type", "code");
            if !self.config.scopes.is_empty() {
                params.append_pair("scope", &self.config.scopes.join(" "));
            }
            params.append_pair("code_challenge", &pkce.code_challenge);
            params.append_pair("code_challenge_method", pkce.code_challenge_method.as_str());
        }

        debug!(realm = %self.config.realm, ?action, "Generated authorization URL");
        Ok(url)
    }

    async fn exchange_code(
        &self,
        code: &str,
        pending: &PendingLogin,
    ) -> IdentityResult<TokenResponse> {
        let mut params = HashMap::new();
        params.insert("grant_type", "authorization_code");
        params.insert("code", code);
        params.insert("client_id", self.config.client_id.as_str());
        params.insert("redirect_uri", pending.redirect_uri.as_str());
        params.insert("code_verifier", pending.code_verifier.as_str());

        match self.token_request(&params).await? {
            Ok(tokens) => {
                info!("Successfully exchanged code for tokens");
                Ok(tokens)
            }
            Err(error_text) => {
                error!("Token exchange failed: {}", error_text);
                Err(IdentityError::TokenExchangeFailed(error_text))
            }
        }
    }

    async fn refresh(&self, refresh_token: &str) -> IdentityResult<TokenResponse> {
        let mut params = HashMap::new();
        params.insert("grant_type", "refresh_token");
        params.insert("refresh_token", refresh_token);
        params.insert("client_id", self.config.client_id.as_str());

        match self.token_request(&params).await? {
            Ok(tokens) => {
                debug!("Access token refreshed");
                Ok(tokens)
            }
            Err(error_text) => {
                error!("Token refresh failed: {}", error_text);
                Err(IdentityError::TokenRefreshFailed(error_text))
            }
        }
    }

    fn logout_url(
        &self,
        id_token_hint: Option<&str>,
        redirect_target: &str,
    ) -> IdentityResult<Url> {
        let mut url = self.config.endpoint("logout")?;
        {
            let mut params = url.query_pairs_mut();
            params.append_pair("client_id", &self.config.client_id);
            params.append_pair("post_logout_redirect_uri", redirect_target);
            if let Some(hint) = id_token_hint {
                params.append_pair("id_token_hint", hint);
            }
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> KeycloakClient {
        KeycloakClient::new(KeycloakConfig::new(
            "https://sso.example.com",
            "bct",
            "bct-frontend",
        ))
        .unwrap()
    }

    #[test]
    fn test_pkce_generation() {
        let pkce1 = PkceChallenge::new();
        let pkce2 = PkceChallenge::new();

        assert_ne!(pkce1.code_verifier, pkce2.code_verifier);
        assert_ne!(pkce1.code_challenge, pkce2.code_challenge);
        assert_eq!(pkce1.code_challenge_method, PkceMethod::S256);

        let rebuilt = PkceChallenge::from_verifier(pkce1.code_verifier.clone());
        assert_eq!(rebuilt.code_challenge, pkce1.code_challenge);
    }

    #[test]
    fn test_authorization_url_generation() {
        let client = client();
        let pending = client.prepare_login();

        let url = client
            .authorization_url(&pending, AuthAction::Login)
            .unwrap();

        assert_eq!(url.host_str(), Some("sso.example.com"));
        assert_eq!(url.path(), "/realms/bct/protocol/openid-connect/auth");

        let params: HashMap<_, _> = url.query_pairs().collect();
        assert_eq!(params.get("response_type"), Some(&"code".into()));
        assert_eq!(params.get("client_id"), Some(&"bct-frontend".into()));
        assert_eq!(
            params.get("redirect_uri"),
            Some(&"http://localhost:4200".into())
        );
        assert_eq!(params.get("state"), Some(&pending.state.as_str().into()));
        assert_eq!(params.get("scope"), Some(&"openid".into()));
        assert_eq!(params.get("code_challenge_method"), Some(&"S256".into()));
        assert_eq!(
            params.get("code_challenge"),
            Some(&PkceChallenge::generate_code_challenge(&pending.code_verifier).into())
        );
    }

    #[test]
    fn test_registration_url_uses_registrations_endpoint() {
        let client = client();
        let pending = client.prepare_login();
        let url = client
            .authorization_url(&pending, AuthAction::Register)
            .unwrap();
        assert_eq!(
            url.path(),
            "/realms/bct/protocol/openid-connect/registrations"
        );
    }

    #[test]
    fn test_logout_url() {
        let url = client()
            .logout_url(Some("id-token"), "http://localhost:4200")
            .unwrap();
        let params: HashMap<_, _> = url.query_pairs().collect();

        assert_eq!(url.path(), "/realms/bct/protocol/openid-connect/logout");
        assert_eq!(
            params.get("post_logout_redirect_uri"),
            Some(&"http://localhost:4200".into())
        );
        assert_eq!(params.get("id_token_hint"), Some(&"id-token".into()));
    }
}
