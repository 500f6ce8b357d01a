//! The session provider: one owned handle on identity-provider state.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bct_auth_core::{AuthResult, RoleSet, SessionContext, TokenSource};
use chrono::Utc;
use tokio::sync::{Mutex, watch};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::claims::TokenClaims;
use crate::client::IdentityClient;
use crate::config::{InitOptions, OnLoad};
use crate::error::{IdentityError, IdentityResult};
use crate::redirect::Redirector;
use crate::store::{SessionStore, StoredSession};
use crate::types::{AuthAction, AuthorizationCallback, TokenSet};

/// Snapshot of the current session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub authenticated: bool,
    pub tokens: Option<TokenSet>,
    pub claims: Option<TokenClaims>,
    pub realm_roles: RoleSet,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn from_tokens(tokens: TokenSet) -> IdentityResult<Self> {
        let claims = TokenClaims::decode(&tokens.access_token)?;
        Ok(Self {
            authenticated: true,
            realm_roles: claims.realm_roles(),
            claims: Some(claims),
            tokens: Some(tokens),
        })
    }

    pub fn access_token(&self) -> Option<&str> {
        self.tokens.as_ref().map(|t| t.access_token.as_str())
    }

    pub fn username(&self) -> Option<&str> {
        self.claims
            .as_ref()
            .and_then(|c| c.preferred_username.as_deref())
    }
}

enum Freshness {
    NoSession,
    Fresh(String),
    Stale(TokenSet),
}

/// Owns the identity-provider client state for the lifetime of the console.
///
/// The only way to obtain one is [`SessionProvider::initialize`], which
/// completes the provider handshake before returning. Anything that needs a
/// session (route guard, request authorizer) takes the returned handle, so no
/// guard can be evaluated before initialization has finished.
pub struct SessionProvider {
    client: Arc<dyn IdentityClient>,
    store: Arc<dyn SessionStore>,
    redirector: Arc<dyn Redirector>,
    state: watch::Sender<Session>,
    refresh_lock: Mutex<()>,
    /// Bumped whenever the session is replaced outside a refresh (logout,
    /// completed login). A refresh started under an older generation must
    /// not install its tokens.
    generation: AtomicU64,
}

impl SessionProvider {
    /// Performs the startup handshake. Never fails: a failed handshake is
    /// logged and leaves the session unauthenticated.
    pub async fn initialize(
        client: Arc<dyn IdentityClient>,
        store: Arc<dyn SessionStore>,
        redirector: Arc<dyn Redirector>,
        options: InitOptions,
    ) -> Arc<Self> {
        let (state, _) = watch::channel(Session::anonymous());
        let provider = Arc::new(Self {
            client,
            store,
            redirector,
            state,
            refresh_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
        });

        if options.check_login_iframe {
            debug!("Login status iframe is not available here; checkLoginIframe ignored");
        }

        match provider.handshake(options.callback.as_ref()).await {
            Ok(true) => {
                let username = provider.current_username().unwrap_or_default();
                let roles = provider.current_roles().wire_names();
                info!(%username, ?roles, "Session established");
            }
            Ok(false) => {
                info!("No existing session");
                if options.on_load == OnLoad::LoginRequired {
                    provider.login();
                }
            }
            Err(e) => {
                error!(error = %e, "Identity provider initialization failed, continuing unauthenticated");
            }
        }

        provider
    }

    async fn handshake(&self, callback: Option<&AuthorizationCallback>) -> IdentityResult<bool> {
        let mut stored = self.store.load()?;

        if let Some(callback) = callback {
            let tokens = self.complete_login(&mut stored, callback).await?;
            self.install(tokens)?;
            return Ok(true);
        }

        let Some(tokens) = stored.tokens.take() else {
            return Ok(false);
        };

        let now = Utc::now();
        if !tokens.is_expired(now) {
            self.install(tokens)?;
            return Ok(true);
        }

        match tokens.usable_refresh_token(now) {
            Some(refresh_token) => {
                debug!("Stored access token expired, refreshing");
                let response = self.client.refresh(refresh_token).await?;
                let refreshed = TokenSet::from_response(response, Utc::now(), Some(&tokens))?;
                self.install(refreshed)?;
                Ok(true)
            }
            None => {
                info!("Stored session expired");
                self.persist(|s| s.tokens = None);
                Ok(false)
            }
        }
    }

    async fn complete_login(
        &self,
        stored: &mut StoredSession,
        callback: &AuthorizationCallback,
    ) -> IdentityResult<TokenSet> {
        // A callback consumes the pending login whatever the outcome.
        let pending = stored.pending_login.take();
        self.persist(|s| s.pending_login = None);

        if let Some(error) = &callback.error {
            let description = callback
                .error_description
                .as_deref()
                .unwrap_or("No description");
            return Err(IdentityError::CallbackError(format!(
                "{}: {}",
                error, description
            )));
        }

        let pending = pending.ok_or(IdentityError::StateNotFound)?;
        if pending.state != callback.state {
            return Err(IdentityError::InvalidState);
        }
        if pending.is_expired() {
            return Err(IdentityError::StateNotFound);
        }

        let code = callback
            .code
            .as_deref()
            .ok_or(IdentityError::MissingAuthorizationCode)?;
        let response = self.client.exchange_code(code, &pending).await?;
        TokenSet::from_response(response, Utc::now(), None)
    }

    /// Replaces the in-memory session and persists the tokens.
    fn install(&self, tokens: TokenSet) -> IdentityResult<()> {
        let session = Session::from_tokens(tokens.clone())?;
        self.state.send_replace(session);
        self.persist(|s| s.tokens = Some(tokens));
        Ok(())
    }

    /// Drops the session after an unrecoverable token failure.
    fn expire(&self) {
        self.state.send_replace(Session::anonymous());
        self.persist(|s| s.tokens = None);
    }

    /// Best-effort write-through to the store; the in-memory session stays
    /// authoritative if the store fails.
    fn persist(&self, update: impl FnOnce(&mut StoredSession)) {
        let result = self.store.load().and_then(|mut stored| {
            update(&mut stored);
            self.store.save(&stored)
        });
        if let Err(e) = result {
            warn!(error = %e, "Failed to persist session");
        }
    }

    /// Current session snapshot.
    pub fn session(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Receiver that observes every session change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    pub fn claims(&self) -> Option<TokenClaims> {
        self.state.borrow().claims.clone()
    }

    fn start_flow(&self, action: AuthAction) -> IdentityResult<Url> {
        let pending = self.client.prepare_login();
        let url = self.client.authorization_url(&pending, action)?;
        let mut stored = self.store.load()?;
        stored.pending_login = Some(pending);
        self.store.save(&stored)?;
        self.redirector.redirect(&url);
        Ok(url)
    }

    /// Sends the user to the provider's login page.
    pub fn begin_login(&self) -> IdentityResult<Url> {
        self.start_flow(AuthAction::Login)
    }

    /// Sends the user to the provider's registration page.
    pub fn register(&self) -> IdentityResult<Url> {
        self.start_flow(AuthAction::Register)
    }

    /// Completes a login started by [`begin_login`](Self::begin_login) in an
    /// earlier run, for shells that receive the callback after startup.
    pub async fn handle_callback(&self, callback: &AuthorizationCallback) -> IdentityResult<()> {
        let mut stored = self.store.load()?;
        let tokens = self.complete_login(&mut stored, callback).await?;
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.install(tokens)
    }

    /// Clears the local session and its stored artifacts, then ends the
    /// provider session.
    pub fn logout(&self, redirect_target: &str) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let previous = self.state.send_replace(Session::anonymous());
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear stored session");
        }

        let id_token = previous.tokens.and_then(|t| t.id_token);
        match self.client.logout_url(id_token.as_deref(), redirect_target) {
            Ok(url) => {
                info!("Logged out");
                self.redirector.redirect(&url);
            }
            Err(e) => error!(error = %e, "Failed to build logout URL"),
        }
    }

    fn freshness(&self, min_validity: Duration) -> Freshness {
        let session = self.state.borrow();
        match &session.tokens {
            None => Freshness::NoSession,
            Some(tokens) if tokens.remaining(Utc::now()) >= min_validity => {
                Freshness::Fresh(tokens.access_token.clone())
            }
            Some(tokens) => Freshness::Stale(tokens.clone()),
        }
    }

    /// Returns an access token valid for at least `min_validity`, refreshing
    /// it when needed. `Ok(None)` when there is no session.
    ///
    /// Refreshes are single-flight: callers that arrive while a refresh is in
    /// progress wait for it and reuse its result.
    pub async fn ensure_fresh_token(&self, min_validity: Duration) -> IdentityResult<Option<String>> {
        match self.freshness(min_validity) {
            Freshness::NoSession => return Ok(None),
            Freshness::Fresh(token) => return Ok(Some(token)),
            Freshness::Stale(_) => {}
        }

        let _guard = self.refresh_lock.lock().await;

        let stale = match self.freshness(min_validity) {
            Freshness::NoSession => return Ok(None),
            Freshness::Fresh(token) => return Ok(Some(token)),
            Freshness::Stale(tokens) => tokens,
        };
        let generation = self.generation.load(Ordering::SeqCst);

        let Some(refresh_token) = stale.usable_refresh_token(Utc::now()) else {
            warn!("Access token expiring and no usable refresh token, ending session");
            self.expire();
            return Err(IdentityError::TokenRefreshFailed(
                "no usable refresh token".to_string(),
            ));
        };

        let result = self.client.refresh(refresh_token).await;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Session replaced during refresh, discarding refresh result");
            return match self.freshness(min_validity) {
                Freshness::NoSession => Ok(None),
                Freshness::Fresh(token) => Ok(Some(token)),
                Freshness::Stale(_) => Err(IdentityError::TokenRefreshFailed(
                    "session replaced during refresh".to_string(),
                )),
            };
        }

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Token refresh failed, ending session");
                self.expire();
                return Err(e);
            }
        };

        let refreshed = TokenSet::from_response(response, Utc::now(), Some(&stale))?;
        let token = refreshed.access_token.clone();
        self.install(refreshed)?;
        debug!("Token refreshed");
        Ok(Some(token))
    }
}

impl SessionContext for SessionProvider {
    fn is_authenticated(&self) -> bool {
        self.state.borrow().authenticated
    }

    fn current_roles(&self) -> RoleSet {
        self.state.borrow().realm_roles.clone()
    }

    fn current_username(&self) -> Option<String> {
        self.state.borrow().username().map(str::to_string)
    }

    fn login(&self) {
        if let Err(e) = self.begin_login() {
            error!(error = %e, "Failed to start login");
        }
    }
}

#[async_trait]
impl TokenSource for SessionProvider {
    fn is_authenticated(&self) -> bool {
        SessionContext::is_authenticated(self)
    }

    async fn ensure_fresh_token(&self, min_validity: Duration) -> AuthResult<Option<String>> {
        SessionProvider::ensure_fresh_token(self, min_validity)
            .await
            .map_err(Into::into)
    }
}
