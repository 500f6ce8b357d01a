//! Outbound request authorization.
//!
//! [`AuthorizeRequestLayer`] wraps any `Service<reqwest::Request>`, usually a
//! `reqwest::Client`, so that every request leaving the console carries the
//! session's bearer token, refreshed first when it is about to expire.

use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use bct_auth_core::TokenSource;
use futures::future::BoxFuture;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use tower::{Layer, Service};
use tracing::{debug, warn};

use crate::error::ApiError;

/// Minimum remaining token lifetime before a request triggers a refresh.
pub const MIN_TOKEN_VALIDITY: Duration = Duration::from_secs(30);

pub struct AuthorizeRequestLayer<T: ?Sized> {
    tokens: Arc<T>,
    min_validity: Duration,
}

impl<T: ?Sized> Clone for AuthorizeRequestLayer<T> {
    fn clone(&self) -> Self {
        Self {
            tokens: Arc::clone(&self.tokens),
            min_validity: self.min_validity,
        }
    }
}

impl<T: TokenSource + ?Sized> AuthorizeRequestLayer<T> {
    pub fn new(tokens: Arc<T>) -> Self {
        Self {
            tokens,
            min_validity: MIN_TOKEN_VALIDITY,
        }
    }

    pub fn with_min_validity(mut self, min_validity: Duration) -> Self {
        self.min_validity = min_validity;
        self
    }
}

impl<S, T: ?Sized> Layer<S> for AuthorizeRequestLayer<T> {
    type Service = AuthorizeRequest<S, T>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthorizeRequest {
            inner,
            tokens: Arc::clone(&self.tokens),
            min_validity: self.min_validity,
        }
    }
}

/// Service produced by [`AuthorizeRequestLayer`].
pub struct AuthorizeRequest<S, T: ?Sized> {
    inner: S,
    tokens: Arc<T>,
    min_validity: Duration,
}

impl<S: Clone, T: ?Sized> Clone for AuthorizeRequest<S, T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            tokens: Arc::clone(&self.tokens),
            min_validity: self.min_validity,
        }
    }
}

impl<S, T> Service<reqwest::Request> for AuthorizeRequest<S, T>
where
    S: Service<reqwest::Request> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Into<ApiError>,
    T: TokenSource + ?Sized + 'static,
{
    type Response = S::Response;
    type Error = ApiError;
    type Future = BoxFuture<'static, Result<S::Response, ApiError>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, mut request: reqwest::Request) -> Self::Future {
        // The ready service goes into the future; a fresh clone stays behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let tokens = Arc::clone(&self.tokens);
        let min_validity = self.min_validity;

        Box::pin(async move {
            if tokens.is_authenticated() {
                match tokens.ensure_fresh_token(min_validity).await {
                    Ok(Some(token)) => {
                        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))?;
                        value.set_sensitive(true);
                        request.headers_mut().insert(AUTHORIZATION, value);
                    }
                    Ok(None) => {
                        debug!(url = %request.url(), "Session ended before the request, sending without token");
                    }
                    Err(e) => {
                        warn!(url = %request.url(), error = %e, "Could not refresh token, request not sent");
                        return Err(ApiError::TokenRefresh(e));
                    }
                }
            }

            inner.call(request).await.map_err(Into::into)
        })
    }
}

/// Token source for clients used without a session.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

#[async_trait::async_trait]
impl TokenSource for Anonymous {
    fn is_authenticated(&self) -> bool {
        false
    }

    async fn ensure_fresh_token(
        &self,
        _min_validity: Duration,
    ) -> bct_auth_core::AuthResult<Option<String>> {
        Ok(None)
    }
}
