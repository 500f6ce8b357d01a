//! HTTP plumbing shared by the admin endpoints.

use std::sync::Arc;
use std::time::Duration;

use bct_auth_core::TokenSource;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Method, Request};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tower::{Layer, ServiceExt};
use tracing::debug;
use url::Url;

use crate::authorizer::{Anonymous, AuthorizeRequest, AuthorizeRequestLayer};
use crate::dto::ApiMessage;
use crate::error::{ApiError, ApiResult};

pub(crate) const API_PREFIX: &str = "/api/admin";

/// Join URL segments without doubling or dropping slashes.
fn join_url_segments(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, path)
    }
}

/// Builder for [`AdminClient`].
pub struct AdminClientBuilder {
    base_url: String,
    timeout: Option<Duration>,
    tokens: Option<Arc<dyn TokenSource>>,
    min_token_validity: Option<Duration>,
}

impl AdminClientBuilder {
    /// `base_url` is the backend root, e.g. `http://localhost:8082`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: None,
            tokens: None,
            min_token_validity: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Session whose bearer token is attached to every request.
    pub fn with_token_source(mut self, tokens: Arc<dyn TokenSource>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn with_min_token_validity(mut self, min_validity: Duration) -> Self {
        self.min_token_validity = Some(min_validity);
        self
    }

    pub fn build(self) -> ApiResult<AdminClient> {
        let base_url = Url::parse(&join_url_segments(&self.base_url, API_PREFIX))?;

        let mut client_builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }
        let http = client_builder.build()?;

        let tokens = self
            .tokens
            .unwrap_or_else(|| Arc::new(Anonymous) as Arc<dyn TokenSource>);
        let mut layer = AuthorizeRequestLayer::new(tokens);
        if let Some(min_validity) = self.min_token_validity {
            layer = layer.with_min_validity(min_validity);
        }

        Ok(AdminClient {
            http: http.clone(),
            service: layer.layer(http),
            base_url,
        })
    }
}

/// Client for the BCT admin REST API. Every request goes through the
/// request authorizer.
#[derive(Clone)]
pub struct AdminClient {
    http: reqwest::Client,
    service: AuthorizeRequest<reqwest::Client, dyn TokenSource>,
    base_url: Url,
}

impl AdminClient {
    pub fn builder(base_url: impl Into<String>) -> AdminClientBuilder {
        AdminClientBuilder::new(base_url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/api/admin/{segments}`. Each segment is percent-encoded on its
    /// own, so identifiers can never change the path they are placed in.
    pub(crate) fn url(&self, segments: &[&str]) -> ApiResult<Url> {
        if let Some(segment) = segments
            .iter()
            .find(|s| s.is_empty() || **s == "." || **s == "..")
        {
            return Err(ApiError::Validation(format!(
                "Invalid path segment '{}'",
                segment
            )));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Validation(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> ApiResult<Request> {
        let mut builder = self
            .http
            .request(method, url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(body) = body {
            builder = builder.json(body);
        }
        Ok(builder.build()?)
    }

    async fn send(&self, request: Request) -> ApiResult<reqwest::Response> {
        let method = request.method().clone();
        let url = request.url().clone();

        let response = self.service.clone().oneshot(request).await?;
        debug!(%method, %url, status = %response.status(), "Admin API call");

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(ApiError::from_response(response).await)
        }
    }

    /// Sends `request` and decodes a JSON body.
    pub(crate) async fn execute<T: DeserializeOwned>(&self, request: Request) -> ApiResult<T> {
        let response = self.send(request).await?;
        Ok(response.json::<T>().await?)
    }

    /// Sends `request` and decodes an acknowledgement, tolerating an empty
    /// body.
    pub(crate) async fn execute_message(&self, request: Request) -> ApiResult<ApiMessage> {
        let response = self.send(request).await?;
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(ApiMessage::default());
        }
        Ok(serde_json::from_str(&body)?)
    }
}
