//! Tests against a mock Keycloak token endpoint.

#[cfg(test)]
mod integration_tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use bct_auth_core::{Role, SessionContext};
    use url::Url;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::claims::test_support::access_token;
    use crate::{
        AuthorizationCallback, IdentityClient, IdentityError, InitOptions, KeycloakClient,
        KeycloakConfig, MemorySessionStore, RecordingRedirector, SessionProvider, SessionStore,
        StoredSession,
    };

    const TOKEN_PATH: &str = "/realms/bct/protocol/openid-connect/token";

    async fn setup_mock_keycloak() -> (MockServer, KeycloakClient) {
        let mock_server = MockServer::start().await;
        let config = KeycloakConfig::new(mock_server.uri(), "bct", "bct-frontend")
            .with_redirect_uri("http://localhost:4200")
            .with_http_timeout(5);
        let client = KeycloakClient::new(config).unwrap();
        (mock_server, client)
    }

    fn token_body(username: &str, roles: &[&str], refresh: &str) -> serde_json::Value {
        serde_json::json!({
            "access_token": access_token(username, roles, 300),
            "token_type": "Bearer",
            "expires_in": 300,
            "refresh_token": refresh,
            "refresh_expires_in": 1800,
            "id_token": "mock_id_token",
            "scope": "openid profile email"
        })
    }

    #[tokio::test]
    async fn test_full_login_flow() {
        let (mock_server, client) = setup_mock_keycloak().await;

        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=auth_code_123"))
            .and(body_string_contains("code_verifier="))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body(
                "sami",
                &["ROLE_MANAGER"],
                "refresh_1",
            )))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = Arc::new(client);
        let store = Arc::new(MemorySessionStore::new());
        let redirector = Arc::new(RecordingRedirector::new());

        // First run: no session, the user asks to log in.
        let provider = SessionProvider::initialize(
            client.clone(),
            store.clone(),
            redirector.clone(),
            InitOptions::check_sso(),
        )
        .await;
        assert!(!SessionContext::is_authenticated(provider.as_ref()));
        provider.login();

        let auth_url = redirector.last().unwrap();
        let params: HashMap<_, _> = auth_url.query_pairs().into_owned().collect();
        let state = params.get("state").unwrap().clone();

        // Second run: the provider redirected back with a code.
        let redirect = Url::parse(&format!(
            "http://localhost:4200/?state={}&code=auth_code_123",
            state
        ))
        .unwrap();
        let callback = AuthorizationCallback::from_redirect_url(&redirect).unwrap();
        let provider = SessionProvider::initialize(
            client,
            store.clone(),
            redirector,
            InitOptions::check_sso().with_callback(callback),
        )
        .await;

        assert!(SessionContext::is_authenticated(provider.as_ref()));
        assert_eq!(provider.current_username().as_deref(), Some("sami"));
        assert!(provider.current_roles().contains(&Role::Manager));

        let stored = store.load().unwrap();
        assert!(stored.pending_login.is_none());
        assert_eq!(
            stored.tokens.unwrap().id_token.as_deref(),
            Some("mock_id_token")
        );
    }

    #[tokio::test]
    async fn test_refresh_against_token_endpoint() {
        let (mock_server, client) = setup_mock_keycloak().await;

        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=refresh_1"))
            .and(body_string_contains("client_id=bct-frontend"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body(
                "sami",
                &["ROLE_AGENT"],
                "refresh_2",
            )))
            .expect(1)
            .mount(&mock_server)
            .await;

        let response = client.refresh("refresh_1").await.unwrap();
        assert_eq!(response.refresh_token.as_deref(), Some("refresh_2"));
        assert_eq!(response.expires_in, Some(300));
    }

    #[tokio::test]
    async fn test_rejected_refresh_ends_session() {
        let (mock_server, client) = setup_mock_keycloak().await;

        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Session not active"
            })))
            .mount(&mock_server)
            .await;

        let stored = StoredSession {
            tokens: Some(crate::TokenSet {
                access_token: access_token("sami", &["ROLE_ADMIN"], 5),
                refresh_token: Some("refresh_1".to_string()),
                id_token: None,
                expires_at: chrono::Utc::now() + chrono::Duration::seconds(5),
                refresh_expires_at: None,
            }),
            pending_login: None,
        };
        let store = Arc::new(MemorySessionStore::with_session(stored));
        let provider = SessionProvider::initialize(
            Arc::new(client),
            store.clone(),
            Arc::new(RecordingRedirector::new()),
            InitOptions::check_sso(),
        )
        .await;
        assert!(SessionContext::is_authenticated(provider.as_ref()));

        let result = provider.ensure_fresh_token(Duration::from_secs(30)).await;

        match result {
            Err(IdentityError::TokenRefreshFailed(message)) => {
                assert!(message.contains("invalid_grant"))
            }
            other => panic!("Expected refresh failure, got {:?}", other),
        }
        assert!(!SessionContext::is_authenticated(provider.as_ref()));
        assert!(store.load().unwrap().tokens.is_none());
    }

    #[tokio::test]
    async fn test_malformed_token_response() {
        let (mock_server, client) = setup_mock_keycloak().await;

        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let result = client.refresh("refresh_1").await;
        assert!(matches!(result, Err(IdentityError::InvalidTokenResponse(_))));
    }
}
