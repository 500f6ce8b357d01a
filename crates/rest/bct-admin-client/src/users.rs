//! User management endpoints.

use reqwest::Method;
use tracing::info;

use crate::client::AdminClient;
use crate::dto::{ApiMessage, CreateUserRequest, KeycloakUser, UpdateUserRequest};
use crate::error::ApiResult;

impl AdminClient {
    pub async fn list_users(&self) -> ApiResult<Vec<KeycloakUser>> {
        let request = self.request::<()>(Method::GET, self.url(&["users"])?, None)?;
        self.execute(request).await
    }

    pub async fn get_user(&self, user_id: &str) -> ApiResult<KeycloakUser> {
        let url = self.url(&["users", user_id])?;
        let request = self.request::<()>(Method::GET, url, None)?;
        self.execute(request).await
    }

    /// Matches username, email, first or last name.
    pub async fn search_users(&self, query: &str) -> ApiResult<Vec<KeycloakUser>> {
        let mut url = self.url(&["users", "search"])?;
        url.query_pairs_mut().append_pair("query", query);
        let request = self.request::<()>(Method::GET, url, None)?;
        self.execute(request).await
    }

    /// Normalizes and validates `user` before sending it.
    pub async fn create_user(&self, user: CreateUserRequest) -> ApiResult<ApiMessage> {
        let user = user.normalized();
        user.validate()?;

        let request = self.request(Method::POST, self.url(&["users"])?, Some(&user))?;
        let ack = self.execute_message(request).await?;
        info!(username = %user.username, user_id = ?ack.user_id, "User created");
        Ok(ack)
    }

    pub async fn update_user(
        &self,
        user_id: &str,
        update: &UpdateUserRequest,
    ) -> ApiResult<ApiMessage> {
        let url = self.url(&["users", user_id])?;
        let request = self.request(Method::PUT, url, Some(update))?;
        self.execute_message(request).await
    }

    pub async fn delete_user(&self, user_id: &str) -> ApiResult<ApiMessage> {
        let url = self.url(&["users", user_id])?;
        let request = self.request::<()>(Method::DELETE, url, None)?;
        let ack = self.execute_message(request).await?;
        info!(%user_id, "User deleted");
        Ok(ack)
    }

    /// Enables or disables an account.
    pub async fn set_user_status(&self, user_id: &str, enabled: bool) -> ApiResult<ApiMessage> {
        let mut url = self.url(&["users", user_id, "status"])?;
        url.query_pairs_mut()
            .append_pair("enabled", if enabled { "true" } else { "false" });
        let request = self.request(Method::PATCH, url, Some(&serde_json::json!({})))?;
        self.execute_message(request).await
    }

    /// Asks the identity provider to email a password-reset link.
    pub async fn send_password_reset(&self, user_id: &str) -> ApiResult<ApiMessage> {
        let url = self.url(&["users", user_id, "reset-password"])?;
        let request = self.request(Method::POST, url, Some(&serde_json::json!({})))?;
        self.execute_message(request).await
    }
}
