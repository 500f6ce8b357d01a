//! Realm role endpoints.

use bct_auth_core::Role;
use reqwest::Method;

use crate::client::AdminClient;
use crate::dto::{ApiMessage, KeycloakUser, RoleDto};
use crate::error::ApiResult;

impl AdminClient {
    pub async fn list_roles(&self) -> ApiResult<Vec<RoleDto>> {
        let request = self.request::<()>(Method::GET, self.url(&["roles"])?, None)?;
        self.execute(request).await
    }

    pub async fn get_user_roles(&self, user_id: &str) -> ApiResult<Vec<RoleDto>> {
        let url = self.url(&["users", user_id, "roles"])?;
        let request = self.request::<()>(Method::GET, url, None)?;
        self.execute(request).await
    }

    pub async fn assign_roles(&self, user_id: &str, roles: &[Role]) -> ApiResult<ApiMessage> {
        let url = self.url(&["users", user_id, "roles"])?;
        let request = self.request(Method::POST, url, Some(roles))?;
        self.execute_message(request).await
    }

    /// The role list travels in the body of the DELETE.
    pub async fn remove_roles(&self, user_id: &str, roles: &[Role]) -> ApiResult<ApiMessage> {
        let url = self.url(&["users", user_id, "roles"])?;
        let request = self.request(Method::DELETE, url, Some(roles))?;
        self.execute_message(request).await
    }

    pub async fn users_by_role(&self, role: &Role) -> ApiResult<Vec<KeycloakUser>> {
        let url = self.url(&["roles", role.wire_name(), "users"])?;
        let request = self.request::<()>(Method::GET, url, None)?;
        self.execute(request).await
    }
}
