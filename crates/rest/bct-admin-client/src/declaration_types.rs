//! Regulatory declaration type endpoints.

use reqwest::Method;

use crate::client::AdminClient;
use crate::dto::{ApiMessage, CreateDeclarationTypeRequest, DeclarationType};
use crate::error::ApiResult;

impl AdminClient {
    pub async fn list_declaration_types(&self) -> ApiResult<Vec<DeclarationType>> {
        let url = self.url(&["declaration-types"])?;
        let request = self.request::<()>(Method::GET, url, None)?;
        self.execute(request).await
    }

    pub async fn create_declaration_type(
        &self,
        declaration: &CreateDeclarationTypeRequest,
    ) -> ApiResult<DeclarationType> {
        let url = self.url(&["declaration-types"])?;
        let request = self.request(Method::POST, url, Some(declaration))?;
        self.execute(request).await
    }

    pub async fn update_declaration_type(
        &self,
        id: i64,
        declaration: &DeclarationType,
    ) -> ApiResult<DeclarationType> {
        let id = id.to_string();
        let url = self.url(&["declaration-types", &id])?;
        let request = self.request(Method::PUT, url, Some(declaration))?;
        self.execute(request).await
    }

    pub async fn delete_declaration_type(&self, id: i64) -> ApiResult<ApiMessage> {
        let id = id.to_string();
        let url = self.url(&["declaration-types", &id])?;
        let request = self.request::<()>(Method::DELETE, url, None)?;
        self.execute_message(request).await
    }

    /// Flips `actif` and returns the updated record.
    pub async fn toggle_declaration_type(&self, id: i64) -> ApiResult<DeclarationType> {
        let id = id.to_string();
        let url = self.url(&["declaration-types", &id, "toggle"])?;
        let request = self.request(Method::PATCH, url, Some(&serde_json::json!({})))?;
        self.execute(request).await
    }
}
