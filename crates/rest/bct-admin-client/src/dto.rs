//! Admin API payloads. JSON field names are camelCase on the wire.

use bct_auth_core::Role;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

/// A realm user as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeycloakUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
    /// Milliseconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<Role>>,
}

impl KeycloakUser {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Role names without the realm prefix, for display.
    pub fn display_roles(&self) -> Vec<&str> {
        self.roles
            .iter()
            .flatten()
            .map(Role::display_name)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub roles: Vec<Role>,
}

fn default_enabled() -> bool {
    true
}

impl CreateUserRequest {
    /// Trims names and lower-cases the email the way the backend stores them.
    pub fn normalized(mut self) -> Self {
        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_lowercase();
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self
    }

    pub fn validate(&self) -> ApiResult<()> {
        if self.username.trim().is_empty() {
            return Err(ApiError::Validation("username is required".to_string()));
        }
        if self.email.trim().is_empty() {
            return Err(ApiError::Validation("email is required".to_string()));
        }
        if !self.email.contains('@') {
            return Err(ApiError::Validation(format!(
                "invalid email address: {}",
                self.email
            )));
        }
        if self.password.is_empty() {
            return Err(ApiError::Validation("password is required".to_string()));
        }
        Ok(())
    }
}

/// Partial user update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
}

impl UpdateUserRequest {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Acknowledgement returned by mutating user and role endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMessage {
    #[serde(default)]
    pub message: Option<String>,
    /// Set when a user was created.
    #[serde(default)]
    pub user_id: Option<String>,
}

/// A declaration type as stored by the backend. Only `code` is mandatory;
/// unset columns arrive as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclarationType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub code: String,
    #[serde(default)]
    pub nom: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub frequence: Option<String>,
    /// ISO date, e.g. `2025-01-31`.
    #[serde(default)]
    pub date_limite: Option<String>,
    #[serde(default = "default_enabled")]
    pub actif: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeclarationTypeRequest {
    pub code: String,
    #[serde(default)]
    pub nom: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub frequence: Option<String>,
    #[serde(default)]
    pub date_limite: Option<String>,
    #[serde(default = "default_enabled")]
    pub actif: bool,
}

impl From<DeclarationType> for CreateDeclarationTypeRequest {
    fn from(value: DeclarationType) -> Self {
        Self {
            code: value.code,
            nom: value.nom,
            format: value.format,
            frequence: value.frequence,
            date_limite: value.date_limite,
            actif: value.actif,
        }
    }
}
