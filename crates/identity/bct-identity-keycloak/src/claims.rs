//! Access-token claims.
//!
//! The console only reads claims for display and route decisions. Signature
//! checks belong to the backend, which is the authority on every request.

use std::collections::HashMap;

use bct_auth_core::{Role, RoleSet};
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::error::IdentityResult;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RealmAccess {
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Parsed access-token payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: Option<String>,
    pub exp: Option<i64>,
    pub iat: Option<i64>,
    pub iss: Option<String>,
    pub azp: Option<String>,
    pub preferred_username: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub realm_access: Option<RealmAccess>,
    #[serde(flatten)]
    pub additional_claims: HashMap<String, serde_json::Value>,
}

impl TokenClaims {
    /// Decodes the payload of a compact JWT without verifying its signature.
    pub fn decode(token: &str) -> IdentityResult<Self> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)?;
        Ok(data.claims)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    /// Realm roles exactly as issued.
    pub fn realm_roles(&self) -> RoleSet {
        self.realm_access
            .iter()
            .flat_map(|access| access.roles.iter())
            .map(|role| Role::from(role.clone()))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use jsonwebtoken::{EncodingKey, Header, encode};

    /// Signs a Keycloak-shaped access token for tests.
    pub fn access_token(username: &str, roles: &[&str], lifetime_seconds: i64) -> String {
        let now = Utc::now().timestamp();
        let claims = serde_json::json!({
            "sub": format!("{}-id", username),
            "iat": now,
            "exp": now + lifetime_seconds,
            "iss": "http://localhost:8080/realms/bct",
            "aud": "account",
            "azp": "bct-frontend",
            "preferred_username": username,
            "email": format!("{}@bct.tn", username),
            "realm_access": { "roles": roles },
            "scope": "openid profile email",
        });

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_keycloak_token() {
        let token = test_support::access_token("amira", &["ROLE_ADMIN", "offline_access"], 300);
        let claims = TokenClaims::decode(&token).unwrap();

        assert_eq!(claims.preferred_username.as_deref(), Some("amira"));
        assert_eq!(claims.azp.as_deref(), Some("bct-frontend"));
        assert!(claims.expires_at().is_some());
        assert_eq!(claims.additional_claims["aud"], "account");

        let roles = claims.realm_roles();
        assert!(roles.contains(&Role::Admin));
        assert!(roles.contains(&Role::parse("offline_access")));
        assert_eq!(roles.len(), 2);
    }

    #[test]
    fn test_missing_realm_access_means_no_roles() {
        let claims = TokenClaims::default();
        assert!(claims.realm_roles().is_empty());
    }

    #[test]
    fn test_malformed_token_is_rejected() {
        assert!(TokenClaims::decode("not-a-jwt").is_err());
    }
}
