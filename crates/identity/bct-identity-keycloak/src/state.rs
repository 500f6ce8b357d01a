//! Pending login state for CSRF protection and PKCE.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A login that has been sent to the provider and is waiting for its
/// callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingLogin {
    pub state: String,
    pub redirect_uri: String,
    pub code_verifier: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl PendingLogin {
    pub fn new(redirect_uri: String, code_verifier: String, ttl_seconds: u64) -> Self {
        let state = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let expires_at = i64::try_from(ttl_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|ttl| created_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            state,
            redirect_uri,
            code_verifier,
            created_at,
            expires_at,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_login_expiry() {
        let mut pending = PendingLogin::new(
            "http://localhost:4200".to_string(),
            "verifier123".to_string(),
            300,
        );
        assert!(!pending.is_expired());

        pending.expires_at = Utc::now() - Duration::minutes(1);
        assert!(pending.is_expired());
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let pending = PendingLogin::new(String::new(), String::new(), u64::MAX);
        assert_eq!(pending.expires_at, DateTime::<Utc>::MAX_UTC);
        assert!(!pending.is_expired());
    }

    #[test]
    fn test_states_are_unique() {
        let a = PendingLogin::new(String::new(), String::new(), 60);
        let b = PendingLogin::new(String::new(), String::new(), 60);
        assert_ne!(a.state, b.state);
    }
}
