//! Role-based route guard.

use std::sync::Arc;

use bct_auth_core::{AuthorizationDecision, SessionContext, authorize};
use tracing::{debug, info, warn};

use crate::routes::{RouteDefinition, UNAUTHORIZED_PATH};

/// Terminal guard states. Each maps onto one [`AuthorizationDecision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Allow,
    DenyUnauthenticated,
    DenyForbidden,
}

impl From<AuthorizationDecision> for GuardState {
    fn from(decision: AuthorizationDecision) -> Self {
        match decision {
            AuthorizationDecision::Allow => GuardState::Allow,
            AuthorizationDecision::RedirectLogin => GuardState::DenyUnauthenticated,
            AuthorizationDecision::RedirectUnauthorized => GuardState::DenyForbidden,
        }
    }
}

impl From<GuardState> for AuthorizationDecision {
    fn from(state: GuardState) -> Self {
        match state {
            GuardState::Allow => AuthorizationDecision::Allow,
            GuardState::DenyUnauthenticated => AuthorizationDecision::RedirectLogin,
            GuardState::DenyForbidden => AuthorizationDecision::RedirectUnauthorized,
        }
    }
}

/// In-app navigation, used by the guard to send forbidden users away.
pub trait Navigator {
    fn navigate_to(&mut self, path: &str);
}

/// Decides whether a guarded route may activate, from cached session state
/// only. Evaluation never waits on the network.
pub struct RouteGuard<S: SessionContext + ?Sized> {
    session: Arc<S>,
}

impl<S: SessionContext + ?Sized> Clone for RouteGuard<S> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
        }
    }
}

impl<S: SessionContext + ?Sized> RouteGuard<S> {
    pub fn new(session: Arc<S>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// Pure decision for `route` against the current session.
    pub fn evaluate(&self, route: &RouteDefinition) -> GuardState {
        authorize(self.session.as_ref(), &route.required_roles()).into()
    }

    /// Runs the guard for a navigation. Returns whether the navigation may
    /// complete; on denial the login flow or the unauthorized page has already
    /// been triggered.
    pub fn can_activate<N: Navigator + ?Sized>(
        &self,
        route: &RouteDefinition,
        navigator: &mut N,
    ) -> bool {
        self.run(route, navigator) == GuardState::Allow
    }

    /// [`can_activate`](Self::can_activate), reporting the terminal state.
    pub fn run<N: Navigator + ?Sized>(
        &self,
        route: &RouteDefinition,
        navigator: &mut N,
    ) -> GuardState {
        let required = route.required_roles();
        let state = self.evaluate(route);

        match state {
            GuardState::Allow => {
                debug!(route = %route.path, required = ?required.wire_names(), "Route allowed");
            }
            GuardState::DenyUnauthenticated => {
                info!(route = %route.path, "Not logged in, redirecting to login");
                self.session.login();
            }
            GuardState::DenyForbidden => {
                warn!(
                    route = %route.path,
                    required = ?required.wire_names(),
                    user_roles = ?self.session.current_roles().wire_names(),
                    "Access denied: missing required role"
                );
                navigator.navigate_to(UNAUTHORIZED_PATH);
            }
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::{RouteTable, Screen};
    use bct_auth_core::{Role, RoleSet};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TestSession {
        authenticated: bool,
        roles: RoleSet,
        logins: AtomicUsize,
    }

    impl TestSession {
        fn new(authenticated: bool, roles: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                authenticated,
                roles: roles.iter().copied().collect(),
                logins: AtomicUsize::new(0),
            })
        }
    }

    impl SessionContext for TestSession {
        fn is_authenticated(&self) -> bool {
            self.authenticated
        }

        fn current_roles(&self) -> RoleSet {
            self.roles.clone()
        }

        fn current_username(&self) -> Option<String> {
            self.authenticated.then(|| "user".to_string())
        }

        fn login(&self) {
            self.logins.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct Visited(Vec<String>);

    impl Navigator for Visited {
        fn navigate_to(&mut self, path: &str) {
            self.0.push(path.to_string());
        }
    }

    #[test]
    fn test_guard_states_map_to_decisions() {
        for state in [
            GuardState::Allow,
            GuardState::DenyUnauthenticated,
            GuardState::DenyForbidden,
        ] {
            let decision: AuthorizationDecision = state.into();
            assert_eq!(GuardState::from(decision), state);
        }
    }

    #[test]
    fn test_unauthenticated_triggers_login_only() {
        let session = TestSession::new(false, &[]);
        let guard = RouteGuard::new(session.clone());
        let table = RouteTable::console();
        let mut visited = Visited::default();

        for route in table.routes().iter().filter(|r| !r.required_roles().is_empty()) {
            assert_eq!(guard.evaluate(route), GuardState::DenyUnauthenticated);
            assert!(!guard.can_activate(route, &mut visited));
        }

        assert!(visited.0.is_empty());
        assert_eq!(session.logins.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_forbidden_navigates_to_unauthorized() {
        let session = TestSession::new(true, &["ROLE_AUDITOR"]);
        let guard = RouteGuard::new(session.clone());
        let route = RouteTable::console().resolve("/manager").cloned().unwrap();
        let mut visited = Visited::default();

        assert!(!guard.can_activate(&route, &mut visited));
        assert_eq!(visited.0, vec![UNAUTHORIZED_PATH.to_string()]);
        assert_eq!(session.logins.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_rule_allows_any_authenticated_user() {
        let session = TestSession::new(true, &[]);
        let guard = RouteGuard::new(session);
        let route = RouteDefinition::guarded("/reports", Screen::Dashboard, &[]);

        assert_eq!(guard.evaluate(&route), GuardState::Allow);
        assert!(guard.can_activate(&route, &mut Visited::default()));
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let guard = RouteGuard::new(TestSession::new(true, &["ROLE_AGENT"]));
        for route in RouteTable::console().routes() {
            assert_eq!(guard.evaluate(route), guard.evaluate(route));
        }
    }

    #[test]
    fn test_role_names_compare_with_prefix() {
        let guard = RouteGuard::new(TestSession::new(true, &["ADMIN"]));
        let route = RouteDefinition::guarded("/x", Screen::Home, &[Role::Admin]);
        assert_eq!(guard.evaluate(&route), GuardState::DenyForbidden);
    }
}
