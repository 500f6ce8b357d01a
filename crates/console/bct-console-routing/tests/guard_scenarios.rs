use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bct_auth_core::{RoleSet, SessionContext};
use bct_console_routing::{
    GuardState, HOME_PATH, NavigationOutcome, RouteDefinition, RouteTable, Router, Screen,
    UNAUTHORIZED_PATH,
};

/// Session double with a login counter.
struct StubSession {
    authenticated: bool,
    roles: RoleSet,
    logins: AtomicUsize,
}

impl StubSession {
    fn anonymous() -> Arc<Self> {
        Arc::new(Self {
            authenticated: false,
            roles: RoleSet::new(),
            logins: AtomicUsize::new(0),
        })
    }

    fn with_roles(roles: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            authenticated: true,
            roles: roles.iter().copied().collect(),
            logins: AtomicUsize::new(0),
        })
    }

    fn logins(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }
}

impl SessionContext for StubSession {
    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn current_roles(&self) -> RoleSet {
        self.roles.clone()
    }

    fn current_username(&self) -> Option<String> {
        self.authenticated.then(|| "test.user".to_string())
    }

    fn login(&self) {
        self.logins.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn agent_is_sent_to_unauthorized_from_user_management() {
    let session = StubSession::with_roles(&["ROLE_AGENT"]);
    let mut router = Router::new(session.clone());

    let nav = router.navigate("/user-management");

    assert_eq!(nav.outcome, NavigationOutcome::Unauthorized);
    assert_eq!(nav.location, UNAUTHORIZED_PATH);
    assert_eq!(router.location(), UNAUTHORIZED_PATH);
    assert_eq!(
        router.current_route().map(|r| r.screen),
        Some(Screen::Unauthorized)
    );
    assert_eq!(session.logins(), 0);
}

#[test]
fn anonymous_user_is_sent_to_login_from_dashboard() {
    let session = StubSession::anonymous();
    let mut router = Router::new(session.clone());
    let before = router.location().to_string();

    let nav = router.navigate("/dashboard");

    assert_eq!(nav.outcome, NavigationOutcome::LoginRedirect);
    assert_eq!(router.location(), before);
    assert_eq!(session.logins(), 1);
}

#[test]
fn admin_reaches_declaration_type_management() {
    let session = StubSession::with_roles(&["ROLE_ADMIN"]);
    let mut router = Router::new(session);

    let nav = router.navigate("/declaration-type-management");

    assert_eq!(
        nav.outcome,
        NavigationOutcome::Rendered(Screen::DeclarationTypeManagement)
    );
    assert_eq!(router.location(), "/declaration-type-management");
}

#[test]
fn manager_reaches_declaration_types_but_not_users() {
    let session = StubSession::with_roles(&["ROLE_MANAGER"]);
    let mut router = Router::new(session);

    assert!(router.navigate("/declaration-type-management").is_rendered());
    assert_eq!(
        router.navigate("/user-management").outcome,
        NavigationOutcome::Unauthorized
    );
}

#[test]
fn anonymous_user_is_never_rendered_a_restricted_route() {
    let session = StubSession::anonymous();
    let mut router = Router::new(session.clone());
    let table = RouteTable::console();
    let restricted: Vec<_> = table
        .routes()
        .iter()
        .filter(|r| !r.required_roles().is_empty())
        .collect();

    for route in &restricted {
        let nav = router.navigate(&route.path);
        assert_eq!(nav.outcome, NavigationOutcome::LoginRedirect, "{}", route.path);
        assert_eq!(
            router.guard().evaluate(route),
            GuardState::DenyUnauthenticated
        );
    }
    assert_eq!(session.logins(), restricted.len());
}

#[test]
fn user_without_matching_role_always_lands_on_unauthorized() {
    let session = StubSession::with_roles(&["offline_access", "ROLE_OBSERVER"]);
    let mut router = Router::new(session);

    for route in RouteTable::console().routes() {
        if route.required_roles().is_empty() {
            continue;
        }
        let nav = router.navigate(&route.path);
        assert_eq!(nav.outcome, NavigationOutcome::Unauthorized, "{}", route.path);
        assert_eq!(nav.location, UNAUTHORIZED_PATH);
    }
}

#[test]
fn public_routes_render_for_everyone() {
    for session in [StubSession::anonymous(), StubSession::with_roles(&[])] {
        let mut router = Router::new(session);
        assert_eq!(
            router.navigate("/").outcome,
            NavigationOutcome::Rendered(Screen::Home)
        );
        assert_eq!(
            router.navigate("/unauthorized").outcome,
            NavigationOutcome::Rendered(Screen::Unauthorized)
        );
    }
}

#[test]
fn unknown_paths_fall_back_to_home() {
    let mut router = Router::new(StubSession::with_roles(&["ROLE_ADMIN"]));
    router.navigate("/user-management");

    let nav = router.navigate("/does-not-exist");

    assert_eq!(nav.outcome, NavigationOutcome::Fallback);
    assert_eq!(nav.requested, "/does-not-exist");
    assert_eq!(router.location(), HOME_PATH);
}

#[test]
fn guard_decision_is_stable_across_evaluations() {
    let router = Router::new(StubSession::with_roles(&["ROLE_AUDITOR"]));
    let table = RouteTable::console();

    for route in table.routes() {
        let first = router.guard().evaluate(route);
        let second = router.guard().evaluate(route);
        assert_eq!(first, second, "{}", route.path);
    }
}

#[test]
fn role_pages_match_their_role() {
    let mut router = Router::new(StubSession::with_roles(&["ROLE_AUDITOR"]));

    assert!(router.navigate("/auditor").is_rendered());
    assert!(router.navigate("/dashboard").is_rendered());
    assert_eq!(
        router.navigate("/agent").outcome,
        NavigationOutcome::Unauthorized
    );
}

#[test]
fn configured_route_with_roles_is_guarded_without_flag() {
    let reports: RouteDefinition = serde_json::from_str(
        r#"{"path":"/reports","screen":"dashboard","data":{"roles":["ROLE_ADMIN"]}}"#,
    )
    .unwrap();
    let table = RouteTable::new(
        vec![
            RouteDefinition::public(HOME_PATH, Screen::Home),
            RouteDefinition::public(UNAUTHORIZED_PATH, Screen::Unauthorized),
            reports,
        ],
        HOME_PATH,
    )
    .unwrap();

    let anonymous = StubSession::anonymous();
    let mut router = Router::with_table(table.clone(), anonymous.clone());
    let nav = router.navigate("/reports");
    assert_eq!(nav.outcome, NavigationOutcome::LoginRedirect);
    assert_eq!(router.location(), HOME_PATH);
    assert_eq!(anonymous.logins(), 1);

    let agent = StubSession::with_roles(&["ROLE_AGENT"]);
    let mut router = Router::with_table(table.clone(), agent);
    assert_eq!(router.navigate("/reports").outcome, NavigationOutcome::Unauthorized);
    assert_eq!(router.location(), UNAUTHORIZED_PATH);

    let admin = StubSession::with_roles(&["ROLE_ADMIN"]);
    let mut router = Router::with_table(table, admin);
    assert_eq!(
        router.navigate("/reports").outcome,
        NavigationOutcome::Rendered(Screen::Dashboard)
    );
}
