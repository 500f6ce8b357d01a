//! Console route definitions.

use bct_auth_core::{Role, RoleSet};
use serde::{Deserialize, Serialize};

use crate::error::{RoutingError, RoutingResult};

pub const HOME_PATH: &str = "/home";
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

/// What a route renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Screen {
    Home,
    Dashboard,
    UserManagement,
    DeclarationTypeManagement,
    Unauthorized,
}

/// Shell a screen is rendered inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    Dashboard,
}

/// Route data. `roles` may be absent entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<Role>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDefinition {
    pub path: String,
    pub screen: Screen,
    /// Whether the role guard runs before this route activates.
    #[serde(default)]
    pub guarded: bool,
    #[serde(default)]
    pub data: RouteData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
}

impl RouteDefinition {
    pub fn public(path: &str, screen: Screen) -> Self {
        Self {
            path: normalize_path(path),
            screen,
            guarded: false,
            data: RouteData::default(),
            layout: None,
        }
    }

    pub fn guarded(path: &str, screen: Screen, roles: &[Role]) -> Self {
        Self {
            path: normalize_path(path),
            screen,
            guarded: true,
            data: RouteData {
                roles: Some(roles.to_vec()),
            },
            layout: None,
        }
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Whether the guard must run. Declaring roles guards a route even when
    /// the `guarded` flag was left out.
    pub fn requires_guard(&self) -> bool {
        self.guarded || !self.required_roles().is_empty()
    }

    /// Roles of which the user needs at least one. Empty means no restriction.
    pub fn required_roles(&self) -> RoleSet {
        self.data
            .roles
            .iter()
            .flatten()
            .cloned()
            .collect()
    }
}

/// Strips query and fragment, forces a leading slash and drops trailing ones.
pub fn normalize_path(path: &str) -> String {
    let path = path
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim()
        .trim_end_matches('/');

    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    routes: Vec<RouteDefinition>,
    fallback: usize,
}

impl RouteTable {
    /// Builds a table whose unmatched paths go to `fallback`, which must be
    /// one of `routes`.
    pub fn new(routes: Vec<RouteDefinition>, fallback: &str) -> RoutingResult<Self> {
        let path = normalize_path(fallback);
        match routes.iter().position(|route| route.path == path) {
            Some(index) if !routes[index].requires_guard() => Ok(Self {
                routes,
                fallback: index,
            }),
            Some(_) => Err(RoutingError::GuardedFallback(path)),
            None => Err(RoutingError::UnknownFallback(path)),
        }
    }

    /// The admin console's routes.
    pub fn console() -> Self {
        Self {
            routes: vec![
                RouteDefinition::public("/", Screen::Home),
                RouteDefinition::public(HOME_PATH, Screen::Home),
                RouteDefinition::guarded("/dashboard", Screen::Dashboard, &Role::ALL_STAFF)
                    .with_layout(Layout::Dashboard),
                RouteDefinition::guarded("/user-management", Screen::UserManagement, &[Role::Admin])
                    .with_layout(Layout::Dashboard),
                RouteDefinition::guarded(
                    "/declaration-type-management",
                    Screen::DeclarationTypeManagement,
                    &[Role::Admin, Role::Manager],
                )
                .with_layout(Layout::Dashboard),
                RouteDefinition::guarded("/agent", Screen::Home, &[Role::Agent]),
                RouteDefinition::guarded("/manager", Screen::Home, &[Role::Manager]),
                RouteDefinition::guarded("/auditor", Screen::Home, &[Role::Auditor]),
                RouteDefinition::public(UNAUTHORIZED_PATH, Screen::Unauthorized),
            ],
            fallback: 1,
        }
    }

    pub fn resolve(&self, path: &str) -> Option<&RouteDefinition> {
        let path = normalize_path(path);
        self.routes.iter().find(|route| route.path == path)
    }

    pub fn fallback(&self) -> &RouteDefinition {
        &self.routes[self.fallback]
    }

    pub fn routes(&self) -> &[RouteDefinition] {
        &self.routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/dashboard/"), "/dashboard");
        assert_eq!(normalize_path("dashboard"), "/dashboard");
        assert_eq!(normalize_path("/dashboard?tab=1#top"), "/dashboard");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/"), "/");
    }

    #[test]
    fn test_console_table_rules() {
        let table = RouteTable::console();

        let users = table.resolve("/user-management").unwrap();
        assert_eq!(users.required_roles(), RoleSet::from_iter([Role::Admin]));
        assert_eq!(users.layout, Some(Layout::Dashboard));

        let declarations = table.resolve("/declaration-type-management/").unwrap();
        assert_eq!(
            declarations.required_roles(),
            RoleSet::from_iter([Role::Admin, Role::Manager])
        );

        assert_eq!(table.resolve("/dashboard").unwrap().required_roles(), RoleSet::all_staff());
        assert!(table.resolve("/home").unwrap().required_roles().is_empty());
        assert!(table.resolve("/nowhere").is_none());
        assert_eq!(table.fallback().path, HOME_PATH);
    }

    #[test]
    fn test_missing_roles_key_deserializes_as_unrestricted() {
        let route: RouteDefinition =
            serde_json::from_str(r#"{"path":"/reports","screen":"dashboard","guarded":true}"#)
                .unwrap();
        assert_eq!(route.data.roles, None);
        assert!(route.required_roles().is_empty());

        let route: RouteDefinition = serde_json::from_str(
            r#"{"path":"/reports","screen":"dashboard","data":{"roles":["ROLE_AUDITOR"]}}"#,
        )
        .unwrap();
        assert!(route.required_roles().contains(&Role::Auditor));
        assert!(route.requires_guard());
    }

    #[test]
    fn test_roles_without_guarded_flag_still_guard() {
        let route: RouteDefinition = serde_json::from_str(
            r#"{"path":"/reports","screen":"dashboard","data":{"roles":["ROLE_ADMIN"]}}"#,
        )
        .unwrap();
        assert!(!route.guarded);
        assert!(route.requires_guard());

        let open: RouteDefinition =
            serde_json::from_str(r#"{"path":"/about","screen":"home","data":{"roles":[]}}"#)
                .unwrap();
        assert!(!open.requires_guard());

        let routes = vec![RouteDefinition::public("/home", Screen::Home), route];
        assert!(matches!(
            RouteTable::new(routes, "/reports"),
            Err(RoutingError::GuardedFallback(_))
        ));
    }

    #[test]
    fn test_fallback_must_be_a_public_route() {
        let routes = vec![
            RouteDefinition::public("/home", Screen::Home),
            RouteDefinition::guarded("/dashboard", Screen::Dashboard, &[Role::Admin]),
        ];

        assert!(RouteTable::new(routes.clone(), "/home").is_ok());
        assert!(matches!(
            RouteTable::new(routes.clone(), "/dashboard"),
            Err(RoutingError::GuardedFallback(_))
        ));
        assert!(matches!(
            RouteTable::new(routes, "/missing"),
            Err(RoutingError::UnknownFallback(_))
        ));
    }
}
