//! In-app navigation through the route table and guard.

use std::fmt;
use std::sync::Arc;

use bct_auth_core::SessionContext;
use tracing::debug;

use crate::guard::{GuardState, Navigator, RouteGuard};
use crate::routes::{RouteDefinition, RouteTable, Screen, normalize_path};

/// How a navigation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The requested route rendered.
    Rendered(Screen),
    /// The guard started a login; the current location did not change.
    LoginRedirect,
    /// The user lacks the required role and was sent to the unauthorized page.
    Unauthorized,
    /// No route matched; the fallback route rendered instead.
    Fallback,
}

impl fmt::Display for NavigationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationOutcome::Rendered(screen) => write!(f, "rendered {:?}", screen),
            NavigationOutcome::LoginRedirect => write!(f, "login required"),
            NavigationOutcome::Unauthorized => write!(f, "access denied"),
            NavigationOutcome::Fallback => write!(f, "unknown route, showing home"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub requested: String,
    /// Where the router is after the navigation.
    pub location: String,
    pub outcome: NavigationOutcome,
}

impl Navigation {
    pub fn is_rendered(&self) -> bool {
        matches!(self.outcome, NavigationOutcome::Rendered(_))
    }
}

pub struct Router<S: SessionContext + ?Sized> {
    table: RouteTable,
    guard: RouteGuard<S>,
    location: String,
}

impl<S: SessionContext + ?Sized> Router<S> {
    /// Router over the console's route table, starting at `/home`.
    pub fn new(session: Arc<S>) -> Self {
        Self::with_table(RouteTable::console(), session)
    }

    pub fn with_table(table: RouteTable, session: Arc<S>) -> Self {
        let location = table.fallback().path.clone();
        Self {
            table,
            guard: RouteGuard::new(session),
            location,
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn current_route(&self) -> Option<&RouteDefinition> {
        self.table.resolve(&self.location)
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn guard(&self) -> &RouteGuard<S> {
        &self.guard
    }

    pub fn navigate(&mut self, path: &str) -> Navigation {
        let requested = normalize_path(path);

        let Some(route) = self.table.resolve(&requested).cloned() else {
            debug!(path = %requested, fallback = %self.table.fallback().path, "No route matched");
            self.location = self.table.fallback().path.clone();
            return self.finish(requested, NavigationOutcome::Fallback);
        };

        if route.requires_guard() {
            let guard = self.guard.clone();
            match guard.run(&route, self) {
                GuardState::Allow => {}
                GuardState::DenyUnauthenticated => {
                    return self.finish(requested, NavigationOutcome::LoginRedirect);
                }
                GuardState::DenyForbidden => {
                    return self.finish(requested, NavigationOutcome::Unauthorized);
                }
            }
        }

        self.location = route.path;
        self.finish(requested, NavigationOutcome::Rendered(route.screen))
    }

    fn finish(&self, requested: String, outcome: NavigationOutcome) -> Navigation {
        Navigation {
            requested,
            location: self.location.clone(),
            outcome,
        }
    }
}

impl<S: SessionContext + ?Sized> Navigator for Router<S> {
    fn navigate_to(&mut self, path: &str) {
        let path = normalize_path(path);
        self.location = match self.table.resolve(&path) {
            Some(route) => route.path.clone(),
            None => self.table.fallback().path.clone(),
        };
    }
}
