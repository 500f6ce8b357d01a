//! Navigation for the BCT admin console.
//!
//! A [`RouteTable`] lists every screen and the realm roles it requires. The
//! [`RouteGuard`] runs before a guarded route activates: an anonymous user is
//! sent to login, a user without any of the required roles lands on
//! `/unauthorized`. [`Router`] ties the two together and keeps the current
//! location.

mod error;
mod guard;
mod page;
mod router;
mod routes;

pub use error::{RoutingError, RoutingResult};
pub use guard::{GuardState, Navigator, RouteGuard};
pub use page::PageInfo;
pub use router::{Navigation, NavigationOutcome, Router};
pub use routes::{
    HOME_PATH, Layout, RouteData, RouteDefinition, RouteTable, Screen, UNAUTHORIZED_PATH,
    normalize_path,
};
