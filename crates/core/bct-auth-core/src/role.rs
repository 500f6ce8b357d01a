//! Typed realm roles.
//!
//! The identity provider issues realm roles with an explicit `ROLE_` prefix.
//! That prefixed spelling is the wire form: it is what gets compared and what
//! crosses the serde boundary. Presentation goes through [`Role::display_name`].

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix carried by every realm role issued for the console realm.
pub const ROLE_PREFIX: &str = "ROLE_";

/// A realm role as issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Manager,
    Agent,
    Auditor,
    /// Any other realm role, kept verbatim.
    Other(String),
}

impl Role {
    /// Every staff role allowed onto the dashboard.
    pub const ALL_STAFF: [Role; 4] = [Role::Agent, Role::Manager, Role::Admin, Role::Auditor];

    /// Parses a wire-level role name. Matching is exact: `ADMIN` or
    /// `role_admin` are not `Role::Admin`.
    pub fn parse(wire: &str) -> Self {
        match wire {
            "ROLE_ADMIN" => Role::Admin,
            "ROLE_MANAGER" => Role::Manager,
            "ROLE_AGENT" => Role::Agent,
            "ROLE_AUDITOR" => Role::Auditor,
            other => Role::Other(other.to_string()),
        }
    }

    /// The exact name used by the identity provider and the backend.
    pub fn wire_name(&self) -> &str {
        match self {
            Role::Admin => "ROLE_ADMIN",
            Role::Manager => "ROLE_MANAGER",
            Role::Agent => "ROLE_AGENT",
            Role::Auditor => "ROLE_AUDITOR",
            Role::Other(name) => name,
        }
    }

    /// Human-facing label with the realm prefix removed.
    pub fn display_name(&self) -> &str {
        let wire = self.wire_name();
        wire.strip_prefix(ROLE_PREFIX).unwrap_or(wire)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match Role::parse(&value) {
            Role::Other(_) => Role::Other(value),
            known => known,
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Role::parse(value)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(name) => name,
            known => known.wire_name().to_string(),
        }
    }
}

/// An ordered set of realm roles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all_staff() -> Self {
        Role::ALL_STAFF.into_iter().collect()
    }

    pub fn insert(&mut self, role: Role) -> bool {
        self.0.insert(role)
    }

    pub fn contains(&self, role: &Role) -> bool {
        self.0.contains(role)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when at least one role is shared.
    pub fn intersects(&self, other: &RoleSet) -> bool {
        self.0.iter().any(|role| other.contains(role))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Role> {
        self.0.iter()
    }

    /// Wire names, for logging and error reports.
    pub fn wire_names(&self) -> Vec<String> {
        self.0.iter().map(|role| role.wire_name().to_string()).collect()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a str> for RoleSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(Role::parse).collect())
    }
}

impl IntoIterator for RoleSet {
    type Item = Role;
    type IntoIter = std::collections::btree_set::IntoIter<Role>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a RoleSet {
    type Item = &'a Role;
    type IntoIter = std::collections::btree_set::Iter<'a, Role>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
