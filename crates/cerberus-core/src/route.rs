//! Per-route authentication requirements.

use crate::error::{CoreError, CoreResult};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Authentication and role requirements declared by a matched route.
///
/// The dispatcher builds one of these per route when the route table is
/// built and shares it (usually as an `Arc`) for the life of the process.
///
/// - `auth_requirements` is ordered: it is the caller-declared priority in
///   which strategies are tried. Empty means the route is anonymous.
/// - `role_requirements` is a set. Empty means there is no role gate;
///   otherwise holding any one of the roles is enough.
///
/// # Example
///
/// ```
/// use cerberus_core::RouteAuthSpec;
///
/// let spec = RouteAuthSpec::new()
///     .require("session")
///     .require("api_key")
///     .require_role("admin");
///
/// assert_eq!(spec.auth_requirements(), ["session", "api_key"]);
/// assert!(spec.role_requirements().contains("admin"));
/// assert!(!spec.is_anonymous());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteAuthSpec {
    #[serde(default)]
    auth_requirements: Vec<String>,
    #[serde(default)]
    role_requirements: IndexSet<String>,
}

impl RouteAuthSpec {
    /// Creates a spec with no requirements.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A route anyone may call.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Builds a spec from requirement and role lists, rejecting blank entries.
    pub fn try_from_parts<R, S, G, T>(requirements: R, roles: G) -> CoreResult<Self>
    where
        R: IntoIterator<Item = S>,
        S: Into<String>,
        G: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut spec = Self::new();
        for requirement in requirements {
            let requirement = requirement.into();
            if requirement.trim().is_empty() {
                return Err(CoreError::invalid_requirement(requirement));
            }
            spec.auth_requirements.push(requirement);
        }
        for role in roles {
            let role = role.into();
            if role.trim().is_empty() {
                return Err(CoreError::InvalidRole(role));
            }
            spec.role_requirements.insert(role);
        }
        Ok(spec)
    }

    /// Appends an authentication requirement (lowest priority so far).
    #[must_use]
    pub fn require(mut self, requirement: impl Into<String>) -> Self {
        self.auth_requirements.push(requirement.into());
        self
    }

    /// Adds a role to the role gate.
    #[must_use]
    pub fn require_role(mut self, role: impl Into<String>) -> Self {
        self.role_requirements.insert(role.into());
        self
    }

    /// Requirements in priority order.
    #[must_use]
    pub fn auth_requirements(&self) -> &[String] {
        &self.auth_requirements
    }

    /// Roles of which the caller must hold at least one.
    #[must_use]
    pub fn role_requirements(&self) -> &IndexSet<String> {
        &self.role_requirements
    }

    /// Whether the route declares no authentication requirement.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.auth_requirements.is_empty()
    }
}
