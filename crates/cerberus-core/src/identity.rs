//! The identity record carried by an authenticated result.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An authenticated identity.
///
/// Strategies build one of these from whatever credential they verified.
/// The record is opaque to the orchestrator except for [`roles`](Self::roles),
/// which role authorization consults.
///
/// # Example
///
/// ```
/// use cerberus_core::UserRecord;
///
/// let user = UserRecord::new("u-1")
///     .with_display_name("Alice")
///     .with_roles(["admin"]);
///
/// assert!(user.has_role("admin"));
/// assert_eq!(user.display_name.as_deref(), Some("Alice"));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserRecord {
    /// Stable user identifier.
    pub id: String,

    /// Human-readable name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Roles held by the user.
    #[serde(default)]
    pub roles: Vec<String>,

    /// Fine-grained permissions held by the user.
    #[serde(default)]
    pub permissions: Vec<String>,

    /// Free-form attributes supplied by the strategy.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
}

impl UserRecord {
    /// Creates a record with only an identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Replaces the role list.
    #[must_use]
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the permission list.
    #[must_use]
    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a free-form attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Whether the user holds `role`.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}
