//! Role extraction and the post-authentication role gate.
//!
//! Roles are read from the first non-empty source, in order:
//!
//! 1. roles asserted directly on the result by the strategy
//! 2. the identity record's `roles`
//! 3. the `user_roles` metadata entry (an array of strings, or a
//!    comma-separated string)
//!
//! The gate passes when the caller holds at least one required role.

use cerberus_core::Authenticated;
use indexmap::IndexSet;
use serde_json::Value;

/// Metadata key consulted when neither the result nor the user carry roles.
pub const USER_ROLES_METADATA_KEY: &str = "user_roles";

/// Outcome of the role gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleCheck {
    /// No roles required, or the caller holds one of them.
    Pass,
    /// The caller holds none of the required roles.
    Deny {
        /// Roles the route accepts.
        required: IndexSet<String>,
        /// Roles the caller holds.
        actual: Vec<String>,
    },
}

impl RoleCheck {
    /// Whether the gate passed.
    #[must_use]
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// Returns the caller's roles from the first non-empty source.
#[must_use]
pub fn extract_roles(auth: &Authenticated) -> Vec<String> {
    if let Some(roles) = auth.roles().filter(|roles| !roles.is_empty()) {
        return roles.to_vec();
    }

    if let Some(user) = auth.user().filter(|user| !user.roles.is_empty()) {
        return user.roles.clone();
    }

    match auth.metadata().get(USER_ROLES_METADATA_KEY) {
        Some(Value::Array(values)) => values
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(joined)) => split_list(joined, ','),
        _ => Vec::new(),
    }
}

/// Applies the role gate to an authenticated caller.
///
/// An empty `required` set always passes.
#[must_use]
pub fn check_roles(auth: &Authenticated, required: &IndexSet<String>) -> RoleCheck {
    if required.is_empty() {
        return RoleCheck::Pass;
    }

    let actual = extract_roles(auth);
    if actual.iter().any(|role| required.contains(role)) {
        RoleCheck::Pass
    } else {
        RoleCheck::Deny {
            required: required.clone(),
            actual,
        }
    }
}

/// Splits a delimited list, trimming entries and dropping empty ones.
pub(crate) fn split_list(list: &str, separator: char) -> Vec<String> {
    list.split(separator)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cerberus_core::{AuthResult, UserRecord};
    use proptest::prelude::*;
    use serde_json::json;

    fn roles(names: &[&str]) -> IndexSet<String> {
        names.iter().map(|name| (*name).to_string()).collect()
    }

    fn authenticated(result: &AuthResult) -> &Authenticated {
        result.as_authenticated().unwrap()
    }

    #[test]
    fn test_result_roles_take_precedence() {
        let result = AuthResult::authenticated("test")
            .user(UserRecord::new("u").with_roles(["viewer"]))
            .roles(["admin"])
            .build();
        assert_eq!(extract_roles(authenticated(&result)), vec!["admin"]);
    }

    #[test]
    fn test_user_roles_used_when_result_has_none() {
        let result = AuthResult::authenticated("test")
            .user(UserRecord::new("u").with_roles(["editor"]))
            .roles(Vec::<String>::new())
            .metadata(USER_ROLES_METADATA_KEY, json!(["admin"]))
            .build();
        assert_eq!(extract_roles(authenticated(&result)), vec!["editor"]);
    }

    #[test]
    fn test_metadata_roles() {
        let result = AuthResult::authenticated("test")
            .metadata(USER_ROLES_METADATA_KEY, json!(["admin", 3, "ops"]))
            .build();
        assert_eq!(extract_roles(authenticated(&result)), vec!["admin", "ops"]);

        let result = AuthResult::authenticated("test")
            .metadata(USER_ROLES_METADATA_KEY, "admin, ops,")
            .build();
        assert_eq!(extract_roles(authenticated(&result)), vec!["admin", "ops"]);
    }

    #[test]
    fn test_no_roles_anywhere() {
        let result = AuthResult::anonymous(None);
        assert!(extract_roles(authenticated(&result)).is_empty());
    }

    #[test]
    fn test_empty_requirement_always_passes() {
        let result = AuthResult::anonymous(None);
        assert!(check_roles(authenticated(&result), &IndexSet::new()).is_pass());
    }

    #[test]
    fn test_any_one_role_is_enough() {
        let result = AuthResult::authenticated("test")
            .user(UserRecord::new("u").with_roles(["editor"]))
            .build();
        let auth = authenticated(&result);

        assert!(check_roles(auth, &roles(&["admin", "editor"])).is_pass());

        let denied = check_roles(auth, &roles(&["admin", "owner"]));
        assert_eq!(
            denied,
            RoleCheck::Deny {
                required: roles(&["admin", "owner"]),
                actual: vec!["editor".to_string()],
            }
        );
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("a| b ||c", '|'), vec!["a", "b", "c"]);
        assert!(split_list(" , ", ',').is_empty());
    }

    proptest! {
        #[test]
        fn prop_role_gate_is_or(
            held in proptest::collection::vec("[a-d]", 0..4),
            required in proptest::collection::vec("[a-d]", 1..4),
        ) {
            let result = AuthResult::authenticated("test").roles(held.clone()).build();
            let required: IndexSet<String> = required.into_iter().collect();

            let expected = held.iter().any(|role| required.contains(role));
            prop_assert_eq!(check_roles(authenticated(&result), &required).is_pass(), expected);
        }
    }
}
