//! Built-in strategies.
//!
//! | Name | Reads | Succeeds when |
//! |------|-------|---------------|
//! | `anonymous` | client address | always |
//! | `session` | session slot | the session names a user |
//! | `api_key` | `x-api-key` header or `api_key` query parameter | the key is known |
//! | `role` | a base strategy | the caller holds a role named after `role:` |
//! | `permission` | a base strategy | the caller holds the permission named after `permission:` |

mod anonymous;
mod api_key;
mod permission;
mod role;
mod session;

pub use anonymous::AnonymousStrategy;
pub use api_key::{ApiKeyRecord, ApiKeyStrategy, ApiKeyTable};
pub use permission::PermissionStrategy;
pub use role::RoleStrategy;
pub use session::SessionStrategy;

/// Returns the parameter after the first `:` of a requirement, if any.
pub(crate) fn requirement_argument(requirement: &str) -> Option<&str> {
    requirement.split_once(':').map(|(_, argument)| argument)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirement_argument() {
        assert_eq!(requirement_argument("role:admin|ops"), Some("admin|ops"));
        assert_eq!(requirement_argument("role:a:b"), Some("a:b"));
        assert_eq!(requirement_argument("role"), None);
    }
}
