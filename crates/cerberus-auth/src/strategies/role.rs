//! `role:<a>|<b>` requirements layered over a base strategy.

use cerberus_core::{AuthResult, BoxFuture, RequestContext};
use std::sync::Arc;

use super::requirement_argument;
use crate::roles::{extract_roles, split_list};
use crate::strategy::Strategy;

const METHOD: &str = "role";

/// Authenticates through a base strategy, then requires one of the roles
/// named in the requirement.
///
/// Registered as `role`, it serves requirements such as `role:admin` or
/// `role:admin|editor`. A bare `role` requirement names no role and always
/// fails.
///
/// # Example
///
/// ```
/// use cerberus_auth::{RoleStrategy, SessionStrategy, StrategyRegistry};
/// use std::sync::Arc;
///
/// let session = Arc::new(SessionStrategy::default());
/// let registry = StrategyRegistry::builder()
///     .register_arc("session", session.clone())?
///     .register("role", RoleStrategy::new(session, "session"))?
///     .build();
/// # Ok::<(), cerberus_auth::AuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RoleStrategy {
    base: Arc<dyn Strategy>,
    base_requirement: String,
}

impl RoleStrategy {
    /// Creates a role check on top of `base`, which is invoked with
    /// `base_requirement`.
    #[must_use]
    pub fn new(base: Arc<dyn Strategy>, base_requirement: impl Into<String>) -> Self {
        Self {
            base,
            base_requirement: base_requirement.into(),
        }
    }
}

impl Strategy for RoleStrategy {
    fn authenticate<'a>(
        &'a self,
        ctx: &'a RequestContext,
        requirement: &'a str,
    ) -> BoxFuture<'a, AuthResult> {
        Box::pin(async move {
            let wanted = requirement_argument(requirement)
                .map(|roles| split_list(roles, '|'))
                .unwrap_or_default();
            if wanted.is_empty() {
                return AuthResult::failed(METHOD, "role requirement names no role");
            }

            let result = self.base.authenticate(ctx, &self.base_requirement).await;
            let Some(auth) = result.as_authenticated() else {
                return result;
            };
            if auth.is_anonymous() {
                return AuthResult::failed(METHOD, "authentication required");
            }

            let held = extract_roles(auth);
            if wanted.iter().any(|role| held.contains(role)) {
                result
            } else {
                AuthResult::failed(METHOD, "missing required role")
            }
        })
    }
}
