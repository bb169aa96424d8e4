//! `permission:<p>` requirements layered over a base strategy.

use cerberus_core::{AuthResult, BoxFuture, RequestContext};
use std::sync::Arc;

use super::requirement_argument;
use crate::roles::split_list;
use crate::strategy::Strategy;

const METHOD: &str = "permission";

/// Authenticates through a base strategy, then requires a permission held
/// by the user record.
///
/// Serves requirements such as `permission:reports.read`. Alternatives may
/// be separated with `|`. Granted permissions support two wildcard forms:
/// `*` grants everything and `reports.*` grants every permission under
/// `reports.`.
#[derive(Debug, Clone)]
pub struct PermissionStrategy {
    base: Arc<dyn Strategy>,
    base_requirement: String,
}

impl PermissionStrategy {
    /// Creates a permission check on top of `base`, which is invoked with
    /// `base_requirement`.
    #[must_use]
    pub fn new(base: Arc<dyn Strategy>, base_requirement: impl Into<String>) -> Self {
        Self {
            base,
            base_requirement: base_requirement.into(),
        }
    }
}

/// Whether `granted` covers `wanted`.
fn grants(granted: &str, wanted: &str) -> bool {
    if granted == "*" || granted == wanted {
        return true;
    }
    granted
        .strip_suffix(".*")
        .and_then(|scope| wanted.strip_prefix(scope))
        .is_some_and(|rest| rest.starts_with('.'))
}

impl Strategy for PermissionStrategy {
    fn authenticate<'a>(
        &'a self,
        ctx: &'a RequestContext,
        requirement: &'a str,
    ) -> BoxFuture<'a, AuthResult> {
        Box::pin(async move {
            let wanted = requirement_argument(requirement)
                .map(|permissions| split_list(permissions, '|'))
                .unwrap_or_default();
            if wanted.is_empty() {
                return AuthResult::failed(METHOD, "permission requirement names no permission");
            }

            let result = self.base.authenticate(ctx, &self.base_requirement).await;
            let Some(auth) = result.as_authenticated() else {
                return result;
            };
            let Some(user) = auth.user() else {
                return AuthResult::failed(METHOD, "authentication required");
            };

            let allowed = wanted.iter().any(|want| {
                user.permissions
                    .iter()
                    .any(|granted| grants(granted, want))
            });
            if allowed {
                result
            } else {
                AuthResult::failed(METHOD, "missing required permission")
            }
        })
    }
}
