//! Identity from the session occupying the request's session slot.

use cerberus_core::{AuthResult, BoxFuture, CoreResult, RequestContext, Session, UserRecord};
use std::sync::Arc;

use crate::strategy::Strategy;

const METHOD: &str = "session";

/// Session key holding the display name.
pub const USER_NAME_KEY: &str = "user_name";
/// Session key holding the user's roles.
pub const ROLES_KEY: &str = "roles";
/// Session key holding the user's permissions.
pub const PERMISSIONS_KEY: &str = "permissions";

/// Authenticates from the session already attached to the request.
///
/// The session must hold a user id under the configured key (`user_id` by
/// default). On success the result carries that same session object, so
/// the slot is left pointing at it.
#[derive(Debug, Clone)]
pub struct SessionStrategy {
    user_key: String,
}

impl SessionStrategy {
    /// Default session key holding the user id.
    pub const DEFAULT_USER_KEY: &'static str = "user_id";

    /// Creates a strategy reading the user id from `user_key`.
    #[must_use]
    pub fn new(user_key: impl Into<String>) -> Self {
        Self {
            user_key: user_key.into(),
        }
    }

    /// The session key holding the user id.
    #[must_use]
    pub fn user_key(&self) -> &str {
        &self.user_key
    }

    fn load_user(&self, session: &Session) -> CoreResult<Option<UserRecord>> {
        let Some(id) = session.get::<String>(&self.user_key)? else {
            return Ok(None);
        };

        let mut user = UserRecord::new(id)
            .with_roles(session.get::<Vec<String>>(ROLES_KEY)?.unwrap_or_default())
            .with_permissions(
                session
                    .get::<Vec<String>>(PERMISSIONS_KEY)?
                    .unwrap_or_default(),
            );
        if let Some(name) = session.get::<String>(USER_NAME_KEY)? {
            user = user.with_display_name(name);
        }
        Ok(Some(user))
    }
}

impl Default for SessionStrategy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_USER_KEY)
    }
}

impl Strategy for SessionStrategy {
    fn authenticate<'a>(
        &'a self,
        ctx: &'a RequestContext,
        _requirement: &'a str,
    ) -> BoxFuture<'a, AuthResult> {
        Box::pin(async move {
            let Some(session) = ctx.session() else {
                return AuthResult::failed(METHOD, "no active session");
            };

            match self.load_user(session) {
                Ok(Some(user)) => AuthResult::authenticated(METHOD)
                    .user(user)
                    .session(Arc::clone(session))
                    .build(),
                Ok(None) => AuthResult::failed(METHOD, "session has no authenticated user"),
                Err(e) => AuthResult::from_error(METHOD, &e),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context_with(session: &cerberus_core::SessionRef) -> RequestContext {
        let mut ctx = RequestContext::new();
        ctx.set_session(Arc::clone(session));
        ctx
    }

    #[tokio::test]
    async fn test_no_session() {
        let ctx = RequestContext::new();
        let result = SessionStrategy::default().authenticate(&ctx, "session").await;
        assert_eq!(result.as_failure().unwrap().failure_reason, "no active session");
    }

    #[tokio::test]
    async fn test_session_without_user() {
        let session = Session::new();
        let ctx = context_with(&session);
        let result = SessionStrategy::default().authenticate(&ctx, "session").await;
        assert_eq!(
            result.as_failure().unwrap().failure_reason,
            "session has no authenticated user"
        );
    }

    #[tokio::test]
    async fn test_authenticates_from_session() {
        let session = Session::new();
        session.insert("user_id", "u-7").unwrap();
        session.insert(USER_NAME_KEY, "Ada").unwrap();
        session.insert(ROLES_KEY, vec!["admin"]).unwrap();
        let ctx = context_with(&session);

        let result = SessionStrategy::default().authenticate(&ctx, "session").await;
        let auth = result.as_authenticated().unwrap();
        let user = auth.user().unwrap();

        assert_eq!(user.id, "u-7");
        assert_eq!(user.display_name.as_deref(), Some("Ada"));
        assert!(user.has_role("admin"));
        assert_eq!(auth.auth_method(), "session");
        assert!(Arc::ptr_eq(auth.session().unwrap(), &session));
    }

    #[tokio::test]
    async fn test_custom_user_key() {
        let session = Session::new();
        session.insert("uid", "u-1").unwrap();
        let ctx = context_with(&session);

        assert!(SessionStrategy::default()
            .authenticate(&ctx, "session")
            .await
            .as_failure()
            .is_some());
        assert!(SessionStrategy::new("uid")
            .authenticate(&ctx, "session")
            .await
            .is_authenticated());
    }

    #[tokio::test]
    async fn test_malformed_session_value_is_internal_error() {
        let session = Session::new();
        session.insert("user_id", 42).unwrap();
        let ctx = context_with(&session);

        let result = SessionStrategy::default().authenticate(&ctx, "session").await;
        assert_eq!(
            result.as_failure().unwrap().failure_reason,
            "internal authentication error"
        );
    }
}
