//! Authentication outcome values.
//!
//! Every strategy invocation produces an [`AuthResult`]. Failure is an
//! ordinary value, not an error: the orchestrator inspects the variant and
//! moves on to the next declared requirement.
//!
//! Results are immutable. Anything that needs a changed result (for example
//! stamping the resolved strategy name on it) builds a new value with
//! [`AuthResult::with_strategy_name`]; the original is left untouched.

use crate::identity::UserRecord;
use crate::session::SessionRef;
use serde_json::Value;
use std::collections::BTreeMap;
use std::net::IpAddr;

/// Authentication method recorded on anonymous results.
pub const ANONYMOUS_METHOD: &str = "anonymous";

/// Generic reason used when a strategy hits an internal error.
const INTERNAL_ERROR_REASON: &str = "internal authentication error";

/// Outcome of a single strategy invocation.
#[derive(Debug, Clone)]
pub enum AuthResult {
    /// The caller was authenticated (possibly as anonymous).
    Authenticated(Authenticated),
    /// The strategy rejected the caller.
    Failed(AuthFailure),
}

/// Payload of a successful authentication.
#[derive(Debug, Clone)]
pub struct Authenticated {
    session: Option<SessionRef>,
    user: Option<UserRecord>,
    roles: Option<Vec<String>>,
    auth_method: String,
    strategy_name: Option<String>,
    metadata: BTreeMap<String, Value>,
}

/// Payload of a failed authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthFailure {
    /// Why the strategy rejected the caller.
    pub failure_reason: String,
    /// The mechanism that was attempted.
    pub auth_method: String,
}

impl AuthResult {
    /// Starts building an authenticated result for `auth_method`.
    ///
    /// # Example
    ///
    /// ```
    /// use cerberus_core::{AuthResult, UserRecord};
    ///
    /// let result = AuthResult::authenticated("api_key")
    ///     .user(UserRecord::new("u-1"))
    ///     .metadata("api_key_id", "k-1")
    ///     .build();
    ///
    /// assert!(result.is_authenticated());
    /// assert!(!result.is_anonymous());
    /// ```
    #[must_use]
    pub fn authenticated(auth_method: impl Into<String>) -> AuthenticatedBuilder {
        AuthenticatedBuilder::new(auth_method)
    }

    /// Creates the distinguished anonymous result.
    ///
    /// It is an `Authenticated` value with no user and no session. The
    /// caller's address is recorded under the `ip` metadata key.
    #[must_use]
    pub fn anonymous(client_addr: Option<IpAddr>) -> Self {
        Self::anonymous_builder(client_addr).build()
    }

    /// Starts building an anonymous result, for callers that need to add
    /// metadata beyond the caller's address.
    #[must_use]
    pub fn anonymous_builder(client_addr: Option<IpAddr>) -> AuthenticatedBuilder {
        let builder = AuthenticatedBuilder::new(ANONYMOUS_METHOD);
        match client_addr {
            Some(addr) => builder.metadata("ip", addr.to_string()),
            None => builder,
        }
    }

    /// Creates a failed result.
    #[must_use]
    pub fn failed(auth_method: impl Into<String>, failure_reason: impl Into<String>) -> Self {
        Self::Failed(AuthFailure {
            failure_reason: failure_reason.into(),
            auth_method: auth_method.into(),
        })
    }

    /// Converts an internal strategy error into a failed result.
    ///
    /// The error detail is logged and replaced by a generic reason so that
    /// it never reaches the client.
    #[must_use]
    pub fn from_error(auth_method: impl Into<String>, error: &dyn std::error::Error) -> Self {
        let auth_method = auth_method.into();
        tracing::error!(auth_method = %auth_method, error = %error, "strategy internal error");
        Self::failed(auth_method, INTERNAL_ERROR_REASON)
    }

    /// Whether this is the `Authenticated` variant (anonymous included).
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// Whether this is an authenticated result without a user.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Authenticated(a) if a.is_anonymous())
    }

    /// Returns the authenticated payload, if any.
    #[must_use]
    pub fn as_authenticated(&self) -> Option<&Authenticated> {
        match self {
            Self::Authenticated(a) => Some(a),
            Self::Failed(_) => None,
        }
    }

    /// Returns the failure payload, if any.
    #[must_use]
    pub fn as_failure(&self) -> Option<&AuthFailure> {
        match self {
            Self::Authenticated(_) => None,
            Self::Failed(f) => Some(f),
        }
    }

    /// The mechanism that produced this result.
    #[must_use]
    pub fn auth_method(&self) -> &str {
        match self {
            Self::Authenticated(a) => &a.auth_method,
            Self::Failed(f) => &f.auth_method,
        }
    }

    /// The resolved strategy name stamped by the orchestrator.
    #[must_use]
    pub fn strategy_name(&self) -> Option<&str> {
        self.as_authenticated().and_then(Authenticated::strategy_name)
    }

    /// Returns a copy of this result carrying `name` as its strategy name.
    ///
    /// Failed results have no strategy name and are returned unchanged.
    #[must_use]
    pub fn with_strategy_name(&self, name: impl Into<String>) -> Self {
        match self {
            Self::Authenticated(a) => Self::Authenticated(a.with_strategy_name(name)),
            Self::Failed(f) => Self::Failed(f.clone()),
        }
    }

    /// A short identifier suitable for logs. Never contains credentials.
    #[must_use]
    pub fn log_id(&self) -> String {
        match self {
            Self::Authenticated(a) => match a.user() {
                Some(user) => format!("user:{}", user.id),
                None => ANONYMOUS_METHOD.to_string(),
            },
            Self::Failed(f) => format!("failed:{}", f.auth_method),
        }
    }
}

impl Authenticated {
    /// The session tied to this identity, if the strategy supplied one.
    #[must_use]
    pub fn session(&self) -> Option<&SessionRef> {
        self.session.as_ref()
    }

    /// The identity record. `None` for anonymous results.
    #[must_use]
    pub fn user(&self) -> Option<&UserRecord> {
        self.user.as_ref()
    }

    /// Roles asserted directly by the strategy, if any.
    #[must_use]
    pub fn roles(&self) -> Option<&[String]> {
        self.roles.as_deref()
    }

    /// The mechanism that authenticated the caller.
    #[must_use]
    pub fn auth_method(&self) -> &str {
        &self.auth_method
    }

    /// The resolved strategy name, once stamped by the orchestrator.
    #[must_use]
    pub fn strategy_name(&self) -> Option<&str> {
        self.strategy_name.as_deref()
    }

    /// Additional key/value facts about the caller.
    #[must_use]
    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    /// Whether this result carries no user.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.user.is_none()
    }

    /// Returns a copy carrying `name` as its strategy name.
    ///
    /// The session handle is shared with the original, not duplicated.
    #[must_use]
    pub fn with_strategy_name(&self, name: impl Into<String>) -> Self {
        let mut copy = self.clone();
        copy.strategy_name = Some(name.into());
        copy
    }
}

/// Builder for [`Authenticated`] results.
#[derive(Debug)]
pub struct AuthenticatedBuilder {
    inner: Authenticated,
}

impl AuthenticatedBuilder {
    fn new(auth_method: impl Into<String>) -> Self {
        Self {
            inner: Authenticated {
                session: None,
                user: None,
                roles: None,
                auth_method: auth_method.into(),
                strategy_name: None,
                metadata: BTreeMap::new(),
            },
        }
    }

    /// Attaches the identity record.
    #[must_use]
    pub fn user(mut self, user: UserRecord) -> Self {
        self.inner.user = Some(user);
        self
    }

    /// Attaches the session that belongs to this identity.
    #[must_use]
    pub fn session(mut self, session: SessionRef) -> Self {
        self.inner.session = Some(session);
        self
    }

    /// Asserts roles directly on the result.
    #[must_use]
    pub fn roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.roles = Some(roles.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the strategy name up front.
    #[must_use]
    pub fn strategy_name(mut self, name: impl Into<String>) -> Self {
        self.inner.strategy_name = Some(name.into());
        self
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inner.metadata.insert(key.into(), value.into());
        self
    }

    /// Finishes the result.
    #[must_use]
    pub fn build(self) -> AuthResult {
        AuthResult::Authenticated(self.inner)
    }
}
