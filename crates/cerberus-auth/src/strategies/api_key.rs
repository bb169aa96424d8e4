//! API keys presented in a header or query parameter.

use cerberus_core::{AuthResult, BoxFuture, RequestContext, Session, UserRecord};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::strategy::Strategy;

const METHOD: &str = "api_key";

/// Metadata key carrying the matched key's identifier.
pub const API_KEY_ID_METADATA_KEY: &str = "api_key_id";

/// What an API key grants.
#[derive(Debug, Clone)]
pub struct ApiKeyRecord {
    /// Public identifier of the key, safe to log.
    pub key_id: String,
    /// The identity the key authenticates as.
    pub user: UserRecord,
    /// Whether a successful request should start a fresh session for the
    /// user. The new session replaces whatever the slot held.
    pub issue_session: bool,
}

impl ApiKeyRecord {
    /// Creates a record that does not issue sessions.
    #[must_use]
    pub fn new(key_id: impl Into<String>, user: UserRecord) -> Self {
        Self {
            key_id: key_id.into(),
            user,
            issue_session: false,
        }
    }

    /// Makes the key start a fresh session on success.
    #[must_use]
    pub fn with_session(mut self) -> Self {
        self.issue_session = true;
        self
    }
}

/// An immutable table of known API keys, indexed by secret.
///
/// The `Debug` output never includes secrets.
#[derive(Clone, Default)]
pub struct ApiKeyTable {
    keys: HashMap<String, ApiKeyRecord>,
}

impl ApiKeyTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a key.
    #[must_use]
    pub fn with_key(mut self, secret: impl Into<String>, record: ApiKeyRecord) -> Self {
        self.keys.insert(secret.into(), record);
        self
    }

    /// Looks up a presented secret.
    #[must_use]
    pub fn lookup(&self, secret: &str) -> Option<&ApiKeyRecord> {
        self.keys.get(secret)
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the table holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Debug for ApiKeyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<&str> = self.keys.values().map(|r| r.key_id.as_str()).collect();
        f.debug_struct("ApiKeyTable").field("key_ids", &ids).finish()
    }
}

/// Authenticates a key presented in a header or, failing that, a query
/// parameter.
#[derive(Debug, Clone)]
pub struct ApiKeyStrategy {
    keys: Arc<ApiKeyTable>,
    header: String,
    query_param: String,
    session_user_key: String,
}

impl ApiKeyStrategy {
    /// Default header carrying the key.
    pub const DEFAULT_HEADER: &'static str = "x-api-key";
    /// Default query parameter carrying the key.
    pub const DEFAULT_QUERY_PARAM: &'static str = "api_key";

    /// Creates a strategy over `keys` using the default header and query
    /// parameter names.
    #[must_use]
    pub fn new(keys: ApiKeyTable) -> Self {
        Self {
            keys: Arc::new(keys),
            header: Self::DEFAULT_HEADER.to_string(),
            query_param: Self::DEFAULT_QUERY_PARAM.to_string(),
            session_user_key: super::SessionStrategy::DEFAULT_USER_KEY.to_string(),
        }
    }

    /// Sets the header carrying the key.
    #[must_use]
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    /// Sets the query parameter carrying the key.
    #[must_use]
    pub fn with_query_param(mut self, param: impl Into<String>) -> Self {
        self.query_param = param.into();
        self
    }

    /// Sets the session key written when a key issues a session.
    #[must_use]
    pub fn with_session_user_key(mut self, key: impl Into<String>) -> Self {
        self.session_user_key = key.into();
        self
    }

    fn presented_key<'a>(&self, ctx: &'a RequestContext) -> Option<&'a str> {
        ctx.header(&self.header)
            .or_else(|| ctx.query_param(&self.query_param))
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

impl Strategy for ApiKeyStrategy {
    fn authenticate<'a>(
        &'a self,
        ctx: &'a RequestContext,
        _requirement: &'a str,
    ) -> BoxFuture<'a, AuthResult> {
        Box::pin(async move {
            let Some(secret) = self.presented_key(ctx) else {
                return AuthResult::failed(METHOD, "missing API key");
            };
            let Some(record) = self.keys.lookup(secret) else {
                return AuthResult::failed(METHOD, "invalid API key");
            };

            let mut builder = AuthResult::authenticated(METHOD)
                .user(record.user.clone())
                .metadata(API_KEY_ID_METADATA_KEY, record.key_id.clone());

            if record.issue_session {
                let session = Session::new();
                if let Err(e) = session.insert(&self.session_user_key, &record.user.id) {
                    return AuthResult::from_error(METHOD, &e);
                }
                builder = builder.session(session);
            }

            builder.build()
        })
    }
}
