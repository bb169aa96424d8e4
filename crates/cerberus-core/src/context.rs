//! Request context types.
//!
//! The [`RequestContext`] carries all per-request state through the
//! middleware pipeline: what strategies need to read (headers, parameters,
//! client address, session) and what authentication writes back (the
//! session slot and the final [`AuthResult`]).

use crate::result::AuthResult;
use crate::route::RouteAuthSpec;
use crate::session::SessionRef;
use http::header::{HeaderMap, ACCEPT, CONTENT_TYPE};
use http::Method;
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which makes it ideal for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Per-request state shared by the dispatcher, the authentication stage,
/// strategies and the handler.
///
/// # Example
///
/// ```
/// use cerberus_core::{RequestContext, Session};
/// use std::sync::Arc;
///
/// let request = http::Request::builder()
///     .uri("/reports?format=csv")
///     .header("accept", "application/json")
///     .body(())
///     .unwrap();
///
/// let mut ctx = RequestContext::from_request(&request);
/// assert_eq!(ctx.path(), "/reports");
/// assert_eq!(ctx.query_param("format"), Some("csv"));
/// assert_eq!(ctx.accept(), Some("application/json"));
///
/// let session = Session::new();
/// ctx.set_session(Arc::clone(&session));
/// assert!(Arc::ptr_eq(ctx.session().unwrap(), &session));
/// ```
pub struct RequestContext {
    request_id: RequestId,
    method: Method,
    path: String,
    headers: HeaderMap,
    query: HashMap<String, String>,
    route_params: HashMap<String, String>,
    client_addr: Option<IpAddr>,
    session: Option<SessionRef>,
    route: Option<Arc<RouteAuthSpec>>,
    auth_result: Option<AuthResult>,
    started_at: Instant,
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl RequestContext {
    /// Creates an empty context for `GET /`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_id: RequestId::new(),
            method: Method::GET,
            path: "/".to_string(),
            headers: HeaderMap::new(),
            query: HashMap::new(),
            route_params: HashMap::new(),
            client_addr: None,
            session: None,
            route: None,
            auth_result: None,
            started_at: Instant::now(),
            extensions: HashMap::new(),
        }
    }

    /// Captures the head of `request` (method, path, headers, query).
    ///
    /// A query string that cannot be decoded is ignored; strategies then
    /// simply see no query parameters.
    #[must_use]
    pub fn from_request<B>(request: &http::Request<B>) -> Self {
        let mut ctx = Self::new();
        ctx.method = request.method().clone();
        ctx.path = request.uri().path().to_string();
        ctx.headers = request.headers().clone();

        if let Some(query) = request.uri().query() {
            match serde_urlencoded::from_str::<Vec<(String, String)>>(query) {
                Ok(pairs) => ctx.query = pairs.into_iter().collect(),
                Err(e) => tracing::debug!(error = %e, "ignoring undecodable query string"),
            }
        }

        ctx
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path (without query string).
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns all request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a decoded query parameter.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Returns a path parameter captured by the router.
    #[must_use]
    pub fn route_param(&self, name: &str) -> Option<&str> {
        self.route_params.get(name).map(String::as_str)
    }

    /// Records a path parameter captured by the router.
    pub fn set_route_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.route_params.insert(name.into(), value.into());
    }

    /// Returns the client address, if the server supplied one.
    #[must_use]
    pub fn client_addr(&self) -> Option<IpAddr> {
        self.client_addr
    }

    /// Sets the client address.
    pub fn set_client_addr(&mut self, addr: IpAddr) {
        self.client_addr = Some(addr);
    }

    /// Returns the content-negotiation indicator: the `Accept` header,
    /// falling back to `Content-Type` when no `Accept` was sent.
    #[must_use]
    pub fn accept(&self) -> Option<&str> {
        self.headers
            .get(ACCEPT)
            .or_else(|| self.headers.get(CONTENT_TYPE))
            .and_then(|v| v.to_str().ok())
    }

    /// Returns the session currently occupying the session slot.
    #[must_use]
    pub fn session(&self) -> Option<&SessionRef> {
        self.session.as_ref()
    }

    /// Replaces the session slot with `session`.
    ///
    /// The slot holds the handle itself, so after this call
    /// `Arc::ptr_eq(ctx.session().unwrap(), &session)` holds.
    pub fn set_session(&mut self, session: SessionRef) {
        self.session = Some(session);
    }

    /// Empties the session slot and returns what it held.
    pub fn take_session(&mut self) -> Option<SessionRef> {
        self.session.take()
    }

    /// Returns the matched route's requirements, if the dispatcher set them.
    #[must_use]
    pub fn route(&self) -> Option<&Arc<RouteAuthSpec>> {
        self.route.as_ref()
    }

    /// Attaches the matched route's requirements.
    pub fn set_route(&mut self, route: Arc<RouteAuthSpec>) {
        self.route = Some(route);
    }

    /// Returns the authentication outcome attached to this request.
    #[must_use]
    pub fn auth_result(&self) -> Option<&AuthResult> {
        self.auth_result.as_ref()
    }

    /// Attaches the authentication outcome.
    pub fn set_auth_result(&mut self, result: AuthResult) {
        self.auth_result = Some(result);
    }

    /// Returns when the request started processing.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Stores a typed extension value.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("client_addr", &self.client_addr)
            .field("session", &self.session.as_ref().map(|s| s.id().to_string()))
            .field("auth_result", &self.auth_result.as_ref().map(AuthResult::log_id))
            .finish_non_exhaustive()
    }
}
