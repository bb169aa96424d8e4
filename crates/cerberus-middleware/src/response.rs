//! Failure responses.
//!
//! [`ResponseBuilder`] turns a non-authorized [`AuthDecision`] into an HTTP
//! response, choosing the shape from the request's accept indicator:
//!
//! | Decision | JSON client | Other clients |
//! |----------|-------------|---------------|
//! | Unauthorized | 401 `{error, message, timestamp}` | 302 to the login path |
//! | Misconfigured | 401 `{error, message, timestamp}` | 401 plain text |
//! | Forbidden | 403 `{error, message}` | 403 plain text |
//!
//! Every response carries the [`SecurityHeaders`] set plus
//! `cache-control: no-store`.

use crate::error::{MiddlewareError, MiddlewareResult};
use crate::types::{Response, ResponseExt};
use cerberus_auth::AuthDecision;
use cerberus_core::{AuthFailure, RequestContext};
use chrono::{SecondsFormat, Utc};
use http::header::{HeaderMap, HeaderName, HeaderValue, CACHE_CONTROL};
use http::StatusCode;
use serde_json::json;
use std::sync::Arc;

/// Default redirect target for unauthenticated HTML clients.
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Default JSON media types. Any `+json` type is recognized as well.
pub const DEFAULT_JSON_MEDIA_TYPES: &[&str] = &["application/json"];

/// Ambient security headers added to every response.
#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    headers: HeaderMap,
}

impl SecurityHeaders {
    /// Builds a header set from name/value pairs.
    ///
    /// # Errors
    ///
    /// Fails if a name or value is not valid HTTP.
    pub fn try_from_pairs<I, K, V>(pairs: I) -> MiddlewareResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            let name = name.as_ref();
            let header = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| MiddlewareError::InvalidHeaderName(name.to_string()))?;
            let value = HeaderValue::from_str(value.as_ref()).map_err(|_| {
                MiddlewareError::InvalidHeaderValue {
                    name: name.to_string(),
                }
            })?;
            headers.insert(header, value);
        }
        Ok(Self { headers })
    }

    /// An empty set.
    #[must_use]
    pub fn none() -> Self {
        Self {
            headers: HeaderMap::new(),
        }
    }

    /// The headers in this set.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Adds every header of the set that `target` does not already have.
    pub fn apply(&self, target: &mut HeaderMap) {
        for (name, value) in &self.headers {
            if !target.contains_key(name) {
                target.insert(name.clone(), value.clone());
            }
        }
    }
}

impl Default for SecurityHeaders {
    fn default() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        );
        headers.insert(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        );
        headers.insert(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        );
        Self { headers }
    }
}

/// Builds content-negotiated failure responses.
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    login_path: HeaderValue,
    json_media_types: Vec<String>,
    security_headers: Arc<SecurityHeaders>,
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        Self {
            login_path: HeaderValue::from_static(DEFAULT_LOGIN_PATH),
            json_media_types: DEFAULT_JSON_MEDIA_TYPES
                .iter()
                .map(|media| (*media).to_string())
                .collect(),
            security_headers: Arc::new(SecurityHeaders::default()),
        }
    }
}

impl ResponseBuilder {
    /// Creates a builder with the default login path, JSON media types and
    /// security headers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the redirect target for unauthenticated HTML clients.
    ///
    /// # Errors
    ///
    /// Fails unless `path` starts with `/` and is a valid header value.
    pub fn with_login_path(mut self, path: &str) -> MiddlewareResult<Self> {
        if !path.starts_with('/') {
            return Err(MiddlewareError::InvalidLoginPath(path.to_string()));
        }
        self.login_path = HeaderValue::from_str(path)
            .map_err(|_| MiddlewareError::InvalidLoginPath(path.to_string()))?;
        Ok(self)
    }

    /// Replaces the recognized JSON media types.
    #[must_use]
    pub fn with_json_media_types<I, S>(mut self, media_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.json_media_types = media_types
            .into_iter()
            .map(|media| media.into().to_ascii_lowercase())
            .collect();
        self
    }

    /// Replaces the security header set.
    #[must_use]
    pub fn with_security_headers(mut self, headers: Arc<SecurityHeaders>) -> Self {
        self.security_headers = headers;
        self
    }

    /// The security header set merged into every response.
    #[must_use]
    pub fn security_headers(&self) -> &Arc<SecurityHeaders> {
        &self.security_headers
    }

    /// The login redirect target.
    #[must_use]
    pub fn login_path(&self) -> &str {
        self.login_path.to_str().unwrap_or(DEFAULT_LOGIN_PATH)
    }

    /// Whether the accept indicator names a JSON media type.
    #[must_use]
    pub fn wants_json(&self, accept: Option<&str>) -> bool {
        let Some(accept) = accept else {
            return false;
        };
        accept.split(',').any(|entry| {
            let mut parts = entry.split(';');
            let media = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
            let refused = parts.any(|param| is_zero_quality(param.trim()));
            !refused
                && (media.ends_with("+json")
                    || self.json_media_types.iter().any(|json| *json == media))
        })
    }

    /// Builds the response for a decision that does not reach the handler.
    ///
    /// `Authorized` has no failure response; it yields a bare `204` and
    /// should not be passed here.
    #[must_use]
    pub fn for_decision(&self, ctx: &RequestContext, decision: &AuthDecision) -> Response {
        match decision {
            AuthDecision::Unauthorized { failure } => self.unauthorized(ctx, failure),
            AuthDecision::Forbidden { required, .. } => {
                let required: Vec<&str> = required.iter().map(String::as_str).collect();
                self.forbidden(ctx, &required)
            }
            AuthDecision::Misconfigured { requirement } => self.misconfigured(ctx, requirement),
            AuthDecision::Authorized => self.finish(Response::text(StatusCode::NO_CONTENT, "")),
        }
    }

    /// 401 JSON body, or a redirect to the login path.
    #[must_use]
    pub fn unauthorized(&self, ctx: &RequestContext, failure: &AuthFailure) -> Response {
        let response = if self.wants_json(ctx.accept()) {
            Response::json(
                StatusCode::UNAUTHORIZED,
                &json!({
                    "error": "Unauthorized",
                    "message": failure.failure_reason,
                    "timestamp": timestamp(),
                }),
            )
        } else {
            Response::redirect(self.login_path.clone())
        };
        self.finish(response)
    }

    /// 403 naming the roles the route accepts.
    #[must_use]
    pub fn forbidden(&self, ctx: &RequestContext, required_roles: &[&str]) -> Response {
        let message = format!("requires one of roles: {}", required_roles.join(", "));
        let response = if self.wants_json(ctx.accept()) {
            Response::json(
                StatusCode::FORBIDDEN,
                &json!({
                    "error": "Forbidden",
                    "message": message,
                }),
            )
        } else {
            Response::text(StatusCode::FORBIDDEN, &message)
        };
        self.finish(response)
    }

    /// 401 reporting a requirement with no registered strategy.
    #[must_use]
    pub fn misconfigured(&self, ctx: &RequestContext, requirement: &str) -> Response {
        let message = format!("authentication strategy not configured: {requirement}");
        let response = if self.wants_json(ctx.accept()) {
            Response::json(
                StatusCode::UNAUTHORIZED,
                &json!({
                    "error": "Unauthorized",
                    "message": message,
                    "timestamp": timestamp(),
                }),
            )
        } else {
            Response::text(StatusCode::UNAUTHORIZED, &message)
        };
        self.finish(response)
    }

    fn finish(&self, mut response: Response) -> Response {
        let headers = response.headers_mut();
        self.security_headers.apply(headers);
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
        response
    }
}

/// Whether a media-range parameter is `q=0` (the client refuses the type).
fn is_zero_quality(param: &str) -> bool {
    let Some((name, value)) = param.split_once('=') else {
        return false;
    };
    name.trim().eq_ignore_ascii_case("q")
        && value.trim().parse::<f32>().is_ok_and(|q| q <= 0.0)
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
    use http_body_util::BodyExt;

    fn ctx(accept: Option<&str>) -> RequestContext {
        let mut builder = http::Request::builder().uri("/private");
        if let Some(accept) = accept {
            builder = builder.header("accept", accept);
        }
        RequestContext::from_request(&builder.body(()).unwrap())
    }

    fn failure() -> AuthFailure {
        AuthFailure {
            failure_reason: "invalid API key".to_string(),
            auth_method: "api_key".to_string(),
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes: Bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_wants_json() {
        let builder = ResponseBuilder::new();
        assert!(builder.wants_json(Some("application/json")));
        assert!(builder.wants_json(Some("text/html, application/json;q=0.9")));
        assert!(builder.wants_json(Some("application/problem+json")));
        assert!(builder.wants_json(Some("Application/JSON; charset=utf-8")));
        assert!(!builder.wants_json(Some("text/html,*/*")));
        assert!(!builder.wants_json(None));

        // q=0 refuses the type.
        assert!(!builder.wants_json(Some("text/html, application/json;q=0")));
        assert!(!builder.wants_json(Some("application/json; Q=0.000")));
        assert!(!builder.wants_json(Some("application/vnd.api+json;q=0")));
        assert!(builder.wants_json(Some("application/json;q=0, application/hal+json")));
        assert!(builder.wants_json(Some("application/json;q=0.1")));

        let custom = ResponseBuilder::new().with_json_media_types(["application/x-ndjson"]);
        assert!(custom.wants_json(Some("application/x-ndjson")));
        assert!(!custom.wants_json(Some("application/json")));
    }

    #[tokio::test]
    async fn test_unauthorized_json() {
        let response = ResponseBuilder::new().unauthorized(&ctx(Some("application/json")), &failure());

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert!(response.headers().contains_key(CONTENT_LENGTH));
        assert_eq!(response.headers()[CACHE_CONTROL], "no-store");
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");

        let body = body_json(response).await;
        assert_eq!(body["error"], "Unauthorized");
        assert_eq!(body["message"], "invalid API key");
        let timestamp = body["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
    }

    #[test]
    fn test_unauthorized_html_redirects() {
        let builder = ResponseBuilder::new().with_login_path("/signin").unwrap();
        let response = builder.unauthorized(&ctx(Some("text/html")), &failure());

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "/signin");
        assert_eq!(response.headers()["x-frame-options"], "DENY");
    }

    #[test]
    fn test_refused_json_gets_redirect() {
        let response = ResponseBuilder::new()
            .unauthorized(&ctx(Some("text/html, application/json;q=0")), &failure());

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "/login");
    }

    #[tokio::test]
    async fn test_forbidden_shapes() {
        let builder = ResponseBuilder::new();

        let response = builder.forbidden(&ctx(Some("application/json")), &["admin", "editor"]);
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Forbidden");
        assert_eq!(body["message"], "requires one of roles: admin, editor");
        assert!(body.get("timestamp").is_none());

        let response = builder.forbidden(&ctx(None), &["admin"]);
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
    }

    #[tokio::test]
    async fn test_misconfigured() {
        let builder = ResponseBuilder::new();

        let response = builder.misconfigured(&ctx(None), "jwt");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"authentication strategy not configured: jwt");

        let response = builder.misconfigured(&ctx(Some("application/json")), "jwt");
        let body = body_json(response).await;
        assert!(body["message"].as_str().unwrap().contains("not configured"));
    }

    #[test]
    fn test_invalid_login_path() {
        assert!(ResponseBuilder::new().with_login_path("login").is_err());
        assert!(ResponseBuilder::new().with_login_path("/log\nin").is_err());
        assert_eq!(
            ResponseBuilder::new().with_login_path("/auth").unwrap().login_path(),
            "/auth"
        );
    }

    #[test]
    fn test_security_headers_do_not_overwrite() {
        let headers = SecurityHeaders::default();
        let mut target = HeaderMap::new();
        target.insert("x-frame-options", HeaderValue::from_static("SAMEORIGIN"));

        headers.apply(&mut target);

        assert_eq!(target["x-frame-options"], "SAMEORIGIN");
        assert_eq!(target["x-content-type-options"], "nosniff");
        assert_eq!(target["referrer-policy"], "strict-origin-when-cross-origin");
    }

    #[test]
    fn test_security_headers_from_pairs() {
        let headers =
            SecurityHeaders::try_from_pairs([("strict-transport-security", "max-age=63072000")])
                .unwrap();
        assert_eq!(headers.headers().len(), 1);

        assert!(SecurityHeaders::try_from_pairs([("bad header", "x")]).is_err());
        assert!(SecurityHeaders::try_from_pairs([("x-ok", "bad\nvalue")]).is_err());
        assert!(SecurityHeaders::none().headers().is_empty());
    }
}
