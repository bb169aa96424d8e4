//! HTTP request and response types used by the middleware chain.

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use http::StatusCode;
use http_body_util::Full;

/// The HTTP request type used in the middleware chain.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type used in the middleware chain.
pub type Response = http::Response<Full<Bytes>>;

/// Content type of plain-text responses.
pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Content type of JSON responses.
pub const APPLICATION_JSON: &str = "application/json";

/// Extension trait for building simple responses.
pub trait ResponseExt {
    /// A plain-text response.
    fn text(status: StatusCode, message: &str) -> Response;

    /// A JSON response.
    fn json(status: StatusCode, body: &serde_json::Value) -> Response;

    /// A `302 Found` redirect with an empty body.
    fn redirect(location: HeaderValue) -> Response;
}

impl ResponseExt for Response {
    fn text(status: StatusCode, message: &str) -> Response {
        with_body(status, HeaderValue::from_static(TEXT_PLAIN), Bytes::from(message.to_string()))
    }

    fn json(status: StatusCode, body: &serde_json::Value) -> Response {
        with_body(
            status,
            HeaderValue::from_static(APPLICATION_JSON),
            Bytes::from(body.to_string()),
        )
    }

    fn redirect(location: HeaderValue) -> Response {
        let mut response = with_body(
            StatusCode::FOUND,
            HeaderValue::from_static(TEXT_PLAIN),
            Bytes::new(),
        );
        response.headers_mut().insert(LOCATION, location);
        response
    }
}

fn with_body(status: StatusCode, content_type: HeaderValue, body: Bytes) -> Response {
    let length = body.len();
    let mut response = http::Response::new(Full::new(body));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, content_type);
    headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
    response
}
