//! Middleware stages.
//!
//! - [`security_headers`] - Adds the ambient security headers to every response
//! - [`authentication`] - Runs the matched route's requirements and role gate

pub mod authentication;
pub mod security_headers;

pub use authentication::AuthenticationMiddleware;
pub use security_headers::SecurityHeadersMiddleware;
