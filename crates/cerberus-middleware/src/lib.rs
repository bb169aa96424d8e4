//! # Cerberus Middleware
//!
//! HTTP integration for the Cerberus authentication engine.
//!
//! ```text
//! Request → SecurityHeaders → Authentication → Handler
//!                                   ↓ (denied)
//! Response ← SecurityHeaders ← ResponseBuilder
//! ```
//!
//! - [`Middleware`] / [`Next`] - Async middleware chain over [`RequestContext`](cerberus_core::RequestContext)
//! - [`Pipeline`] - Ordered stages ending at a handler
//! - [`AuthenticationMiddleware`] - Post-routing authentication stage
//! - [`SecurityHeadersMiddleware`] - Ambient security headers
//! - [`ResponseBuilder`] - Content-negotiated 401/403/redirect responses

#![doc(html_root_url = "https://docs.rs/cerberus-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod middleware;
pub mod pipeline;
pub mod response;
pub mod stages;
pub mod types;

pub use error::{MiddlewareError, MiddlewareResult};
pub use middleware::{Handler, Middleware, Next};
pub use pipeline::{BoxedMiddleware, Pipeline, PipelineBuilder};
pub use response::{ResponseBuilder, SecurityHeaders};
pub use stages::{AuthenticationMiddleware, SecurityHeadersMiddleware};
pub use types::{Request, Response, ResponseExt};
