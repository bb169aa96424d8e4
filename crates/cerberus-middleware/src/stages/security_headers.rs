//! Security headers stage.
//!
//! Adds the configured [`SecurityHeaders`] to whatever response comes back
//! from inner stages or the handler, so successful and failed requests
//! carry the same set. Headers already present are left untouched.

use crate::middleware::{Middleware, Next};
use crate::response::SecurityHeaders;
use crate::types::{Request, Response};
use cerberus_core::{BoxFuture, RequestContext};
use std::sync::Arc;

/// Middleware that merges the security header set into responses.
#[derive(Debug, Clone, Default)]
pub struct SecurityHeadersMiddleware {
    headers: Arc<SecurityHeaders>,
}

impl SecurityHeadersMiddleware {
    /// Creates the stage for a shared header set.
    #[must_use]
    pub fn new(headers: Arc<SecurityHeaders>) -> Self {
        Self { headers }
    }
}

impl Middleware for SecurityHeadersMiddleware {
    fn name(&self) -> &'static str {
        "security_headers"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let mut response = next.run(ctx, request).await;
            self.headers.apply(response.headers_mut());
            response
        })
    }
}
