//! Authentication stage.
//!
//! Runs after routing. Reads the matched route's [`RouteAuthSpec`] from the
//! context (no spec means an anonymous route), asks the [`Authenticator`]
//! for a decision, and either calls the handler or answers with a failure
//! response from the [`ResponseBuilder`].
//!
//! ```text
//! SessionStore → SecurityHeaders → [Authentication] → Handler
//! ```
//!
//! The session store, if any, wraps this stage and persists whatever
//! session occupies the slot once it returns.

use crate::middleware::{Middleware, Next};
use crate::response::ResponseBuilder;
use crate::types::{Request, Response};
use cerberus_auth::{AuthDecision, Authenticator};
use cerberus_core::{BoxFuture, RequestContext, RouteAuthSpec};
use std::sync::Arc;

/// Post-routing authentication and role authorization.
#[derive(Debug, Clone)]
pub struct AuthenticationMiddleware {
    authenticator: Authenticator,
    responses: Arc<ResponseBuilder>,
}

impl AuthenticationMiddleware {
    /// Creates the stage.
    #[must_use]
    pub fn new(authenticator: Authenticator, responses: Arc<ResponseBuilder>) -> Self {
        Self {
            authenticator,
            responses,
        }
    }

    /// The orchestrator used by this stage.
    #[must_use]
    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }
}

impl Middleware for AuthenticationMiddleware {
    fn name(&self) -> &'static str {
        "authentication"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let route = ctx.route().cloned();
            let anonymous = RouteAuthSpec::anonymous();
            let spec = route.as_deref().unwrap_or(&anonymous);

            match self.authenticator.authenticate(ctx, spec).await {
                AuthDecision::Authorized => next.run(ctx, request).await,
                decision => {
                    let response = self.responses.for_decision(ctx, &decision);
                    tracing::debug!(
                        request_id = %ctx.request_id(),
                        decision = decision.label(),
                        status = response.status().as_u16(),
                        "request denied before handler"
                    );
                    response
                }
            }
        })
    }
}
