//! Core middleware trait and types.
//!
//! A [`Middleware`] receives the mutable [`RequestContext`], the request and
//! a [`Next`] continuation. Calling `next.run()` passes control inward;
//! returning a response without calling it short-circuits the chain.
//!
//! # Example
//!
//! ```
//! use cerberus_core::{BoxFuture, RequestContext};
//! use cerberus_middleware::{Middleware, Next, Request, Response};
//!
//! struct Timing;
//!
//! impl Middleware for Timing {
//!     fn name(&self) -> &'static str {
//!         "timing"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut RequestContext,
//!         request: Request,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, Response> {
//!         Box::pin(async move {
//!             let response = next.run(ctx, request).await;
//!             tracing::debug!(elapsed = ?ctx.started_at().elapsed(), "request finished");
//!             response
//!         })
//!     }
//! }
//! ```

use crate::types::{Request, Response};
use cerberus_core::{BoxFuture, RequestContext};

/// The core middleware trait.
///
/// Middleware MUST call `next.run()` at most once.
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name of this stage, used in logs.
    fn name(&self) -> &'static str;

    /// Processes the request, usually by delegating to `next`.
    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response>;
}

/// The terminal handler of a chain.
pub type Handler<'a> =
    Box<dyn FnOnce(&mut RequestContext, Request) -> BoxFuture<'static, Response> + Send + 'a>;

/// Continuation invoking the rest of the chain.
///
/// Consumed by [`run`](Next::run), so it can be called only once.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    Handler(Handler<'a>),
}

impl<'a> Next<'a> {
    /// A continuation that invokes `middleware`, then `next`.
    pub(crate) fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// A continuation that invokes the handler.
    pub fn handler<F>(f: F) -> Self
    where
        F: FnOnce(&mut RequestContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        Self {
            inner: NextInner::Handler(Box::new(f)),
        }
    }

    /// Invokes the next middleware or the handler.
    pub async fn run(self, ctx: &mut RequestContext, request: Request) -> Response {
        match self.inner {
            NextInner::Chain { middleware, next } => middleware.process(ctx, request, *next).await,
            NextInner::Handler(handler) => handler(ctx, request).await,
        }
    }
}
