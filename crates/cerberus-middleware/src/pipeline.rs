//! Ordered middleware pipeline.
//!
//! Stages run outermost first. Session persistence, when the host has it,
//! belongs outside the pipeline (or as an earlier stage) so that it sees
//! the session slot as authentication left it.

use crate::middleware::{Middleware, Next};
use crate::types::{Request, Response};
use cerberus_core::{BoxFuture, RequestContext};
use std::fmt;
use std::sync::Arc;

/// A type-erased middleware.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// An immutable chain of middleware stages ending at a handler.
///
/// # Example
///
/// ```
/// use cerberus_core::RequestContext;
/// use cerberus_middleware::{Pipeline, Request, Response, ResponseExt, SecurityHeadersMiddleware};
/// use http::StatusCode;
///
/// # tokio_test::block_on(async {
/// let pipeline = Pipeline::builder()
///     .stage(SecurityHeadersMiddleware::default())
///     .build();
///
/// let request: Request = http::Request::builder()
///     .uri("/")
///     .body(Default::default())
///     .unwrap();
/// let mut ctx = RequestContext::from_request(&request);
///
/// let response = pipeline
///     .process(&mut ctx, request, |_ctx, _req| {
///         Box::pin(async { Response::text(StatusCode::OK, "hello") })
///     })
///     .await;
/// assert_eq!(response.headers()["x-frame-options"], "DENY");
/// # });
/// ```
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Runs `request` through every stage and then `handler`.
    ///
    /// The context is borrowed so the host can inspect it afterwards, for
    /// example to persist the session that occupies the slot.
    pub async fn process<H>(&self, ctx: &mut RequestContext, request: Request, handler: H) -> Response
    where
        H: FnOnce(&mut RequestContext, Request) -> BoxFuture<'static, Response> + Send + 'static,
    {
        let next = self.build_chain(handler);
        next.run(ctx, request).await
    }

    fn build_chain<'a, H>(&'a self, handler: H) -> Next<'a>
    where
        H: FnOnce(&mut RequestContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        let mut next = Next::handler(handler);
        for middleware in self.stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        next
    }

    /// Returns the stage names in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Builder for constructing a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage. Stages added first run outermost.
    #[must_use]
    pub fn stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Appends an already shared stage.
    #[must_use]
    pub fn boxed_stage(mut self, middleware: BoxedMiddleware) -> Self {
        self.stages.push(middleware);
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
        }
    }
}
