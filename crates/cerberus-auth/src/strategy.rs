//! The strategy trait.
//!
//! A strategy is a named, stateless mechanism that turns a request into an
//! [`AuthResult`]. Strategies are registered once at startup and shared by
//! every request, so they must be `Send + Sync` and keep no per-request
//! state of their own.
//!
//! # Example
//!
//! ```
//! use cerberus_auth::Strategy;
//! use cerberus_core::{AuthResult, BoxFuture, RequestContext, UserRecord};
//!
//! #[derive(Debug)]
//! struct HeaderUser;
//!
//! impl Strategy for HeaderUser {
//!     fn authenticate<'a>(
//!         &'a self,
//!         ctx: &'a RequestContext,
//!         _requirement: &'a str,
//!     ) -> BoxFuture<'a, AuthResult> {
//!         Box::pin(async move {
//!             match ctx.header("x-user") {
//!                 Some(id) => AuthResult::authenticated("header")
//!                     .user(UserRecord::new(id))
//!                     .build(),
//!                 None => AuthResult::failed("header", "missing x-user header"),
//!             }
//!         })
//!     }
//! }
//! ```

use cerberus_core::{AuthResult, BoxFuture, RequestContext};
use std::fmt;

/// A pluggable authentication mechanism.
///
/// `requirement` is the route's full requirement string, so a strategy
/// registered under a prefix (for example `role`) can read its parameter
/// from `role:admin`.
///
/// Failure is reported by returning [`AuthResult::Failed`]. Internal errors
/// should be mapped with [`AuthResult::from_error`] so that no detail leaks
/// into the failure reason.
pub trait Strategy: Send + Sync + fmt::Debug {
    /// Attempts to authenticate the request.
    fn authenticate<'a>(
        &'a self,
        ctx: &'a RequestContext,
        requirement: &'a str,
    ) -> BoxFuture<'a, AuthResult>;
}

/// A strategy created from a synchronous closure.
///
/// # Example
///
/// ```
/// use cerberus_auth::FnStrategy;
/// use cerberus_core::AuthResult;
///
/// let deny_all = FnStrategy::new(|_ctx, _requirement| {
///     AuthResult::failed("deny_all", "access disabled")
/// });
/// ```
pub struct FnStrategy<F> {
    func: F,
}

impl<F> FnStrategy<F> {
    /// Wraps `func` as a strategy.
    pub fn new(func: F) -> Self
    where
        F: Fn(&RequestContext, &str) -> AuthResult + Send + Sync + 'static,
    {
        Self { func }
    }
}

impl<F> Strategy for FnStrategy<F>
where
    F: Fn(&RequestContext, &str) -> AuthResult + Send + Sync + 'static,
{
    fn authenticate<'a>(
        &'a self,
        ctx: &'a RequestContext,
        requirement: &'a str,
    ) -> BoxFuture<'a, AuthResult> {
        let result = (self.func)(ctx, requirement);
        Box::pin(async move { result })
    }
}

impl<F> fmt::Debug for FnStrategy<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStrategy").finish_non_exhaustive()
    }
}
