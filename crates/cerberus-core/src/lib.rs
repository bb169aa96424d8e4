//! # Cerberus Core
//!
//! Core types shared by every Cerberus crate.
//!
//! This crate provides the foundational values the post-routing
//! authentication engine works with:
//!
//! - [`RequestContext`] - Per-request state: session slot, client address,
//!   accept indicator, headers, parameters and the attached [`AuthResult`]
//! - [`Session`] / [`SessionRef`] - Shared, interior-mutable session object
//! - [`AuthResult`] - Outcome of one strategy invocation (`Authenticated` or `Failed`)
//! - [`UserRecord`] - Opaque identity record carried by an authenticated result
//! - [`RouteAuthSpec`] - A matched route's declared requirements
//! - [`CoreError`] - Standard error type for this crate

#![doc(html_root_url = "https://docs.rs/cerberus-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod identity;
mod result;
mod route;
mod session;

use std::future::Future;
use std::pin::Pin;

pub use context::{RequestContext, RequestId};
pub use error::{CoreError, CoreResult};
pub use identity::UserRecord;
pub use result::{AuthFailure, AuthResult, Authenticated, AuthenticatedBuilder, ANONYMOUS_METHOD};
pub use route::RouteAuthSpec;
pub use session::{Session, SessionRef};

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
