//! # Cerberus Auth
//!
//! Post-routing authentication and role authorization.
//!
//! Once the router has matched a route, its declared requirements are
//! checked here:
//!
//! - [`Strategy`] - A named authentication mechanism
//! - [`StrategyRegistry`] - Strategies registered at startup, then frozen
//! - [`StrategyResolver`] - Maps requirement strings to strategies (exact
//!   name, then the prefix before the first `:`), memoizing the answer
//! - [`Authenticator`] - Runs requirements in order and applies the role gate
//! - [`strategies`] - Built-in strategies (anonymous, session, API key,
//!   role and permission)
//!
//! ## Example
//!
//! ```
//! use cerberus_auth::{
//!     AnonymousStrategy, AuthDecision, Authenticator, SessionStrategy,
//!     StrategyRegistry, StrategyResolver,
//! };
//! use cerberus_core::{RequestContext, RouteAuthSpec};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let registry = StrategyRegistry::builder()
//!     .register("session", SessionStrategy::default())?
//!     .register("anonymous", AnonymousStrategy)?
//!     .build();
//! let authenticator = Authenticator::new(Arc::new(StrategyResolver::new(registry)));
//!
//! let route = RouteAuthSpec::new().require("session").require("anonymous");
//! let mut ctx = RequestContext::new();
//!
//! let decision = authenticator.authenticate(&mut ctx, &route).await;
//! assert_eq!(decision, AuthDecision::Authorized);
//! assert_eq!(ctx.auth_result().unwrap().strategy_name(), Some("anonymous"));
//! # Ok::<(), cerberus_auth::AuthError>(())
//! # }).unwrap();
//! ```

#![doc(html_root_url = "https://docs.rs/cerberus-auth/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod authenticator;
mod error;
mod registry;
mod resolver;
pub mod roles;
pub mod strategies;
mod strategy;

pub use authenticator::{
    AuthDecision, Authenticator, ATTEMPTED_STRATEGIES_KEY, FAILURE_REASONS_KEY,
    MULTI_STRATEGY_FAILURE,
};
pub use error::{AuthError, RegistryResult};
pub use registry::{StrategyRegistry, StrategyRegistryBuilder};
pub use resolver::{CacheStats, ResolvedStrategy, StrategyResolver};
pub use roles::{check_roles, extract_roles, RoleCheck};
pub use strategies::{
    AnonymousStrategy, ApiKeyRecord, ApiKeyStrategy, ApiKeyTable, PermissionStrategy,
    RoleStrategy, SessionStrategy,
};
pub use strategy::{FnStrategy, Strategy};
