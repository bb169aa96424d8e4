//! # Cerberus
//!
//! **Post-routing authentication and authorization for HTTP services.**
//!
//! After the router has matched a route, Cerberus checks the route's
//! declared requirements:
//!
//! - Each authentication requirement names a strategy (`session`,
//!   `api_key`, `role:admin|ops`, ...). Strategies run in declared order
//!   and the first success wins.
//! - A requirement with no registered strategy fails the request before
//!   anything runs.
//! - If the route lists roles, the caller must hold at least one of them.
//! - Denied requests get a 401 (JSON or a login redirect) or a 403, always
//!   with the same security headers as successful responses.
//!
//! ## Quick Start
//!
//! ```
//! use cerberus::prelude::*;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let config = ConfigLoader::new().load().unwrap();
//! let registry = default_registry(&config.auth, ApiKeyTable::new()).unwrap();
//! let pipeline = AuthStack::from_config(&config, registry).unwrap().pipeline();
//!
//! let request: Request = http::Request::builder()
//!     .uri("/admin")
//!     .header("accept", "application/json")
//!     .body(Default::default())
//!     .unwrap();
//! let mut ctx = RequestContext::from_request(&request);
//! ctx.set_route(Arc::new(RouteAuthSpec::new().require("session")));
//!
//! let response = pipeline
//!     .process(&mut ctx, request, |_ctx, _req| {
//!         Box::pin(async { Response::text(http::StatusCode::OK, "welcome") })
//!     })
//!     .await;
//! assert_eq!(response.status(), http::StatusCode::UNAUTHORIZED);
//! # });
//! ```
//!
//! ## Crates
//!
//! | Crate | Re-exported as |
//! |-------|----------------|
//! | `cerberus-core` | [`core`] |
//! | `cerberus-auth` | [`auth`] |
//! | `cerberus-middleware` | [`middleware`] |
//! | `cerberus-config` | [`config`] |
//! | `cerberus-telemetry` | [`telemetry`] |

#![doc(html_root_url = "https://docs.rs/cerberus/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod registry;
mod stack;

pub use cerberus_auth as auth;
pub use cerberus_config as config;
pub use cerberus_core as core;
pub use cerberus_middleware as middleware;
pub use cerberus_telemetry as telemetry;

pub use cerberus_auth::{ApiKeyRecord, ApiKeyTable, Strategy, StrategyRegistry};
pub use cerberus_config::{AuthConfig, CerberusConfig, ConfigLoader};
pub use error::{CerberusError, CerberusResult};
pub use registry::{
    default_registry, default_registry_builder, ANONYMOUS, API_KEY, PERMISSION, ROLE, SESSION,
};
pub use stack::AuthStack;

/// Installs logging and metrics as configured.
///
/// # Errors
///
/// Returns `CerberusError::Telemetry` if a subscriber or recorder is
/// already installed, or a setting is invalid.
pub fn init_telemetry(config: &CerberusConfig) -> CerberusResult<()> {
    cerberus_telemetry::init_telemetry(&config.log_config(), &config.metrics_config())?;
    Ok(())
}

/// Common imports.
///
/// ```
/// use cerberus::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        default_registry, default_registry_builder, init_telemetry, AuthStack, CerberusError,
    };

    pub use cerberus_core::{
        AuthFailure, AuthResult, Authenticated, BoxFuture, RequestContext, RouteAuthSpec, Session,
        SessionRef, UserRecord,
    };

    pub use cerberus_auth::{
        ApiKeyRecord, ApiKeyTable, AuthDecision, Authenticator, FnStrategy, Strategy,
        StrategyRegistry, StrategyResolver,
    };

    pub use cerberus_middleware::{
        Middleware, Next, Pipeline, Request, Response, ResponseBuilder, ResponseExt,
    };

    pub use cerberus_config::{CerberusConfig, ConfigLoader};
}
