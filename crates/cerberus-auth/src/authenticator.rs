//! The authentication orchestrator.
//!
//! Given a matched route's [`RouteAuthSpec`], the [`Authenticator`]:
//!
//! 1. treats a route with no requirements as anonymous and authorizes it
//! 2. resolves every requirement up front, refusing the request before any
//!    strategy runs if one of them has no strategy
//! 3. tries the strategies strictly in declared order, stopping at the
//!    first success
//! 4. stamps the resolved strategy name on the winning result, adopts its
//!    session and applies the route's role gate
//! 5. when every strategy fails, attaches an anonymous result describing
//!    every attempt and reports the last failure
//!
//! Exactly one [`AuthResult`] is attached to the request context on every
//! path.

use crate::resolver::{ResolvedStrategy, StrategyResolver};
use crate::roles::{check_roles, RoleCheck};
use cerberus_core::{AuthFailure, AuthResult, RequestContext, RouteAuthSpec};
use cerberus_telemetry::metrics::{record_decision, record_strategy_attempt};
use indexmap::IndexSet;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// Strategy name recorded when several strategies were tried and all failed.
pub const MULTI_STRATEGY_FAILURE: &str = "multi_strategy";

/// Metadata key listing the strategies tried, in order.
pub const ATTEMPTED_STRATEGIES_KEY: &str = "attempted_strategies";

/// Metadata key listing the failure reasons, parallel to the attempts.
pub const FAILURE_REASONS_KEY: &str = "failure_reasons";

/// Reason attached when a requirement has no strategy.
const NOT_CONFIGURED_REASON: &str = "authentication strategy not configured";

/// The orchestrator's verdict for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDecision {
    /// Proceed to the handler.
    Authorized,
    /// Every strategy failed; `failure` is the last one.
    Unauthorized {
        /// The last strategy failure.
        failure: AuthFailure,
    },
    /// The caller authenticated but holds none of the required roles.
    Forbidden {
        /// Roles the route accepts.
        required: IndexSet<String>,
        /// Roles the caller holds.
        actual: Vec<String>,
    },
    /// A requirement names no registered strategy. No strategy was run.
    Misconfigured {
        /// The first unresolvable requirement.
        requirement: String,
    },
}

impl AuthDecision {
    /// Whether the handler may run.
    #[must_use]
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized)
    }

    /// Short label used for metrics and logs.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Authorized => "authorized",
            Self::Unauthorized { .. } => "unauthorized",
            Self::Forbidden { .. } => "forbidden",
            Self::Misconfigured { .. } => "misconfigured",
        }
    }
}

/// Runs a route's authentication requirements against a request.
///
/// # Example
///
/// ```
/// use cerberus_auth::{AnonymousStrategy, Authenticator, StrategyRegistry, StrategyResolver};
/// use cerberus_core::{RequestContext, RouteAuthSpec};
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let registry = StrategyRegistry::builder()
///     .register("anonymous", AnonymousStrategy)
///     .unwrap()
///     .build();
/// let authenticator = Authenticator::new(Arc::new(StrategyResolver::new(registry)));
///
/// let mut ctx = RequestContext::new();
/// let route = RouteAuthSpec::new().require("anonymous");
/// let decision = authenticator.authenticate(&mut ctx, &route).await;
///
/// assert!(decision.is_authorized());
/// assert!(ctx.auth_result().unwrap().is_anonymous());
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct Authenticator {
    resolver: Arc<StrategyResolver>,
}

impl Authenticator {
    /// Creates an orchestrator over a shared resolver.
    #[must_use]
    pub fn new(resolver: Arc<StrategyResolver>) -> Self {
        Self { resolver }
    }

    /// The resolver in use.
    #[must_use]
    pub fn resolver(&self) -> &Arc<StrategyResolver> {
        &self.resolver
    }

    /// Authenticates and authorizes one request.
    ///
    /// Always attaches exactly one [`AuthResult`] to `ctx`. On success the
    /// context's session slot holds the winning result's session, if it
    /// carried one.
    pub async fn authenticate(&self, ctx: &mut RequestContext, route: &RouteAuthSpec) -> AuthDecision {
        let decision = self.run(ctx, route).await;
        record_decision(decision.label());
        decision
    }

    async fn run(&self, ctx: &mut RequestContext, route: &RouteAuthSpec) -> AuthDecision {
        if route.is_anonymous() {
            ctx.set_auth_result(AuthResult::anonymous(ctx.client_addr()));
            return AuthDecision::Authorized;
        }

        let strategies = match self.resolve_all(route.auth_requirements()) {
            Ok(strategies) => strategies,
            Err(requirement) => {
                tracing::error!(
                    request_id = %ctx.request_id(),
                    requirement = %requirement,
                    path = %ctx.path(),
                    "no authentication strategy registered for requirement"
                );
                ctx.set_auth_result(AuthResult::failed(requirement.clone(), NOT_CONFIGURED_REASON));
                return AuthDecision::Misconfigured { requirement };
            }
        };

        let mut failures: Vec<(String, AuthFailure)> = Vec::with_capacity(strategies.len());

        for (requirement, resolved) in route.auth_requirements().iter().zip(&strategies) {
            let started = Instant::now();
            let result = resolved.strategy().authenticate(ctx, requirement).await;
            let elapsed = started.elapsed();

            match result {
                AuthResult::Authenticated(_) => {
                    record_strategy_attempt(resolved.name(), "success", elapsed);
                    let stamped = result.with_strategy_name(resolved.name());
                    tracing::debug!(
                        request_id = %ctx.request_id(),
                        requirement = %requirement,
                        strategy = %resolved.name(),
                        caller = %stamped.log_id(),
                        duration_ms = elapsed.as_secs_f64() * 1000.0,
                        "authentication succeeded"
                    );
                    return Self::admit(ctx, route, stamped);
                }
                AuthResult::Failed(failure) => {
                    record_strategy_attempt(resolved.name(), "failure", elapsed);
                    tracing::info!(
                        request_id = %ctx.request_id(),
                        requirement = %requirement,
                        strategy = %resolved.name(),
                        reason = %failure.failure_reason,
                        duration_ms = elapsed.as_secs_f64() * 1000.0,
                        "authentication strategy failed"
                    );
                    failures.push((resolved.name().to_string(), failure));
                }
            }
        }

        Self::reject(ctx, failures)
    }

    /// Resolves every requirement, or returns the first that does not resolve.
    fn resolve_all(&self, requirements: &[String]) -> Result<Vec<ResolvedStrategy>, String> {
        requirements
            .iter()
            .map(|requirement| {
                self.resolver
                    .resolve(requirement)
                    .ok_or_else(|| requirement.clone())
            })
            .collect()
    }

    fn admit(ctx: &mut RequestContext, route: &RouteAuthSpec, result: AuthResult) -> AuthDecision {
        let check = match result.as_authenticated() {
            Some(auth) => {
                if let Some(session) = auth.session() {
                    ctx.set_session(Arc::clone(session));
                }
                check_roles(auth, route.role_requirements())
            }
            None => RoleCheck::Pass,
        };

        let decision = match check {
            RoleCheck::Pass => AuthDecision::Authorized,
            RoleCheck::Deny { required, actual } => {
                tracing::warn!(
                    request_id = %ctx.request_id(),
                    caller = %result.log_id(),
                    required_roles = ?required,
                    actual_roles = ?actual,
                    path = %ctx.path(),
                    "caller lacks required role"
                );
                AuthDecision::Forbidden { required, actual }
            }
        };

        ctx.set_auth_result(result);
        decision
    }

    fn reject(ctx: &mut RequestContext, failures: Vec<(String, AuthFailure)>) -> AuthDecision {
        let attempted: Vec<Value> = failures
            .iter()
            .map(|(name, _)| Value::from(name.as_str()))
            .collect();
        let reasons: Vec<Value> = failures
            .iter()
            .map(|(_, failure)| Value::from(failure.failure_reason.as_str()))
            .collect();
        let strategy_name = match failures.as_slice() {
            [(name, _)] => name.clone(),
            _ => MULTI_STRATEGY_FAILURE.to_string(),
        };

        tracing::warn!(
            request_id = %ctx.request_id(),
            attempted = ?attempted,
            reasons = ?reasons,
            path = %ctx.path(),
            "all authentication strategies failed"
        );

        let result = AuthResult::anonymous_builder(ctx.client_addr())
            .strategy_name(strategy_name)
            .metadata(ATTEMPTED_STRATEGIES_KEY, attempted)
            .metadata(FAILURE_REASONS_KEY, reasons)
            .build();
        ctx.set_auth_result(result);

        let failure = failures
            .into_iter()
            .last()
            .map(|(_, failure)| failure)
            .unwrap_or_else(|| AuthFailure {
                failure_reason: "no authentication strategy succeeded".to_string(),
                auth_method: MULTI_STRATEGY_FAILURE.to_string(),
            });
        AuthDecision::Unauthorized { failure }
    }
}
