//! Property tests for strategy ordering.

use cerberus_auth::{
    AuthDecision, Authenticator, FnStrategy, StrategyRegistry, StrategyResolver,
    MULTI_STRATEGY_FAILURE,
};
use cerberus_core::{AuthResult, RequestContext, RouteAuthSpec, UserRecord};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Builds one strategy per outcome (`true` succeeds) and returns the
/// authenticator, the route requiring them in order and the call counters.
fn setup(outcomes: &[bool]) -> (Authenticator, RouteAuthSpec, Vec<Arc<AtomicUsize>>) {
    let mut builder = StrategyRegistry::builder();
    let mut route = RouteAuthSpec::new();
    let mut counters = Vec::new();

    for (i, succeeds) in outcomes.iter().copied().enumerate() {
        let name = format!("s{i}");
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let user = name.clone();
        let strategy = FnStrategy::new(move |_ctx, _req| {
            counter.fetch_add(1, Ordering::SeqCst);
            if succeeds {
                AuthResult::authenticated("test")
                    .user(UserRecord::new(user.clone()))
                    .build()
            } else {
                AuthResult::failed("test", format!("{user} failed"))
            }
        });
        builder = builder.register(name.clone(), strategy).unwrap();
        route = route.require(name);
        counters.push(calls);
    }

    let resolver = Arc::new(StrategyResolver::new(builder.build()));
    (Authenticator::new(resolver), route, counters)
}

proptest! {
    #[test]
    fn strategies_run_in_order_until_first_success(
        outcomes in proptest::collection::vec(any::<bool>(), 1..6)
    ) {
        let (authenticator, route, counters) = setup(&outcomes);
        let mut ctx = RequestContext::new();

        let decision = tokio_test::block_on(authenticator.authenticate(&mut ctx, &route));
        let winner = outcomes.iter().position(|succeeds| *succeeds);

        for (i, calls) in counters.iter().enumerate() {
            let expected = match winner {
                Some(w) if i > w => 0,
                _ => 1,
            };
            prop_assert_eq!(calls.load(Ordering::SeqCst), expected, "strategy s{}", i);
        }

        let result = ctx.auth_result().unwrap();
        match winner {
            Some(w) => {
                prop_assert!(decision.is_authorized());
                let expected_name = format!("s{w}");
                prop_assert_eq!(result.strategy_name(), Some(expected_name.as_str()));
            }
            None => {
                let is_unauthorized = matches!(decision, AuthDecision::Unauthorized { .. });
                prop_assert!(is_unauthorized);
                prop_assert!(result.is_anonymous());
                let expected_name = if outcomes.len() == 1 {
                    "s0".to_string()
                } else {
                    MULTI_STRATEGY_FAILURE.to_string()
                };
                prop_assert_eq!(result.strategy_name(), Some(expected_name.as_str()));
            }
        }
    }

    #[test]
    fn unknown_requirement_anywhere_runs_nothing(
        outcomes in proptest::collection::vec(any::<bool>(), 1..5),
        position in 0usize..5,
    ) {
        let (authenticator, route, counters) = setup(&outcomes);
        let mut requirements: Vec<String> = route.auth_requirements().to_vec();
        let position = position.min(requirements.len());
        requirements.insert(position, "unregistered".to_string());
        let route = RouteAuthSpec::try_from_parts(requirements, Vec::<String>::new()).unwrap();

        let mut ctx = RequestContext::new();
        let decision = tokio_test::block_on(authenticator.authenticate(&mut ctx, &route));

        let is_misconfigured = matches!(decision, AuthDecision::Misconfigured { .. });
        prop_assert!(is_misconfigured);
        for calls in &counters {
            prop_assert_eq!(calls.load(Ordering::SeqCst), 0);
        }
    }
}
