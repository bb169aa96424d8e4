//! Requirement-to-strategy resolution.
//!
//! A requirement resolves by exact registry name first. Failing that, the
//! part before the first `:` is tried, so `role:admin` falls back to the
//! strategy registered as `role`. Only the first colon is significant:
//! `role:a:b` falls back to `role`, never to `role:a`.
//!
//! Results, including "not registered", are memoized per requirement
//! string. The registry is frozen, so a memoized answer never goes stale.

use crate::registry::StrategyRegistry;
use crate::strategy::Strategy;
use cerberus_telemetry::metrics::record_cache_lookup;
use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A strategy together with the registry name it was found under.
#[derive(Clone)]
pub struct ResolvedStrategy {
    strategy: Arc<dyn Strategy>,
    name: String,
}

impl ResolvedStrategy {
    /// The strategy.
    #[must_use]
    pub fn strategy(&self) -> &Arc<dyn Strategy> {
        &self.strategy
    }

    /// The registry name that matched: the requirement itself, or its
    /// prefix when resolution fell back.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for ResolvedStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedStrategy")
            .field("name", &self.name)
            .field("strategy", &self.strategy)
            .finish()
    }
}

/// Resolver cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that consulted the registry.
    pub misses: u64,
    /// Distinct requirement strings cached.
    pub size: usize,
}

/// Maps requirement strings to registered strategies.
///
/// # Example
///
/// ```
/// use cerberus_auth::{AnonymousStrategy, StrategyRegistry, StrategyResolver};
///
/// let registry = StrategyRegistry::builder()
///     .register("role", AnonymousStrategy)?
///     .build();
/// let resolver = StrategyResolver::new(registry);
///
/// assert_eq!(resolver.resolve("role:admin").unwrap().name(), "role");
/// assert!(resolver.resolve("jwt").is_none());
/// # Ok::<(), cerberus_auth::AuthError>(())
/// ```
pub struct StrategyResolver {
    registry: StrategyRegistry,
    cache: DashMap<String, Option<ResolvedStrategy>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl StrategyResolver {
    /// Creates a resolver over a frozen registry.
    #[must_use]
    pub fn new(registry: StrategyRegistry) -> Self {
        Self {
            registry,
            cache: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Resolves `requirement`, or returns `None` when neither the full
    /// string nor its prefix is registered.
    pub fn resolve(&self, requirement: &str) -> Option<ResolvedStrategy> {
        let cached = self.cache.get(requirement).map(|entry| entry.value().clone());
        if let Some(resolved) = cached {
            self.hits.fetch_add(1, Ordering::Relaxed);
            record_cache_lookup(true);
            return resolved;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        record_cache_lookup(false);

        let resolved = self.lookup(requirement);
        self.cache.insert(requirement.to_string(), resolved.clone());
        resolved
    }

    fn lookup(&self, requirement: &str) -> Option<ResolvedStrategy> {
        if let Some(strategy) = self.registry.get(requirement) {
            return Some(ResolvedStrategy {
                strategy: Arc::clone(strategy),
                name: requirement.to_string(),
            });
        }

        let (prefix, _) = requirement.split_once(':')?;
        self.registry.get(prefix).map(|strategy| ResolvedStrategy {
            strategy: Arc::clone(strategy),
            name: prefix.to_string(),
        })
    }

    /// The registry this resolver reads.
    #[must_use]
    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// Returns cache statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: self.cache.len(),
        }
    }
}

impl fmt::Debug for StrategyResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyResolver")
            .field("registry", &self.registry)
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::AnonymousStrategy;
    use proptest::prelude::*;

    fn resolver(names: &[&str]) -> StrategyResolver {
        let mut builder = StrategyRegistry::builder();
        for name in names {
            builder = builder.register(*name, AnonymousStrategy).unwrap();
        }
        StrategyResolver::new(builder.build())
    }

    #[test]
    fn test_exact_match() {
        let resolver = resolver(&["session", "api_key"]);
        let resolved = resolver.resolve("session").unwrap();
        assert_eq!(resolved.name(), "session");
    }

    #[test]
    fn test_prefix_fallback() {
        let resolver = resolver(&["role"]);
        assert_eq!(resolver.resolve("role:admin").unwrap().name(), "role");
    }

    #[test]
    fn test_exact_wins_over_prefix() {
        let resolver = resolver(&["role", "role:admin"]);
        assert_eq!(resolver.resolve("role:admin").unwrap().name(), "role:admin");
        assert_eq!(resolver.resolve("role:editor").unwrap().name(), "role");
    }

    #[test]
    fn test_only_first_colon_is_significant() {
        let resolver = resolver(&["role:a"]);
        assert!(resolver.resolve("role:a:b").is_none());

        let resolver = self::resolver(&["role"]);
        assert_eq!(resolver.resolve("role:a:b").unwrap().name(), "role");
    }

    #[test]
    fn test_unknown_requirement() {
        let resolver = resolver(&["session"]);
        assert!(resolver.resolve("jwt").is_none());
        assert!(resolver.resolve("jwt:strict").is_none());
        assert!(resolver.resolve(":session").is_none());
    }

    #[test]
    fn test_cache_records_hits_and_absent_entries() {
        let resolver = resolver(&["session"]);

        assert!(resolver.resolve("session").is_some());
        assert!(resolver.resolve("session").is_some());
        assert!(resolver.resolve("jwt").is_none());
        assert!(resolver.resolve("jwt").is_none());

        let stats = resolver.stats();
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.size, 2);
    }

    #[test]
    fn test_cached_result_is_same_strategy() {
        let resolver = resolver(&["session"]);
        let first = resolver.resolve("session").unwrap();
        let second = resolver.resolve("session").unwrap();
        assert!(Arc::ptr_eq(first.strategy(), second.strategy()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_resolution_converges() {
        const TASKS: usize = 16;
        const ROUNDS: usize = 500;

        let resolver = Arc::new(resolver(&["role", "session"]));
        let mut handles = Vec::with_capacity(TASKS);
        for _ in 0..TASKS {
            let resolver = Arc::clone(&resolver);
            handles.push(tokio::spawn(async move {
                let mut seen = Vec::with_capacity(ROUNDS * 2);
                for _ in 0..ROUNDS {
                    let role = resolver.resolve("role:admin");
                    seen.push(role.map(|r| (r.name().to_string(), Arc::clone(r.strategy()))));
                    assert!(resolver.resolve("jwt").is_none());
                    tokio::task::yield_now().await;
                }
                seen
            }));
        }

        let expected = resolver.registry().get("role").cloned().unwrap();
        for handle in handles {
            for resolved in handle.await.unwrap() {
                let (name, strategy) = resolved.unwrap();
                assert_eq!(name, "role");
                assert!(Arc::ptr_eq(&strategy, &expected));
            }
        }

        let stats = resolver.stats();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.hits + stats.misses, (TASKS * ROUNDS * 2) as u64);
        assert!(stats.misses >= 2);
    }

    proptest! {
        #[test]
        fn prop_prefix_rule(prefix in "[a-z_]{1,8}", suffix in "[a-z:|]{0,12}") {
            let resolver = resolver(&[prefix.as_str()]);
            let requirement = format!("{prefix}:{suffix}");

            let resolved = resolver.resolve(&requirement);
            prop_assert_eq!(resolved.map(|r| r.name().to_string()), Some(prefix.clone()));

            // An unregistered prefix never resolves, whatever follows it.
            let other = format!("x{prefix}:{suffix}");
            prop_assert!(resolver.resolve(&other).is_none());
        }

        #[test]
        fn prop_resolution_is_stable(requirement in "[a-z:]{1,16}") {
            let resolver = resolver(&["a", "b:c"]);
            let first = resolver.resolve(&requirement).map(|r| r.name().to_string());
            let second = resolver.resolve(&requirement).map(|r| r.name().to_string());
            prop_assert_eq!(first, second);
        }
    }
}
