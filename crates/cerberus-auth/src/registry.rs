//! The strategy registry.
//!
//! Strategies are registered by name while the application starts and the
//! registry is then frozen into an immutable, cheaply clonable value shared
//! by every request.

use crate::error::{AuthError, RegistryResult};
use crate::strategy::Strategy;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// An immutable name-to-strategy table.
///
/// # Example
///
/// ```
/// use cerberus_auth::{AnonymousStrategy, StrategyRegistry};
///
/// let registry = StrategyRegistry::builder()
///     .register("anonymous", AnonymousStrategy)?
///     .build();
///
/// assert!(registry.get("anonymous").is_some());
/// assert!(registry.get("session").is_none());
/// # Ok::<(), cerberus_auth::AuthError>(())
/// ```
#[derive(Clone)]
pub struct StrategyRegistry {
    strategies: Arc<HashMap<String, Arc<dyn Strategy>>>,
}

impl StrategyRegistry {
    /// Starts an empty registry.
    #[must_use]
    pub fn builder() -> StrategyRegistryBuilder {
        StrategyRegistryBuilder::default()
    }

    /// Looks up a strategy by its exact registered name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Strategy>> {
        self.strategies.get(name)
    }

    /// Whether a strategy is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.strategies.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered strategies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Whether no strategy is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("strategies", &self.names())
            .finish()
    }
}

/// Mutable registry used during startup.
#[derive(Default)]
pub struct StrategyRegistryBuilder {
    strategies: HashMap<String, Arc<dyn Strategy>>,
}

impl StrategyRegistryBuilder {
    /// Registers `strategy` under `name`.
    ///
    /// Names may contain `:`; such a name only ever matches exactly.
    ///
    /// # Errors
    ///
    /// Fails on an empty name or a name that is already registered.
    pub fn register<S>(self, name: impl Into<String>, strategy: S) -> RegistryResult<Self>
    where
        S: Strategy + 'static,
    {
        self.register_arc(name, Arc::new(strategy))
    }

    /// Registers an already shared strategy under `name`.
    ///
    /// Useful when one strategy instance is also the base of another, as
    /// with [`RoleStrategy`](crate::RoleStrategy).
    ///
    /// # Errors
    ///
    /// Fails on an empty name or a name that is already registered.
    pub fn register_arc(
        mut self,
        name: impl Into<String>,
        strategy: Arc<dyn Strategy>,
    ) -> RegistryResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AuthError::EmptyStrategyName);
        }
        if self.strategies.contains_key(&name) {
            return Err(AuthError::DuplicateStrategy(name));
        }
        tracing::debug!(strategy = %name, "registered authentication strategy");
        self.strategies.insert(name, strategy);
        Ok(self)
    }

    /// Returns a strategy registered so far.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Strategy>> {
        self.strategies.get(name).cloned()
    }

    /// Freezes the registry.
    #[must_use]
    pub fn build(self) -> StrategyRegistry {
        StrategyRegistry {
            strategies: Arc::new(self.strategies),
        }
    }
}

impl fmt::Debug for StrategyRegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.strategies.keys().collect();
        names.sort_unstable();
        f.debug_struct("StrategyRegistryBuilder")
            .field("strategies", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::AnonymousStrategy;

    #[test]
    fn test_register_and_get() {
        let registry = StrategyRegistry::builder()
            .register("anonymous", AnonymousStrategy)
            .unwrap()
            .register("role:admin", AnonymousStrategy)
            .unwrap()
            .build();

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("anonymous"));
        assert!(registry.contains("role:admin"));
        assert!(registry.get("role").is_none());
        assert_eq!(registry.names(), vec!["anonymous", "role:admin"]);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let err = StrategyRegistry::builder()
            .register("anonymous", AnonymousStrategy)
            .unwrap()
            .register("anonymous", AnonymousStrategy)
            .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateStrategy(name) if name == "anonymous"));
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = StrategyRegistry::builder()
            .register("  ", AnonymousStrategy)
            .unwrap_err();
        assert!(matches!(err, AuthError::EmptyStrategyName));
    }

    #[test]
    fn test_builder_get_shares_instance() {
        let builder = StrategyRegistry::builder()
            .register("anonymous", AnonymousStrategy)
            .unwrap();
        let shared = builder.get("anonymous").unwrap();
        let registry = builder.build();
        assert!(Arc::ptr_eq(registry.get("anonymous").unwrap(), &shared));
    }

    #[test]
    fn test_clones_share_table() {
        let registry = StrategyRegistry::builder().build();
        let clone = registry.clone();
        assert!(clone.is_empty());
        assert!(Arc::ptr_eq(&registry.strategies, &clone.strategies));
    }
}
