//! The built-in strategy set, configured from [`AuthConfig`].

use cerberus_auth::{
    AnonymousStrategy, ApiKeyStrategy, ApiKeyTable, AuthError, PermissionStrategy,
    RegistryResult, RoleStrategy, SessionStrategy, Strategy, StrategyRegistry,
    StrategyRegistryBuilder,
};
use cerberus_config::AuthConfig;
use std::sync::Arc;

/// Registered name of [`AnonymousStrategy`].
pub const ANONYMOUS: &str = "anonymous";
/// Registered name of [`SessionStrategy`].
pub const SESSION: &str = "session";
/// Registered name of [`ApiKeyStrategy`].
pub const API_KEY: &str = "api_key";
/// Registered name of [`RoleStrategy`].
pub const ROLE: &str = "role";
/// Registered name of [`PermissionStrategy`].
pub const PERMISSION: &str = "permission";

/// Registers the five built-in strategies and returns the builder, so
/// applications can add their own before freezing it.
///
/// `role` and `permission` authenticate through the strategies named by
/// `role_base_strategy` and `permission_base_strategy`, which must be one
/// of `anonymous`, `session` or `api_key`.
///
/// # Errors
///
/// Returns `AuthError::Config` when a base strategy is itself `role` or
/// `permission`, and `AuthError::UnknownStrategy` when it names nothing
/// registered.
pub fn default_registry_builder(
    config: &AuthConfig,
    api_keys: ApiKeyTable,
) -> RegistryResult<StrategyRegistryBuilder> {
    let api_key = ApiKeyStrategy::new(api_keys)
        .with_header(config.api_key_header.as_str())
        .with_query_param(config.api_key_query_param.as_str())
        .with_session_user_key(config.session_user_key.as_str());

    let builder = StrategyRegistry::builder()
        .register(ANONYMOUS, AnonymousStrategy)?
        .register(SESSION, SessionStrategy::new(config.session_user_key.as_str()))?
        .register(API_KEY, api_key)?;

    let role_base = base_strategy(&builder, &config.role_base_strategy)?;
    let permission_base = base_strategy(&builder, &config.permission_base_strategy)?;

    builder
        .register(
            ROLE,
            RoleStrategy::new(role_base, config.role_base_strategy.as_str()),
        )?
        .register(
            PERMISSION,
            PermissionStrategy::new(permission_base, config.permission_base_strategy.as_str()),
        )
}

/// [`default_registry_builder`], frozen.
///
/// # Errors
///
/// See [`default_registry_builder`].
///
/// # Example
///
/// ```
/// use cerberus::{default_registry, ApiKeyTable, AuthConfig};
///
/// let registry = default_registry(&AuthConfig::default(), ApiKeyTable::new()).unwrap();
/// assert_eq!(
///     registry.names(),
///     ["anonymous", "api_key", "permission", "role", "session"]
/// );
/// ```
pub fn default_registry(
    config: &AuthConfig,
    api_keys: ApiKeyTable,
) -> RegistryResult<StrategyRegistry> {
    default_registry_builder(config, api_keys).map(StrategyRegistryBuilder::build)
}

fn base_strategy(builder: &StrategyRegistryBuilder, name: &str) -> RegistryResult<Arc<dyn Strategy>> {
    if name == ROLE || name == PERMISSION {
        return Err(AuthError::config(format!(
            "{name} cannot be used as a base strategy"
        )));
    }
    builder
        .get(name)
        .ok_or_else(|| AuthError::UnknownStrategy(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_names() {
        let registry = default_registry(&AuthConfig::default(), ApiKeyTable::new()).unwrap();
        assert_eq!(registry.len(), 5);
        for name in [ANONYMOUS, SESSION, API_KEY, ROLE, PERMISSION] {
            assert!(registry.contains(name), "{name} missing");
        }
    }

    #[test]
    fn test_builder_accepts_more_strategies() {
        let registry = default_registry_builder(&AuthConfig::default(), ApiKeyTable::new())
            .unwrap()
            .register("guest", AnonymousStrategy)
            .unwrap()
            .build();
        assert!(registry.contains("guest"));
    }

    #[test]
    fn test_unknown_base_strategy() {
        let config = AuthConfig {
            role_base_strategy: "ldap".to_string(),
            ..AuthConfig::default()
        };
        let err = default_registry(&config, ApiKeyTable::new()).unwrap_err();
        assert!(matches!(err, AuthError::UnknownStrategy(name) if name == "ldap"));
    }

    #[test]
    fn test_self_referencing_base_strategy() {
        let config = AuthConfig {
            permission_base_strategy: "role".to_string(),
            ..AuthConfig::default()
        };
        let err = default_registry(&config, ApiKeyTable::new()).unwrap_err();
        assert!(matches!(err, AuthError::Config(_)));
    }
}
