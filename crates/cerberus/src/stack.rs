//! Assembly of the authentication stages from configuration.

use crate::error::CerberusResult;
use cerberus_auth::{Authenticator, StrategyRegistry, StrategyResolver};
use cerberus_config::CerberusConfig;
use cerberus_middleware::{
    AuthenticationMiddleware, Pipeline, PipelineBuilder, ResponseBuilder, SecurityHeaders,
    SecurityHeadersMiddleware,
};
use std::sync::Arc;

/// The configured authentication stages, ready to be placed after routing.
///
/// ```text
/// [host stages] → SecurityHeaders → Authentication → Handler
/// ```
///
/// # Example
///
/// ```
/// use cerberus::{default_registry, ApiKeyTable, AuthStack, CerberusConfig};
///
/// let config = CerberusConfig::default();
/// let registry = default_registry(&config.auth, ApiKeyTable::new()).unwrap();
/// let stack = AuthStack::from_config(&config, registry).unwrap();
///
/// assert_eq!(stack.pipeline().stage_names(), ["security_headers", "authentication"]);
/// ```
#[derive(Debug, Clone)]
pub struct AuthStack {
    resolver: Arc<StrategyResolver>,
    responses: Arc<ResponseBuilder>,
    authentication: AuthenticationMiddleware,
    security_headers: SecurityHeadersMiddleware,
}

impl AuthStack {
    /// Builds the resolver, orchestrator, response builder and both stages.
    ///
    /// # Errors
    ///
    /// Fails if the login path or a security header cannot be expressed as
    /// HTTP values. [`CerberusConfig::validate`] rejects the same inputs.
    pub fn from_config(config: &CerberusConfig, registry: StrategyRegistry) -> CerberusResult<Self> {
        let auth = &config.auth;

        let headers = Arc::new(SecurityHeaders::try_from_pairs(
            auth.security_headers
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str())),
        )?);

        let responses = Arc::new(
            ResponseBuilder::new()
                .with_login_path(&auth.login_path)?
                .with_json_media_types(auth.json_media_types.iter().map(String::as_str))
                .with_security_headers(Arc::clone(&headers)),
        );

        tracing::info!(
            strategies = ?registry.names(),
            login_path = %auth.login_path,
            "authentication stack ready"
        );

        let resolver = Arc::new(StrategyResolver::new(registry));
        let authenticator = Authenticator::new(Arc::clone(&resolver));

        Ok(Self {
            resolver,
            authentication: AuthenticationMiddleware::new(authenticator, Arc::clone(&responses)),
            security_headers: SecurityHeadersMiddleware::new(headers),
            responses,
        })
    }

    /// Appends the security header and authentication stages to `builder`.
    ///
    /// Stages already in `builder` run first; a session store belongs there
    /// so it sees the session the authentication stage leaves in the slot.
    #[must_use]
    pub fn install(&self, builder: PipelineBuilder) -> PipelineBuilder {
        builder
            .stage(self.security_headers.clone())
            .stage(self.authentication.clone())
    }

    /// A pipeline holding only the two authentication stages.
    #[must_use]
    pub fn pipeline(&self) -> Pipeline {
        self.install(Pipeline::builder()).build()
    }

    /// The shared strategy resolver.
    #[must_use]
    pub fn resolver(&self) -> &Arc<StrategyResolver> {
        &self.resolver
    }

    /// The orchestrator.
    #[must_use]
    pub fn authenticator(&self) -> &Authenticator {
        self.authentication.authenticator()
    }

    /// The failure response builder.
    #[must_use]
    pub fn responses(&self) -> &Arc<ResponseBuilder> {
        &self.responses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{default_registry, ApiKeyTable};

    fn registry(config: &CerberusConfig) -> StrategyRegistry {
        default_registry(&config.auth, ApiKeyTable::new()).unwrap()
    }

    #[test]
    fn test_from_config_applies_auth_section() {
        let mut config = CerberusConfig::default();
        config.auth.login_path = "/signin".to_string();
        config.auth.security_headers.clear();
        config
            .auth
            .security_headers
            .insert("x-frame-options".to_string(), "SAMEORIGIN".to_string());

        let stack = AuthStack::from_config(&config, registry(&config)).unwrap();
        assert_eq!(stack.responses().login_path(), "/signin");
        assert_eq!(
            stack.responses().security_headers().headers()["x-frame-options"],
            "SAMEORIGIN"
        );
        assert_eq!(stack.responses().security_headers().headers().len(), 1);
    }

    #[test]
    fn test_from_config_rejects_bad_values() {
        let mut config = CerberusConfig::default();
        config.auth.login_path = "signin".to_string();
        assert!(AuthStack::from_config(&config, registry(&CerberusConfig::default())).is_err());

        let mut config = CerberusConfig::default();
        config
            .auth
            .security_headers
            .insert("bad header".to_string(), "x".to_string());
        assert!(AuthStack::from_config(&config, registry(&CerberusConfig::default())).is_err());
    }

    #[test]
    fn test_install_appends_after_host_stages() {
        let config = CerberusConfig::default();
        let stack = AuthStack::from_config(&config, registry(&config)).unwrap();
        let pipeline = stack
            .install(Pipeline::builder().stage(SecurityHeadersMiddleware::default()))
            .build();
        assert_eq!(pipeline.stage_count(), 3);
        assert_eq!(pipeline.stage_names()[2], "authentication");
    }

    #[test]
    fn test_resolver_is_shared() {
        let config = CerberusConfig::default();
        let stack = AuthStack::from_config(&config, registry(&config)).unwrap();
        assert!(Arc::ptr_eq(stack.resolver(), stack.authenticator().resolver()));
    }
}
