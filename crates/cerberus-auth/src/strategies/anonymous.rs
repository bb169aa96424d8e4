//! Public access: every caller is accepted as anonymous.

use cerberus_core::{AuthResult, BoxFuture, RequestContext};

use crate::strategy::Strategy;

/// Accepts every request as anonymous.
///
/// Useful as the last requirement of a route that serves both signed-in
/// and anonymous callers.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousStrategy;

impl Strategy for AnonymousStrategy {
    fn authenticate<'a>(
        &'a self,
        ctx: &'a RequestContext,
        _requirement: &'a str,
    ) -> BoxFuture<'a, AuthResult> {
        let result = AuthResult::anonymous(ctx.client_addr());
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_always_anonymous() {
        let mut ctx = RequestContext::new();
        ctx.set_client_addr("127.0.0.1".parse().unwrap());

        let result = AnonymousStrategy.authenticate(&ctx, "anonymous").await;
        assert!(result.is_anonymous());
        assert_eq!(
            result.as_authenticated().unwrap().metadata().get("ip"),
            Some(&serde_json::Value::from("127.0.0.1"))
        );
    }
}
