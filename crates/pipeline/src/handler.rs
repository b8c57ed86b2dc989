//! Handler contract and the validation-gated executor.

use std::sync::Arc;

use async_trait::async_trait;

use anchorcrm_core::DomainResult;

use crate::request::Request;
use crate::validate::RuleSet;

/// Handles one request type. Handlers are stateless: no shared mutable
/// fields between invocations, safe to run concurrently across unrelated
/// requests. Suspension happens only at repository await points, so dropping
/// the returned future cancels cleanly.
#[async_trait]
pub trait Handle<R: Request>: Send + Sync {
    async fn handle(&self, request: R) -> DomainResult<R::Output>;
}

#[async_trait]
impl<R, H> Handle<R> for Arc<H>
where
    R: Request,
    H: Handle<R> + ?Sized,
{
    async fn handle(&self, request: R) -> DomainResult<R::Output> {
        (**self).handle(request).await
    }
}

/// Run the validation gate, then the handler.
///
/// The handler is never invoked with an invalid request; a failing rule set
/// stops execution before any repository call is made.
pub async fn execute<R, H>(rules: &RuleSet<R>, handler: &H, request: R) -> DomainResult<R::Output>
where
    R: Request,
    H: Handle<R>,
{
    rules.check(&request)?;
    handler.handle(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anchorcrm_core::EntityId;

    use crate::validate::required_id;

    #[derive(Debug)]
    struct Ping {
        id: EntityId,
    }

    impl Request for Ping {
        type Output = String;
    }

    struct PingHandler {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Handle<Ping> for PingHandler {
        async fn handle(&self, request: Ping) -> DomainResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(request.id.to_string())
        }
    }

    #[tokio::test]
    async fn valid_request_reaches_the_handler() {
        let rules = RuleSet::new().rule(required_id("id", |r: &Ping| r.id));
        let handler = PingHandler { calls: AtomicUsize::new(0) };

        let id = EntityId::new();
        let out = execute(&rules, &handler, Ping { id }).await.unwrap();
        assert_eq!(out, id.to_string());
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalid_request_never_reaches_the_handler() {
        let rules = RuleSet::new().rule(required_id("id", |r: &Ping| r.id));
        let handler = PingHandler { calls: AtomicUsize::new(0) };

        let err = execute(&rules, &handler, Ping { id: EntityId::nil() })
            .await
            .unwrap_err();
        assert!(matches!(err, anchorcrm_core::DomainError::Validation(_)));
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    }
}
