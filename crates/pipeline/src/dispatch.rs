//! Request dispatch (registry lookup).
//!
//! The dispatcher maps each request type to its registered rule set and
//! handler. Dispatch runs the validation gate first; a request type with no
//! registration fails with `Unsupported` rather than panicking.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;

use anchorcrm_core::{DomainError, DomainResult};

use crate::handler::Handle;
use crate::request::Request;
use crate::validate::RuleSet;

struct Registered<R: Request> {
    rules: RuleSet<R>,
    handler: Arc<dyn Handle<R>>,
}

/// Type-map registry from request type to (rule set, handler).
#[derive(Default)]
pub struct Dispatcher {
    entries: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler and rule set for a request type. A second
    /// registration for the same type replaces the first.
    pub fn register<R: Request>(&mut self, rules: RuleSet<R>, handler: Arc<dyn Handle<R>>) {
        self.entries
            .insert(TypeId::of::<R>(), Box::new(Registered { rules, handler }));
    }

    /// Validate, then route the request to its handler.
    pub async fn dispatch<R: Request>(&self, request: R) -> DomainResult<R::Output> {
        let entry = self
            .entries
            .get(&TypeId::of::<R>())
            .and_then(|e| e.downcast_ref::<Registered<R>>())
            .ok_or_else(|| DomainError::Unsupported(type_name::<R>().to_string()))?;

        entry.rules.check(&request)?;
        tracing::debug!(request = type_name::<R>(), "dispatching");
        entry.handler.handle(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::validate::required_text;

    #[derive(Debug)]
    struct Greet {
        name: String,
    }

    impl Request for Greet {
        type Output = String;
    }

    struct GreetHandler;

    #[async_trait]
    impl Handle<Greet> for GreetHandler {
        async fn handle(&self, request: Greet) -> DomainResult<String> {
            Ok(format!("hello {}", request.name))
        }
    }

    #[tokio::test]
    async fn dispatch_routes_to_the_registered_handler() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(
            RuleSet::new().rule(required_text("name", 50, |r: &Greet| &r.name)),
            Arc::new(GreetHandler),
        );

        let out = dispatcher
            .dispatch(Greet { name: "ada".to_string() })
            .await
            .unwrap();
        assert_eq!(out, "hello ada");
    }

    #[tokio::test]
    async fn dispatch_applies_the_validation_gate() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(
            RuleSet::new().rule(required_text("name", 50, |r: &Greet| &r.name)),
            Arc::new(GreetHandler),
        );

        let err = dispatcher
            .dispatch(Greet { name: "  ".to_string() })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn unregistered_request_type_is_unsupported() {
        let dispatcher = Dispatcher::new();
        let err = dispatcher
            .dispatch(Greet { name: "ada".to_string() })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Unsupported(_)));
    }
}
