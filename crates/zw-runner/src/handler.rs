//! Host handlers invoked by callback actions.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use zw_core::FlagValue;

/// An error returned by a host handler. Absorbed by the runner.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    /// Create an error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Result returned by handlers: an optional value, or an error.
pub type HandlerResult = Result<Option<FlagValue>, HandlerError>;

/// A host function reachable from `callback` actions.
///
/// Handlers may suspend; the enclosing navigation call waits for them.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Run the handler with the action's arguments.
    async fn call(&self, args: &[FlagValue]) -> HandlerResult;
}

/// Adapts a synchronous closure into an [`ActionHandler`].
struct FnHandler<F>(F);

#[async_trait]
impl<F> ActionHandler for FnHandler<F>
where
    F: Fn(&[FlagValue]) -> HandlerResult + Send + Sync,
{
    async fn call(&self, args: &[FlagValue]) -> HandlerResult {
        (self.0)(args)
    }
}

/// Named handlers available to `callback` actions.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn ActionHandler>>,
}

impl HandlerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an asynchronous handler, replacing any with the same name.
    pub fn register(&mut self, name: impl Into<String>, handler: impl ActionHandler + 'static) {
        self.handlers.insert(name.into(), Arc::new(handler));
    }

    /// Register a synchronous closure.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&[FlagValue]) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(name, FnHandler(f));
    }

    /// Builder form of [`Self::register_fn`].
    pub fn with_fn<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[FlagValue]) -> HandlerResult + Send + Sync + 'static,
    {
        self.register_fn(name, f);
        self
    }

    /// Look up a handler.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.get(name).cloned()
    }

    /// Whether a handler is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl ActionHandler for Echo {
        async fn call(&self, args: &[FlagValue]) -> HandlerResult {
            tokio::task::yield_now().await;
            Ok(args.first().cloned())
        }
    }

    #[tokio::test]
    async fn async_and_sync_handlers() {
        let mut registry = HandlerRegistry::new().with_fn("fail", |_| Err(HandlerError::new("boom")));
        registry.register("echo", Echo);

        let echo = registry.get("echo").unwrap();
        assert_eq!(echo.call(&[FlagValue::from(7)]).await.unwrap(), Some(FlagValue::from(7)));

        let fail = registry.get("fail").unwrap();
        assert_eq!(fail.call(&[]).await.unwrap_err().to_string(), "boom");

        assert!(registry.get("missing").is_none());
        assert_eq!(registry.len(), 2);
    }
}
