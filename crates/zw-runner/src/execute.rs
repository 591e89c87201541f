//! Action execution.

use tracing::{trace, warn};
use zw_core::{Action, FlagValue, resolve};

use crate::error::{ActionError, DialogueError, DialogueResult};
use crate::flags::FlagScopes;
use crate::handler::HandlerRegistry;
use crate::observer::DialogueObserver;

/// Applies actions to the flag stores and dispatches callbacks.
#[derive(Clone, Copy)]
pub struct ActionExecutor<'a> {
    /// The stores flag actions write to.
    pub flags: FlagScopes<'a>,
    /// Handlers for callback actions.
    pub handlers: &'a HandlerRegistry,
    /// Receives a notification for every completed action.
    pub observer: &'a dyn DialogueObserver,
}

impl<'a> ActionExecutor<'a> {
    /// Create an executor.
    pub fn new(
        flags: FlagScopes<'a>,
        handlers: &'a HandlerRegistry,
        observer: &'a dyn DialogueObserver,
    ) -> Self {
        Self {
            flags,
            handlers,
            observer,
        }
    }

    /// Run one action and return its result.
    ///
    /// Only a callback naming an unregistered handler is an error. Every
    /// other failure is reported to the observer and yields `Ok(None)`.
    pub async fn execute(&self, action: &Action) -> DialogueResult<Option<FlagValue>> {
        let outcome = match action {
            Action::Set { flag, value } => {
                let flag = resolve(flag);
                self.flags.store(&flag).set(&flag.key, value.clone());
                Ok(Some(value.clone()))
            }
            Action::Clear { flag } => {
                let flag = resolve(flag);
                self.flags.store(&flag).delete(&flag.key);
                Ok(Some(FlagValue::Boolean(true)))
            }
            Action::Increment { flag, amount } => {
                let flag = resolve(flag);
                self.flags
                    .store(&flag)
                    .increment(&flag.key, amount)
                    .map(Some)
                    .map_err(ActionError::from)
            }
            Action::Decrement { flag, amount } => {
                let flag = resolve(flag);
                self.flags
                    .store(&flag)
                    .decrement(&flag.key, amount)
                    .map(Some)
                    .map_err(ActionError::from)
            }
            Action::Callback { name, args } => {
                let Some(handler) = self.handlers.get(name) else {
                    return Err(DialogueError::MissingHandler(name.clone()));
                };
                handler.call(args).await.map_err(|e| ActionError::Handler {
                    name: name.clone(),
                    message: e.to_string(),
                })
            }
        };

        match outcome {
            Ok(result) => {
                trace!(kind = action.kind(), ?result, "action executed");
                self.observer.action_executed(action, result.as_ref());
                Ok(result)
            }
            Err(error) => {
                warn!(kind = action.kind(), %error, "action failed; continuing");
                self.observer.action_failed(action, &error);
                self.observer.action_executed(action, None);
                Ok(None)
            }
        }
    }

    /// Run actions in order, stopping only at a fatal error.
    pub async fn execute_all(&self, actions: &[Action]) -> DialogueResult<()> {
        for action in actions {
            self.execute(action).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HandlerError;
    use crate::observer::{DialogueEvent, EventRecorder};
    use zw_core::{FlagStore, MemoryFlagStore};

    struct Fixture {
        persistent: MemoryFlagStore,
        ephemeral: MemoryFlagStore,
        handlers: HandlerRegistry,
        recorder: EventRecorder,
    }

    impl Fixture {
        fn new() -> Self {
            let handlers = HandlerRegistry::new()
                .with_fn("double", |args| {
                    let n = args.first().and_then(FlagValue::as_f64).unwrap_or(0.0);
                    Ok(Some(FlagValue::Float(n * 2.0)))
                })
                .with_fn("explode", |_| Err(HandlerError::new("kaboom")));
            Self {
                persistent: MemoryFlagStore::new(),
                ephemeral: MemoryFlagStore::new(),
                handlers,
                recorder: EventRecorder::new(),
            }
        }

        fn executor(&self) -> ActionExecutor<'_> {
            ActionExecutor::new(
                FlagScopes::new(&self.persistent, &self.ephemeral),
                &self.handlers,
                &self.recorder,
            )
        }
    }

    #[tokio::test]
    async fn set_and_clear_by_scope() {
        let fx = Fixture::new();
        let exec = fx.executor();

        let v = exec.execute(&Action::set("conv:mood", "calm")).await.unwrap();
        assert_eq!(v, Some(FlagValue::from("calm")));
        exec.execute(&Action::set("game:gold", 5)).await.unwrap();
        exec.execute(&Action::set("quest:stage", 2)).await.unwrap();

        assert_eq!(fx.ephemeral.get("mood"), Some(FlagValue::from("calm")));
        assert_eq!(fx.persistent.get("gold"), Some(FlagValue::from(5)));
        assert_eq!(fx.persistent.get("quest:stage"), Some(FlagValue::from(2)));

        let v = exec.execute(&Action::clear("conv:mood")).await.unwrap();
        assert_eq!(v, Some(FlagValue::from(true)));
        assert!(fx.ephemeral.get("mood").is_none());

        // Clearing an absent flag is fine.
        let v = exec.execute(&Action::clear("conv:nothing")).await.unwrap();
        assert_eq!(v, Some(FlagValue::from(true)));
    }

    #[tokio::test]
    async fn increment_from_nothing() {
        let fx = Fixture::new();
        let v = fx.executor().execute(&Action::increment("counter")).await.unwrap();
        assert_eq!(v, Some(FlagValue::from(1)));
        assert_eq!(fx.persistent.get("counter"), Some(FlagValue::from(1)));
    }

    #[tokio::test]
    async fn decrement_is_not_clamped() {
        let fx = Fixture::new();
        fx.persistent.set("health", FlagValue::from(10));
        let v = fx
            .executor()
            .execute(&Action::decrement_by("health", 20))
            .await
            .unwrap();
        assert_eq!(v, Some(FlagValue::from(-10)));
        assert_eq!(fx.persistent.get("health"), Some(FlagValue::from(-10)));
    }

    #[tokio::test]
    async fn arithmetic_failure_is_absorbed() {
        let fx = Fixture::new();
        fx.persistent.set("name", FlagValue::from("Mira"));
        let exec = fx.executor();

        let v = exec.execute(&Action::increment("name")).await.unwrap();
        assert_eq!(v, None);
        let events = fx.recorder.events();
        assert!(matches!(events[0], DialogueEvent::ActionFailed { kind: "increment", .. }));
        assert_eq!(
            events[1],
            DialogueEvent::ActionExecuted {
                kind: "increment",
                result: None
            }
        );
    }

    #[tokio::test]
    async fn callbacks() {
        let fx = Fixture::new();
        let exec = fx.executor();

        let v = exec
            .execute(&Action::callback("double", vec![FlagValue::from(4)]))
            .await
            .unwrap();
        assert_eq!(v, Some(FlagValue::from(8.0)));

        let v = exec.execute(&Action::callback("explode", vec![])).await.unwrap();
        assert_eq!(v, None);

        let err = exec
            .execute(&Action::callback("missing", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, DialogueError::MissingHandler(ref name) if name == "missing"));
    }

    #[tokio::test]
    async fn execute_all_stops_at_missing_handler() {
        let fx = Fixture::new();
        let actions = vec![
            Action::increment("a"),
            Action::callback("explode", vec![]),
            Action::increment("b"),
            Action::callback("missing", vec![]),
            Action::increment("c"),
        ];
        let err = fx.executor().execute_all(&actions).await.unwrap_err();
        assert!(matches!(err, DialogueError::MissingHandler(_)));
        assert_eq!(fx.persistent.get("a"), Some(FlagValue::from(1)));
        assert_eq!(fx.persistent.get("b"), Some(FlagValue::from(1)));
        assert!(fx.persistent.get("c").is_none());
    }
}
