use std::sync::Arc;

use zw_core::{FlagStore, MemoryFlagStore};

use crate::handler::HandlerRegistry;
use crate::interpolate::{FunctionRegistry, Translator};
use crate::observer::{DialogueObserver, ObserverSet};
use crate::speaker::SpeakerRegistry;

/// Everything a runner is constructed with.
#[derive(Clone)]
pub struct RunnerConfig {
    /// Host-owned persistent flag store.
    pub flags: Arc<dyn FlagStore>,
    /// Handlers for callback actions.
    pub handlers: HandlerRegistry,
    /// Speakers referenced by nodes.
    pub speakers: SpeakerRegistry,
    /// Custom template functions.
    pub functions: FunctionRegistry,
    /// Optional translation pre-pass for node text.
    pub translator: Option<Arc<dyn Translator>>,
    /// Lifecycle hooks.
    pub observers: ObserverSet,
    /// Maximum history depth (oldest entries dropped when exceeded). 0 = unlimited.
    pub max_history: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            flags: Arc::new(MemoryFlagStore::new()),
            handlers: HandlerRegistry::new(),
            speakers: SpeakerRegistry::new(),
            functions: FunctionRegistry::new(),
            translator: None,
            observers: ObserverSet::new(),
            max_history: 0,
        }
    }
}

impl RunnerConfig {
    /// Use a host-owned persistent flag store.
    pub fn with_flags(mut self, flags: Arc<dyn FlagStore>) -> Self {
        self.flags = flags;
        self
    }

    /// Set the callback handlers.
    pub fn with_handlers(mut self, handlers: HandlerRegistry) -> Self {
        self.handlers = handlers;
        self
    }

    /// Set the speaker registry.
    pub fn with_speakers(mut self, speakers: SpeakerRegistry) -> Self {
        self.speakers = speakers;
        self
    }

    /// Set the template functions.
    pub fn with_functions(mut self, functions: FunctionRegistry) -> Self {
        self.functions = functions;
        self
    }

    /// Translate node text before interpolation.
    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Add an observer.
    pub fn with_observer(mut self, observer: Arc<dyn DialogueObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Set the maximum history depth (0 = unlimited).
    pub fn with_max_history(mut self, max: usize) -> Self {
        self.max_history = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::EventRecorder;
    use crate::speaker::Speaker;
    use zw_core::FlagValue;

    #[test]
    fn config_default_values() {
        let config = RunnerConfig::default();
        assert_eq!(config.max_history, 0);
        assert!(config.handlers.is_empty());
        assert!(config.observers.is_empty());
        assert!(config.translator.is_none());
        assert!(config.flags.all().is_empty());
    }

    #[test]
    fn config_builder_chain() {
        let flags = Arc::new(MemoryFlagStore::new());
        flags.set("gold", FlagValue::from(3));
        let config = RunnerConfig::default()
            .with_flags(flags.clone())
            .with_handlers(HandlerRegistry::new().with_fn("noop", |_| Ok(None)))
            .with_speakers(SpeakerRegistry::new().with_speaker("mira", Speaker::new("Mira")))
            .with_observer(Arc::new(EventRecorder::new()))
            .with_observer(Arc::new(EventRecorder::new()))
            .with_max_history(50);

        assert_eq!(config.max_history, 50);
        assert!(config.handlers.contains("noop"));
        assert_eq!(config.speakers.get("mira").map(|s| s.name.as_str()), Some("Mira"));
        assert_eq!(config.observers.len(), 2);
        assert_eq!(config.flags.get("gold"), Some(FlagValue::from(3)));
    }
}
