//! Plays Zwiesprache dialogue graphs.
//!
//! [`DialogueRunner`] walks a [`zw_core::DialogueGraph`]: it gates choices
//! on flag conditions, runs node and choice actions against two flag
//! stores, renders `{{token}}` text, and keeps a history that supports
//! undo and save/restore.
//!
//! Flags named `conv:<key>` live in a per-session store owned by the
//! runner. Every other flag lives in the host's persistent store.
//!
//! All navigation calls are `async` because host callbacks and template
//! functions may suspend. The crate does not depend on a specific async
//! runtime.

/// Runner configuration.
pub mod config;
/// Runner errors.
pub mod error;
/// Condition evaluation.
pub mod evaluate;
/// Action execution.
pub mod execute;
/// Raw-name access to both flag stores.
pub mod flags;
/// Host callback handlers.
pub mod handler;
/// History entries and save state.
pub mod history;
/// Text interpolation.
pub mod interpolate;
/// Lifecycle observers.
pub mod observer;
/// The dialogue state machine.
pub mod runner;
/// Speaker registry.
pub mod speaker;
/// Rendered views returned to the host.
pub mod view;

pub use config::RunnerConfig;
pub use error::{ActionError, DialogueError, DialogueResult, ErrorKind};
pub use evaluate::evaluate;
pub use execute::ActionExecutor;
pub use flags::FlagScopes;
pub use handler::{ActionHandler, HandlerError, HandlerRegistry, HandlerResult};
pub use history::{HistoryEntry, SAVE_VERSION, SerializedHistoryEntry, SerializedState};
pub use interpolate::{
    FunctionRegistry, InterpolationContext, InterpolationFn, Interpolator, Translator,
};
pub use observer::{DialogueEvent, DialogueObserver, EventRecorder, ObserverSet};
pub use runner::DialogueRunner;
pub use speaker::{Speaker, SpeakerRegistry};
pub use view::{ChoiceFilter, ChoiceOptions, ChoiceView, NodeView, RestartOptions, Step};
