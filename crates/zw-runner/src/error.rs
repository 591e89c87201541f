//! Error types for the dialogue runner.

use thiserror::Error;
use zw_core::ZwError;

/// Result type for runner operations.
pub type DialogueResult<T> = Result<T, DialogueError>;

/// The category an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The graph references something that does not exist.
    Structural,
    /// The call is not valid in the runner's current state.
    Usage,
    /// A callback action names a handler that is not registered.
    CallbackLookup,
    /// A save state could not be encoded or decoded.
    Serialization,
}

/// Errors that abort a runner call.
#[derive(Debug, Error)]
pub enum DialogueError {
    /// The graph's start node does not exist.
    #[error("dialogue {dialogue}: start node not found: {node}")]
    MissingStartNode {
        /// Dialogue id.
        dialogue: String,
        /// The missing start node id.
        node: String,
    },

    /// A choice or `next` points at a node that does not exist.
    #[error("node {from} leads to missing node {target}")]
    MissingTarget {
        /// The node being left.
        from: String,
        /// The missing target id.
        target: String,
    },

    /// A node id given by the caller does not exist.
    #[error("node not found: {0}")]
    UnknownNode(String),

    /// A save state records a choice index the node does not declare.
    #[error("node {node} has no choice {index}")]
    UnknownChoice {
        /// The node the choice was taken at.
        node: String,
        /// The recorded index.
        index: usize,
    },

    /// No session has been started.
    #[error("no active dialogue session")]
    NoActiveSession,

    /// The current node is terminal.
    #[error("dialogue has ended")]
    DialogueEnded,

    /// The current node has no choices.
    #[error("node {0} has no choices")]
    NoChoices(String),

    /// Choice index outside the node's declared choices.
    #[error("invalid choice {index}: node has {count} choices")]
    ChoiceOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of declared choices.
        count: usize,
    },

    /// The choice is statically disabled.
    #[error("choice {0} is disabled")]
    ChoiceDisabled(usize),

    /// The choice's condition does not hold.
    #[error("condition not met for choice {0}")]
    ConditionNotMet(usize),

    /// A save state belongs to another dialogue.
    #[error("save state is for dialogue {found}, runner has {expected}")]
    DialogueMismatch {
        /// The bound graph's id.
        expected: String,
        /// The id recorded in the save state.
        found: String,
    },

    /// A save state was written by an incompatible format version.
    #[error("unsupported save state version {0}")]
    IncompatibleSave(u32),

    /// A callback action names an unregistered handler.
    #[error("no handler registered for callback: {0}")]
    MissingHandler(String),

    /// Save state encoding or decoding failed.
    #[error("{0}")]
    Core(#[from] ZwError),
}

impl DialogueError {
    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingStartNode { .. }
            | Self::MissingTarget { .. }
            | Self::UnknownNode(_)
            | Self::UnknownChoice { .. } => ErrorKind::Structural,
            Self::NoActiveSession
            | Self::DialogueEnded
            | Self::NoChoices(_)
            | Self::ChoiceOutOfRange { .. }
            | Self::ChoiceDisabled(_)
            | Self::ConditionNotMet(_)
            | Self::DialogueMismatch { .. }
            | Self::IncompatibleSave(_) => ErrorKind::Usage,
            Self::MissingHandler(_) => ErrorKind::CallbackLookup,
            Self::Core(_) => ErrorKind::Serialization,
        }
    }
}

/// A failed action that was absorbed instead of aborting traversal.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Flag arithmetic failed.
    #[error(transparent)]
    Flag(#[from] ZwError),

    /// A registered handler returned an error.
    #[error("handler {name} failed: {message}")]
    Handler {
        /// Handler name.
        name: String,
        /// The handler's error message.
        message: String,
    },
}
