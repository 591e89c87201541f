//! What the host displays: rendered nodes, choice lists, and call results.

use serde::Serialize;
use zw_core::Choice;

/// The current node as shown to the player.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeView {
    /// Node id.
    pub id: String,
    /// Translated and interpolated text.
    pub text: String,
    /// Speaker id from the node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker_id: Option<String>,
    /// Display name of the speaker, when registered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker_name: Option<String>,
    /// Node tags.
    pub tags: Vec<String>,
    /// Whether the node is explicitly marked as an end.
    pub is_terminal: bool,
}

/// A choice as offered to the player.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceView {
    /// Index into the node's full declared choice list. Pass this to `choose`.
    pub index: usize,
    /// Choice text, uninterpolated.
    pub text: String,
    /// Target node id.
    pub target_node_id: String,
    /// Choice tags.
    pub tags: Vec<String>,
    /// Whether `choose` would accept this choice.
    pub available: bool,
    /// Why the choice is unavailable, when a condition failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Host text for a disabled choice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled_text: Option<String>,
}

/// The result of a navigation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    /// The current node, `None` when it is explicitly terminal.
    pub view: Option<NodeView>,
    /// Available choices at the current node.
    pub choices: Vec<ChoiceView>,
    /// Whether the dialogue has ended.
    pub ended: bool,
}

/// A predicate applied to declared choices before availability.
pub type ChoiceFilter<'a> = &'a (dyn Fn(&Choice) -> bool + Send + Sync);

/// How to build the choice list.
#[derive(Clone, Copy, Default)]
pub struct ChoiceOptions<'a> {
    /// Also return unavailable choices, annotated.
    pub include_unavailable: bool,
    /// Only consider choices the filter accepts.
    pub filter: Option<ChoiceFilter<'a>>,
}

impl<'a> ChoiceOptions<'a> {
    /// Return every choice, annotated with availability.
    pub fn all() -> Self {
        Self {
            include_unavailable: true,
            filter: None,
        }
    }

    /// Restrict the list with a predicate.
    pub fn with_filter(mut self, filter: ChoiceFilter<'a>) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// Options for `restart`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestartOptions {
    /// Keep `conv:` flags instead of resetting them.
    pub preserve_conversation_flags: bool,
}

impl RestartOptions {
    /// Restart keeping conversation flags.
    pub fn preserving() -> Self {
        Self {
            preserve_conversation_flags: true,
        }
    }
}
