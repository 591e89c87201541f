//! Dialogue graphs, nodes, and choices.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::condition::Condition;
use crate::error::ZwResult;

/// A complete dialogue: a set of nodes and the node it starts at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueGraph {
    /// Unique identifier for this dialogue.
    pub id: String,
    /// The node a session starts at.
    #[serde(rename = "startNode")]
    pub start_node_id: String,
    /// All nodes, keyed by node id.
    pub nodes: BTreeMap<String, Node>,
}

impl DialogueGraph {
    /// Create an empty graph.
    pub fn new(id: impl Into<String>, start_node_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            start_node_id: start_node_id.into(),
            nodes: BTreeMap::new(),
        }
    }

    /// Add a node.
    pub fn with_node(mut self, id: impl Into<String>, node: Node) -> Self {
        self.nodes.insert(id.into(), node);
        self
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Whether a node with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// The start node, if it exists.
    pub fn start_node(&self) -> Option<&Node> {
        self.node(&self.start_node_id)
    }

    /// Parse a graph from JSON.
    pub fn from_json(json: &str) -> ZwResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the graph to pretty-printed JSON.
    pub fn to_json(&self) -> ZwResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A unit of dialogue content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Display text or a translation key.
    pub text: String,
    /// Speaker id, resolved through the host's speaker registry.
    #[serde(rename = "speaker", default, skip_serializing_if = "Option::is_none")]
    pub speaker_id: Option<String>,
    /// Free-form tags for the host.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Actions run when the node is entered.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
    /// Choices offered at this node.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
    /// Unconditional successor, followed when the node has no choices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    /// Explicit end marker.
    #[serde(rename = "isEnd", default, skip_serializing_if = "std::ops::Not::not")]
    pub is_terminal: bool,
}

impl Node {
    /// Create a node with the given text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Set the speaker id.
    pub fn with_speaker(mut self, speaker_id: impl Into<String>) -> Self {
        self.speaker_id = Some(speaker_id.into());
        self
    }

    /// Add a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Add an entry action.
    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Add a choice.
    pub fn with_choice(mut self, choice: Choice) -> Self {
        self.choices.push(choice);
        self
    }

    /// Set the unconditional successor.
    pub fn with_next(mut self, node_id: impl Into<String>) -> Self {
        self.next = Some(node_id.into());
        self
    }

    /// Mark the node as an explicit end.
    pub fn terminal(mut self) -> Self {
        self.is_terminal = true;
        self
    }

    /// A node that auto-advances to its successor.
    pub fn is_pass_through(&self) -> bool {
        !self.is_terminal && self.choices.is_empty() && self.next.is_some()
    }

    /// Explicitly terminal, or lacking both choices and a successor.
    pub fn is_ended(&self) -> bool {
        self.is_terminal || (self.choices.is_empty() && self.next.is_none())
    }
}

/// A player option at a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    /// The text shown to the player.
    pub text: String,
    /// The node reached by selecting this choice.
    #[serde(rename = "next")]
    pub target_node_id: String,
    /// Condition that must hold for the choice to be available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Condition>,
    /// Actions run on selection, before the transition.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
    /// Free-form tags for the host.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Statically disabled.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
    /// Text to show in place of a disabled choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_text: Option<String>,
}

impl Choice {
    /// Create a choice leading to `target_node_id`.
    pub fn new(text: impl Into<String>, target_node_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            target_node_id: target_node_id.into(),
            ..Self::default()
        }
    }

    /// Gate the choice on a condition.
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions = Some(condition);
        self
    }

    /// Add a selection action.
    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Add a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Disable the choice, optionally with replacement text.
    pub fn disabled(mut self, disabled_text: Option<String>) -> Self {
        self.disabled = true;
        self.disabled_text = disabled_text;
        self
    }
}
