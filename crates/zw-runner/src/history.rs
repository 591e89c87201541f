//! Navigation history and portable save state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zw_core::{Choice, FlagMap, Node, ZwResult};

/// Save state format version. A state with a different version is rejected.
pub const SAVE_VERSION: u32 = 1;

fn default_version() -> u32 {
    SAVE_VERSION
}

/// One step the session took, recorded so it can be undone.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// The node that was left.
    pub node_id: String,
    /// A copy of that node.
    pub node: Node,
    /// Index of the choice taken, if the step was a choice.
    pub choice_index: Option<usize>,
    /// A copy of the choice taken.
    pub choice: Option<Choice>,
    /// When the step was taken.
    pub timestamp: DateTime<Utc>,
    /// Ephemeral flags as they were before the step's actions ran.
    pub ephemeral_flags: FlagMap,
}

impl HistoryEntry {
    /// An entry for leaving `node_id` without a choice.
    pub fn leaving(node_id: impl Into<String>, node: Node, ephemeral_flags: FlagMap) -> Self {
        Self {
            node_id: node_id.into(),
            node,
            choice_index: None,
            choice: None,
            timestamp: Utc::now(),
            ephemeral_flags,
        }
    }

    /// Attach the choice that caused the step.
    pub fn with_choice(mut self, index: usize, choice: Choice) -> Self {
        self.choice_index = Some(index);
        self.choice = Some(choice);
        self
    }

    /// The portable form of this entry.
    pub fn to_serialized(&self) -> SerializedHistoryEntry {
        SerializedHistoryEntry {
            node_id: self.node_id.clone(),
            choice_index: self.choice_index,
            timestamp: self.timestamp,
            ephemeral_flags: self.ephemeral_flags.clone(),
        }
    }
}

/// A history entry without its node and choice copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedHistoryEntry {
    /// The node that was left.
    pub node_id: String,
    /// Index of the choice taken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice_index: Option<usize>,
    /// When the step was taken.
    pub timestamp: DateTime<Utc>,
    /// Ephemeral flags before the step.
    #[serde(default)]
    pub ephemeral_flags: FlagMap,
}

/// A session snapshot the host can persist and later restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedState {
    /// Format version.
    #[serde(default = "default_version")]
    pub version: u32,
    /// Id of the dialogue the session belongs to.
    pub dialogue_id: String,
    /// The current node.
    pub current_node_id: String,
    /// Oldest entry first.
    #[serde(default)]
    pub history: Vec<SerializedHistoryEntry>,
    /// The ephemeral store's contents.
    #[serde(default)]
    pub ephemeral_flags: FlagMap,
}

impl SerializedState {
    /// Whether this runner can restore the state.
    pub fn is_compatible(&self) -> bool {
        self.version == SAVE_VERSION
    }

    /// Parse a state from JSON.
    pub fn from_json(json: &str) -> ZwResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encode the state as pretty-printed JSON.
    pub fn to_json(&self) -> ZwResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use zw_core::FlagValue;

    fn state() -> SerializedState {
        let timestamp = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let mut before = FlagMap::new();
        before.insert("mood".to_string(), FlagValue::from("wary"));
        let mut now = before.clone();
        now.insert("asked".to_string(), FlagValue::from(true));
        SerializedState {
            version: SAVE_VERSION,
            dialogue_id: "smith".to_string(),
            current_node_id: "prices".to_string(),
            history: vec![SerializedHistoryEntry {
                node_id: "greet".to_string(),
                choice_index: Some(1),
                timestamp,
                ephemeral_flags: before,
            }],
            ephemeral_flags: now,
        }
    }

    #[test]
    fn wire_format() {
        insta::assert_snapshot!(state().to_json().unwrap(), @r#"
        {
          "version": 1,
          "dialogueId": "smith",
          "currentNodeId": "prices",
          "history": [
            {
              "nodeId": "greet",
              "choiceIndex": 1,
              "timestamp": "2026-03-01T12:00:00Z",
              "ephemeralFlags": {
                "mood": "wary"
              }
            }
          ],
          "ephemeralFlags": {
            "asked": true,
            "mood": "wary"
          }
        }
        "#);
    }

    #[test]
    fn json_round_trip() {
        let state = state();
        let back = SerializedState::from_json(&state.to_json().unwrap()).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn missing_version_defaults_to_current() {
        let json = r#"{ "dialogueId": "smith", "currentNodeId": "greet" }"#;
        let state = SerializedState::from_json(json).unwrap();
        assert_eq!(state.version, SAVE_VERSION);
        assert!(state.is_compatible());
        assert!(state.history.is_empty());
        assert!(state.ephemeral_flags.is_empty());
    }

    #[test]
    fn future_versions_are_incompatible() {
        let json = r#"{ "version": 2, "dialogueId": "smith", "currentNodeId": "greet" }"#;
        assert!(!SerializedState::from_json(json).unwrap().is_compatible());
    }

    #[test]
    fn entry_serialization_drops_copies() {
        let entry = HistoryEntry::leaving("greet", Node::new("Hello"), FlagMap::new())
            .with_choice(0, Choice::new("Hi", "prices"));
        let wire = entry.to_serialized();
        assert_eq!(wire.node_id, "greet");
        assert_eq!(wire.choice_index, Some(0));
        assert_eq!(wire.timestamp, entry.timestamp);
    }
}
