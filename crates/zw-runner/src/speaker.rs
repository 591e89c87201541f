//! Speaker lookup.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use zw_core::FlagValue;

/// A character who can speak a node's text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Speaker {
    /// Display name.
    pub name: String,
    /// Any other host data (portrait, colour, voice...).
    #[serde(flatten)]
    pub attributes: BTreeMap<String, FlagValue>,
}

impl Speaker {
    /// Create a speaker with a display name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Attach a host attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<FlagValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Speakers keyed by the id nodes refer to.
#[derive(Debug, Clone, Default)]
pub struct SpeakerRegistry {
    speakers: HashMap<String, Speaker>,
}

impl SpeakerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a speaker, replacing any with the same id.
    pub fn register(&mut self, id: impl Into<String>, speaker: Speaker) {
        self.speakers.insert(id.into(), speaker);
    }

    /// Builder form of [`Self::register`].
    pub fn with_speaker(mut self, id: impl Into<String>, speaker: Speaker) -> Self {
        self.register(id, speaker);
        self
    }

    /// Look up a speaker by id.
    pub fn get(&self, id: &str) -> Option<&Speaker> {
        self.speakers.get(id)
    }
}
