// src/models/intent.rs
use crate::nlp::artifacts::{read_json, ArtifactError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A labeled category of user request with example utterances and canned replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub tag: String,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub responses: Vec<String>,
}

impl Intent {
    pub fn new(tag: &str, patterns: &[&str], responses: &[&str]) -> Self {
        Self {
            tag: tag.to_string(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            responses: responses.iter().map(|r| r.to_string()).collect(),
        }
    }
}

/// The intents catalog, shaped as `{ "intents": [ ... ] }` on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentCatalog {
    #[serde(default)]
    pub intents: Vec<Intent>,
}

impl IntentCatalog {
    pub fn new(intents: Vec<Intent>) -> Self {
        Self { intents }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        read_json(path.as_ref())
    }

    /// First intent carrying `tag`, if any.
    pub fn find(&self, tag: &str) -> Option<&Intent> {
        self.intents.iter().find(|intent| intent.tag == tag)
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }
}
