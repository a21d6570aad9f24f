use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of one-request-lifetime message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Notice,
    Alert,
}

/// Set of flash messages keyed by kind.
///
/// The same type is used for the messages visible to the current request and
/// for the messages persisted in the session for the next one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Flash {
    messages: BTreeMap<FlashKind, String>,
}

impl Flash {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, kind: FlashKind, message: impl Into<String>) {
        self.messages.insert(kind, message.into());
    }

    pub fn get(&self, kind: FlashKind) -> Option<&str> {
        self.messages.get(&kind).map(String::as_str)
    }

    pub fn notice(&self) -> Option<&str> {
        self.get(FlashKind::Notice)
    }

    pub fn alert(&self) -> Option<&str> {
        self.get(FlashKind::Alert)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Moves all messages out, leaving this flash empty
    pub fn take(&mut self) -> Flash {
        std::mem::take(self)
    }
}
