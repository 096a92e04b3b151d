use serde::{Deserialize, Serialize};

/// One chat post submitted for summarization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Id of the author, resolved to a display label through a `UserProvider`.
    pub speaker: String,
    pub body: String,
    /// Soft-deleted on the chat platform.
    #[serde(default)]
    pub deleted: bool,
}

impl Message {
    pub fn new(speaker: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            body: body.into(),
            deleted: false,
        }
    }

    pub fn deleted(speaker: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            deleted: true,
            ..Self::new(speaker, body)
        }
    }

    /// Soft-deleted posts with nothing left in them carry no content worth summarizing.
    #[must_use]
    pub fn is_tombstone(&self) -> bool {
        self.deleted && self.body.is_empty()
    }
}

/// User record with the display-name fields used to label speakers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub position: String,
}

impl User {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            position: String::new(),
        }
    }

    #[must_use]
    pub fn with_position(mut self, position: impl Into<String>) -> Self {
        self.position = position.into();
        self
    }

    /// Non-empty name fields and position joined by single spaces.
    #[must_use]
    pub fn label(&self) -> String {
        [&self.first_name, &self.last_name, &self.position]
            .iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
