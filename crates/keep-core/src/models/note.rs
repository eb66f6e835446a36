//! Note model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier of a node on the note service.
///
/// Ids are assigned by whoever creates the node. Notes created locally get a
/// time-sortable UUID v7, the same way the service's own clients generate ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Generate a new client-side id
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NoteId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A note held by a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Service-visible identifier
    pub id: NoteId,
    /// Id of the child node carrying the text on the wire
    pub body_id: NoteId,
    pub title: String,
    /// Free-text body
    pub text: String,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
    #[serde(default)]
    pub trashed: bool,
    /// Local mutation not yet pushed to the service
    #[serde(default)]
    pub dirty: bool,
}

impl Note {
    /// Create a new, unsynced note
    #[must_use]
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: NoteId::generate(),
            body_id: NoteId::generate(),
            title: title.into(),
            text: text.into(),
            created_at: now,
            updated_at: now,
            trashed: false,
            dirty: true,
        }
    }

    /// Replace the body text, marking the note for the next sync
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text == self.text {
            return;
        }
        self.text = text;
        self.touch();
    }

    /// Whether `query` appears verbatim in the title or text of a live note
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        !self.trashed && (self.title.contains(query) || self.text.contains(query))
    }

    fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().timestamp_millis();
        self.dirty = true;
    }
}
