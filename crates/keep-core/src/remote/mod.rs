//! Client seam for the remote note service.
//!
//! Everything the session needs from the service goes through
//! [`RemoteClient`]: one authentication call and one change exchange that
//! pushes local mutations and pulls everything newer than a version cursor.

mod keep_api;

#[cfg(any(test, feature = "test-support"))]
mod fake;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Note, NoteId};

pub use keep_api::{KeepApiClient, KeepEndpoints, DEFAULT_API_URL, DEFAULT_AUTH_URL};

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeRemote, FakeRemoteState};

#[derive(Debug, Error)]
pub enum RemoteError {
    /// The service refused the credentials. Carries the raw service error code.
    #[error("Login rejected by service: {0}")]
    Login(String),
    #[error("Invalid note service configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Not authenticated with the note service")]
    NotAuthenticated,
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Note service API error: {0}")]
    Api(String),
    #[error("Invalid payload from note service: {0}")]
    InvalidPayload(String),
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Account credentials for one invocation.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Note header as reported by the service. The body travels separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteNote {
    pub id: NoteId,
    pub title: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub trashed: bool,
}

/// Body text of a note, carried by a child node on the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteBody {
    pub note_id: NoteId,
    pub body_id: NoteId,
    pub text: String,
}

/// Result of one change exchange with the service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Version cursor to send on the next exchange
    pub to_version: String,
    /// Notes created or updated remotely since the requested version
    pub notes: Vec<RemoteNote>,
    /// Bodies changed remotely since the requested version
    pub bodies: Vec<RemoteBody>,
    /// Notes deleted remotely since the requested version
    pub deleted: Vec<NoteId>,
    /// More changes are pending; the caller should exchange again
    pub truncated: bool,
}

#[async_trait]
pub trait RemoteClient: Send {
    async fn authenticate(&mut self, credentials: &Credentials) -> RemoteResult<()>;

    /// Push `outgoing` and pull changes newer than `since` (everything when `None`).
    async fn changes(&mut self, since: Option<&str>, outgoing: &[Note]) -> RemoteResult<ChangeSet>;
}
