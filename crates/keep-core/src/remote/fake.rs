//! In-memory note service for tests.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{
    ChangeSet, Credentials, RemoteBody, RemoteClient, RemoteError, RemoteNote, RemoteResult,
};
use crate::models::Note;

/// Shared view of the fake service. Clones observe the same state, so a test
/// can keep one handle while a session owns another.
#[derive(Clone, Default)]
pub struct FakeRemote {
    inner: Arc<Mutex<FakeRemoteState>>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeRemoteState {
    /// Service error code returned from `authenticate`, if any
    pub login_error: Option<String>,
    /// Stored notes with the version they were last written at
    pub notes: Vec<(Note, u64)>,
    pub version: u64,
    pub authenticate_calls: usize,
    pub changes_calls: usize,
    /// `since` cursor of every exchange, in call order
    pub requested_versions: Vec<Option<String>>,
    /// Every note pushed by clients, in push order
    pub pushed: Vec<Note>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// A service that rejects every login with the given error code
    pub fn rejecting(code: impl Into<String>) -> Self {
        let remote = Self::new();
        remote.state().login_error = Some(code.into());
        remote
    }

    /// A service that already stores `notes`
    pub fn with_notes(notes: impl IntoIterator<Item = Note>) -> Self {
        let remote = Self::new();
        {
            let mut state = remote.state();
            for mut note in notes {
                state.version += 1;
                note.dirty = false;
                let version = state.version;
                state.notes.push((note, version));
            }
        }
        remote
    }

    pub fn snapshot(&self) -> FakeRemoteState {
        self.state().clone()
    }

    fn state(&self) -> MutexGuard<'_, FakeRemoteState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl RemoteClient for FakeRemote {
    async fn authenticate(&mut self, _credentials: &Credentials) -> RemoteResult<()> {
        let mut state = self.state();
        state.authenticate_calls += 1;
        match state.login_error.clone() {
            Some(code) => Err(RemoteError::Login(code)),
            None => Ok(()),
        }
    }

    async fn changes(&mut self, since: Option<&str>, outgoing: &[Note]) -> RemoteResult<ChangeSet> {
        let mut state = self.state();
        state.changes_calls += 1;
        state.requested_versions.push(since.map(str::to_string));

        let since = match since {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| RemoteError::Api(format!("unknown version {raw}")))?,
            None => 0,
        };

        if !outgoing.is_empty() {
            state.version += 1;
            let version = state.version;
            for note in outgoing {
                let mut stored = note.clone();
                stored.dirty = false;
                state.pushed.push(stored.clone());
                if let Some(slot) = state
                    .notes
                    .iter_mut()
                    .find(|(existing, _)| existing.id == note.id)
                {
                    *slot = (stored, version);
                } else {
                    state.notes.push((stored, version));
                }
            }
        }

        let mut change_set = ChangeSet {
            to_version: state.version.to_string(),
            ..ChangeSet::default()
        };
        for (note, _) in state.notes.iter().filter(|(_, version)| *version > since) {
            change_set.notes.push(RemoteNote {
                id: note.id.clone(),
                title: note.title.clone(),
                created_at: note.created_at,
                updated_at: note.updated_at,
                trashed: note.trashed,
            });
            change_set.bodies.push(RemoteBody {
                note_id: note.id.clone(),
                body_id: note.body_id.clone(),
                text: note.text.clone(),
            });
        }

        Ok(change_set)
    }
}
