//! Authenticated session against the note service.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::{Note, NoteId};
use crate::remote::{ChangeSet, Credentials, RemoteBody, RemoteClient, RemoteError};
use crate::state::{self, CachedState};
use crate::{Error, Result};

const APP_PASSWORD_HELP_URL: &str = "https://support.google.com/accounts/answer/185833";

/// Why the service refused a login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    BadCredentials,
    TwoFactorRequired,
    PolicyBlocked,
    Unknown,
}

impl AuthFailure {
    /// Classify a raw service error code.
    pub fn from_code(code: &str) -> Self {
        match code {
            "BadAuthentication" => Self::BadCredentials,
            "NeedsBrowser" => Self::TwoFactorRequired,
            "DeviceManagementRequiredOrSyncDisabled" => Self::PolicyBlocked,
            _ => Self::Unknown,
        }
    }

    /// Human-readable explanation for the user.
    pub fn message(self, error: &RemoteError) -> String {
        match self {
            Self::BadCredentials => {
                "Authorization failed, check your username and password".to_string()
            }
            Self::TwoFactorRequired => format!(
                "You have two-factor authentication enabled and need to generate an \
                 app-specific password, see: {APP_PASSWORD_HELP_URL}"
            ),
            Self::PolicyBlocked => {
                "Sync is not allowed by policy, is this an enterprise account?".to_string()
            }
            Self::Unknown => format!("Encountered unexpected error during login: {error}"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionState {
    version: Option<String>,
    notes: Vec<Note>,
}

/// Notes held for one CLI invocation plus the client that syncs them.
pub struct Session<C: RemoteClient> {
    client: C,
    version: Option<String>,
    notes: Vec<Note>,
}

impl<C: RemoteClient> Session<C> {
    /// An empty session that has not talked to the service yet.
    pub const fn new(client: C) -> Self {
        Self {
            client,
            version: None,
            notes: Vec::new(),
        }
    }

    /// Authenticate and bring the session up to date, resuming from `state`
    /// when given instead of pulling everything.
    pub async fn login(
        client: C,
        credentials: &Credentials,
        state: Option<&CachedState>,
    ) -> Result<Self> {
        let mut session = Self::new(client);

        tracing::info!("Logging into Google Keep");
        if let Err(error) = session.client.authenticate(credentials).await {
            let failure = match &error {
                RemoteError::Login(code) => AuthFailure::from_code(code),
                _ => AuthFailure::Unknown,
            };
            tracing::error!("{}", failure.message(&error));
            return Err(error.into());
        }

        if let Some(state) = state {
            session.restore(state)?;
        }
        session.sync().await?;
        Ok(session)
    }

    /// All notes, including trashed ones, in the order they were first seen.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Version cursor of the last completed sync.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn get(&self, id: &NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| &note.id == id)
    }

    /// Live notes whose title or text contains `query`.
    pub fn find<'a>(&'a self, query: &'a str) -> impl Iterator<Item = &'a Note> + 'a {
        self.notes.iter().filter(move |note| note.matches(query))
    }

    /// Add a note locally. It reaches the service on the next sync.
    pub fn create_note(&mut self, title: impl Into<String>, text: impl Into<String>) -> &mut Note {
        let index = self.notes.len();
        self.notes.push(Note::new(title, text));
        &mut self.notes[index]
    }

    /// The first note matching `query`, or a new empty note titled `query`.
    pub fn find_or_create_note(&mut self, query: &str) -> &mut Note {
        let index = if let Some(index) = self.notes.iter().position(|note| note.matches(query)) {
            index
        } else {
            tracing::info!("Creating new note with name \"{}\"", query);
            self.notes.push(Note::new(query, ""));
            self.notes.len() - 1
        };
        &mut self.notes[index]
    }

    /// Push local changes and pull remote ones until the service is drained.
    pub async fn sync(&mut self) -> Result<()> {
        // Bodies can arrive on an earlier page than their note
        let mut orphans = Vec::new();
        loop {
            let outgoing = self
                .notes
                .iter()
                .filter(|note| note.dirty)
                .cloned()
                .collect::<Vec<_>>();
            tracing::debug!(
                "Syncing from version {:?} with {} local change(s)",
                self.version,
                outgoing.len()
            );

            let changes = self
                .client
                .changes(self.version.as_deref(), &outgoing)
                .await?;

            for pushed in &outgoing {
                if let Some(note) = self.notes.iter_mut().find(|note| note.id == pushed.id) {
                    note.dirty = false;
                }
            }

            let truncated = changes.truncated;
            orphans = self.apply(changes, orphans);
            if !truncated {
                for body in &orphans {
                    tracing::warn!(
                        "Dropping body {} for unknown note {}",
                        body.body_id,
                        body.note_id
                    );
                }
                return Ok(());
            }
        }
    }

    /// Serialize everything needed to resume this session later.
    pub fn dump(&self) -> Result<CachedState> {
        let state = SessionState {
            version: self.version.clone(),
            notes: self.notes.clone(),
        };
        Ok(CachedState::new(serde_json::to_value(state)?))
    }

    /// Replace the in-memory notes and cursor with a previously dumped state.
    pub fn restore(&mut self, state: &CachedState) -> Result<()> {
        let state = SessionState::deserialize(state.value())
            .map_err(|error| Error::InvalidState(error.to_string()))?;
        self.version = state.version;
        self.notes = state.notes;
        Ok(())
    }

    /// Apply one page of changes. `pending` holds bodies from earlier pages
    /// whose note had not arrived yet; bodies still without a note are returned.
    fn apply(&mut self, changes: ChangeSet, pending: Vec<RemoteBody>) -> Vec<RemoteBody> {
        self.notes
            .retain(|note| !changes.deleted.contains(&note.id));

        for remote in changes.notes {
            if let Some(note) = self.notes.iter_mut().find(|note| note.id == remote.id) {
                note.title = remote.title;
                note.created_at = remote.created_at;
                note.updated_at = remote.updated_at;
                note.trashed = remote.trashed;
            } else {
                self.notes.push(Note {
                    id: remote.id,
                    body_id: NoteId::generate(),
                    title: remote.title,
                    text: String::new(),
                    created_at: remote.created_at,
                    updated_at: remote.updated_at,
                    trashed: remote.trashed,
                    dirty: false,
                });
            }
        }

        let mut orphans = Vec::new();
        for body in pending.into_iter().chain(changes.bodies) {
            if changes.deleted.contains(&body.note_id) {
                continue;
            }
            if let Some(note) = self.notes.iter_mut().find(|note| note.id == body.note_id) {
                note.body_id = body.body_id;
                note.text = body.text;
            } else {
                orphans.push(body);
            }
        }

        self.version = Some(changes.to_version);
        orphans
    }
}

/// Load the cached state for `config_dir` and log in with it.
pub async fn login<C: RemoteClient>(
    client: C,
    credentials: &Credentials,
    config_dir: &Path,
) -> Result<Session<C>> {
    let cached = state::load(config_dir)?;
    Session::login(client, credentials, cached.as_ref()).await
}
