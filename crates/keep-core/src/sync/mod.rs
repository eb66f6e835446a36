//! Login, run caller code, then sync and persist.

use std::path::Path;

use crate::remote::{Credentials, RemoteClient};
use crate::session::{self, Session};
use crate::state;

/// Run `block` against a freshly logged-in session.
///
/// When the block succeeds the session is synced and written back to
/// `config_dir`. When it fails nothing is synced or saved, so local edits made
/// by the block are dropped.
pub async fn with_synced_session<C, T, E, F>(
    client: C,
    credentials: &Credentials,
    config_dir: &Path,
    block: F,
) -> Result<T, E>
where
    C: RemoteClient,
    E: From<crate::Error>,
    F: FnOnce(&mut Session<C>) -> Result<T, E>,
{
    let mut session = session::login(client, credentials, config_dir).await?;

    let value = match block(&mut session) {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!("Command failed, local changes were not synced or saved");
            return Err(error);
        }
    };

    session.sync().await?;
    state::save(&session, config_dir)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::Note;
    use crate::remote::FakeRemote;
    use crate::Error;

    fn credentials() -> Credentials {
        Credentials::new("user@example.com", "app-password")
    }

    #[tokio::test]
    async fn failed_block_skips_sync_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let remote = FakeRemote::new();

        let result: Result<(), Error> =
            with_synced_session(remote.clone(), &credentials(), dir.path(), |session| {
                session.create_note("Lost", "never pushed");
                Err(Error::InvalidState("editor blew up".to_string()))
            })
            .await;

        assert!(matches!(result, Err(Error::InvalidState(message)) if message == "editor blew up"));
        let snapshot = remote.snapshot();
        // Only the initial sync inside login
        assert_eq!(snapshot.changes_calls, 1);
        assert!(snapshot.pushed.is_empty());
        assert!(!state::state_path(dir.path()).exists());
    }

    #[tokio::test]
    async fn successful_block_pushes_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let remote = FakeRemote::with_notes([Note::new("Groceries", "milk")]);

        let id = with_synced_session::<_, _, Error, _>(
            remote.clone(),
            &credentials(),
            dir.path(),
            |session| {
                let note = session.find_or_create_note("Groceries");
                note.set_text("milk\neggs");
                Ok(note.id.clone())
            },
        )
        .await
        .unwrap();

        let snapshot = remote.snapshot();
        assert_eq!(snapshot.changes_calls, 2);
        assert_eq!(snapshot.pushed.len(), 1);
        assert_eq!(snapshot.pushed[0].id, id);
        assert_eq!(snapshot.pushed[0].text, "milk\neggs");

        let cached = state::load(dir.path()).unwrap().expect("state saved");
        let mut restored = Session::new(FakeRemote::new());
        restored.restore(&cached).unwrap();
        let note = restored.get(&id).expect("note persisted");
        assert_eq!(note.text, "milk\neggs");
        assert!(!note.dirty);
    }

    #[tokio::test]
    async fn login_failure_never_runs_block() {
        let dir = tempfile::tempdir().unwrap();
        let mut ran = false;

        let result: Result<(), Error> = with_synced_session(
            FakeRemote::rejecting("BadAuthentication"),
            &credentials(),
            dir.path(),
            |_| {
                ran = true;
                Ok(())
            },
        )
        .await;

        assert!(result.is_err());
        assert!(!ran);
        assert!(!state::state_path(dir.path()).exists());
    }
}
