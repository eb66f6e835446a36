use std::path::Path;

use keep_core::{with_synced_session, Credentials, Note, NoteId, RemoteClient};

use crate::config::Settings;
use crate::editor::edit_note;
use crate::error::CliError;

pub async fn run_note(expression: &str, settings: &Settings) -> Result<(), CliError> {
    let credentials = settings.credentials()?;
    let client = settings.client()?;

    let id = run_note_with(
        client,
        &credentials,
        &settings.config_dir,
        expression,
        edit_note,
    )
    .await?;
    println!("{id}");
    Ok(())
}

/// Find or create the note for `expression`, hand it to `edit`, then sync.
pub async fn run_note_with<C, F>(
    client: C,
    credentials: &Credentials,
    config_dir: &Path,
    expression: &str,
    edit: F,
) -> Result<NoteId, CliError>
where
    C: RemoteClient,
    F: FnOnce(&mut Note) -> Result<(), CliError>,
{
    with_synced_session(client, credentials, config_dir, |session| {
        let note = session.find_or_create_note(expression);
        edit(note)?;
        Ok(note.id.clone())
    })
    .await
}
