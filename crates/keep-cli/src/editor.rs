//! Round-trip note text through the user's editor.

use std::env;
use std::io::{self, Write};
use std::path::Path;
use std::process::Command;

use keep_core::Note;

use crate::error::CliError;

pub const DEFAULT_EDITOR: &str = "vim";

/// Edit `note` in `$EDITOR`, blocking until the editor exits.
pub fn edit_note(note: &mut Note) -> Result<(), CliError> {
    edit_note_with(&preferred_editor(), note)
}

/// Write the note text to a temp file, run `editor` on it, and read the
/// whole file back as the new text.
pub fn edit_note_with(editor: &str, note: &mut Note) -> Result<(), CliError> {
    let mut file = tempfile::Builder::new()
        .prefix("keep-note-")
        .suffix(".txt")
        .tempfile()?;
    file.write_all(note.text.as_bytes())?;
    file.flush()?;

    tracing::debug!("Launching {editor} on {}", file.path().display());
    launch_editor(editor, file.path())?;

    let text = std::fs::read_to_string(file.path())?;
    note.set_text(text);
    Ok(())
}

pub fn preferred_editor() -> String {
    env::var("EDITOR")
        .ok()
        .filter(|editor| !editor.trim().is_empty())
        .unwrap_or_else(|| {
            tracing::warn!("$EDITOR is not set, falling back to {DEFAULT_EDITOR}");
            DEFAULT_EDITOR.to_string()
        })
}

fn launch_editor(editor: &str, file_path: &Path) -> Result<(), CliError> {
    let status = match Command::new(editor).arg(file_path).status() {
        Ok(status) => status,
        // Allow EDITOR values with arguments, e.g. "code --wait"
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let mut parts = editor.split_whitespace();
            let Some(program) = parts.next() else {
                return Err(CliError::EditorFailed("empty EDITOR command".into()));
            };
            if parts.clone().next().is_none() {
                return Err(CliError::Io(err));
            }
            Command::new(program).args(parts).arg(file_path).status()?
        }
        Err(err) => return Err(CliError::Io(err)),
    };

    if status.success() {
        Ok(())
    } else {
        Err(CliError::EditorFailed(format!(
            "`{editor}` exited with status {status}"
        )))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    /// Shell script run through `sh`, so it never needs the exec bit.
    fn stub_editor(dir: &Path, body: &str) -> String {
        let script = dir.join("editor.sh");
        std::fs::write(&script, body).unwrap();
        format!("sh {}", script.display())
    }

    #[test]
    fn stub_editor_edits_are_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let editor = stub_editor(dir.path(), "printf '%s' \"$(cat \"$1\")-edited\" > \"$1\"\n");
        let mut note = Note::new("Groceries", "abc");
        note.dirty = false;

        edit_note_with(&editor, &mut note).unwrap();

        assert_eq!(note.text, "abc-edited");
        assert!(note.dirty);
    }

    #[test]
    fn unchanged_text_leaves_note_clean() {
        let dir = tempfile::tempdir().unwrap();
        let editor = stub_editor(dir.path(), "exit 0\n");
        let mut note = Note::new("Groceries", "milk\n");
        note.dirty = false;

        edit_note_with(&editor, &mut note).unwrap();

        assert_eq!(note.text, "milk\n");
        assert!(!note.dirty);
    }

    #[test]
    fn failing_editor_keeps_original_text() {
        let dir = tempfile::tempdir().unwrap();
        let editor = stub_editor(dir.path(), "echo clobbered > \"$1\"\nexit 3\n");
        let mut note = Note::new("Groceries", "abc");

        let error = edit_note_with(&editor, &mut note).unwrap_err();

        assert!(matches!(error, CliError::EditorFailed(_)));
        assert_eq!(note.text, "abc");
    }

    #[test]
    fn missing_editor_is_io_error() {
        let mut note = Note::new("Groceries", "abc");
        let error = edit_note_with("keep-no-such-editor-binary", &mut note).unwrap_err();
        assert!(matches!(error, CliError::Io(ref err) if err.kind() == io::ErrorKind::NotFound));
    }
}
