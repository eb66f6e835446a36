//! Data models for keep

mod note;

pub use note::{Note, NoteId};
