//! keep-core - Core library for keep
//!
//! Notes, the remote service seam, the local state cache, and the
//! login/sync cycle shared by the `keep` command-line client.

pub mod error;
pub mod models;
pub mod remote;
pub mod session;
pub mod state;
pub mod sync;
pub mod text;

pub use error::{Error, Result};
pub use models::{Note, NoteId};
pub use remote::{Credentials, KeepApiClient, KeepEndpoints, RemoteClient, RemoteError};
pub use session::{AuthFailure, Session};
pub use state::CachedState;
pub use sync::with_synced_session;
