//! Local sync state cache.
//!
//! One `state.json` per config directory. The file holds whatever
//! [`Session::dump`] produced; this module never looks inside it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::remote::RemoteClient;
use crate::session::Session;
use crate::Result;

pub const STATE_FILE_NAME: &str = "state.json";

/// Opaque serialized session state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CachedState(serde_json::Value);

impl CachedState {
    pub(crate) const fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub(crate) const fn value(&self) -> &serde_json::Value {
        &self.0
    }
}

pub fn state_path(config_dir: &Path) -> PathBuf {
    config_dir.join(STATE_FILE_NAME)
}

/// Read the cached state for `config_dir`, or `None` when nothing was saved yet.
pub fn load(config_dir: &Path) -> Result<Option<CachedState>> {
    let path = state_path(config_dir);
    if !path.exists() {
        tracing::debug!("No local state at {}", path.display());
        return Ok(None);
    }

    tracing::info!("Loading local state from {}", path.display());
    let raw = std::fs::read_to_string(&path)?;
    Ok(Some(serde_json::from_str(&raw)?))
}

/// Write the full session state for `config_dir`, replacing any previous file.
pub fn save<C: RemoteClient>(session: &Session<C>, config_dir: &Path) -> Result<()> {
    if !config_dir.exists() {
        tracing::info!("Creating config directory {}", config_dir.display());
        std::fs::create_dir_all(config_dir)?;
    }

    let path = state_path(config_dir);
    tracing::info!("Saving local state to {}", path.display());
    let serialized = serde_json::to_string(&session.dump()?)?;
    std::fs::write(path, serialized)?;
    Ok(())
}
