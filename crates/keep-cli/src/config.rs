//! Layered CLI configuration.
//!
//! Flags and `KEEP_*` variables are merged by clap before we see them. This
//! module adds `config.yaml` underneath and the built-in defaults below that.

use std::path::{Path, PathBuf};

use keep_core::text::non_empty;
use keep_core::{Credentials, KeepApiClient, KeepEndpoints};
use serde::Deserialize;

use crate::cli::GlobalArgs;
use crate::error::CliError;

pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Contents of `<config-dir>/config.yaml`. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FileConfig {
    pub verbose: Option<bool>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub auth_url: Option<String>,
    pub api_url: Option<String>,
}

/// Where the file layer came from. Logged once logging is set up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Missing(PathBuf),
    Invalid { path: PathBuf, reason: String },
}

impl ConfigSource {
    pub fn log(&self) {
        match self {
            Self::File(path) => tracing::debug!("Loaded config from {}", path.display()),
            Self::Missing(path) => tracing::debug!("No config file at {}", path.display()),
            Self::Invalid { path, reason } => {
                tracing::warn!("Ignoring config at {}: {reason}", path.display());
            }
        }
    }
}

impl FileConfig {
    /// Read `config.yaml` from `config_dir`. A missing or broken file yields
    /// the empty config.
    pub fn load(config_dir: &Path) -> (Self, ConfigSource) {
        let path = config_dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return (Self::default(), ConfigSource::Missing(path));
        }

        match Self::load_from_path(&path) {
            Ok(config) => (config, ConfigSource::File(path)),
            Err(reason) => (Self::default(), ConfigSource::Invalid { path, reason }),
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        let raw = std::fs::read_to_string(path)
            .map_err(|error| format!("Failed to read config: {error}"))?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&raw).map_err(|error| format!("Failed to parse config: {error}"))
    }
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub verbose: bool,
    pub config_dir: PathBuf,
    pub username: Option<String>,
    pub password: Option<String>,
    pub auth_url: String,
    pub api_url: String,
}

impl Settings {
    pub fn resolve(args: &GlobalArgs, config_dir: PathBuf, file: FileConfig) -> Self {
        let defaults = KeepEndpoints::default();
        Self {
            verbose: args.verbose || file.verbose.unwrap_or(false),
            config_dir,
            username: non_empty(args.username.clone()).or_else(|| non_empty(file.username)),
            password: non_empty(args.password.clone()).or_else(|| non_empty(file.password)),
            auth_url: non_empty(args.auth_url.clone())
                .or_else(|| non_empty(file.auth_url))
                .unwrap_or(defaults.auth_url),
            api_url: non_empty(args.api_url.clone())
                .or_else(|| non_empty(file.api_url))
                .unwrap_or(defaults.api_url),
        }
    }

    pub fn credentials(&self) -> Result<Credentials, CliError> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Ok(Credentials::new(username, password)),
            _ => Err(CliError::MissingCredentials),
        }
    }

    pub fn client(&self) -> Result<KeepApiClient, CliError> {
        KeepEndpoints::new(&self.auth_url, &self.api_url)
            .and_then(KeepApiClient::new)
            .map_err(|error| CliError::Config(error.to_string()))
    }
}

/// `--config-dir`/`KEEP_CONFIG_DIR`, else `~/.config/keep`.
pub fn resolve_config_dir(explicit: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(dir) = explicit.filter(|dir| !dir.as_os_str().is_empty()) {
        return Ok(dir);
    }
    dirs::home_dir()
        .map(|home| home.join(".config").join("keep"))
        .ok_or_else(|| CliError::Config("Failed to resolve home directory".to_string()))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let (config, source) = FileConfig::load(dir.path());
        assert_eq!(config, FileConfig::default());
        assert!(matches!(source, ConfigSource::Missing(_)));
    }

    #[test]
    fn load_invalid_file_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "username: [unclosed").unwrap();

        let (config, source) = FileConfig::load(dir.path());
        assert_eq!(config, FileConfig::default());
        assert!(matches!(source, ConfigSource::Invalid { .. }));
    }

    #[test]
    fn load_reads_known_keys() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "verbose: true\nusername: me@example.com\napi_url: http://localhost:8080\n",
        )
        .unwrap();

        let (config, source) = FileConfig::load(dir.path());
        assert_eq!(config.verbose, Some(true));
        assert_eq!(config.username.as_deref(), Some("me@example.com"));
        assert_eq!(config.api_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(config.password, None);
        assert!(matches!(source, ConfigSource::File(_)));
    }

    #[test]
    fn empty_file_is_empty_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "\n").unwrap();
        let (config, source) = FileConfig::load(dir.path());
        assert_eq!(config, FileConfig::default());
        assert!(matches!(source, ConfigSource::File(_)));
    }

    #[test]
    fn explicit_config_dir_wins() {
        let dir = resolve_config_dir(Some(PathBuf::from("/tmp/keep-test"))).unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/keep-test"));
    }

    #[test]
    fn credentials_require_both_fields() {
        let args = GlobalArgs {
            username: Some("me@example.com".to_string()),
            ..GlobalArgs::default()
        };
        let settings = Settings::resolve(&args, PathBuf::from("/tmp"), FileConfig::default());
        assert!(matches!(
            settings.credentials(),
            Err(CliError::MissingCredentials)
        ));
    }

    #[test]
    fn client_rejects_non_http_endpoint() {
        let args = GlobalArgs {
            api_url: Some("ftp://example.com".to_string()),
            ..GlobalArgs::default()
        };
        let settings = Settings::resolve(&args, PathBuf::from("/tmp"), FileConfig::default());
        assert!(matches!(settings.client(), Err(CliError::Config(_))));
    }
}
