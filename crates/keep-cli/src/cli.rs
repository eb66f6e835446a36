use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "keep")]
#[command(about = "Edit and sync Google Keep notes from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options shared by every command. Each one can also come from a `KEEP_*`
/// environment variable or from `config.yaml`.
#[derive(Args, Debug, Default, Clone)]
pub struct GlobalArgs {
    /// Enable debug logging
    #[arg(short, long, global = true, env = "KEEP_VERBOSE")]
    pub verbose: bool,

    /// Directory holding config.yaml and the local state cache
    #[arg(long, global = true, env = "KEEP_CONFIG_DIR", value_name = "PATH")]
    pub config_dir: Option<PathBuf>,

    /// Google account email
    #[arg(long, global = true, env = "KEEP_USERNAME", value_name = "EMAIL")]
    pub username: Option<String>,

    /// Google account password or app-specific password
    #[arg(
        long,
        global = true,
        env = "KEEP_PASSWORD",
        hide_env_values = true,
        value_name = "PASSWORD"
    )]
    pub password: Option<String>,

    /// Override the authentication endpoint
    #[arg(long, global = true, env = "KEEP_AUTH_URL", value_name = "URL")]
    pub auth_url: Option<String>,

    /// Override the notes API endpoint
    #[arg(long, global = true, env = "KEEP_API_URL", value_name = "URL")]
    pub api_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the first note matching an expression in $EDITOR, creating it if needed
    Note {
        /// Text to search for in note titles and bodies
        expression: String,
    },
    /// Sync notes with Google Keep and refresh the local cache
    Sync,
}
