use std::path::Path;

use keep_core::{with_synced_session, Credentials, RemoteClient};

use crate::config::Settings;
use crate::error::CliError;

pub async fn run_sync(settings: &Settings) -> Result<(), CliError> {
    let credentials = settings.credentials()?;
    let client = settings.client()?;

    run_sync_with(client, &credentials, &settings.config_dir).await?;
    println!("Sync completed");
    Ok(())
}

pub async fn run_sync_with<C: RemoteClient>(
    client: C,
    credentials: &Credentials,
    config_dir: &Path,
) -> Result<(), CliError> {
    with_synced_session(client, credentials, config_dir, |_| Ok::<_, CliError>(())).await
}
