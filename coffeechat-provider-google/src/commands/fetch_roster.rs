use anyhow::{Context, Result};
use coffeechat_core::protocol::FetchRoster;

use crate::api::GoogleApi;
use crate::remote_config::GoogleRemoteConfig;
use crate::session::Session;

pub async fn handle(cmd: FetchRoster) -> Result<Vec<Vec<String>>> {
    let config = GoogleRemoteConfig::try_from(&cmd.remote_config)?;
    let session = Session::load_valid(&config.google_account).await?;

    GoogleApi::new(session.access_token())
        .sheet_values(&cmd.roster.source_id, &cmd.roster.range)
        .await
        .with_context(|| format!("Failed to read roster from spreadsheet {}", cmd.roster.source_id))
}
