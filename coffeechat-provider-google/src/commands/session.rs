//! Confirm the stored session works before a run starts.

use anyhow::Result;
use coffeechat_core::protocol::Session as SessionCommand;

use crate::remote_config::GoogleRemoteConfig;
use crate::session::Session;

pub async fn handle(cmd: SessionCommand) -> Result<String> {
    let config = GoogleRemoteConfig::try_from(&cmd.remote_config)?;
    let session = Session::load_valid(&config.google_account).await?;

    Ok(session.account_email().to_string())
}
