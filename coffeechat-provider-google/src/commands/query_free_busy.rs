use anyhow::Result;
use coffeechat_core::event::BusyInterval;
use coffeechat_core::protocol::QueryFreeBusy;

use crate::api::GoogleApi;
use crate::remote_config::GoogleRemoteConfig;
use crate::session::Session;

pub async fn handle(cmd: QueryFreeBusy) -> Result<Vec<BusyInterval>> {
    let config = GoogleRemoteConfig::try_from(&cmd.remote_config)?;
    let session = Session::load_valid(&config.google_account).await?;

    GoogleApi::new(session.access_token())
        .free_busy(&cmd.identity, cmd.time_min, cmd.time_max)
        .await
}
