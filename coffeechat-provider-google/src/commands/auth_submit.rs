//! Complete OAuth authentication - exchanges the code for tokens.

use anyhow::{Context, Result};
use coffeechat_core::protocol::AuthSubmit;
use google_calendar::Client;
use google_calendar::types::MinAccessRole;

use crate::app_config::AppConfig;
use crate::session::{Session, SessionData};

fn credential<'a>(cmd: &'a AuthSubmit, key: &str) -> Result<&'a str> {
    cmd.credentials
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("Missing '{}' in credentials", key))
}

pub async fn handle(cmd: AuthSubmit) -> Result<String> {
    let code = credential(&cmd, "code")?;
    let state = credential(&cmd, "state")?;
    let redirect_uri = credential(&cmd, "redirect_uri")?;

    let app_config = AppConfig::load()?;

    let mut client = Client::new(
        app_config.client_id.clone(),
        app_config.client_secret.clone(),
        redirect_uri.to_string(),
        String::new(),
        String::new(),
    );

    let tokens = client
        .get_access_token(code, state)
        .await
        .context("Failed to exchange authorization code for tokens")?;

    let session_data: SessionData = (&tokens).into();

    let client = Client::new(
        app_config.client_id,
        app_config.client_secret,
        redirect_uri.to_string(),
        tokens.access_token.clone(),
        tokens.refresh_token.clone(),
    );

    // The primary calendar's summary is the account email
    let calendars = client
        .calendar_list()
        .list_all(MinAccessRole::default(), false, false)
        .await
        .context("Failed to fetch calendars")?
        .body;

    let account_email = calendars
        .iter()
        .find(|cal| cal.primary)
        .map(|cal| cal.summary.clone())
        .ok_or_else(|| anyhow::anyhow!("No primary calendar found"))?;

    Session::new(&account_email, session_data).save()?;

    Ok(account_email)
}
