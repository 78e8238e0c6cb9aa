//! Initialize OAuth authentication - returns the authorization URL.

use anyhow::Result;
use coffeechat_core::protocol::{AuthInit, AuthInitResponse};
use google_calendar::Client;
use url::Url;

use crate::app_config::AppConfig;

pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/calendar",
    "https://www.googleapis.com/auth/spreadsheets.readonly",
];

pub async fn handle(cmd: AuthInit) -> Result<AuthInitResponse> {
    let redirect_uri = cmd
        .redirect_uri
        .ok_or_else(|| anyhow::anyhow!("redirect_uri is required for OAuth"))?;

    let app_config = AppConfig::load()?;

    let client = Client::new(
        app_config.client_id,
        app_config.client_secret,
        redirect_uri,
        String::new(),
        String::new(),
    );

    let scopes: Vec<String> = SCOPES.iter().map(|s| s.to_string()).collect();

    // The library generates the URL with its own state parameter
    let authorization_url = client.user_consent_url(&scopes);
    let state = state_param(&authorization_url)?;

    Ok(AuthInitResponse {
        authorization_url,
        state,
        scopes,
    })
}

fn state_param(authorization_url: &str) -> Result<String> {
    Url::parse(authorization_url)?
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.to_string())
        .ok_or_else(|| anyhow::anyhow!("No state parameter in authorization URL"))
}
