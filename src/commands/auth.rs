use std::collections::HashMap;

use anyhow::{Context, Result};
use coffeechat_core::provider::Provider;
use owo_colors::OwoColorize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

const REDIRECT_PORT: u16 = 8085;

pub async fn run(provider_name: &str) -> Result<()> {
    let provider = Provider::from_name(provider_name);
    let redirect_uri = format!("http://localhost:{}/callback", REDIRECT_PORT);

    println!("Authenticating with {provider_name}...\n");

    let init = provider.auth_init(Some(redirect_uri.clone())).await?;

    println!("Open this URL in your browser to authenticate:\n");
    println!("{}\n", init.authorization_url);

    if open::that(&init.authorization_url).is_err() {
        println!("(Could not open browser automatically, please copy the URL above)");
    }

    let params = wait_for_callback(REDIRECT_PORT).await?;

    if let Some(error) = params.get("error") {
        anyhow::bail!("Authorization was refused: {}", error);
    }

    let code = params
        .get("code")
        .ok_or_else(|| anyhow::anyhow!("No code in callback"))?;
    let state = params
        .get("state")
        .ok_or_else(|| anyhow::anyhow!("No state in callback"))?;

    if state != &init.state {
        anyhow::bail!("OAuth state mismatch - possible CSRF attack");
    }

    println!("Received authorization code, exchanging for tokens...");

    let mut credentials = serde_json::Map::new();
    credentials.insert("code".into(), code.clone().into());
    credentials.insert("state".into(), state.clone().into());
    credentials.insert("redirect_uri".into(), redirect_uri.into());

    let account = provider.auth_submit(credentials).await?;

    println!("\n{} {}", "Authenticated as:".green(), account);
    println!("\nMake sure your config.toml names this account:");
    println!();
    println!("[provider]");
    println!("name = \"{}\"", provider_name);
    println!("{}_account = \"{}\"", provider_name, account);
    println!();
    println!("Then run `coffeechat --dry-run` to preview the schedule.");

    Ok(())
}

/// Wait for an HTTP callback on localhost and return all query parameters.
async fn wait_for_callback(port: u16) -> Result<HashMap<String, String>> {
    let address = format!("127.0.0.1:{}", port);
    let listener = TcpListener::bind(&address)
        .await
        .context("Failed to bind OAuth callback listener")?;

    let (stream, _) = listener
        .accept()
        .await
        .context("Failed to accept OAuth callback")?;

    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader
        .read_line(&mut request_line)
        .await
        .context("Failed to read OAuth callback request line")?;

    let path = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("Invalid HTTP request"))?;

    let params = query_params(path)?;

    let response = "HTTP/1.1 200 OK\r\n\
        Content-Type: text/html\r\n\
        Connection: close\r\n\
        \r\n\
        <html><body>\
        <h1>coffeechat is connected</h1>\
        <p>You can close this window and return to the terminal.</p>\
        </body></html>";

    let mut stream = reader.into_inner();
    stream
        .write_all(response.as_bytes())
        .await
        .context("Failed to write OAuth callback response")?;
    stream.flush().await?;

    Ok(params)
}

fn query_params(path: &str) -> Result<HashMap<String, String>> {
    let url = url::Url::parse(&format!("http://localhost{}", path))?;
    Ok(url.query_pairs().into_owned().collect())
}
