//! coffeechat-provider-google - Google Calendar and Sheets provider for coffeechat
//!
//! This binary implements the coffeechat provider protocol, communicating
//! with coffeechat via JSON over stdin/stdout.
//!
//! The provider manages its own credentials and tokens:
//!   ~/.config/coffeechat/providers/google/app_config.toml
//!   ~/.config/coffeechat/providers/google/session/{account}.toml

mod api;
mod app_config;
mod commands;
mod google_event;
mod remote_config;
mod session;

use std::future::Future;
use std::io::{self, BufRead, Write};

use coffeechat_core::protocol::{Command, Request, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

#[tokio::main]
async fn main() {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Failed to read stdin: {}", e);
                break;
            }
        };

        // Skip empty lines
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => handle_request(request).await,
            Err(e) => Response::<()>::error(&format!("Failed to parse request: {}", e)),
        };

        if writeln!(stdout, "{}", response).and_then(|_| stdout.flush()).is_err() {
            break;
        }
    }
}

async fn handle_request(request: Request) -> String {
    let params = request.params;

    match request.command {
        Command::AuthInit => dispatch(params, commands::auth_init::handle).await,
        Command::AuthSubmit => dispatch(params, commands::auth_submit::handle).await,
        Command::Session => dispatch(params, commands::session::handle).await,
        Command::FetchRoster => dispatch(params, commands::fetch_roster::handle).await,
        Command::QueryFreeBusy => dispatch(params, commands::query_free_busy::handle).await,
        Command::CreateEvent => dispatch(params, commands::create_event::handle).await,
    }
}

/// Parse the typed command from `params`, run it, and encode the result.
async fn dispatch<C, R, F, Fut>(params: serde_json::Value, handler: F) -> String
where
    C: DeserializeOwned,
    R: Serialize,
    F: FnOnce(C) -> Fut,
    Fut: Future<Output = anyhow::Result<R>>,
{
    let cmd: C = match serde_json::from_value(params) {
        Ok(cmd) => cmd,
        Err(e) => return Response::<()>::error(&format!("Invalid params: {}", e)),
    };

    match handler(cmd).await {
        Ok(data) => Response::success(data),
        Err(e) => Response::<()>::error(&format!("{:#}", e)),
    }
}
