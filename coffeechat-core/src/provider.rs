//! Provider subprocess protocol.
//!
//! This module handles communication with external provider binaries
//! (e.g., `coffeechat-provider-google`) using JSON over stdin/stdout.
//!
//! Providers manage their own credentials and tokens. Core just passes
//! provider-specific parameters from the `[provider]` config table.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;
use tracing::debug;

use crate::backend::{CalendarBackend, RosterSource, RosterSpec, SessionSource};
use crate::config::ProviderConfig;
use crate::error::{CoffeeChatError, CoffeeChatResult};
use crate::event::{BusyInterval, CreatedEvent, EventRequest};
use crate::protocol::{
    AuthInit, AuthInitResponse, AuthSubmit, Command, CreateEvent, FetchRoster, ProviderCommand,
    QueryFreeBusy, Request, Response, Session,
};

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);
/// Auth commands wait on the user, so they get longer.
const AUTH_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Provider(String);

impl Provider {
    pub fn from_name(name: &str) -> Self {
        Provider(name.to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    fn binary_path(&self) -> CoffeeChatResult<std::path::PathBuf> {
        let binary_name = format!("coffeechat-provider-{}", self.0);
        which::which(&binary_name).map_err(|_| CoffeeChatError::ProviderNotInstalled(binary_name))
    }

    /// Start authentication; the provider answers with the URL to open.
    pub async fn auth_init(&self, redirect_uri: Option<String>) -> CoffeeChatResult<AuthInitResponse> {
        self.call_with_timeout(AUTH_TIMEOUT, AuthInit { redirect_uri }).await
    }

    /// Submit the OAuth callback parameters. Returns the account identifier.
    pub async fn auth_submit(
        &self,
        credentials: serde_json::Map<String, serde_json::Value>,
    ) -> CoffeeChatResult<String> {
        self.call_with_timeout(AUTH_TIMEOUT, AuthSubmit { credentials })
            .await
            .map_err(into_auth_error)
    }

    /// Call a typed provider command and return the result.
    ///
    /// The response type is inferred from the command's associated type,
    /// ensuring compile-time type safety.
    pub async fn call<C: ProviderCommand>(&self, cmd: C) -> CoffeeChatResult<C::Response> {
        self.call_with_timeout(PROVIDER_TIMEOUT, cmd).await
    }

    async fn call_with_timeout<C: ProviderCommand>(
        &self,
        limit: Duration,
        cmd: C,
    ) -> CoffeeChatResult<C::Response> {
        timeout(limit, self.call_raw(C::command(), cmd))
            .await
            .map_err(|_| CoffeeChatError::ProviderTimeout(limit.as_secs()))?
    }

    /// Low-level call that sends a command with params and deserializes the response.
    async fn call_raw<P: Serialize, R: serde::de::DeserializeOwned>(
        &self,
        command: Command,
        params: P,
    ) -> CoffeeChatResult<R> {
        let params = serde_json::to_value(params)
            .map_err(|e| CoffeeChatError::Serialization(e.to_string()))?;
        let request = Request { command, params };
        let request_json = serde_json::to_string(&request)
            .map_err(|e| CoffeeChatError::Serialization(e.to_string()))?;

        let binary_path = self.binary_path()?;
        debug!(provider = %self.0, ?command, "calling provider");

        let mut child = TokioCommand::new(&binary_path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                CoffeeChatError::Backend(format!("Failed to spawn {}: {}", binary_path.display(), e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| CoffeeChatError::Backend("Provider stdin unavailable".into()))?;
        stdin
            .write_all(format!("{request_json}\n").as_bytes())
            .await?;
        drop(stdin);

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(CoffeeChatError::Backend(format!(
                "Provider exited with status: {}",
                output.status.code().unwrap_or(-1)
            )));
        }

        let response_str = String::from_utf8_lossy(&output.stdout);
        if response_str.trim().is_empty() {
            return Err(CoffeeChatError::Backend("Provider returned no response".into()));
        }

        let response: Response<R> = serde_json::from_str(&response_str)
            .map_err(|e| CoffeeChatError::Backend(format!("Failed to parse response: {}", e)))?;

        match response {
            Response::Success { data } => Ok(data),
            Response::Error { error } => Err(CoffeeChatError::Backend(error)),
        }
    }
}

fn into_auth_error(error: CoffeeChatError) -> CoffeeChatError {
    match error {
        CoffeeChatError::Backend(message) => CoffeeChatError::Auth(message),
        other => other,
    }
}

/// Provider parameters from the config file, as JSON for the wire.
fn params_to_json(params: &HashMap<String, toml::Value>) -> serde_json::Map<String, serde_json::Value> {
    params
        .iter()
        .map(|(k, v)| {
            (
                k.clone(),
                serde_json::to_value(v).unwrap_or(serde_json::Value::Null),
            )
        })
        .collect()
}

/// A provider bound to its parameters; the backend used for real runs.
pub struct ProviderBackend {
    provider: Provider,
    params: serde_json::Map<String, serde_json::Value>,
}

impl ProviderBackend {
    pub fn from_config(config: &ProviderConfig) -> Self {
        ProviderBackend {
            provider: Provider::from_name(&config.name),
            params: params_to_json(&config.params),
        }
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }
}

impl SessionSource for ProviderBackend {
    async fn session(&self) -> CoffeeChatResult<String> {
        self.provider
            .call(Session {
                remote_config: self.params.clone(),
            })
            .await
            .map_err(into_auth_error)
    }
}

impl RosterSource for ProviderBackend {
    async fn fetch_rows(&self, spec: &RosterSpec) -> CoffeeChatResult<Vec<Vec<String>>> {
        self.provider
            .call(FetchRoster {
                remote_config: self.params.clone(),
                roster: spec.clone(),
            })
            .await
    }
}

impl CalendarBackend for ProviderBackend {
    async fn query_free_busy(
        &self,
        identity: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> CoffeeChatResult<Vec<BusyInterval>> {
        self.provider
            .call(QueryFreeBusy {
                remote_config: self.params.clone(),
                identity: identity.to_string(),
                time_min,
                time_max,
            })
            .await
    }

    async fn insert_event(
        &self,
        calendar_id: &str,
        event: &EventRequest,
    ) -> CoffeeChatResult<CreatedEvent> {
        self.provider
            .call(CreateEvent {
                remote_config: self.params.clone(),
                calendar_id: calendar_id.to_string(),
                event: event.clone(),
            })
            .await
    }
}
