//! Defines the JSON protocol used for communication between coffeechat
//! and provider binaries over stdin/stdout.
//!
//! One request line in, one response line out:
//! `{"command": "...", "params": {...}}` →
//! `{"status": "success", "data": ...}` or `{"status": "error", "error": "..."}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::backend::RosterSpec;
use crate::event::{BusyInterval, CreatedEvent, EventRequest};

pub trait ProviderCommand: Serialize {
    type Response: DeserializeOwned;
    fn command() -> Command;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    AuthInit,
    AuthSubmit,
    Session,
    FetchRoster,
    QueryFreeBusy,
    CreateEvent,
}

/// Request sent from coffeechat to provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Response sent from provider to coffeechat.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success { data: T },
    Error { error: String },
}

impl<T: Serialize> Response<T> {
    pub fn success(data: T) -> String {
        serde_json::to_string(&Response::Success { data })
            .unwrap_or_else(|e| Response::<()>::error(&format!("Failed to serialize response: {e}")))
    }
}

impl Response<()> {
    pub fn error(msg: &str) -> String {
        serde_json::to_string(&Response::<()>::Error {
            error: msg.to_string(),
        })
        .unwrap_or_else(|_| r#"{"status":"error","error":"unserializable error"}"#.to_string())
    }
}

// ============================================================================
// Auth
// ============================================================================

/// Start an OAuth flow.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthInit {
    /// The redirect URI the caller will listen on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthInitResponse {
    pub authorization_url: String,
    pub state: String,
    pub scopes: Vec<String>,
}

impl ProviderCommand for AuthInit {
    type Response = AuthInitResponse;
    fn command() -> Command {
        Command::AuthInit
    }
}

/// Hand the OAuth callback parameters (`code`, `state`, `redirect_uri`) back to the provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthSubmit {
    #[serde(flatten)]
    pub credentials: serde_json::Map<String, serde_json::Value>,
}

impl ProviderCommand for AuthSubmit {
    type Response = String; // Account identifier (e.g., email)
    fn command() -> Command {
        Command::AuthSubmit
    }
}

/// Check that a stored session is usable, refreshing it if needed.
#[derive(Debug, Serialize, Deserialize)]
pub struct Session {
    /// Provider-specific config (e.g., google_account)
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
}

impl ProviderCommand for Session {
    type Response = String;
    fn command() -> Command {
        Command::Session
    }
}

// ============================================================================
// Data
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct FetchRoster {
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub roster: RosterSpec,
}

impl ProviderCommand for FetchRoster {
    type Response = Vec<Vec<String>>;
    fn command() -> Command {
        Command::FetchRoster
    }
}

/// Busy intervals of one identity.
#[derive(Debug, Serialize, Deserialize)]
pub struct QueryFreeBusy {
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub identity: String,
    pub time_min: DateTime<Utc>,
    pub time_max: DateTime<Utc>,
}

impl ProviderCommand for QueryFreeBusy {
    type Response = Vec<BusyInterval>;
    fn command() -> Command {
        Command::QueryFreeBusy
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateEvent {
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub calendar_id: String,
    pub event: EventRequest,
}

impl ProviderCommand for CreateEvent {
    type Response = CreatedEvent;
    fn command() -> Command {
        Command::CreateEvent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn request_wire_format() {
        let cmd = QueryFreeBusy {
            remote_config: serde_json::Map::from_iter([(
                "google_account".to_string(),
                serde_json::Value::from("lead@example.com"),
            )]),
            identity: "bob@example.com".to_string(),
            time_min: Utc.with_ymd_and_hms(2025, 6, 2, 13, 0, 0).unwrap(),
            time_max: Utc.with_ymd_and_hms(2025, 6, 2, 13, 20, 0).unwrap(),
        };
        let request = Request {
            command: QueryFreeBusy::command(),
            params: serde_json::to_value(cmd).unwrap(),
        };

        let json: serde_json::Value = serde_json::to_value(&request).unwrap();
        assert_eq!(json["command"], "query_free_busy");
        assert_eq!(json["params"]["google_account"], "lead@example.com");
        assert_eq!(json["params"]["identity"], "bob@example.com");
    }

    #[test]
    fn response_status_tag() {
        let ok: Response<String> = serde_json::from_str(&Response::success("a@b.c")).unwrap();
        assert!(matches!(ok, Response::Success { data } if data == "a@b.c"));

        let err: Response<String> = serde_json::from_str(&Response::<()>::error("nope")).unwrap();
        assert!(matches!(err, Response::Error { error } if error == "nope"));
    }
}
