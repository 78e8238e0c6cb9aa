//! Google-specific provider parameters.
//!
//! coffeechat-core passes the `[provider]` table through untyped; this
//! gives the Google side a checked view of it.

use anyhow::Result;

/// Strongly-typed provider parameters for Google.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleRemoteConfig {
    /// Account whose stored session is used for every API call.
    pub google_account: String,
}

impl TryFrom<&serde_json::Map<String, serde_json::Value>> for GoogleRemoteConfig {
    type Error = anyhow::Error;

    fn try_from(map: &serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        let google_account = map
            .get("google_account")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Missing required field: google_account (set it under [provider] in the coffeechat config)"
                )
            })?
            .to_string();

        Ok(Self { google_account })
    }
}
