//! Plain REST calls for the two endpoints the calendar client does not
//! cover well: Calendar `freeBusy` and Sheets `values.get`.

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use coffeechat_core::event::BusyInterval;
use serde::{Deserialize, Serialize};
use url::Url;

const FREE_BUSY_URL: &str = "https://www.googleapis.com/calendar/v3/freeBusy";
const SHEETS_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

pub struct GoogleApi {
    http: reqwest::Client,
    access_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FreeBusyRequest<'a> {
    time_min: String,
    time_max: String,
    time_zone: &'static str,
    items: Vec<FreeBusyItem<'a>>,
}

#[derive(Serialize)]
struct FreeBusyItem<'a> {
    id: &'a str,
}

#[derive(Debug, Deserialize)]
struct FreeBusyResponse {
    #[serde(default)]
    calendars: HashMap<String, FreeBusyCalendar>,
}

#[derive(Debug, Deserialize)]
struct FreeBusyCalendar {
    #[serde(default)]
    busy: Vec<TimePeriod>,
    #[serde(default)]
    errors: Vec<FreeBusyError>,
}

#[derive(Debug, Deserialize)]
struct TimePeriod {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct FreeBusyError {
    #[serde(default)]
    domain: String,
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

impl GoogleApi {
    pub fn new(access_token: &str) -> Self {
        GoogleApi {
            http: reqwest::Client::new(),
            access_token: access_token.to_string(),
        }
    }

    /// Busy intervals for one calendar identity. Errors Google reports for
    /// that identity (e.g. `notFound`) are returned as failures.
    pub async fn free_busy(
        &self,
        identity: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>> {
        let body = FreeBusyRequest {
            time_min: time_min.to_rfc3339_opts(SecondsFormat::Secs, true),
            time_max: time_max.to_rfc3339_opts(SecondsFormat::Secs, true),
            time_zone: "UTC",
            items: vec![FreeBusyItem { id: identity }],
        };

        let response = self
            .http
            .post(FREE_BUSY_URL)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .context("Failed to send freeBusy request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("freeBusy failed ({}): {}", status, error_text);
        }

        let parsed: FreeBusyResponse = response
            .json()
            .await
            .context("Failed to parse freeBusy response")?;

        busy_for(parsed, identity)
    }

    /// Rows of a sheet range as strings; empty trailing cells are simply absent.
    pub async fn sheet_values(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<String>>> {
        let url = values_url(spreadsheet_id, range)?;

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .context("Failed to send Sheets request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Reading {} failed ({}): {}", range, status, error_text);
        }

        let parsed: ValueRange = response
            .json()
            .await
            .context("Failed to parse Sheets response")?;

        Ok(rows_from(parsed))
    }
}

fn values_url(spreadsheet_id: &str, range: &str) -> Result<Url> {
    let mut url = Url::parse(SHEETS_URL)?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("Sheets URL cannot be a base"))?
        .push(spreadsheet_id)
        .push("values")
        .push(range);
    Ok(url)
}

fn busy_for(response: FreeBusyResponse, identity: &str) -> Result<Vec<BusyInterval>> {
    let mut calendars = response.calendars;
    let calendar = calendars
        .remove(identity)
        .ok_or_else(|| anyhow::anyhow!("freeBusy returned nothing for {}", identity))?;

    if !calendar.errors.is_empty() {
        let reasons: Vec<String> = calendar
            .errors
            .iter()
            .map(|e| format!("{}/{}", e.domain, e.reason))
            .collect();
        anyhow::bail!("freeBusy error for {}: {}", identity, reasons.join(", "));
    }

    Ok(calendar
        .busy
        .into_iter()
        .map(|p| BusyInterval {
            start: p.start,
            end: p.end,
        })
        .collect())
}

fn rows_from(range: ValueRange) -> Vec<Vec<String>> {
    range
        .values
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|cell| match cell {
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                })
                .collect()
        })
        .collect()
}
