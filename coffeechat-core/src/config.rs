//! Run configuration at ~/.config/coffeechat/config.toml
//!
//! Every value has a default; environment variables prefixed with
//! `COFFEECHAT_` override the file, using `__` between nested keys
//! (e.g. `COFFEECHAT_SCHEDULE__WEEKLY_CAP=3`).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Duration;
use chrono_tz::Tz;
use config::{ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use serde::{Deserialize, Deserializer};

use crate::backend::RosterSpec;
use crate::error::{CoffeeChatError, CoffeeChatResult};
use crate::pair::PairOrder;
use crate::quota::WeeklyQuota;
use crate::roster::{Group, GroupLabels};
use crate::slots::{LunchBreak, SlotRules};
use crate::window::{TimeWindow, WindowRule, WindowTable, default_rules};

const ENV_PREFIX: &str = "COFFEECHAT";

fn humantime_duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let text = String::deserialize(deserializer)?;
    let std_duration = humantime::parse_duration(&text).map_err(serde::de::Error::custom)?;
    Duration::from_std(std_duration).map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Receives the end-of-run reminder event.
    pub organizer_email: String,
    /// All windows, lunch hours and reminder times are in this zone.
    pub organizer_timezone: Tz,
    /// Team calendar the events are created on.
    pub calendar_id: String,
    pub provider: ProviderConfig,
    pub roster: RosterConfig,
    pub schedule: ScheduleConfig,
    pub event: EventConfig,
    pub windows: Vec<WindowRule>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            organizer_email: String::new(),
            organizer_timezone: chrono_tz::Europe::Paris,
            calendar_id: String::new(),
            provider: ProviderConfig::default(),
            roster: RosterConfig::default(),
            schedule: ScheduleConfig::default(),
            event: EventConfig::default(),
            windows: default_rules(),
        }
    }
}

/// Which provider binary to use, plus whatever parameters it needs
/// (e.g. `google_account`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub name: String,
    #[serde(flatten)]
    pub params: HashMap<String, toml::Value>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            name: "google".to_string(),
            params: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    pub spreadsheet_id: String,
    pub range: String,
    pub labels: GroupLabels,
}

impl Default for RosterConfig {
    fn default() -> Self {
        RosterConfig {
            spreadsheet_id: String::new(),
            range: "Sheet1!A2:D100".to_string(),
            labels: GroupLabels::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub capped_group: Group,
    pub weekly_cap: u32,
    #[serde(deserialize_with = "humantime_duration")]
    pub meeting_duration: Duration,
    pub horizon_days: u32,
    #[serde(deserialize_with = "humantime_duration")]
    pub slot_step: Duration,
    pub lunch_start_hour: u32,
    pub lunch_end_hour: u32,
    /// Fixed seed for the pair order; unset means a fresh shuffle every run.
    pub shuffle_seed: Option<u64>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            capped_group: Group::A,
            weekly_cap: 2,
            meeting_duration: Duration::minutes(20),
            horizon_days: 90,
            slot_step: Duration::minutes(30),
            lunch_start_hour: 12,
            lunch_end_hour: 14,
            shuffle_seed: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    pub summary: String,
    pub description: String,
    pub reminder_summary: String,
    pub reminder_description: String,
    /// Popup reminder before each event.
    pub reminder_minutes: i64,
    /// Organizer-local hour of the end-of-run reminder event.
    pub reminder_hour: u32,
    #[serde(deserialize_with = "humantime_duration")]
    pub reminder_duration: Duration,
}

impl Default for EventConfig {
    fn default() -> Self {
        EventConfig {
            summary: "☕ Chat Product - Sales".to_string(),
            description: "\
Some ideas:
• Discuss what is coming up in the next few weeks
• Dive into a specific feature
• User Experience feedback
• Share insights from a recent customer interaction

⚠️ If this time does not work, please feel free to reschedule!"
                .to_string(),
            reminder_summary: "⏰ Coffee Chat Prep Reminder".to_string(),
            reminder_description: "The last coffee chat of this round is today. Time to prepare the next one."
                .to_string(),
            reminder_minutes: 10,
            reminder_hour: 17,
            reminder_duration: Duration::minutes(30),
        }
    }
}

impl Config {
    pub fn config_path() -> CoffeeChatResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CoffeeChatError::Config("Could not determine config directory".into()))?
            .join("coffeechat");

        Ok(config_dir.join("config.toml"))
    }

    /// Load ~/.config/coffeechat/config.toml, creating a commented default
    /// file on first run.
    pub fn load() -> CoffeeChatResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        let builder = config::Config::builder()
            .add_source(File::from(config_path.clone()).required(false));

        let config = Self::build(builder)?;
        config.require_identities(&config_path)?;
        Ok(config)
    }

    /// Parse TOML text with the same defaults, overrides and validation as [`Config::load`].
    pub fn from_toml_str(contents: &str) -> CoffeeChatResult<Self> {
        Self::build(config::Config::builder().add_source(File::from_str(contents, FileFormat::Toml)))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> CoffeeChatResult<Self> {
        let config: Config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| CoffeeChatError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CoffeeChatError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Range checks on everything the scheduler relies on.
    pub fn validate(&self) -> CoffeeChatResult<()> {
        let schedule = &self.schedule;

        if schedule.weekly_cap == 0 {
            return Err(CoffeeChatError::Config("schedule.weekly_cap must be at least 1".into()));
        }
        if schedule.meeting_duration <= Duration::zero() {
            return Err(CoffeeChatError::Config("schedule.meeting_duration must be positive".into()));
        }
        if schedule.slot_step <= Duration::zero() {
            return Err(CoffeeChatError::Config("schedule.slot_step must be positive".into()));
        }
        if schedule.lunch_start_hour >= schedule.lunch_end_hour || schedule.lunch_end_hour > 24 {
            return Err(CoffeeChatError::Config(format!(
                "Invalid lunch window {}:00-{}:00",
                schedule.lunch_start_hour, schedule.lunch_end_hour
            )));
        }
        if self.event.reminder_hour >= 24 {
            return Err(CoffeeChatError::Config("event.reminder_hour must be below 24".into()));
        }

        for rule in &self.windows {
            if TimeWindow::from_hours(rule.start, rule.duration).is_none() {
                return Err(CoffeeChatError::Config(format!(
                    "Invalid window for {} ↔ {}: start {} duration {}",
                    rule.a, rule.b, rule.start, rule.duration
                )));
            }
        }

        Ok(())
    }

    /// The identities a real run cannot do without.
    fn require_identities(&self, path: &Path) -> CoffeeChatResult<()> {
        let missing: Vec<&str> = [
            ("organizer_email", &self.organizer_email),
            ("calendar_id", &self.calendar_id),
            ("roster.spreadsheet_id", &self.roster.spreadsheet_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(key, _)| key)
        .collect();

        if missing.is_empty() {
            return Ok(());
        }

        Err(CoffeeChatError::Config(format!(
            "Missing {} in {}",
            missing.join(", "),
            path.display()
        )))
    }

    pub fn window_table(&self) -> WindowTable {
        WindowTable::new(self.organizer_timezone, &self.windows)
    }

    pub fn slot_rules(&self) -> SlotRules {
        SlotRules {
            meeting_duration: self.schedule.meeting_duration,
            step: self.schedule.slot_step,
            lunch: LunchBreak {
                start_hour: self.schedule.lunch_start_hour,
                end_hour: self.schedule.lunch_end_hour,
            },
        }
    }

    pub fn quota(&self) -> WeeklyQuota {
        WeeklyQuota::new(self.schedule.capped_group, self.schedule.weekly_cap)
    }

    pub fn roster_spec(&self) -> RosterSpec {
        RosterSpec {
            source_id: self.roster.spreadsheet_id.clone(),
            range: self.roster.range.clone(),
        }
    }

    pub fn pair_order(&self) -> PairOrder {
        PairOrder::from_seed(self.schedule.shuffle_seed)
    }

    /// Create a default config file with the required keys blank and
    /// everything else commented out.
    pub fn create_default_config(path: &Path) -> CoffeeChatResult<()> {
        let contents = "\
# coffeechat configuration

# Who gets the end-of-run reminder:
organizer_email = \"\"
# organizer_timezone = \"Europe/Paris\"

# Team calendar the chats are booked on:
calendar_id = \"\"

[provider]
# name = \"google\"
# google_account = \"you@example.com\"

[roster]
# Spreadsheet with rows of: name, group, email, timezone
spreadsheet_id = \"\"
# range = \"Sheet1!A2:D100\"

# [roster.labels]
# a = \"group1\"
# b = \"group2\"

# [schedule]
# capped_group = \"A\"
# weekly_cap = 2
# meeting_duration = \"20m\"
# horizon_days = 90
# slot_step = \"30m\"
# lunch_start_hour = 12
# lunch_end_hour = 14
# shuffle_seed = 42

# [event]
# summary = \"☕ Chat Product - Sales\"
# reminder_minutes = 10
# reminder_hour = 17
# reminder_duration = \"30m\"

# Preferred windows, in organizer-local hours:
# [[windows]]
# a = \"Paris\"
# b = \"Boston\"
# start = 15
# duration = 3
";

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CoffeeChatError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| CoffeeChatError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_toml_str("").unwrap();

        assert_eq!(config.organizer_timezone, chrono_tz::Europe::Paris);
        assert_eq!(config.provider.name, "google");
        assert_eq!(config.schedule.weekly_cap, 2);
        assert_eq!(config.schedule.meeting_duration, Duration::minutes(20));
        assert_eq!(config.schedule.slot_step, Duration::minutes(30));
        assert_eq!(config.schedule.horizon_days, 90);
        assert_eq!(config.roster.range, "Sheet1!A2:D100");
        assert_eq!(config.windows.len(), 4);
        assert_eq!(config.window_table().len(), 4);
        assert_eq!(config.pair_order(), PairOrder::Shuffled);
    }

    #[test]
    fn parses_full_file() {
        let config = Config::from_toml_str(
            r#"
organizer_email = "lead@example.com"
organizer_timezone = "America/New_York"
calendar_id = "team@group.calendar.google.com"

[provider]
name = "google"
google_account = "lead@example.com"

[roster]
spreadsheet_id = "sheet-123"
range = "People!A2:D50"

[roster.labels]
a = "mentor"
b = "mentee"

[schedule]
capped_group = "B"
weekly_cap = 1
meeting_duration = "30m"
slot_step = "15m"
shuffle_seed = 7

[[windows]]
a = "Boston"
b = "Boston"
start = 9.5
duration = 2
"#,
        )
        .unwrap();

        assert_eq!(config.organizer_timezone, chrono_tz::America::New_York);
        assert_eq!(
            config.provider.params.get("google_account").and_then(|v| v.as_str()),
            Some("lead@example.com")
        );
        assert_eq!(config.roster_spec().source_id, "sheet-123");
        assert_eq!(config.roster_spec().range, "People!A2:D50");
        assert_eq!(config.roster.labels.a, "mentor");
        assert_eq!(config.quota().capped_group(), Group::B);
        assert_eq!(config.quota().cap(), 1);
        assert_eq!(config.slot_rules().meeting_duration, Duration::minutes(30));
        assert_eq!(config.slot_rules().step, Duration::minutes(15));
        assert_eq!(config.pair_order(), PairOrder::Seeded(7));
        assert_eq!(config.windows.len(), 1);
        assert!(config.window_table().lookup("Boston", "Boston").is_some());
        assert!(config.window_table().lookup("Paris", "Boston").is_none());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Config::from_toml_str("[schedule]\nweekly_cap = 0").is_err());
        assert!(Config::from_toml_str("[schedule]\nlunch_start_hour = 14\nlunch_end_hour = 12").is_err());
        assert!(Config::from_toml_str("[schedule]\nmeeting_duration = \"soon\"").is_err());
        assert!(Config::from_toml_str("[[windows]]\na = \"X\"\nb = \"Y\"\nstart = 25\nduration = 1").is_err());
        assert!(Config::from_toml_str("organizer_timezone = \"Mars/Olympus\"").is_err());
        assert!(Config::from_toml_str("[[windows]]\na = \"X\"\nb = \"Y\"\nstart = 9\nduration = 1e12").is_err());
    }

    #[test]
    fn missing_identities_are_reported_together() {
        let config = Config::from_toml_str("calendar_id = \"team\"").unwrap();
        let err = config
            .require_identities(Path::new("/tmp/config.toml"))
            .unwrap_err()
            .to_string();

        assert!(err.contains("organizer_email"));
        assert!(err.contains("roster.spreadsheet_id"));
        assert!(!err.contains("calendar_id,"));
    }
}
