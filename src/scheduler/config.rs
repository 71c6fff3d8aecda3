//! Scheduler configuration loaded from TOML.

use crate::task::domain::UserId;
use chrono::{NaiveTime, TimeDelta, Timelike};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_REMINDER_THRESHOLD_HOURS: u32 = 17;
const DEFAULT_DIGEST_TIME: &str = "21:00";
const DEFAULT_TIMEZONE: &str = "UTC";

/// Errors raised while loading or validating scheduler configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read scheduler config {path}: {source}")]
    Read {
        /// Path that was read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or has unexpected keys.
    #[error("failed to parse scheduler config: {0}")]
    Parse(String),

    /// The reminder threshold is zero.
    #[error("reminder_threshold_hours must be at least 1")]
    ZeroReminderThreshold,

    /// The digest time is not `HH:MM`.
    #[error("invalid digest_hour_local '{0}', expected HH:MM")]
    InvalidDigestTime(String),

    /// The timezone is not `UTC` or a known IANA zone name.
    #[error("invalid timezone '{0}', expected UTC or an IANA name such as Europe/London")]
    InvalidTimezone(String),

    /// The supervisor id cannot be a Discord user id.
    #[error("invalid supervisor_user_id {0}")]
    InvalidSupervisor(u64),
}

/// Raw scheduler options as written in the configuration file.
///
/// Missing keys take their defaults. Call [`SchedulerConfig::resolve`] to
/// obtain validated [`ScheduleSettings`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Hours after creation at which the one-time reminder fires.
    pub reminder_threshold_hours: u32,
    /// Local time of the daily digest as `HH:MM`; only the hour gates.
    pub digest_hour_local: String,
    /// `UTC`, `Z`, or an IANA zone name such as `Europe/London`.
    pub timezone: String,
    /// User mentioned on every digest. Absent or `0` disables the mention.
    pub supervisor_user_id: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            reminder_threshold_hours: DEFAULT_REMINDER_THRESHOLD_HOURS,
            digest_hour_local: DEFAULT_DIGEST_TIME.to_owned(),
            timezone: DEFAULT_TIMEZONE.to_owned(),
            supervisor_user_id: None,
        }
    }
}

impl SchedulerConfig {
    /// Loads and validates configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, parsed, or
    /// validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the text cannot be parsed or validated.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.resolve()?;
        Ok(config)
    }

    /// Validates the options and converts them to typed settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the first invalid option.
    pub fn resolve(&self) -> Result<ScheduleSettings, ConfigError> {
        if self.reminder_threshold_hours == 0 {
            return Err(ConfigError::ZeroReminderThreshold);
        }
        Ok(ScheduleSettings {
            reminder_threshold: TimeDelta::hours(i64::from(self.reminder_threshold_hours)),
            digest_hour: parse_digest_hour(&self.digest_hour_local)?,
            timezone: parse_timezone(&self.timezone)?,
            supervisor: parse_supervisor(self.supervisor_user_id)?,
            intervals: PollIntervals::default(),
        })
    }
}

/// Poll periods of the three scans. Not configurable from files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    /// Reminder scan period.
    pub reminder: Duration,
    /// Overdue scan period.
    pub overdue: Duration,
    /// Digest check period.
    pub digest: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            reminder: Duration::from_secs(30 * 60),
            overdue: Duration::from_secs(15 * 60),
            digest: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Validated scheduler settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleSettings {
    /// Elapsed time since creation after which the reminder fires.
    pub reminder_threshold: TimeDelta,
    /// Local hour (0-23) during which the digest is sent.
    pub digest_hour: u32,
    /// Zone defining local time for the digest.
    pub timezone: Tz,
    /// User mentioned on every digest.
    pub supervisor: Option<UserId>,
    /// Poll periods.
    pub intervals: PollIntervals,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            reminder_threshold: TimeDelta::hours(i64::from(DEFAULT_REMINDER_THRESHOLD_HOURS)),
            digest_hour: 21,
            timezone: Tz::UTC,
            supervisor: None,
            intervals: PollIntervals::default(),
        }
    }
}

fn parse_digest_hour(raw: &str) -> Result<u32, ConfigError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map(|time| time.hour())
        .map_err(|_| ConfigError::InvalidDigestTime(raw.to_owned()))
}

fn parse_timezone(raw: &str) -> Result<Tz, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("utc") || trimmed.eq_ignore_ascii_case("z") {
        return Ok(Tz::UTC);
    }
    trimmed
        .parse::<Tz>()
        .map_err(|_| ConfigError::InvalidTimezone(raw.to_owned()))
}

fn parse_supervisor(raw: Option<u64>) -> Result<Option<UserId>, ConfigError> {
    match raw {
        None | Some(0) => Ok(None),
        Some(value) => UserId::new(value)
            .map(Some)
            .map_err(|_| ConfigError::InvalidSupervisor(value)),
    }
}
