//! Application configuration.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::preferences::FailurePolicy;
use crate::reminders::DEFAULT_REMINDER_LEAD_MINUTES;
use crate::source::{BundledSource, CacheConfig, RemoteConfig};

pub const ENV_DATA_URL: &str = "TRANSIT_DATA_URL";
pub const ENV_DATA_DIR: &str = "TRANSIT_DATA_DIR";
pub const ENV_BUNDLED_PATH: &str = "TRANSIT_BUNDLED_PATH";
pub const ENV_REMINDER_LEAD_MINS: &str = "TRANSIT_REMINDER_LEAD_MINS";
pub const ENV_UPDATE_CHECK_HOURS: &str = "TRANSIT_UPDATE_CHECK_HOURS";

const DEFAULT_DATA_DIR: &str = "transit-data";

/// How often to check the remote source for newer data (24 hours).
const DEFAULT_UPDATE_CHECK_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Everything needed to start the client.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub remote: RemoteConfig,
    /// Directory holding the disk cache, settings and favorites
    pub data_dir: PathBuf,
    pub bundled: BundledSource,
    pub cache: CacheConfig,
    /// Time between a reminder and its departure
    pub reminder_lead: chrono::Duration,
    /// Period of the background update check; `None` disables it
    pub update_check_interval: Option<Duration>,
    pub failure_policy: FailurePolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            remote: RemoteConfig::disabled(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            bundled: BundledSource::Embedded,
            cache: CacheConfig::default(),
            reminder_lead: chrono::Duration::minutes(DEFAULT_REMINDER_LEAD_MINUTES),
            update_check_interval: Some(DEFAULT_UPDATE_CHECK_INTERVAL),
            failure_policy: FailurePolicy::FailOpen,
        }
    }
}

impl AppConfig {
    /// Create a config that keeps its files in `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_remote(mut self, remote: RemoteConfig) -> Self {
        self.remote = remote;
        self
    }

    pub fn with_bundled(mut self, bundled: BundledSource) -> Self {
        self.bundled = bundled;
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_reminder_lead(mut self, lead: chrono::Duration) -> Self {
        self.reminder_lead = lead;
        self
    }

    pub fn with_update_check_interval(mut self, interval: Option<Duration>) -> Self {
        self.update_check_interval = interval;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Read the config from `TRANSIT_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from a variable lookup. Unset or unparseable values
    /// keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        match get(ENV_DATA_URL) {
            Some(url) => config.remote = RemoteConfig::new(url),
            None => warn!("{ENV_DATA_URL} not set. Remote updates are disabled."),
        }
        if let Some(dir) = get(ENV_DATA_DIR) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(path) = get(ENV_BUNDLED_PATH) {
            config.bundled = BundledSource::File(PathBuf::from(path));
        }
        if let Some(mins) = parse_number(ENV_REMINDER_LEAD_MINS, get(ENV_REMINDER_LEAD_MINS)) {
            match i64::try_from(mins).ok().and_then(chrono::Duration::try_minutes) {
                Some(lead) => config.reminder_lead = lead,
                None => warn!(minutes = mins, "Reminder lead out of range, using default"),
            }
        }
        if let Some(hours) = parse_number(ENV_UPDATE_CHECK_HOURS, get(ENV_UPDATE_CHECK_HOURS)) {
            config.update_check_interval =
                (hours > 0).then(|| Duration::from_secs(hours.saturating_mul(60 * 60)));
        }

        config
    }
}

fn parse_number(key: &str, value: Option<String>) -> Option<u64> {
    let value = value?;
    match value.parse::<u64>() {
        Ok(n) => Some(n),
        Err(e) => {
            warn!(key, value = %value, error = %e, "Ignoring invalid number");
            None
        }
    }
}
