//! Layered host settings.
//!
//! Values come from built-in defaults, then an optional settings file, then
//! `HERALD__`-prefixed environment variables (`HERALD__QUEUE__DRAIN_INTERVAL=30s`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use herald_watch::{DEFAULT_MAX_MESSAGE_LENGTH, QueueConfig, WatcherConfig};
use serde::{Deserialize, Serialize};

use crate::error::{HostError, HostResult};

/// Environment variable naming the settings file.
pub const CONFIG_PATH_ENV: &str = "HERALD_CONFIG";

/// Prefix of settings environment variables.
pub const ENV_PREFIX: &str = "HERALD";

/// Host settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Default tracing filter; `RUST_LOG` overrides it.
    pub log_level: String,
    pub queue: QueueSettings,
    pub formatter: FormatterSettings,
    pub feed: FeedSettings,
    pub commands: CommandSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            queue: QueueSettings::default(),
            formatter: FormatterSettings::default(),
            feed: FeedSettings::default(),
            commands: CommandSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueSettings {
    /// Delay between notification drains.
    #[serde(with = "duration_str")]
    pub drain_interval: Duration,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            drain_interval: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatterSettings {
    /// Longest chunk a channel accepts, in characters.
    pub max_message_length: usize,
}

impl Default for FormatterSettings {
    fn default() -> Self {
        Self {
            max_message_length: DEFAULT_MAX_MESSAGE_LENGTH,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    /// Feed name; subscriptions are keyed by it.
    pub name: String,
    /// Delay between feed polls.
    #[serde(with = "duration_str")]
    pub poll_interval: Duration,
    /// JSON file holding the latest feed entries. No file means no entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            name: "feed".to_string(),
            poll_interval: Duration::from_secs(60 * 60),
            source: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandSettings {
    /// Prefix that marks a line as a command.
    pub prefix: String,
    /// Channel id used for commands typed on the console.
    pub console_channel: u64,
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            prefix: "!".to_string(),
            console_channel: 1,
        }
    }
}

impl Settings {
    /// Loads settings, reading the file named by `HERALD_CONFIG` if set.
    pub fn load() -> HostResult<Self> {
        let path = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        Self::load_from(path.as_deref())
    }

    /// Loads settings from defaults, `path` (if any) and the environment.
    pub fn load_from(path: Option<&Path>) -> HostResult<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Rejects values the host cannot run with.
    pub fn validate(&self) -> HostResult<()> {
        if self.queue.drain_interval.is_zero() {
            return Err(HostError::invalid_setting(
                "queue.drain_interval",
                "must be greater than zero",
            ));
        }
        if self.feed.poll_interval.is_zero() {
            return Err(HostError::invalid_setting(
                "feed.poll_interval",
                "must be greater than zero",
            ));
        }
        if self.formatter.max_message_length == 0 {
            return Err(HostError::invalid_setting(
                "formatter.max_message_length",
                "must be greater than zero",
            ));
        }
        if self.commands.prefix.trim().is_empty() {
            return Err(HostError::invalid_setting("commands.prefix", "must not be blank"));
        }
        Ok(())
    }

    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            name: "notification-queue".to_string(),
            drain_interval: self.queue.drain_interval,
        }
    }

    pub fn feed_watcher_config(&self) -> WatcherConfig {
        WatcherConfig::new(format!("feed-{}", self.feed.name), self.feed.poll_interval)
    }
}

/// Serde adapter for human-readable durations such as `90s` or `1h 30m`.
mod duration_str {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&humantime::format_duration(*duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom)
    }
}
