use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_RECIPIENT_COUNT: usize = 20;
pub const DEFAULT_PRELOAD_MESSAGES_PER_RECIPIENT: usize = 50;
pub const DEFAULT_REPLY_DELAY_MS: u64 = 2_500;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 30_000;
pub const DEFAULT_MAX_BACKFILL_DAYS: u32 = 10;
pub const DEFAULT_ATTACHMENT_URL: &str = "logo192.png";

fn default_recipient_count() -> usize {
    DEFAULT_RECIPIENT_COUNT
}

fn default_preload_messages_per_recipient() -> usize {
    DEFAULT_PRELOAD_MESSAGES_PER_RECIPIENT
}

fn default_reply_delay_ms() -> u64 {
    DEFAULT_REPLY_DELAY_MS
}

fn default_tick_enabled() -> bool {
    true
}

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

fn default_max_backfill_days() -> u32 {
    DEFAULT_MAX_BACKFILL_DAYS
}

fn default_attachment_url() -> String {
    DEFAULT_ATTACHMENT_URL.to_string()
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(error) => write!(f, "config io error: {error}"),
            ConfigError::Parse(error) => write!(f, "config parse error: {error}"),
            ConfigError::Invalid(reason) => write!(f, "invalid config: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(error: std::io::Error) -> Self {
        ConfigError::Io(error)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(error: toml::de::Error) -> Self {
        ConfigError::Parse(error)
    }
}

/// Settings for [`super::MockClient`]. Every field has a default, so a
/// TOML file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockClientConfig {
    /// Recipients generated when the client is created.
    #[serde(default = "default_recipient_count")]
    pub recipient_count: usize,
    /// Historical messages emitted per recipient when listening starts.
    #[serde(default = "default_preload_messages_per_recipient")]
    pub preload_messages_per_recipient: usize,
    /// Delay between a send and its simulated reply.
    #[serde(default = "default_reply_delay_ms")]
    pub reply_delay_ms: u64,
    #[serde(default = "default_tick_enabled")]
    pub tick_enabled: bool,
    /// Interval of the unsolicited incoming message.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Upper bound, in whole days, of how far back a preloaded transcript ends.
    #[serde(default = "default_max_backfill_days")]
    pub max_backfill_days: u32,
    #[serde(default = "default_attachment_url")]
    pub attachment_url: String,
    /// Seed for all generated content. Drawn from the OS when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for MockClientConfig {
    fn default() -> Self {
        Self {
            recipient_count: DEFAULT_RECIPIENT_COUNT,
            preload_messages_per_recipient: DEFAULT_PRELOAD_MESSAGES_PER_RECIPIENT,
            reply_delay_ms: DEFAULT_REPLY_DELAY_MS,
            tick_enabled: true,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            max_backfill_days: DEFAULT_MAX_BACKFILL_DAYS,
            attachment_url: default_attachment_url(),
            seed: None,
        }
    }
}

impl MockClientConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.preload_messages_per_recipient == 0 {
            return Err(ConfigError::Invalid(
                "preload_messages_per_recipient must be at least 1".to_string(),
            ));
        }
        if self.tick_enabled && self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "tick_interval_ms must be at least 1 when ticking is enabled".to_string(),
            ));
        }
        Ok(())
    }

    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }

    /// `None` when the periodic tick is switched off.
    pub fn tick_interval(&self) -> Option<Duration> {
        self.tick_enabled
            .then(|| Duration::from_millis(self.tick_interval_ms))
    }

    /// A config for tests: seeded, small, no periodic tick.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            tick_enabled: false,
            ..Self::default()
        }
    }
}
