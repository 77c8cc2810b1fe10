//! Command-line configuration for the `message-mock` driver.
//!
//! Settings resolve in this order: CLI argument, environment variable,
//! config file, built-in default.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::simulation::{ConfigError, MockClientConfig};

pub const ENV_CONFIG: &str = "MESSAGE_MOCK_CONFIG";
pub const ENV_SEED: &str = "MESSAGE_MOCK_SEED";
pub const ENV_RECIPIENTS: &str = "MESSAGE_MOCK_RECIPIENTS";
pub const ENV_REPLY_DELAY_MS: &str = "MESSAGE_MOCK_REPLY_DELAY_MS";
pub const ENV_TICK_INTERVAL_MS: &str = "MESSAGE_MOCK_TICK_INTERVAL_MS";

/// Simulated messaging backend.
///
/// Prints every client event as one JSON line on stdout. Lines read from
/// stdin are sent as messages: `<handle> <text>`.
#[derive(Parser, Debug, Default)]
#[command(name = "message-mock", version, about)]
pub struct Cli {
    /// TOML config file [env: MESSAGE_MOCK_CONFIG]
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Seed for generated recipients and messages [env: MESSAGE_MOCK_SEED]
    #[arg(long, short = 's')]
    pub seed: Option<u64>,

    /// Number of generated recipients [env: MESSAGE_MOCK_RECIPIENTS] [default: 20]
    #[arg(long, short = 'n')]
    pub recipients: Option<usize>,

    /// Delay before a sent message is answered [env: MESSAGE_MOCK_REPLY_DELAY_MS] [default: 2500]
    #[arg(long)]
    pub reply_delay_ms: Option<u64>,

    /// Interval of unsolicited incoming messages [env: MESSAGE_MOCK_TICK_INTERVAL_MS] [default: 30000]
    #[arg(long)]
    pub tick_interval_ms: Option<u64>,

    /// Disable unsolicited incoming messages
    #[arg(long)]
    pub no_tick: bool,

    /// Exit after this many seconds instead of waiting for Ctrl-C
    #[arg(long, short = 'd')]
    pub duration_secs: Option<u64>,
}

#[derive(Debug)]
pub struct Config {
    pub client: MockClientConfig,
    pub duration: Option<Duration>,
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid(format!("{name}: cannot parse {value:?}"))),
        Err(_) => Ok(None),
    }
}

impl Config {
    pub fn from_cli_and_env(cli: Cli) -> Result<Self, ConfigError> {
        let overrides = cli_overrides(&cli);
        let config_path = cli
            .config
            .or_else(|| std::env::var(ENV_CONFIG).ok().map(PathBuf::from));
        let env = EnvOverrides {
            seed: env_parsed(ENV_SEED)?,
            recipients: env_parsed(ENV_RECIPIENTS)?,
            reply_delay_ms: env_parsed(ENV_REPLY_DELAY_MS)?,
            tick_interval_ms: env_parsed(ENV_TICK_INTERVAL_MS)?,
        };
        let base = match config_path {
            Some(path) => MockClientConfig::load(&path)?,
            None => MockClientConfig::default(),
        };
        Self::resolve(overrides, env, base, cli.no_tick, cli.duration_secs)
    }

    fn resolve(
        cli: EnvOverrides,
        env: EnvOverrides,
        mut client: MockClientConfig,
        no_tick: bool,
        duration_secs: Option<u64>,
    ) -> Result<Self, ConfigError> {
        if let Some(seed) = cli.seed.or(env.seed) {
            client.seed = Some(seed);
        }
        if let Some(recipients) = cli.recipients.or(env.recipients) {
            client.recipient_count = recipients;
        }
        if let Some(delay) = cli.reply_delay_ms.or(env.reply_delay_ms) {
            client.reply_delay_ms = delay;
        }
        if let Some(interval) = cli.tick_interval_ms.or(env.tick_interval_ms) {
            client.tick_interval_ms = interval;
        }
        if no_tick {
            client.tick_enabled = false;
        }
        client.validate()?;
        Ok(Self {
            client,
            duration: duration_secs.map(Duration::from_secs),
        })
    }
}

#[derive(Debug, Default)]
struct EnvOverrides {
    seed: Option<u64>,
    recipients: Option<usize>,
    reply_delay_ms: Option<u64>,
    tick_interval_ms: Option<u64>,
}

fn cli_overrides(cli: &Cli) -> EnvOverrides {
    EnvOverrides {
        seed: cli.seed,
        recipients: cli.recipients,
        reply_delay_ms: cli.reply_delay_ms,
        tick_interval_ms: cli.tick_interval_ms,
    }
}

/// Parse a stdin line of the form `<handle> <text>`.
pub fn parse_send_line(line: &str) -> Option<(&str, &str)> {
    let (handle, text) = line.trim().split_once(char::is_whitespace)?;
    let text = text.trim();
    if handle.is_empty() || text.is_empty() {
        return None;
    }
    Some((handle, text))
}
