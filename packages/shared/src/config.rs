use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    Missing(String),
    Invalid(String, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(name) => {
                write!(f, "{} environment variable must be set", name)
            }
            ConfigError::Invalid(name, value) => {
                write!(f, "{} has an invalid value: {}", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq)]
pub struct LichessConfig {
    pub base_url: String,
    pub white_token: String,
    pub black_token: String,
    pub black_username: String,
}

/// Thresholds for the chat notification throttle.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationPolicy {
    pub channel: String,
    /// Notify when the game has been quiet for longer than this.
    pub throttle: Duration,
    /// Notify on every n-th move regardless of timing.
    pub every_n_moves: u32,
}

impl Default for NotificationPolicy {
    fn default() -> Self {
        NotificationPolicy {
            channel: "#chess".to_string(),
            throttle: Duration::from_millis(300_000),
            every_n_moves: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub games_table: String,
    pub moves_table: String,
    pub move_queue_table: String,
    /// Minimum time between two moves by the same identity.
    pub move_timeout: Duration,
    pub processing_timeout: Duration,
    pub notification: NotificationPolicy,
    pub lichess: LichessConfig,
    pub slack_webhook_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&std::env::vars().collect())
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let required = |name: &str| {
            vars.get(name)
                .filter(|value| !value.trim().is_empty())
                .cloned()
                .ok_or_else(|| ConfigError::Missing(name.to_string()))
        };
        let optional = |name: &str, default: &str| {
            vars.get(name)
                .filter(|value| !value.trim().is_empty())
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };
        let millis = |name: &str, default: u64| match vars.get(name) {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::Invalid(name.to_string(), value.clone())),
            None => Ok(Duration::from_millis(default)),
        };

        let every_n_moves = match vars.get("NOTIFY_EVERY_N_MOVES") {
            Some(value) => value
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    ConfigError::Invalid("NOTIFY_EVERY_N_MOVES".to_string(), value.clone())
                })?,
            None => 10,
        };

        Ok(Config {
            games_table: required("GAMES_TABLE")?,
            moves_table: required("MOVES_TABLE")?,
            move_queue_table: required("MOVE_QUEUE_TABLE")?,
            move_timeout: millis("MOVE_TIMEOUT_MS", 5_000)?,
            processing_timeout: millis("PROCESSING_TIMEOUT_MS", 30_000)?,
            notification: NotificationPolicy {
                channel: optional("NOTIFICATION_CHANNEL", "#chess"),
                throttle: millis("NOTIFY_THROTTLE_MS", 300_000)?,
                every_n_moves,
            },
            lichess: LichessConfig {
                base_url: optional("LICHESS_BASE_URL", "https://lichess.org"),
                white_token: required("LICHESS_WHITE_TOKEN")?,
                black_token: required("LICHESS_BLACK_TOKEN")?,
                black_username: required("LICHESS_BLACK_USERNAME")?,
            },
            slack_webhook_url: required("SLACK_WEBHOOK_URL")?,
        })
    }
}
