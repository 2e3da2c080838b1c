use std::{env, path::PathBuf, str::FromStr, time::Duration};

use crate::dispatch::ExchangeOptions;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const DEFAULT_OUTPUT_DELAY_MS: u64 = 5;
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LINE_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub config_path: PathBuf,
    pub output_delay: Duration,
    pub connection_timeout: Duration,
    pub line_timeout: Duration,
    pub drain_grace: Duration,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            output_delay: Duration::from_millis(DEFAULT_OUTPUT_DELAY_MS),
            connection_timeout: Duration::from_secs(DEFAULT_CONNECTION_TIMEOUT_SECS),
            line_timeout: Duration::from_secs(DEFAULT_LINE_TIMEOUT_SECS),
            drain_grace: Duration::ZERO,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl RelaySettings {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            config_path: env::var("RELAY_CONFIG_PATH")
                .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from),
            output_delay: Duration::from_millis(env_or(
                "RELAY_OUTPUT_DELAY_MS",
                DEFAULT_OUTPUT_DELAY_MS,
            )),
            connection_timeout: Duration::from_secs(env_or(
                "CONNECTION_TIMEOUT",
                DEFAULT_CONNECTION_TIMEOUT_SECS,
            )),
            line_timeout: Duration::from_secs(env_or(
                "RELAY_LINE_TIMEOUT",
                DEFAULT_LINE_TIMEOUT_SECS,
            )),
            drain_grace: Duration::from_millis(env_or("RELAY_DRAIN_GRACE_MS", 0)),
        }
    }

    #[must_use]
    pub fn exchange_options(&self, markers: bool) -> ExchangeOptions {
        ExchangeOptions {
            markers,
            response_timeout: self.connection_timeout,
            drain_grace: self.drain_grace,
        }
    }
}
