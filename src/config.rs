//! Shell configuration parsed from environment variables.
//!
//! DESIGN
//! ======
//! Every constant the shell relies on (URLs, countdown length, timer periods,
//! storage key, manual chord) is configuration with a typed default. Numeric
//! values fall back to their default when absent or unparseable, and the
//! repeating timer periods (tick, poll) also when zero. URLs and the key chord
//! are validated and fail loudly at startup.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::message::KeyChord;
use crate::signin::HomePattern;

pub const DEFAULT_SIGNIN_URL: &str = "https://kagi.com/signin";
pub const DEFAULT_TARGET_URL: &str = "https://kagi.com/assistant";
pub const DEFAULT_PUBLIC_PREFIXES: &str = "/search";
pub const DEFAULT_AUTH_KEY: &str = "kagiLoggedIn";
pub const DEFAULT_MANUAL_CHORD: &str = "Ctrl+Shift+A";
pub const DEFAULT_COUNTDOWN_SECS: u32 = 5;
pub const DEFAULT_TICK_MS: u64 = 1000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_LOADING_TIMEOUT_MS: u64 = 2500;
pub const DEFAULT_BRIDGE_DELAY_MS: u64 = 1000;

const STORE_DIR: &str = "assistant-shell";
const STORE_FILE: &str = "state.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is not a valid URL: {source}")]
    InvalidUrl {
        var: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("{var} has no host")]
    MissingHost { var: &'static str },
    #[error("{var} is not a valid key chord: {raw}")]
    InvalidChord { var: &'static str, raw: String },
}

/// Timer periods for the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Countdown length in ticks.
    pub countdown_secs: u32,
    /// Period of one countdown tick.
    pub tick: Duration,
    /// Fallback location polling period.
    pub poll_interval: Duration,
    /// Upper bound on how long the loading overlay stays visible.
    pub loading_timeout: Duration,
    /// Delay before the bridge installs its hooks into a freshly loaded page.
    pub bridge_delay: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            tick: Duration::from_millis(DEFAULT_TICK_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            loading_timeout: Duration::from_millis(DEFAULT_LOADING_TIMEOUT_MS),
            bridge_delay: Duration::from_millis(DEFAULT_BRIDGE_DELAY_MS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Initial embedded content.
    pub signin_url: Url,
    /// Redirect destination.
    pub target_url: Url,
    pub home: HomePattern,
    pub auth_key: String,
    pub store_path: PathBuf,
    pub manual_chord: KeyChord,
    pub timings: Timings,
}

impl ShellConfig {
    /// Build typed shell config from environment variables.
    ///
    /// Optional:
    /// - `SHELL_SIGNIN_URL`, `SHELL_TARGET_URL`
    /// - `SHELL_HOME_HOST`: defaults to the target URL's host
    /// - `SHELL_PUBLIC_PREFIXES`: comma separated, default `/search`
    /// - `SHELL_AUTH_KEY`: default `kagiLoggedIn`
    /// - `SHELL_STORE_PATH`: default `<data dir>/assistant-shell/state.json`
    /// - `SHELL_MANUAL_CHORD`: default `Ctrl+Shift+A`
    /// - `SHELL_COUNTDOWN_SECS`, `SHELL_TICK_MS`, `SHELL_POLL_INTERVAL_MS`,
    ///   `SHELL_LOADING_TIMEOUT_MS`, `SHELL_BRIDGE_DELAY_MS`
    ///
    /// # Errors
    ///
    /// Returns an error if a URL or the key chord does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let signin_url = parse_url("SHELL_SIGNIN_URL", DEFAULT_SIGNIN_URL)?;
        let target_url = parse_url("SHELL_TARGET_URL", DEFAULT_TARGET_URL)?;

        let home_host = match std::env::var("SHELL_HOME_HOST") {
            Ok(host) => host,
            Err(_) => target_url
                .host_str()
                .ok_or(ConfigError::MissingHost { var: "SHELL_TARGET_URL" })?
                .to_string(),
        };
        let prefixes = std::env::var("SHELL_PUBLIC_PREFIXES").unwrap_or_else(|_| DEFAULT_PUBLIC_PREFIXES.to_string());
        let home = HomePattern::new(home_host, split_prefixes(&prefixes));

        let raw_chord = std::env::var("SHELL_MANUAL_CHORD").unwrap_or_else(|_| DEFAULT_MANUAL_CHORD.to_string());
        let manual_chord = raw_chord
            .parse::<KeyChord>()
            .map_err(|_| ConfigError::InvalidChord { var: "SHELL_MANUAL_CHORD", raw: raw_chord.clone() })?;

        let store_path = std::env::var("SHELL_STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_store_path());

        let timings = Timings {
            countdown_secs: env_parse("SHELL_COUNTDOWN_SECS", DEFAULT_COUNTDOWN_SECS),
            tick: env_period("SHELL_TICK_MS", DEFAULT_TICK_MS),
            poll_interval: env_period("SHELL_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS),
            loading_timeout: Duration::from_millis(env_parse("SHELL_LOADING_TIMEOUT_MS", DEFAULT_LOADING_TIMEOUT_MS)),
            bridge_delay: Duration::from_millis(env_parse("SHELL_BRIDGE_DELAY_MS", DEFAULT_BRIDGE_DELAY_MS)),
        };

        Ok(Self {
            signin_url,
            target_url,
            home,
            auth_key: std::env::var("SHELL_AUTH_KEY").unwrap_or_else(|_| DEFAULT_AUTH_KEY.to_string()),
            store_path,
            manual_chord,
            timings,
        })
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Repeating timer period in milliseconds. Zero falls back to `default_ms`.
fn env_period(key: &str, default_ms: u64) -> Duration {
    match env_parse(key, default_ms) {
        0 => Duration::from_millis(default_ms),
        ms => Duration::from_millis(ms),
    }
}

fn parse_url(var: &'static str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl { var, source })
}

fn split_prefixes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| if p.starts_with('/') { p.to_string() } else { format!("/{p}") })
        .collect()
}

fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(STORE_DIR)
        .join(STORE_FILE)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
