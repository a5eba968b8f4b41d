//! Environment-driven service configuration

use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use types::Symbol;

/// How a freshly created book is aligned with the venue feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapMode {
    /// Accept the first live diff unconditionally and track from there.
    Stream,
    /// Buffer diffs, fetch a REST snapshot, then drain the buffer through
    /// the continuity check (the venue-documented flow).
    Snapshot,
}

impl FromStr for BootstrapMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stream" => Ok(BootstrapMode::Stream),
            "snapshot" => Ok(BootstrapMode::Snapshot),
            other => Err(format!("invalid bootstrap mode: {other}")),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("TRADING_PAIRS must name at least one symbol")]
    NoTradingPairs,
}

/// Service configuration.
///
/// Everything is overridable from the environment; defaults target the
/// venue's production endpoints.
#[derive(Debug, Clone)]
pub struct Config {
    /// `BINANCE_WS_URL`
    pub ws_url: String,
    /// `BINANCE_REST_URL`
    pub rest_url: String,
    /// `TRADING_PAIRS`, comma-separated, normalized to lowercase
    pub trading_pairs: Vec<Symbol>,
    /// `PORT`
    pub port: u16,
    /// `LOG_LEVEL`
    pub log_level: String,
    /// `ORDERBOOK_DEPTH`, the per-side limit used for REST snapshots
    pub depth_limit: u32,
    /// `BOOTSTRAP_MODE`
    pub bootstrap_mode: BootstrapMode,
    /// Reconnect attempts before giving up
    pub max_reconnect_attempts: u32,
    /// First reconnect delay; doubles per failed attempt
    pub reconnect_base_delay: Duration,
    /// Wait after the socket opens before sending subscriptions
    pub subscribe_delay: Duration,
    /// Pacing between per-symbol book creation at startup
    pub book_init_pacing: Duration,
    /// Sequence gap beyond which a diff is adopted as a resync
    pub resync_gap_threshold: u64,
    /// Bounded outbound queue per push-surface subscriber
    pub subscriber_queue_capacity: usize,
    /// Reconnect if the upstream socket stays silent this long
    pub read_idle_timeout: Duration,
    /// Application-level ping cadence to the venue
    pub upstream_ping_interval: Duration,
}

impl Config {
    /// Load configuration from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let trading_pairs: Vec<Symbol> = var_or("TRADING_PAIRS", "btcusdt,ethusdt")
            .split(',')
            .map(Symbol::new)
            .filter(|s| !s.is_empty())
            .collect();
        if trading_pairs.is_empty() {
            return Err(ConfigError::NoTradingPairs);
        }

        Ok(Self {
            ws_url: var_or("BINANCE_WS_URL", "wss://fstream.binance.com/ws"),
            rest_url: var_or("BINANCE_REST_URL", "https://fapi.binance.com"),
            trading_pairs,
            port: parse_var("PORT", 3000)?,
            log_level: var_or("LOG_LEVEL", "info"),
            depth_limit: parse_var("ORDERBOOK_DEPTH", 1000)?,
            bootstrap_mode: parse_var("BOOTSTRAP_MODE", BootstrapMode::Stream)?,
            max_reconnect_attempts: 10,
            reconnect_base_delay: Duration::from_millis(1000),
            subscribe_delay: Duration::from_millis(2000),
            book_init_pacing: Duration::from_millis(100),
            resync_gap_threshold: 1000,
            subscriber_queue_capacity: 64,
            read_idle_timeout: Duration::from_secs(60),
            upstream_ping_interval: Duration::from_secs(30),
        })
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_env().unwrap();
        assert_eq!(config.rest_url, "https://fapi.binance.com");
        assert_eq!(config.resync_gap_threshold, 1000);
        assert_eq!(config.max_reconnect_attempts, 10);
        assert_eq!(config.bootstrap_mode, BootstrapMode::Stream);
        assert!(!config.trading_pairs.is_empty());
    }

    #[test]
    fn test_bootstrap_mode_parse() {
        assert_eq!(
            "snapshot".parse::<BootstrapMode>().unwrap(),
            BootstrapMode::Snapshot
        );
        assert_eq!(
            "STREAM".parse::<BootstrapMode>().unwrap(),
            BootstrapMode::Stream
        );
        assert!("rest".parse::<BootstrapMode>().is_err());
    }
}
