//! Configuration module for the reply collector.
//!
//! This module contains the collector configuration and its environment
//! variable handling.

use chrono::Duration;
use log::{debug, error, info, warn};
use std::env;
use std::str::FromStr;

/// Configuration for the polling collector.
///
/// Holds the API credential, the search language and the pacing limits of
/// the polling loop.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// App-only Bearer Token for the recent search endpoint
    pub bearer_token: String,
    /// Language filter of the reply search (`en`, `ja`, ...)
    pub lang: String,
    /// How far back in time the first search window starts
    pub search_offset: Duration,
    /// Width of each search window, also the sleep between windows
    pub period: Duration,
    /// Extra sleep after a failed window
    pub error_sleep: Duration,
    /// Maximum number of windows to search
    pub loop_limit: u64,
    /// Maximum number of failed windows before giving up
    pub error_limit: u64,
    /// Maximum wall-clock running time
    pub time_limit: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        CollectorConfig {
            bearer_token: String::new(),
            lang: "en".to_string(),
            search_offset: Duration::days(2),
            period: Duration::minutes(12),
            error_sleep: Duration::minutes(10),
            loop_limit: 100_000,
            error_limit: 100,
            time_limit: Duration::days(365),
        }
    }
}

/// Masks a secret for logging, keeping at most 8 leading and trailing chars.
fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    let prefix: String = chars.iter().take(8).collect();
    if chars.len() > 16 {
        let suffix: String = chars[chars.len() - 8..].iter().collect();
        format!("{}...{}", prefix, suffix)
    } else {
        format!("{}...", prefix)
    }
}

/// Reads an optional numeric environment variable.
fn parse_env<T>(name: &str) -> Result<Option<T>, Box<dyn std::error::Error + Send + Sync>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => {
                debug!("Found {} environment variable: {}", name, raw.trim());
                Ok(Some(value))
            }
            Err(e) => {
                error!("Invalid value for {}: {}", name, e);
                Err(format!("Invalid {} environment variable '{}': {}", name, raw, e).into())
            }
        },
        Err(_) => Ok(None),
    }
}

impl CollectorConfig {
    /// Creates a new `CollectorConfig` by loading settings from environment variables.
    ///
    /// # Required Environment Variables
    ///
    /// - `BEARER_TOKEN`: App-only Bearer Token from the Twitter Developer Portal
    ///
    /// # Optional Environment Variables
    ///
    /// - `SEARCH_LANG`: Language of the replies to collect (default `en`)
    /// - `SEARCH_OFFSET_DAYS`: Age of the first search window in days (default 2)
    /// - `SEARCH_PERIOD_MINUTES`: Window width and sleep in minutes (default 12)
    /// - `ERROR_SLEEP_SECONDS`: Extra sleep after a failed window (default 600)
    /// - `LOOP_LIMIT`: Maximum number of windows (default 100000)
    /// - `ERROR_LIMIT`: Maximum number of failed windows (default 100)
    /// - `TIME_LIMIT_DAYS`: Maximum running time in days (default 365)
    ///
    /// # Returns
    ///
    /// - `Ok(CollectorConfig)`: If the token is present and every set value parses
    /// - `Err(Box<dyn std::error::Error + Send + Sync>)`: Otherwise
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        info!("Loading collector configuration from environment variables");

        let bearer_token = match env::var("BEARER_TOKEN") {
            Ok(token) => {
                if token.trim().is_empty() {
                    error!("Bearer token is empty");
                    return Err("Bearer token cannot be empty".into());
                }
                info!(
                    "Found BEARER_TOKEN environment variable with length: {}",
                    token.len()
                );
                debug!("Bearer token (masked): {}", mask_token(&token));
                if token.len() < 10 {
                    warn!(
                        "Bearer token seems unusually short ({} characters)",
                        token.len()
                    );
                }
                token
            }
            Err(e) => {
                error!("Failed to load BEARER_TOKEN from environment: {}", e);
                return Err(format!("Missing BEARER_TOKEN environment variable: {}", e).into());
            }
        };

        let defaults = CollectorConfig::default();
        let lang = match env::var("SEARCH_LANG") {
            Ok(lang) if !lang.trim().is_empty() => lang.trim().to_string(),
            _ => defaults.lang.clone(),
        };

        let config = CollectorConfig {
            bearer_token,
            lang,
            search_offset: parse_env::<i64>("SEARCH_OFFSET_DAYS")?
                .map(Duration::days)
                .unwrap_or(defaults.search_offset),
            period: parse_env::<i64>("SEARCH_PERIOD_MINUTES")?
                .map(Duration::minutes)
                .unwrap_or(defaults.period),
            error_sleep: parse_env::<i64>("ERROR_SLEEP_SECONDS")?
                .map(Duration::seconds)
                .unwrap_or(defaults.error_sleep),
            loop_limit: parse_env("LOOP_LIMIT")?.unwrap_or(defaults.loop_limit),
            error_limit: parse_env("ERROR_LIMIT")?.unwrap_or(defaults.error_limit),
            time_limit: parse_env::<i64>("TIME_LIMIT_DAYS")?
                .map(Duration::days)
                .unwrap_or(defaults.time_limit),
        };

        if config.period <= Duration::zero() {
            return Err("SEARCH_PERIOD_MINUTES must be positive".into());
        }

        info!(
            "offset: {} days, period: {} minutes, loop limit: {}, error limit: {}, time limit: {} days, lang: {}",
            config.search_offset.num_days(),
            config.period.num_minutes(),
            config.loop_limit,
            config.error_limit,
            config.time_limit.num_days(),
            config.lang
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Serializes tests that manipulate the process environment
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "BEARER_TOKEN",
        "SEARCH_LANG",
        "SEARCH_OFFSET_DAYS",
        "SEARCH_PERIOD_MINUTES",
        "ERROR_SLEEP_SECONDS",
        "LOOP_LIMIT",
        "ERROR_LIMIT",
        "TIME_LIMIT_DAYS",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_from_env_requires_bearer_token() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        assert!(CollectorConfig::from_env().is_err());

        env::set_var("BEARER_TOKEN", "  ");
        assert!(CollectorConfig::from_env().is_err());
        clear_env();
    }

    #[test]
    fn test_from_env_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("BEARER_TOKEN", "AAAAAAAAAAAAAAAAAAAAAbcdef");

        let config = CollectorConfig::from_env().unwrap();
        assert_eq!(config.lang, "en");
        assert_eq!(config.search_offset, Duration::days(2));
        assert_eq!(config.period, Duration::minutes(12));
        assert_eq!(config.error_sleep, Duration::seconds(600));
        assert_eq!(config.loop_limit, 100_000);
        assert_eq!(config.error_limit, 100);
        assert_eq!(config.time_limit, Duration::days(365));
        clear_env();
    }

    #[test]
    fn test_from_env_overrides_and_rejects_garbage() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("BEARER_TOKEN", "AAAAAAAAAAAAAAAAAAAAAbcdef");
        env::set_var("SEARCH_LANG", "ja");
        env::set_var("SEARCH_PERIOD_MINUTES", "30");
        env::set_var("LOOP_LIMIT", "5");

        let config = CollectorConfig::from_env().unwrap();
        assert_eq!(config.lang, "ja");
        assert_eq!(config.period, Duration::minutes(30));
        assert_eq!(config.loop_limit, 5);

        env::set_var("ERROR_LIMIT", "many");
        assert!(CollectorConfig::from_env().is_err());
        clear_env();
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("short"), "short...");
        assert_eq!(mask_token("0123456789abcdefXYZ"), "01234567...bcdefXYZ");
    }
}
