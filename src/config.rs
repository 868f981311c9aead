//! Configuration management for airwatch
//!
//! Handles config file loading and receiver address lookup.
//! Config is stored at ~/.config/airwatch/config.toml

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::airplay::session::{
    SessionConfig, DEFAULT_KEEP_ALIVE_INTERVAL, DEFAULT_POLL_INTERVAL,
};

/// Environment variable holding the receiver address
pub const RECEIVER_ENV: &str = "APPLE_TV_IP";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    /// Receiver address used when neither flag nor env var is set
    pub default_receiver: Option<String>,
    /// Delay between position polls in milliseconds
    pub poll_interval_ms: Option<u64>,
    /// Delay between keep-alive probes in seconds
    pub keep_alive_secs: Option<u64>,
}

impl Config {
    /// Get config file path (~/.config/airwatch/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("airwatch").join("config.toml"))
    }

    /// Load config from the default path, or return default if not found
    pub fn load() -> Self {
        Self::path()
            .map(|p| Self::load_from(&p))
            .unwrap_or_default()
    }

    /// Load config from `path`; unreadable or invalid files give the default
    pub fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Get receiver address with fallback chain:
    /// 1. `--apple-tv` flag
    /// 2. Environment variable APPLE_TV_IP
    /// 3. default_receiver from config file
    pub fn receiver_address(&self, flag: Option<&str>) -> Option<String> {
        let env = std::env::var(RECEIVER_ENV).ok();
        self.resolve_receiver(flag, env.as_deref())
    }

    fn resolve_receiver(&self, flag: Option<&str>, env: Option<&str>) -> Option<String> {
        [flag, env, self.default_receiver.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(String::from)
    }

    /// Session timing, with defaults for anything unset or zero
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            poll_interval: self
                .poll_interval_ms
                .filter(|&ms| ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_POLL_INTERVAL),
            keep_alive_interval: self
                .keep_alive_secs
                .filter(|&s| s > 0)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_KEEP_ALIVE_INTERVAL),
        }
    }
}
