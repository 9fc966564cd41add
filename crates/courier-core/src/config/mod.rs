//! Runtime configuration.
//!
//! Resolution order: built-in defaults, then an optional JSON file, then
//! `COURIER_*` environment variables. Front ends apply their own flags last.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{non_blank, parse_endpoint_url};

pub const DEFAULT_DEBOUNCE_MS: u64 = 400;
pub const DEFAULT_REMOTE_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_SIMULATED_LATENCY_MS: u64 = 600;
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 4_000;

pub const ENV_DB_PATH: &str = "COURIER_DB_PATH";
pub const ENV_REMOTE_URL: &str = "COURIER_REMOTE_URL";
pub const ENV_REACHABILITY_URL: &str = "COURIER_REACHABILITY_URL";
pub const ENV_DEBOUNCE_MS: &str = "COURIER_DEBOUNCE_MS";
pub const ENV_REMOTE_TIMEOUT_MS: &str = "COURIER_REMOTE_TIMEOUT_MS";

/// Settings for opening a [`CourierService`](crate::services::CourierService).
///
/// Without `remote_url` operations are delivered to an in-process simulated
/// remote. Without `reachability_url` unknown reachability counts as online.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CourierConfig {
    pub db_path: Option<PathBuf>,
    pub remote_url: Option<String>,
    pub reachability_url: Option<String>,
    pub debounce_ms: u64,
    pub remote_timeout_ms: u64,
    pub simulated_latency_ms: u64,
    pub probe_timeout_ms: u64,
}

impl Default for CourierConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            remote_url: None,
            reachability_url: None,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            remote_timeout_ms: DEFAULT_REMOTE_TIMEOUT_MS,
            simulated_latency_ms: DEFAULT_SIMULATED_LATENCY_MS,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
        }
    }
}

impl CourierConfig {
    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw).map_err(|error| {
            Error::Config(format!("invalid config file {}: {error}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `COURIER_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, which maps variable names to values.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = non_blank(lookup(ENV_DB_PATH)) {
            self.db_path = Some(PathBuf::from(path));
        }
        if let Some(url) = non_blank(lookup(ENV_REMOTE_URL)) {
            self.remote_url = Some(url);
        }
        if let Some(url) = non_blank(lookup(ENV_REACHABILITY_URL)) {
            self.reachability_url = Some(url);
        }
        if let Some(value) = non_blank(lookup(ENV_DEBOUNCE_MS)) {
            self.debounce_ms = parse_millis(ENV_DEBOUNCE_MS, &value)?;
        }
        if let Some(value) = non_blank(lookup(ENV_REMOTE_TIMEOUT_MS)) {
            self.remote_timeout_ms = parse_millis(ENV_REMOTE_TIMEOUT_MS, &value)?;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        for (field, url) in [
            ("remote_url", &self.remote_url),
            ("reachability_url", &self.reachability_url),
        ] {
            if let Some(url) = non_blank(url.clone()) {
                parse_endpoint_url(&url, field)?;
            }
        }

        if self.remote_timeout_ms == 0 {
            return Err(Error::Config(
                "'remote_timeout_ms' must be greater than zero".to_string(),
            ));
        }
        if self.probe_timeout_ms == 0 {
            return Err(Error::Config(
                "'probe_timeout_ms' must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub const fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }

    pub const fn simulated_latency(&self) -> Duration {
        Duration::from_millis(self.simulated_latency_ms)
    }

    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

fn parse_millis(key: &str, value: &str) -> Result<u64> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("{key} must be a number of milliseconds, got '{value}'")))
}
