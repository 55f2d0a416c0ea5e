use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{HarnessError, Result};
use crate::types::MIN_AGENTS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// `host:port` the game server listens on.
    pub server_address: String,
    pub agent_count: usize,
    pub poll_interval_ms: u64,
    /// Pause after an action so the page can re-render.
    pub settle_ms: u64,
    pub initial_settle_ms: u64,
    pub ready_attempts: u32,
    pub ready_backoff_ms: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            server_address: "127.0.0.1:8080".to_string(),
            agent_count: MIN_AGENTS,
            poll_interval_ms: 500,
            settle_ms: 100,
            initial_settle_ms: 300,
            ready_attempts: 10,
            ready_backoff_ms: 1000,
        }
    }
}

impl HarnessConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_address: std::env::var("E2E_SERVER_ADDR").unwrap_or(defaults.server_address),
            agent_count: env_parse("E2E_AGENT_COUNT").unwrap_or(defaults.agent_count),
            poll_interval_ms: env_parse("E2E_POLL_INTERVAL_MS")
                .unwrap_or(defaults.poll_interval_ms),
            settle_ms: env_parse("E2E_SETTLE_MS").unwrap_or(defaults.settle_ms),
            initial_settle_ms: env_parse("E2E_INITIAL_SETTLE_MS")
                .unwrap_or(defaults.initial_settle_ms),
            ready_attempts: env_parse("E2E_READY_ATTEMPTS").unwrap_or(defaults.ready_attempts),
            ready_backoff_ms: env_parse("E2E_READY_BACKOFF_MS")
                .unwrap_or(defaults.ready_backoff_ms),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| HarnessError::config(format!("read {}: {}", path.display(), e)))?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| HarnessError::config(format!("parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.agent_count < MIN_AGENTS {
            return Err(HarnessError::config(format!(
                "agent_count must be at least {}, got {}",
                MIN_AGENTS, self.agent_count
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(HarnessError::config("poll_interval_ms must be positive"));
        }
        if self.server_address.trim().is_empty() {
            return Err(HarnessError::config("server_address is empty"));
        }
        Ok(())
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.server_address)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn initial_settle(&self) -> Duration {
        Duration::from_millis(self.initial_settle_ms)
    }

    pub fn ready_backoff(&self) -> Duration {
        Duration::from_millis(self.ready_backoff_ms)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}
