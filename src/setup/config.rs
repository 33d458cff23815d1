/* src/setup/config.rs */

use crate::monitor::connection::DEFAULT_WRITE_TIMEOUT;
use crate::monitor::event_log::DEFAULT_LOG_CAPACITY;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SetupConfig {
    pub log_level: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    pub listen: String,
    pub port: u16,
    pub write_timeout_secs: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TarpitConfig {
    pub line_interval_ms: u64,
    pub max_line_len: usize,
    pub max_session_secs: Option<u64>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    pub tick_ms: u64,
    pub log_capacity: usize,
    pub show_debug: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub setup: SetupConfig,
    pub network: NetworkConfig,
    pub tarpit: TarpitConfig,
    pub dashboard: DashboardConfig,
}

impl Default for SetupConfig {
    fn default() -> Self {
        SetupConfig {
            log_level: "info".to_string(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            listen: "0.0.0.0".to_string(),
            port: 2222,
            write_timeout_secs: DEFAULT_WRITE_TIMEOUT.as_secs(),
        }
    }
}

impl Default for TarpitConfig {
    fn default() -> Self {
        TarpitConfig {
            line_interval_ms: 1000,
            max_line_len: 32,
            max_session_secs: None,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            tick_ms: 500,
            log_capacity: DEFAULT_LOG_CAPACITY,
            show_debug: false,
        }
    }
}

impl NetworkConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.listen, self.port)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
