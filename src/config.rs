use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const API_URL_ENV: &str = "IDOL_API_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip)]
    pub data_dir: PathBuf,
    pub api_url: String,
    pub streaming: bool,
    pub request_timeout_secs: u64,
    /// Inclusive range for the offline responder's fake latency.
    pub mock_latency_ms: (u64, u64),
    pub idol_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            api_url: "http://localhost:8000".to_string(),
            streaming: true,
            request_timeout_secs: 30,
            mock_latency_ms: (800, 1500),
            idol_name: "Trainee".to_string(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("idol-trainee")
}

impl Config {
    pub fn new(data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);

        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        let config_path = data_dir.join("config.json");
        let mut config = match Self::read(&config_path) {
            Some(config) => config,
            None => {
                let config = Config::default();
                let json = serde_json::to_string_pretty(&config)
                    .context("Failed to serialize default config")?;
                std::fs::write(&config_path, json)
                    .with_context(|| format!("Failed to write {}", config_path.display()))?;
                tracing::info!(path = %config_path.display(), "created default config");
                config
            }
        };

        config.data_dir = data_dir;
        Ok(config.with_api_url_override(std::env::var(API_URL_ENV).ok()))
    }

    /// Missing, empty or unparsable files all yield `None`.
    fn read(path: &Path) -> Option<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read config, recreating");
                return None;
            }
        };

        if text.trim().is_empty() {
            tracing::warn!(path = %path.display(), "config file is empty, recreating");
            return None;
        }

        match serde_json::from_str::<Config>(&text) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to parse config, recreating");
                None
            }
        }
    }

    pub fn with_api_url_override(mut self, api_url: Option<String>) -> Self {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_url = url;
        }
        self
    }

    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join("config.json")
    }

    /// Directory holding the persisted trainee state.
    pub fn state_dir(&self) -> PathBuf {
        self.data_dir.join("state")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn mock_latency(&self) -> std::ops::RangeInclusive<u64> {
        let (lo, hi) = self.mock_latency_ms;
        lo.min(hi)..=lo.max(hi)
    }
}
