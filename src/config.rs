//! TOML configuration parsing and validation.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable holding the backend API token.
pub const API_TOKEN_ENV: &str = "SOURCEDOCK_API_TOKEN";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub prefs: PrefsConfig,
    #[serde(default)]
    pub defaults: ScheduleDefaults,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Base URL of the retrieval backend, e.g. `http://localhost:8080`.
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// How long fetched credential/status lists stay fresh in the cache.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_refresh_interval_secs() -> u64 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct PrefsConfig {
    /// Where the expand/collapse state of the status table is persisted.
    #[serde(default = "default_prefs_path")]
    pub path: PathBuf,
}

impl Default for PrefsConfig {
    fn default() -> Self {
        Self {
            path: default_prefs_path(),
        }
    }
}

fn default_prefs_path() -> PathBuf {
    PathBuf::from("./.sourcedock/prefs.json")
}

/// Scheduling defaults applied when an advanced field is left blank.
///
/// An explicit zero is not defaulted; it means "never".
#[derive(Debug, Deserialize, Clone)]
pub struct ScheduleDefaults {
    #[serde(default = "default_refresh_freq_minutes")]
    pub refresh_freq_minutes: u64,
    #[serde(default = "default_prune_freq_days")]
    pub prune_freq_days: u64,
}

impl Default for ScheduleDefaults {
    fn default() -> Self {
        Self {
            refresh_freq_minutes: default_refresh_freq_minutes(),
            prune_freq_days: default_prune_freq_days(),
        }
    }
}

fn default_refresh_freq_minutes() -> u64 {
    30
}
fn default_prune_freq_days() -> u64 {
    30
}

impl Config {
    /// Minimal config for tests and commands that never hit the backend.
    pub fn minimal() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:8080".to_string(),
                timeout_secs: default_timeout_secs(),
                refresh_interval_secs: default_refresh_interval_secs(),
            },
            prefs: PrefsConfig::default(),
            defaults: ScheduleDefaults::default(),
        }
    }

    /// API token from the environment, if set.
    pub fn api_token(&self) -> Option<String> {
        std::env::var(API_TOKEN_ENV).ok()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.api.base_url.trim().is_empty() {
        anyhow::bail!("api.base_url must not be empty");
    }
    if !config.api.base_url.starts_with("http://") && !config.api.base_url.starts_with("https://") {
        anyhow::bail!("api.base_url must start with http:// or https://");
    }
    if config.api.timeout_secs == 0 {
        anyhow::bail!("api.timeout_secs must be > 0");
    }
    if config.api.refresh_interval_secs == 0 {
        anyhow::bail!("api.refresh_interval_secs must be > 0");
    }

    Ok(config)
}

/// Write a commented starter config, refusing to clobber an existing one.
pub fn write_starter_config(path: &Path) -> Result<()> {
    if path.exists() {
        anyhow::bail!("config file already exists: {}", path.display());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let starter = r#"# sourcedock configuration

[api]
# Base URL of the retrieval backend.
base_url = "http://localhost:8080"
timeout_secs = 30
# Credential/status lists fetched more recently than this are served
# from the in-process cache.
refresh_interval_secs = 5

[prefs]
# Expand/collapse state of the status table is persisted here.
path = "./.sourcedock/prefs.json"

[defaults]
# Applied when `dock add` is run without the corresponding flag.
refresh_freq_minutes = 30
prune_freq_days = 30
"#;

    std::fs::write(path, starter)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    Ok(())
}
