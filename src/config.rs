use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::consts::{DEFAULT_REFRESH_THROTTLE, DEFAULT_SESSION_COUNT_POLL, DEFAULT_STATUS_POLL};

const DATA_DIR_ENV: &str = "TIMEFLOW_DATA_DIR";

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Config {
    #[serde(default)]
    pub(crate) data_dir: Option<PathBuf>,
    #[serde(default)]
    pub(crate) timezone: Option<String>,
    #[serde(default)]
    pub(crate) no_color: bool,
    #[serde(default)]
    pub(crate) debug: bool,
    #[serde(default)]
    pub(crate) refresh_throttle_ms: Option<u64>,
    #[serde(default)]
    pub(crate) status_poll_secs: Option<u64>,
    #[serde(default)]
    pub(crate) session_count_poll_secs: Option<u64>,
}

/// What happened while looking for a config file; logged once the subscriber exists
#[derive(Debug, Default)]
pub(crate) struct LoadReport {
    source: Option<PathBuf>,
    problems: Vec<String>,
}

impl LoadReport {
    pub(crate) fn log(&self) {
        for problem in &self.problems {
            warn!(event = "dashboard.config.ignored", reason = %problem);
        }
        if let Some(path) = &self.source {
            debug!(event = "dashboard.config.loaded", path = %path.display());
        }
    }
}

impl Config {
    /// First config file that parses wins
    pub(crate) fn load() -> (Self, LoadReport) {
        let mut report = LoadReport::default();
        for path in Self::get_config_paths() {
            if !path.exists() {
                continue;
            }
            match fs::read_to_string(&path) {
                Ok(content) => match toml::from_str::<Config>(&content) {
                    Ok(config) => {
                        report.source = Some(path);
                        return (config, report);
                    }
                    Err(e) => report
                        .problems
                        .push(format!("Failed to parse {}: {e}", path.display())),
                },
                Err(e) => report
                    .problems
                    .push(format!("Failed to read {}: {e}", path.display())),
            }
        }
        (Self::default(), report)
    }

    fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. XDG config: ~/.config/timeflow/config.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".config").join("timeflow").join("config.toml"));
        }

        // 2. Platform config dir, e.g. ~/Library/Application Support/timeflow/config.toml
        if let Some(config_dir) = dirs::config_dir() {
            let platform_path = config_dir.join("timeflow").join("config.toml");
            if !paths.contains(&platform_path) {
                paths.push(platform_path);
            }
        }

        // 3. Home directory: ~/.timeflow.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".timeflow.toml"));
        }

        paths
    }

    pub(crate) fn refresh_throttle(&self) -> Duration {
        self.refresh_throttle_ms
            .map_or(DEFAULT_REFRESH_THROTTLE, Duration::from_millis)
    }

    pub(crate) fn status_poll(&self) -> Duration {
        self.status_poll_secs
            .filter(|&s| s > 0)
            .map_or(DEFAULT_STATUS_POLL, Duration::from_secs)
    }

    pub(crate) fn session_count_poll(&self) -> Duration {
        self.session_count_poll_secs
            .filter(|&s| s > 0)
            .map_or(DEFAULT_SESSION_COUNT_POLL, Duration::from_secs)
    }
}

/// `--data-dir`, then `TIMEFLOW_DATA_DIR`, then the config file, then the platform data dir
pub(crate) fn resolve_data_dir(cli: Option<&Path>, config: &Config) -> PathBuf {
    if let Some(dir) = cli {
        return dir.to_path_buf();
    }
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    if let Some(dir) = &config.data_dir {
        return dir.clone();
    }
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("timeflow")
}
