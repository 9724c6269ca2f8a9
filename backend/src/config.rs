//! Process configuration: data directory, listener and analysis endpoint.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::domain::rate_limiter::{DEFAULT_DAILY_LIMIT, DEFAULT_HOURLY_LIMIT};
use crate::storage::csv::CsvConnection;

pub const CONFIG_PATH_VAR: &str = "BABYTRACK_CONFIG";
pub const DATA_DIR_VAR: &str = "BABYTRACK_DATA_DIR";
pub const PORT_VAR: &str = "BABYTRACK_PORT";
pub const ANALYSIS_ENDPOINT_VAR: &str = "BABYTRACK_ANALYSIS_ENDPOINT";

const CONFIG_FILE_NAME: &str = "config.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// `None` means ~/Documents/Baby Tracker (or its redirect target)
    pub data_dir: Option<PathBuf>,
    pub bind_address: String,
    pub port: u16,
    pub analysis_endpoint: String,
    pub api_keys: Vec<String>,
    pub device_id: Option<String>,
    pub hourly_limit: u32,
    pub daily_limit: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            bind_address: "127.0.0.1".to_string(),
            port: 3000,
            analysis_endpoint: "https://api.deepseek.com/v1/analyze".to_string(),
            api_keys: Vec::new(),
            device_id: None,
            hourly_limit: DEFAULT_HOURLY_LIMIT,
            daily_limit: DEFAULT_DAILY_LIMIT,
        }
    }
}

impl AppConfig {
    pub fn load_config(config_path: &Path) -> Result<Self> {
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
        let config: AppConfig =
            serde_yaml::from_str(&content).with_context(|| "Failed to parse config YAML")?;

        if config.hourly_limit == 0 || config.daily_limit == 0 {
            return Err(anyhow::anyhow!("Rate limits must be positive"));
        }
        Ok(config)
    }

    pub fn load_config_or_default(config_path: &Path) -> Self {
        match Self::load_config(config_path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to load config from {:?}: {}", config_path, e);
                info!("Using default configuration");
                Self::default()
            }
        }
    }

    /// `BABYTRACK_CONFIG` if set, else `config.yaml` in the data directory
    /// if present, else defaults; then environment overrides
    pub fn from_env() -> Self {
        Self::resolve(|name| std::env::var(name).ok())
    }

    fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = match lookup(CONFIG_PATH_VAR) {
            Some(path) => Self::load_config_or_default(Path::new(&path)),
            None => {
                let data_dir = lookup(DATA_DIR_VAR)
                    .map(PathBuf::from)
                    .or_else(|| CsvConnection::default_data_directory().ok());
                match data_dir.map(|dir| dir.join(CONFIG_FILE_NAME)) {
                    Some(path) if path.exists() => Self::load_config_or_default(&path),
                    _ => Self::default(),
                }
            }
        };
        config.apply_overrides(lookup);
        config
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(DATA_DIR_VAR) {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(port) = lookup(PORT_VAR) {
            match port.parse() {
                Ok(port) => self.port = port,
                Err(_) => warn!("Ignoring invalid {}: {}", PORT_VAR, port),
            }
        }
        if let Some(endpoint) = lookup(ANALYSIS_ENDPOINT_VAR) {
            self.analysis_endpoint = endpoint;
        }
    }

    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Configured data directory, else the default one
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(CsvConnection::follow_redirect(dir.clone())),
            None => CsvConnection::default_data_directory(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup(vars: HashMap<&'static str, String>) -> impl Fn(&str) -> Option<String> {
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_load_partial_yaml_fills_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "port: 8080\napi_keys: [a, b]\n").unwrap();

        let config = AppConfig::load_config(&path).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.api_keys, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(config.hourly_limit, 10);
        assert_eq!(config.daily_limit, 30);
    }

    #[test]
    fn test_invalid_config_falls_back_to_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "hourly_limit: 0\n").unwrap();

        assert!(AppConfig::load_config(&path).is_err());
        assert_eq!(AppConfig::load_config_or_default(&path), AppConfig::default());
    }

    #[test]
    fn test_data_dir_config_and_env_overrides() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("config.yaml"), "port: 4000\nbind_address: 0.0.0.0\n").unwrap();

        let vars = HashMap::from([
            (DATA_DIR_VAR, temp.path().display().to_string()),
            (ANALYSIS_ENDPOINT_VAR, "http://localhost:9999/analyze".to_string()),
        ]);
        let config = AppConfig::resolve(lookup(vars));
        assert_eq!(config.port, 4000);
        assert_eq!(config.socket_address(), "0.0.0.0:4000");
        assert_eq!(config.analysis_endpoint, "http://localhost:9999/analyze");
        assert_eq!(config.data_dir.as_deref(), Some(temp.path()));

        let vars = HashMap::from([
            (DATA_DIR_VAR, temp.path().display().to_string()),
            (PORT_VAR, "not-a-port".to_string()),
        ]);
        assert_eq!(AppConfig::resolve(lookup(vars)).port, 4000);
    }
}
