use crate::types::{DEFAULT_DETECTION_ENDPOINT, DEFAULT_DETECTION_TIMEOUT_MS};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};

pub fn config_path() -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config.json")
}

pub fn env_default(key: &str) -> Option<String> {
  env::var(key)
    .ok()
    .map(|value| value.trim().to_string())
    .filter(|value| !value.is_empty())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("read config {path}: {source}")]
  Read {
    path: String,
    source: std::io::Error,
  },
  #[error("parse config {path}: {source}")]
  Parse {
    path: String,
    source: serde_json::Error,
  },
  #[error("encode config: {0}")]
  Encode(serde_json::Error),
  #[error("write config {path}: {source}")]
  Write {
    path: String,
    source: std::io::Error,
  },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
  pub detection_endpoint: String,
  pub detection_timeout_ms: u64,
  pub shuffle_seed: Option<u64>,
}

impl Default for AppConfig {
  fn default() -> Self {
    AppConfig {
      detection_endpoint: DEFAULT_DETECTION_ENDPOINT.to_string(),
      detection_timeout_ms: DEFAULT_DETECTION_TIMEOUT_MS,
      shuffle_seed: None,
    }
  }
}

/// Environment overrides win over whatever the config file says, matching
/// how the app resolves the detection endpoint at startup.
pub fn apply_env_defaults(mut config: AppConfig) -> AppConfig {
  if let Some(value) = env_default("DART_DETECTION_URL") {
    config.detection_endpoint = value;
  }
  if let Some(value) = env_default("DART_DETECTION_TIMEOUT_MS") {
    if let Ok(parsed) = value.parse() {
      config.detection_timeout_ms = parsed;
    }
  }
  if let Some(value) = env_default("TOURNAMENT_SHUFFLE_SEED") {
    if let Ok(parsed) = value.parse() {
      config.shuffle_seed = Some(parsed);
    }
  }
  config
}

pub fn load_config() -> Result<AppConfig, ConfigError> {
  let path = config_path();
  if !path.is_file() {
    return Ok(apply_env_defaults(AppConfig::default()));
  }
  let data = fs::read_to_string(&path).map_err(|e| ConfigError::Read {
    path: path.display().to_string(),
    source: e,
  })?;
  let config = serde_json::from_str::<AppConfig>(&data).map_err(|e| ConfigError::Parse {
    path: path.display().to_string(),
    source: e,
  })?;
  Ok(apply_env_defaults(config))
}

pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
  let path = config_path();
  let payload = serde_json::to_string_pretty(config).map_err(ConfigError::Encode)?;
  fs::write(&path, payload).map_err(|e| ConfigError::Write {
    path: path.display().to_string(),
    source: e,
  })?;
  Ok(())
}
