use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::stats::{DEFAULT_WINDOW, PARTICULATE_WINDOW};
use crate::data::timestamp::EpochPolicy;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "SENSOR_PANDA_CONFIG";
/// Config file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "sensor-panda.json";

// ---------------------------------------------------------------------------
// Viewer configuration
// ---------------------------------------------------------------------------

/// Startup settings. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Sources loaded at startup when none are given on the command line.
    pub default_sources: Vec<String>,
    pub default_window: usize,
    pub particulate_window: usize,
    pub http_timeout_secs: u64,
    /// Read epochs between 1e9 and 1e12 as seconds rather than milliseconds.
    pub infer_second_epoch: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            default_sources: Vec::new(),
            default_window: DEFAULT_WINDOW,
            particulate_window: PARTICULATE_WINDOW,
            http_timeout_secs: 15,
            infer_second_epoch: false,
        }
    }
}

impl ViewerConfig {
    /// Load from `$SENSOR_PANDA_CONFIG`, else `./sensor-panda.json`, else
    /// defaults.
    pub fn load() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::from_file(Path::new(&path));
        }
        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Self::from_file(&local);
        }
        Ok(Self::default())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: ViewerConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn epoch_policy(&self) -> EpochPolicy {
        if self.infer_second_epoch {
            EpochPolicy::InferSeconds
        } else {
            EpochPolicy::Compat
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"default_sources": ["a.json"], "infer_second_epoch": true}}"#).unwrap();

        let config = ViewerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.default_sources, vec!["a.json".to_string()]);
        assert_eq!(config.default_window, DEFAULT_WINDOW);
        assert_eq!(config.particulate_window, PARTICULATE_WINDOW);
        assert_eq!(config.epoch_policy(), EpochPolicy::InferSeconds);
    }

    #[test]
    fn invalid_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ nope").unwrap();
        assert!(ViewerConfig::from_file(file.path()).is_err());
    }
}
