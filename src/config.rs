use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SkelError};

// === Configuration ===

#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct SkelConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default tracing filter when neither RUST_LOG nor --log-level is set
    #[serde(default = "default_level")]
    pub level: String,
    /// JSON log lines instead of text
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OutputConfig {
    /// Print the success line after writing an output file
    #[serde(default = "default_announce")]
    pub announce: bool,
}

fn default_announce() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            announce: default_announce(),
        }
    }
}

/// Load the config file the user named. Unlike a discovered config, a named
/// one that cannot be read or parsed is an error, never a silent default.
pub fn load_config(path: &Path) -> Result<SkelConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SkelError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let config: SkelConfig = toml::from_str(&content).map_err(|e| SkelError::Config {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })?;
    tracing::debug!(path = %path.display(), ?config, "loaded config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_sections_missing() {
        let config: SkelConfig = toml::from_str("").unwrap();
        assert_eq!(config.logging.level, "warn");
        assert!(!config.logging.json);
        assert!(config.output.announce);
    }

    #[test]
    fn test_load_config_reads_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("goskel.toml");
        std::fs::write(
            &path,
            "[logging]\nlevel = \"debug\"\njson = true\n\n[output]\nannounce = false\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
        assert!(!config.output.announce);
    }

    #[test]
    fn test_load_config_errors_are_reported() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("absent.toml");
        assert!(matches!(
            load_config(&missing),
            Err(SkelError::Config { .. })
        ));

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "[logging\nlevel = 1\n").unwrap();
        let err = load_config(&broken).unwrap_err();
        assert!(err.to_string().starts_with("invalid config"));
        assert_eq!(err.exit_code(), 1);
    }
}
