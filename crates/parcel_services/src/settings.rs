//! Settings management

use parcel_asset::SyntheticParams;
use parcel_core::PartitionConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Runtime settings; every section falls back to its defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub partition: PartitionConfig,
    pub synthetic: SyntheticParams,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directive, overridden by `RUST_LOG`.
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml_str(&text)?;
        tracing::info!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Settings::from_toml_str("").unwrap(), Settings::default());
    }

    #[test]
    fn parses_partial_sections() {
        let text = r#"
            [logging]
            filter = "parcel_core=debug"

            [synthetic]
            seed = 9
            resolution = 0.02
            keep_clear_cells = false

            [[partition.partners]]
            code = "N"
            resources = 3.0
            leaders = ["N1", "N2"]

            [[partition.partners]]
            code = "S"
            resources = 1.0
            leaders = ["S1"]
        "#;
        let settings = Settings::from_toml_str(text).unwrap();
        assert_eq!(settings.logging.filter, "parcel_core=debug");
        assert_eq!(settings.synthetic.seed, 9);
        assert_eq!(settings.synthetic.resolution, 0.02);
        assert!(!settings.synthetic.keep_clear_cells);
        assert_eq!(settings.synthetic.blob_count, 201);
        assert_eq!(settings.partition.partners.len(), 2);
        assert_eq!(settings.partition.shares().unwrap(), vec![0.75, 0.25]);
    }

    #[test]
    fn reports_bad_toml() {
        let err = Settings::from_toml_str("[synthetic]\nseed = \"x\"").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Settings::load(Path::new("/nonexistent/parcel.toml")).unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
    }
}
