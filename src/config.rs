//! Configuration types for the PhotoPass downloader

use crate::time::DEFAULT_TIMEZONE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default attribution written to Make/Model/Software
pub const DEFAULT_ATTRIBUTION: &str = "Disney Photo Pass";

/// Settings for the `copy-exif` command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagateConfig {
    /// Directory holding the tagged downloads
    pub source_dir: PathBuf,

    /// Directory whose same-named images receive the metadata
    pub target_dir: PathBuf,
}

impl Default for PropagateConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("downloaded_photos"),
            target_dir: PathBuf::from("cleaned"),
        }
    }
}

/// Configuration for the downloader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON manifest exported from the PhotoPass service
    pub manifest: PathBuf,

    /// Directory receiving downloaded files
    pub output_dir: PathBuf,

    /// JSON table of park code to latitude/longitude
    pub park_coordinates: PathBuf,

    /// IANA timezone the parks operate in
    pub timezone: String,

    /// Value written to Make, Model and Software
    pub attribution: String,

    /// Whole-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Verbose output
    pub verbose: bool,

    pub propagate: PropagateConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            manifest: PathBuf::from("photos.json"),
            output_dir: PathBuf::from("downloaded_photos"),
            park_coordinates: PathBuf::from("park_coordinates.json"),
            timezone: DEFAULT_TIMEZONE.to_string(),
            attribution: DEFAULT_ATTRIBUTION.to_string(),
            request_timeout_secs: 30,
            verbose: false,
            propagate: PropagateConfig::default(),
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            source: e,
        })?;

        fs::write(path, content).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    /// Write the commented sample configuration to `path`
    pub fn write_sample<P: AsRef<Path>>(path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }
        fs::write(path, Self::sample_config()).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Generate a sample configuration file content
    pub fn sample_config() -> String {
        r#"# PhotoPass Fetch Configuration File
# This file uses TOML format (https://toml.io)

# Manifest exported from the PhotoPass media listing
manifest = "photos.json"

# Where downloaded photos are written
output_dir = "downloaded_photos"

# Park code -> coordinates table, e.g. { "MK": { "lat": 28.4177, "lon": -81.5812 } }
# A missing or invalid table disables GPS tagging
park_coordinates = "park_coordinates.json"

# IANA timezone used for the local EXIF timestamps
timezone = "America/New_York"

# Written to the Make, Model and Software tags
attribution = "Disney Photo Pass"

# Whole-request timeout for each download, in seconds
request_timeout_secs = 30

# Verbose output - debug logging and per-photo results
verbose = false

# Settings for `copy-exif`
[propagate]
# Tagged originals
source_dir = "downloaded_photos"
# Edited copies with the same filenames
target_dir = "cleaned"
"#
        .to_string()
    }
}

/// Errors that can occur when loading or saving configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read configuration file
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse configuration file
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// Failed to write configuration file
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to serialize configuration
    SerializeError {
        source: toml::ser::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError { path, source } => {
                write!(f, "Failed to read config file '{}': {}", path.display(), source)
            }
            ConfigError::ParseError { path, source } => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), source)
            }
            ConfigError::WriteError { path, source } => {
                write!(f, "Failed to write config file '{}': {}", path.display(), source)
            }
            ConfigError::SerializeError { source } => {
                write!(f, "Failed to serialize config: {}", source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
            ConfigError::WriteError { source, .. } => Some(source),
            ConfigError::SerializeError { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.manifest, PathBuf::from("photos.json"));
        assert_eq!(config.output_dir, PathBuf::from("downloaded_photos"));
        assert_eq!(config.timezone, "America/New_York");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.propagate.target_dir, PathBuf::from("cleaned"));
    }

    #[test]
    fn test_sample_config_parses_to_defaults() {
        let parsed: Config = toml::from_str(&Config::sample_config()).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let parsed: Config = toml::from_str("timezone = \"Asia/Tokyo\"\n").unwrap();
        assert_eq!(parsed.timezone, "Asia/Tokyo");
        assert_eq!(parsed.attribution, DEFAULT_ATTRIBUTION);
        assert_eq!(parsed.propagate, PropagateConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Config").join("park.toml");

        let config = Config {
            output_dir: PathBuf::from("out"),
            request_timeout_secs: 5,
            ..Config::default()
        };
        config.save_to_file(&path).unwrap();

        assert_eq!(Config::load_from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_write_sample() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sample.toml");
        Config::write_sample(&path).unwrap();
        assert_eq!(Config::load_from_file(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_load_errors() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            Config::load_from_file(&missing),
            Err(ConfigError::ReadError { .. })
        ));

        let bad = dir.path().join("bad.toml");
        fs::write(&bad, "timezone = [").unwrap();
        let err = Config::load_from_file(&bad).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }
}
