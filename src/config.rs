//! Configuration file handling for pixelate.
//!
//! Loads configuration from `~/.config/pixelate/config.toml` or a custom path.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::session::DEFAULT_XRAY_RADIUS;

/// Configuration file structure for pixelate.
/// Loaded from ~/.config/pixelate/config.toml (or custom path via --config).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub xray: XrayConfig,
}

/// Render defaults applied after an image loads. Unset fields keep the
/// session's built-in defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RenderConfig {
    #[serde(default)]
    pub block_size: Option<u32>,
    #[serde(default)]
    pub padding: Option<u32>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub jitter: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XrayConfig {
    #[serde(default = "default_xray_radius")]
    pub radius: f64,
}

impl Default for XrayConfig {
    fn default() -> Self {
        Self {
            radius: default_xray_radius(),
        }
    }
}

fn default_xray_radius() -> f64 {
    DEFAULT_XRAY_RADIUS
}

/// Contents written by `pixelate config init`.
pub const DEFAULT_CONFIG_TOML: &str = r#"# pixelate configuration

[render]
# Block edge length in source pixels (>= 1)
block_size = 4
# Gap between cells in pixels
padding = 0
# Style: circle, square, scatter
style = "circle"
# Randomly grow each cell
jitter = true

[xray]
# Radius of the reveal disc in pixels
radius = 75.0
"#;

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
                path: path.clone(),
                source: e,
            })?;
            let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.clone(),
                source: e,
            })?;
            log::debug!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            log::debug!("No config at {}, using defaults", path.display());
            Ok(Config::default())
        }
    }

    /// Load a config that must exist (explicit `--config`).
    pub fn load_from_explicit(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::IoError {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
            });
        }
        Self::load(Some(path))
    }

    /// Render as TOML for `config show`.
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError { path, source } => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
        }
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("pixelate").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/pixelate/config.toml")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = Config::load(Some(Path::new("/nonexistent/pixelate.toml"))).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.xray.radius, DEFAULT_XRAY_RADIUS);
    }

    #[test]
    fn test_default_toml_parses() {
        let config: Config = toml::from_str(DEFAULT_CONFIG_TOML).unwrap();
        assert_eq!(config.render.block_size, Some(4));
        assert_eq!(config.render.style.as_deref(), Some("circle"));
        assert_eq!(config.render.jitter, Some(true));
        assert_eq!(config.xray.radius, 75.0);
    }

    #[test]
    fn test_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[render]\npadding = 2").unwrap();
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.render.padding, Some(2));
        assert_eq!(config.render.block_size, None);
        assert_eq!(config.xray, XrayConfig::default());
    }

    #[test]
    fn test_invalid_file_is_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[render]\nblock_size = \"big\"").unwrap();
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_explicit_missing_is_error() {
        let err = Config::load_from_explicit(Path::new("/nonexistent/pixelate.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError { .. }));
    }
}
