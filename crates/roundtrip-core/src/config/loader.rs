//! Configuration file discovery and loading

use super::roundtrip_config::RoundtripConfig;
use crate::{Result, RoundtripError};
use std::path::{Path, PathBuf};

/// Config file names, in discovery priority order
pub const CONFIG_FILE_NAMES: &[&str] = &[
    ".roundtriprc.json",
    ".roundtriprc.toml",
    "roundtrip.yaml",
    "roundtrip.yml",
    "roundtrip.json",
];

/// Configuration loader for discovering and loading config files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Auto-discover a config file by traversing upward from `start_path`
    ///
    /// Each directory is checked for the names in [`CONFIG_FILE_NAMES`] until a
    /// file is found or the filesystem root is reached.
    pub fn auto_discover(start_path: &Path) -> Result<Option<PathBuf>> {
        let mut current = start_path
            .canonicalize()
            .map_err(|e| RoundtripError::config_error(format!("Invalid path: {e}")))?;

        loop {
            for filename in CONFIG_FILE_NAMES {
                let config_path = current.join(filename);
                if config_path.is_file() {
                    tracing::debug!("Found config: {}", config_path.display());
                    return Ok(Some(config_path));
                }
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok(None),
            }
        }
    }

    /// Load configuration from a specific file
    ///
    /// The format follows the extension: `.json`, `.toml`, `.yaml` or `.yml`.
    /// Relative paths in the file are taken relative to the file's directory.
    pub fn load_from_file(path: &Path) -> Result<RoundtripConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RoundtripError::config_error(format!(
                "Failed to read config '{}': {}",
                path.display(),
                e
            ))
        })?;

        let parse_error = |e: &dyn std::fmt::Display| {
            RoundtripError::config_error(format!(
                "Failed to load config from '{}': {}",
                path.display(),
                e
            ))
        };

        let mut config: RoundtripConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content).map_err(|e| parse_error(&e))?,
            Some("toml") => toml::from_str(&content).map_err(|e| parse_error(&e))?,
            Some("yaml") | Some("yml") => {
                serde_yaml::from_str(&content).map_err(|e| parse_error(&e))?
            }
            _ => {
                return Err(RoundtripError::config_error(format!(
                    "Unsupported config file '{}' (expected .json, .toml, .yaml, or .yml)",
                    path.display()
                )));
            }
        };

        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        Ok(config)
    }

    /// Load config from an explicit path or auto-discover one
    ///
    /// An explicit path must exist. Without one, discovery starts at
    /// `start_dir` (or the current directory) and falls back to defaults when
    /// no file is found.
    pub fn load(custom_path: Option<&Path>, start_dir: Option<&Path>) -> Result<RoundtripConfig> {
        if let Some(path) = custom_path {
            if !path.exists() {
                return Err(RoundtripError::config_error(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Self::load_from_file(path);
        }

        let search_dir = start_dir.unwrap_or_else(|| Path::new("."));
        match Self::auto_discover(search_dir)? {
            Some(path) => Self::load_from_file(&path),
            None => {
                tracing::debug!("No config file found; using defaults");
                Ok(RoundtripConfig::default())
            }
        }
    }
}
