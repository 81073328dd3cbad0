//! Configuration file parsing utilities

use std::fs;
use std::path::{Path, PathBuf};

use super::file::DEFAULT_CONFIG_FILE;
use crate::error::{ArchscanError, Result};
use crate::models::config::PartialSettings;

/// Parse a TOML configuration file into PartialSettings
pub fn parse_config_file<P: AsRef<Path>>(path: P) -> Result<PartialSettings> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ArchscanError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path).map_err(|e| ArchscanError::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_config_content(&content, path)
}

/// Parse TOML configuration content into PartialSettings
pub fn parse_config_content<P: AsRef<Path>>(content: &str, path: P) -> Result<PartialSettings> {
    let path = path.as_ref();

    let settings: PartialSettings = toml::from_str(content).map_err(|e| ArchscanError::ConfigParse {
        path: path.to_path_buf(),
        source: e,
    })?;

    validate_partial_settings(&settings, path)?;
    Ok(settings)
}

/// Validate partial settings for obvious errors
pub fn validate_partial_settings<P: AsRef<Path>>(settings: &PartialSettings, path: P) -> Result<()> {
    let path = path.as_ref();
    let invalid = |message: String| {
        Err(ArchscanError::config_error(format!(
            "{} in config file: {}",
            message,
            path.display()
        )))
    };

    if let Some(scan_path) = &settings.scan_path {
        if scan_path.as_os_str().is_empty() {
            return invalid("Invalid empty scan_path".to_string());
        }
    }

    if let Some(patterns) = &settings.exclude_patterns {
        for pattern in patterns {
            if pattern.is_empty() {
                return invalid("Empty exclude pattern".to_string());
            }
            if let Err(e) = glob::Pattern::new(pattern) {
                return invalid(format!("Invalid exclude pattern '{}': {}", pattern, e));
            }
        }
    }

    if let Some(file_glob) = &settings.file_glob {
        if let Err(e) = glob::Pattern::new(file_glob) {
            return invalid(format!("Invalid file_glob '{}': {}", file_glob, e));
        }
    }

    for (key, value) in [
        ("min_confidence", settings.min_confidence),
        ("indicator_only_confidence", settings.indicator_only_confidence),
    ] {
        if let Some(value) = value {
            if !(0.0..=1.0).contains(&value) {
                return invalid(format!("{} must be between 0 and 1, got {}", key, value));
            }
        }
    }

    for (key, value) in [
        ("workers", settings.workers),
        ("max_nodes", settings.max_nodes),
        ("max_edges", settings.max_edges),
        ("max_cycles", settings.max_cycles),
    ] {
        if value == Some(0) {
            return invalid(format!("Invalid {} 0. Must be at least 1", key));
        }
    }

    if settings.max_file_size == Some(0) {
        return invalid("Invalid max_file_size 0. Must be at least 1".to_string());
    }

    if let Some(output_file) = &settings.output_file {
        if output_file.as_os_str().is_empty() {
            return invalid("Invalid empty output_file".to_string());
        }
    }

    Ok(())
}

/// Config file locations in lookup order
pub fn default_config_locations() -> Vec<PathBuf> {
    let mut locations = vec![PathBuf::from(DEFAULT_CONFIG_FILE)];
    if let Some(home_dir) = dirs::home_dir() {
        locations.push(home_dir.join(DEFAULT_CONFIG_FILE));
    }
    if let Some(config_dir) = dirs::config_dir() {
        locations.push(config_dir.join("archscan").join("config.toml"));
    }
    locations
}

/// Load the first existing file among `locations`
pub fn find_config_in(locations: &[PathBuf]) -> Result<Option<PartialSettings>> {
    match locations.iter().find(|path| path.is_file()) {
        Some(path) => parse_config_file(path).map(Some),
        None => Ok(None),
    }
}

/// Find and load configuration from default locations
pub fn find_default_config() -> Result<Option<PartialSettings>> {
    find_config_in(&default_config_locations())
}

/// Create a default configuration file at the specified path
pub fn create_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(ArchscanError::io_error)?;
        }
    }

    let default_config = include_str!("default_config.toml");
    fs::write(path, default_config).map_err(ArchscanError::io_error)?;

    Ok(())
}
