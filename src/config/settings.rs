//! Validation of fully merged settings

use std::path::Path;

use crate::error::{ArchscanError, Result, ResultExt};
use crate::models::config::Settings;

/// Settings validator for ensuring configuration is valid
pub struct SettingsValidator;

impl SettingsValidator {
    /// Validate settings and return errors if invalid
    pub fn validate(settings: &Settings) -> Result<()> {
        if !settings.scan_path.is_dir() {
            return Err(ArchscanError::InvalidPath {
                path: settings.scan_path.clone(),
            });
        }

        for pattern in &settings.exclude_patterns {
            glob::Pattern::new(pattern).with_context(|| format!("Invalid exclude pattern: {}", pattern))?;
        }
        glob::Pattern::new(&settings.file_glob)
            .with_context(|| format!("Invalid file glob: {}", settings.file_glob))?;

        Self::validate_threshold("min_confidence", settings.min_confidence)?;
        Self::validate_threshold("indicator_only_confidence", settings.indicator_only_confidence)?;

        for (key, value) in [
            ("workers", settings.workers),
            ("max_nodes", settings.max_nodes),
            ("max_edges", settings.max_edges),
            ("max_cycles", settings.max_cycles),
        ] {
            if value == 0 {
                return Err(ArchscanError::config_error(format!("{} must be at least 1", key)));
            }
        }
        if settings.max_file_size == 0 {
            return Err(ArchscanError::config_error("max_file_size must be at least 1"));
        }

        if let Some(path) = &settings.output_file {
            Self::validate_output_path(path)?;
        }

        Ok(())
    }

    fn validate_threshold(key: &str, value: f64) -> Result<()> {
        if value.is_nan() || !(0.0..=1.0).contains(&value) {
            return Err(ArchscanError::config_error(format!(
                "{} must be between 0 and 1, got {}",
                key, value
            )));
        }
        Ok(())
    }

    /// The output file's directory must already exist
    fn validate_output_path(path: &Path) -> Result<()> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
                Err(ArchscanError::InvalidPath {
                    path: parent.to_path_buf(),
                })
            }
            _ => Ok(()),
        }
    }
}
