//! Configuration file and environment variable sources

use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::{parser, ConfigSource};
use crate::error::{ArchscanError, Result};
use crate::models::config::PartialSettings;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = ".archscan.toml";

/// Configuration file source
pub struct FileConfig {
    path: PathBuf,
    name: String,
    priority: u8,
}

impl FileConfig {
    /// File source for `.archscan.toml` in the working directory
    pub fn new() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_CONFIG_FILE),
            name: "default config file".to_string(),
            priority: 20,
        }
    }

    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            name: format!("config file ({})", path.as_ref().display()),
            priority: 20,
        }
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the embedded default configuration to this location
    pub fn create_default(&self) -> Result<()> {
        parser::create_default_config(&self.path)
    }
}

impl ConfigSource for FileConfig {
    fn load(&self) -> Result<PartialSettings> {
        if !self.is_available() {
            return Err(ArchscanError::ConfigNotFound {
                path: self.path.clone(),
            });
        }
        parser::parse_config_file(&self.path)
    }

    fn is_available(&self) -> bool {
        self.path.is_file()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> u8 {
        self.priority
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Variable suffixes read by [`EnvConfig`]
const ENV_KEYS: &[&str] = &[
    "SCAN_PATH",
    "EXCLUDE",
    "FILE_GLOB",
    "MIN_CONFIDENCE",
    "WORKERS",
    "MAX_FILE_SIZE",
    "PARALLEL",
    "CACHE_ENABLED",
    "OUTPUT_FORMAT",
];

/// Environment variable configuration source
pub struct EnvConfig {
    prefix: String,
    name: String,
    priority: u8,
}

impl EnvConfig {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            name: format!("{} environment variables", &prefix),
            prefix,
            priority: 10,
        }
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    fn var(&self, key: &str) -> Option<(String, String)> {
        let name = format!("{}_{}", self.prefix, key);
        std::env::var(&name).ok().map(|value| (name, value))
    }

    /// Parse a variable, reporting the variable name on failure
    fn parsed<T: FromStr>(&self, key: &str) -> Result<Option<T>> {
        match self.var(key) {
            None => Ok(None),
            Some((name, value)) => value.trim().parse().map(Some).map_err(|_| {
                ArchscanError::config_error(format!("Invalid value '{}' for {}", value, name))
            }),
        }
    }
}

impl ConfigSource for EnvConfig {
    fn load(&self) -> Result<PartialSettings> {
        let mut settings = PartialSettings::default();

        if let Some((_, path)) = self.var("SCAN_PATH") {
            settings.scan_path = Some(PathBuf::from(path));
        }
        if let Some((_, exclude)) = self.var("EXCLUDE") {
            settings.exclude_patterns = Some(
                exclude
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            );
        }
        if let Some((_, glob)) = self.var("FILE_GLOB") {
            settings.file_glob = Some(glob);
        }
        settings.min_confidence = self.parsed("MIN_CONFIDENCE")?;
        settings.workers = self.parsed("WORKERS")?;
        settings.max_file_size = self.parsed("MAX_FILE_SIZE")?;
        settings.parallel = self.parsed("PARALLEL")?;
        settings.cache_enabled = self.parsed("CACHE_ENABLED")?;
        if let Some((name, format)) = self.var("OUTPUT_FORMAT") {
            settings.output_format = Some(format.parse().map_err(|e: String| {
                ArchscanError::config_error(format!("{} in {}", e, name))
            })?);
        }

        Ok(settings)
    }

    fn is_available(&self) -> bool {
        ENV_KEYS.iter().any(|key| self.var(key).is_some())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> u8 {
        self.priority
    }
}
