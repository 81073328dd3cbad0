//! Configuration management
//!
//! Settings are layered: built-in defaults, then a config file, then
//! `ARCHSCAN_*` environment variables, then command-line flags.

pub mod cli;
pub mod file;
pub mod parser;
pub mod settings;
#[cfg(test)]
pub mod tests;

use crate::error::Result;
use crate::models::config::{PartialSettings, Settings};
use tracing::debug;

pub use cli::{CliArgs, CliConfig};
pub use file::{EnvConfig, FileConfig};
pub use parser::{create_default_config, find_default_config, parse_config_content, parse_config_file};
pub use settings::SettingsValidator;

/// Prefix of the environment variables archscan reads
pub const ENV_PREFIX: &str = "ARCHSCAN";

/// Trait for configuration sources
pub trait ConfigSource {
    /// Load configuration from this source
    fn load(&self) -> Result<PartialSettings>;

    /// Check if this configuration source is available
    fn is_available(&self) -> bool;

    /// Get the name of this configuration source for logging
    fn name(&self) -> &str;

    /// Get the priority of this source (higher numbers take precedence)
    fn priority(&self) -> u8 {
        10
    }
}

/// Configuration builder for merging multiple sources
pub struct ConfigBuilder {
    partial: PartialSettings,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            partial: PartialSettings::default(),
        }
    }

    /// Merge settings from a partial configuration
    pub fn merge(mut self, partial: PartialSettings) -> Self {
        self.partial.merge_from(partial);
        self
    }

    /// Load and merge settings from a configuration source
    pub fn load_from<S: ConfigSource>(self, source: &S) -> Result<Self> {
        if !source.is_available() {
            return Ok(self);
        }
        let partial = source.load()?;
        debug!(source = source.name(), "merged configuration source");
        Ok(self.merge(partial))
    }

    /// Try to load from a source, ignoring failures
    pub fn try_load_from<S: ConfigSource>(self, source: &S) -> Self {
        if !source.is_available() {
            return self;
        }
        match source.load() {
            Ok(partial) => self.merge(partial),
            Err(e) => {
                debug!(source = source.name(), error = %e, "ignoring configuration source");
                self
            }
        }
    }

    /// Add configuration from a file that must exist
    pub fn add_config_file(self, path: &std::path::Path) -> Result<Self> {
        let file_config = FileConfig::with_path(path);
        if !file_config.is_available() {
            // load() reports the missing file
            return file_config.load().map(|partial| self.merge(partial));
        }
        self.load_from(&file_config)
    }

    /// Merge the first config file found in the default locations
    pub fn add_default_config_file(self) -> Result<Self> {
        Ok(match parser::find_default_config()? {
            Some(partial) => self.merge(partial),
            None => self,
        })
    }

    /// Build the final settings with validation
    pub fn build(self) -> Result<Settings> {
        let settings = self.partial.to_settings();
        SettingsValidator::validate(&settings)?;
        Ok(settings)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Load configuration from every source with the usual precedence
pub fn load_config(cli_args: CliArgs) -> Result<Settings> {
    load_config_with_env_prefix(cli_args, ENV_PREFIX)
}

/// Load configuration with a custom environment variable prefix
pub fn load_config_with_env_prefix(cli_args: CliArgs, env_prefix: &str) -> Result<Settings> {
    let mut builder = ConfigBuilder::new();

    builder = match &cli_args.config {
        Some(path) => builder.add_config_file(path)?,
        None => builder.add_default_config_file()?,
    };

    builder = builder.load_from(&EnvConfig::new(env_prefix))?;
    builder = builder.load_from(&CliConfig::new(cli_args))?;

    builder.build()
}
