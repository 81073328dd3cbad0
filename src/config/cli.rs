//! Command-line argument configuration source

use std::path::PathBuf;

use super::ConfigSource;
use crate::cli::args::{Args, OutputFormat as CliOutputFormat};
use crate::error::Result;
use crate::models::config::{OutputFormat, PartialSettings};

/// Command-line argument configuration source
#[derive(Debug)]
pub struct CliConfig {
    args: CliArgs,
    name: String,
    priority: u8,
}

/// The subset of command-line flags that feed into settings
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub path: Option<PathBuf>,
    pub exclude: Option<Vec<String>>,
    pub file_glob: Option<String>,
    pub min_confidence: Option<f64>,
    pub workers: Option<usize>,
    pub output_format: Option<OutputFormat>,
    pub output_file: Option<PathBuf>,
    pub no_parallel: bool,
    pub no_cache: bool,
    pub quiet: bool,
    pub verbose: bool,
    pub no_colors: bool,
    pub no_progress: bool,
    pub config: Option<PathBuf>,
}

impl CliArgs {
    pub fn from_args(args: &Args) -> Self {
        Self {
            path: args.path.clone(),
            exclude: if args.exclude.is_empty() {
                None
            } else {
                Some(args.exclude.clone())
            },
            file_glob: args.glob.clone(),
            min_confidence: args.min_confidence,
            workers: args.workers,
            output_format: args.output.map(|format| match format {
                CliOutputFormat::Text => OutputFormat::Text,
                CliOutputFormat::Json => OutputFormat::Json,
                CliOutputFormat::Csv => OutputFormat::Csv,
            }),
            output_file: args.output_file.clone(),
            no_parallel: args.no_parallel,
            no_cache: args.no_cache,
            quiet: args.quiet,
            verbose: args.verbose,
            no_colors: args.no_colors,
            no_progress: args.no_progress,
            config: args.config.clone(),
        }
    }
}

impl CliConfig {
    pub fn new(args: CliArgs) -> Self {
        Self {
            args,
            name: "command-line arguments".to_string(),
            priority: 30,
        }
    }

    pub fn from_args(args: &Args) -> Self {
        Self::new(CliArgs::from_args(args))
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Get the config file path if specified
    pub fn config_path(&self) -> Option<&PathBuf> {
        self.args.config.as_ref()
    }
}

impl ConfigSource for CliConfig {
    fn load(&self) -> Result<PartialSettings> {
        let args = &self.args;
        let mut settings = PartialSettings {
            scan_path: args.path.clone(),
            exclude_patterns: args.exclude.clone(),
            file_glob: args.file_glob.clone(),
            min_confidence: args.min_confidence,
            workers: args.workers,
            output_format: args.output_format,
            output_file: args.output_file.clone(),
            ..Default::default()
        };

        // Flags only ever switch a default off (or on), never back
        if args.no_parallel {
            settings.parallel = Some(false);
        }
        if args.no_cache {
            settings.cache_enabled = Some(false);
        }
        if args.quiet {
            settings.quiet = Some(true);
        }
        if args.verbose {
            settings.verbose = Some(true);
        }
        if args.no_colors {
            settings.use_colors = Some(false);
        }
        if args.no_progress {
            settings.show_progress = Some(false);
        }

        Ok(settings)
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> u8 {
        self.priority
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_config_source() {
        let args = CliArgs {
            path: Some(PathBuf::from("/cli/path")),
            exclude: Some(vec!["migrations".to_string()]),
            min_confidence: Some(0.7),
            output_format: Some(OutputFormat::Json),
            no_cache: true,
            verbose: true,
            ..Default::default()
        };

        let cli_config = CliConfig::new(args);
        assert!(cli_config.is_available());
        assert_eq!(cli_config.priority(), 30);

        let settings = cli_config.load().unwrap();
        assert_eq!(settings.scan_path, Some(PathBuf::from("/cli/path")));
        assert_eq!(settings.exclude_patterns, Some(vec!["migrations".to_string()]));
        assert_eq!(settings.min_confidence, Some(0.7));
        assert_eq!(settings.output_format, Some(OutputFormat::Json));
        assert_eq!(settings.cache_enabled, Some(false));
        assert_eq!(settings.verbose, Some(true));
        // Unset flags leave lower layers alone
        assert_eq!(settings.parallel, None);
        assert_eq!(settings.quiet, None);
    }

    #[test]
    fn test_from_args() {
        let args = Args::parse_from([
            "archscan",
            "--path",
            "/test/path",
            "--exclude",
            "migrations",
            "--exclude",
            "docs",
            "--glob",
            "app/**/*.py",
            "--output",
            "csv",
            "--output-file",
            "report.csv",
            "--min-confidence",
            "0.4",
            "--workers",
            "2",
            "--no-parallel",
            "--no-progress",
            "detect",
        ]);

        let settings = CliConfig::from_args(&args).load().unwrap();
        assert_eq!(settings.scan_path, Some(PathBuf::from("/test/path")));
        assert_eq!(
            settings.exclude_patterns,
            Some(vec!["migrations".to_string(), "docs".to_string()])
        );
        assert_eq!(settings.file_glob, Some("app/**/*.py".to_string()));
        assert_eq!(settings.output_format, Some(OutputFormat::Csv));
        assert_eq!(settings.output_file, Some(PathBuf::from("report.csv")));
        assert_eq!(settings.min_confidence, Some(0.4));
        assert_eq!(settings.workers, Some(2));
        assert_eq!(settings.parallel, Some(false));
        assert_eq!(settings.show_progress, Some(false));
    }

    #[test]
    fn test_output_format_left_to_lower_layers() {
        let args = Args::parse_from(["archscan", "graph"]);
        let settings = CliConfig::from_args(&args).load().unwrap();
        assert_eq!(settings.output_format, None);
    }
}
