//! Configuration-related data structures

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Files larger than this are skipped by the source parser
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Main configuration settings for archscan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Project root to analyze
    pub scan_path: PathBuf,

    /// Glob patterns for paths to leave out of every scan
    pub exclude_patterns: Vec<String>,

    /// Glob selecting the source files to parse
    pub file_glob: String,

    /// Directory prefixes stripped from module ids (e.g. `src`)
    pub source_roots: Vec<String>,

    /// Minimum confidence for a technology to be reported
    pub min_confidence: f64,

    /// Confidence given to indicator-only technologies without a plugin
    pub indicator_only_confidence: f64,

    /// Generic formats never reported as technologies
    pub noise_technologies: Vec<String>,

    /// Maximum size in bytes of a parsed file
    pub max_file_size: u64,

    /// Graph node cap
    pub max_nodes: usize,

    /// Graph edge cap
    pub max_edges: usize,

    /// Cap on enumerated import cycles
    pub max_cycles: usize,

    /// Worker threads for parsing
    pub workers: usize,

    /// Whether to parse files in parallel
    pub parallel: bool,

    /// Whether to reuse built graphs within the cache TTL
    pub cache_enabled: bool,

    /// Lifetime of a cached graph in seconds
    pub cache_ttl_secs: u64,

    /// Output format (text, json, csv)
    pub output_format: OutputFormat,

    /// Output file path (if not specified, output to stdout)
    pub output_file: Option<PathBuf>,

    /// Whether to suppress non-essential output
    pub quiet: bool,

    /// Whether to show detailed progress and debug information
    pub verbose: bool,

    /// Whether to use colors in text output
    pub use_colors: bool,

    /// Whether to show progress bars
    pub show_progress: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scan_path: PathBuf::from("."),
            exclude_patterns: default_exclude_patterns(),
            file_glob: "**/*.py".to_string(),
            source_roots: vec!["src".to_string()],
            min_confidence: 0.5,
            indicator_only_confidence: 0.6,
            noise_technologies: default_noise_technologies(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_nodes: 10_000,
            max_edges: 100_000,
            max_cycles: 1000,
            workers: num_cpus::get(),
            parallel: true,
            cache_enabled: true,
            cache_ttl_secs: 300,
            output_format: OutputFormat::Text,
            output_file: None,
            quiet: false,
            verbose: false,
            use_colors: true,
            show_progress: true,
        }
    }
}

fn default_exclude_patterns() -> Vec<String> {
    [
        ".git",
        "__pycache__",
        ".venv",
        "venv",
        ".tox",
        ".mypy_cache",
        ".pytest_cache",
        "node_modules",
        "build",
        "dist",
        "*.egg-info",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_noise_technologies() -> Vec<String> {
    ["json", "yaml", "markdown", "text", "toml", "xml", "csv", "ini"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for programmatic consumption
    Json,
    /// CSV output for spreadsheet analysis
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Invalid output format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Partial settings for configuration merging
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartialSettings {
    pub scan_path: Option<PathBuf>,
    pub exclude_patterns: Option<Vec<String>>,
    pub file_glob: Option<String>,
    pub source_roots: Option<Vec<String>>,
    pub min_confidence: Option<f64>,
    pub indicator_only_confidence: Option<f64>,
    pub noise_technologies: Option<Vec<String>>,
    pub max_file_size: Option<u64>,
    pub max_nodes: Option<usize>,
    pub max_edges: Option<usize>,
    pub max_cycles: Option<usize>,
    pub workers: Option<usize>,
    pub parallel: Option<bool>,
    pub cache_enabled: Option<bool>,
    pub cache_ttl_secs: Option<u64>,
    pub output_format: Option<OutputFormat>,
    pub output_file: Option<PathBuf>,
    pub quiet: Option<bool>,
    pub verbose: Option<bool>,
    pub use_colors: Option<bool>,
    pub show_progress: Option<bool>,
}

/// Overwrite `$target` with `$source` when the source field is set
macro_rules! merge_fields {
    ($target:expr, $source:expr, $($field:ident),+ $(,)?) => {
        $(
            if $source.$field.is_some() {
                $target.$field = $source.$field;
            }
        )+
    };
}

impl PartialSettings {
    /// Merge another PartialSettings into this one
    /// Fields from `other` take precedence over existing fields
    pub fn merge_from(&mut self, other: PartialSettings) {
        merge_fields!(
            self,
            other,
            scan_path,
            exclude_patterns,
            file_glob,
            source_roots,
            min_confidence,
            indicator_only_confidence,
            noise_technologies,
            max_file_size,
            max_nodes,
            max_edges,
            max_cycles,
            workers,
            parallel,
            cache_enabled,
            cache_ttl_secs,
            output_format,
            output_file,
            quiet,
            verbose,
            use_colors,
            show_progress,
        );
    }

    /// Convert partial settings to full settings
    /// Uses defaults for any fields that are None
    pub fn to_settings(&self) -> Settings {
        let mut settings = Settings::default();

        if let Some(scan_path) = &self.scan_path {
            settings.scan_path = scan_path.clone();
        }
        if let Some(exclude_patterns) = &self.exclude_patterns {
            settings.exclude_patterns = exclude_patterns.clone();
        }
        if let Some(file_glob) = &self.file_glob {
            settings.file_glob = file_glob.clone();
        }
        if let Some(source_roots) = &self.source_roots {
            settings.source_roots = source_roots.clone();
        }
        if let Some(min_confidence) = self.min_confidence {
            settings.min_confidence = min_confidence;
        }
        if let Some(confidence) = self.indicator_only_confidence {
            settings.indicator_only_confidence = confidence;
        }
        if let Some(noise) = &self.noise_technologies {
            settings.noise_technologies = noise.clone();
        }
        if let Some(max_file_size) = self.max_file_size {
            settings.max_file_size = max_file_size;
        }
        if let Some(max_nodes) = self.max_nodes {
            settings.max_nodes = max_nodes;
        }
        if let Some(max_edges) = self.max_edges {
            settings.max_edges = max_edges;
        }
        if let Some(max_cycles) = self.max_cycles {
            settings.max_cycles = max_cycles;
        }
        if let Some(workers) = self.workers {
            settings.workers = workers;
        }
        if let Some(parallel) = self.parallel {
            settings.parallel = parallel;
        }
        if let Some(cache_enabled) = self.cache_enabled {
            settings.cache_enabled = cache_enabled;
        }
        if let Some(ttl) = self.cache_ttl_secs {
            settings.cache_ttl_secs = ttl;
        }
        if let Some(output_format) = self.output_format {
            settings.output_format = output_format;
        }
        if let Some(output_file) = &self.output_file {
            settings.output_file = Some(output_file.clone());
        }
        if let Some(quiet) = self.quiet {
            settings.quiet = quiet;
        }
        if let Some(verbose) = self.verbose {
            settings.verbose = verbose;
        }
        if let Some(use_colors) = self.use_colors {
            settings.use_colors = use_colors;
        }
        if let Some(show_progress) = self.show_progress {
            settings.show_progress = show_progress;
        }

        settings
    }
}
