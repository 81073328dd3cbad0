//! Command-line argument parsing

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// archscan - technology detection and architecture analysis for Python projects
#[derive(Parser, Debug)]
#[command(name = "archscan")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Detect technologies, analyze import graphs and score architecture patterns")]
#[command(long_about = "archscan inspects a Python source tree. It detects the technologies and frameworks \
the project uses (with confidence scores and evidence), builds the module import graph to report \
circular dependencies and coupling, and scores the layout against known architecture styles \
(hexagonal, layered, DDD, CQRS, MVC).")]
#[command(after_help = "EXAMPLES:

    # Run every analysis on the current directory
    archscan

    # Detect technologies, including plugin facts
    archscan detect --enrich

    # Dependency graph as JSON, plus a Graphviz export
    archscan --output json graph --dot deps.dot

    # Coupling and neighbours of one module
    archscan graph --module app.services.billing

    # Score a single architecture pattern
    archscan patterns --pattern hexagonal

    # Skip generated code and only report confident matches
    archscan --exclude migrations --min-confidence 0.7 detect

    # Create a default .archscan.toml
    archscan --init
")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Project root to analyze
    #[arg(short, long, global = true, value_name = "PATH", help = "Project directory to analyze (defaults to the current directory)")]
    pub path: Option<PathBuf>,

    /// Exclude paths matching these glob patterns
    #[arg(short, long, global = true, value_name = "PATTERN", help = "Glob patterns for paths to exclude (can be specified multiple times)")]
    pub exclude: Vec<String>,

    /// Glob selecting the source files to parse
    #[arg(long, global = true, value_name = "GLOB", help = "Glob selecting source files to parse (default: **/*.py)")]
    pub glob: Option<String>,

    /// Minimum confidence for reported technologies
    #[arg(long, global = true, value_name = "SCORE", help = "Minimum confidence between 0 and 1 for a technology to be reported (default: 0.5)")]
    pub min_confidence: Option<f64>,

    /// Output format (text, json, csv)
    #[arg(short, long, global = true, value_enum, help = "Output format: 'text' for people, 'json' for tools, 'csv' for spreadsheets")]
    pub output: Option<OutputFormat>,

    /// Output file path (stdout if not specified)
    #[arg(long, global = true, value_name = "FILE", help = "File to write the report to (uses stdout if not specified)")]
    pub output_file: Option<PathBuf>,

    /// Worker threads for parsing
    #[arg(long, global = true, value_name = "N", help = "Number of worker threads used for parsing (defaults to the number of CPUs)")]
    pub workers: Option<usize>,

    /// Suppress non-essential output
    #[arg(short, long, global = true, help = "Only print a one-line summary per section")]
    pub quiet: bool,

    /// Show detailed progress and debug information
    #[arg(short, long, global = true, help = "Show evidence, suggestions and info-level logs")]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true, value_name = "FILE", help = "Path to a configuration file (defaults to .archscan.toml lookup)")]
    pub config: Option<PathBuf>,

    /// Disable parallel processing
    #[arg(long, global = true, help = "Parse files on the calling thread only")]
    pub no_parallel: bool,

    /// Disable the graph cache
    #[arg(long, global = true, help = "Always rebuild the dependency graph")]
    pub no_cache: bool,

    /// Disable colored output
    #[arg(long, global = true, help = "Disable ANSI colors in text output")]
    pub no_colors: bool,

    /// Disable progress bars
    #[arg(long, global = true, help = "Disable progress bars (useful for CI or when redirecting output)")]
    pub no_progress: bool,

    /// Initialize a default configuration file
    #[arg(long, help = "Create a default configuration file (.archscan.toml) in the current directory")]
    pub init: bool,
}

/// Analyses archscan can run
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Detect technologies and frameworks
    Detect {
        /// Run plugin fact extraction and artifact generation on the matches
        #[arg(long)]
        enrich: bool,
    },
    /// Build and analyze the module dependency graph
    Graph {
        /// Also write the graph in Graphviz DOT format
        #[arg(long, value_name = "FILE")]
        dot: Option<PathBuf>,

        /// Report coupling, depth and neighbours of one module
        #[arg(long, value_name = "MODULE")]
        module: Option<String>,
    },
    /// Score architecture patterns
    Patterns {
        /// Only score this pattern
        #[arg(long, value_name = "NAME")]
        pattern: Option<String>,
    },
    /// Detection with enrichment, dependency graph and patterns
    All,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for programmatic consumption
    Json,
    /// CSV output for spreadsheet analysis
    Csv,
}

impl Args {
    pub fn parse_args() -> Self {
        Args::parse()
    }

    /// The subcommand to run; no subcommand means everything
    pub fn analysis(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::All)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_default_command_is_all() {
        let args = Args::parse_from(["archscan"]);
        assert_eq!(args.analysis(), Commands::All);
        assert!(!args.init);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::parse_from(["archscan", "graph", "--dot", "deps.dot", "--output", "json", "-q"]);
        assert_eq!(
            args.analysis(),
            Commands::Graph {
                dot: Some(PathBuf::from("deps.dot")),
                module: None
            }
        );
        assert_eq!(args.output, Some(OutputFormat::Json));
        assert!(args.quiet);
    }

    #[test]
    fn test_patterns_and_detect() {
        let args = Args::parse_from(["archscan", "patterns", "--pattern", "ddd"]);
        assert_eq!(
            args.analysis(),
            Commands::Patterns {
                pattern: Some("ddd".to_string())
            }
        );

        let args = Args::parse_from(["archscan", "--min-confidence", "0.3", "detect", "--enrich"]);
        assert_eq!(args.analysis(), Commands::Detect { enrich: true });
        assert_eq!(args.min_confidence, Some(0.3));
    }
}
