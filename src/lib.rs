//! archscan - technology detection and architecture analysis for Python projects
//!
//! This library scans a source tree and produces three kinds of results:
//! detected technologies with confidence scores, the module import graph
//! with cycles and coupling metrics, and scores for known architecture
//! patterns.

pub mod cli;
pub mod config;
pub mod core;
pub mod detection;
pub mod error;
pub mod models;
pub mod output;
pub mod parsers;
pub mod patterns;
pub mod plugins;
pub mod utils;

// Re-export commonly used types
pub use crate::core::DependencyAnalyzer;
pub use detection::{DetectionOrchestrator, TechnologyGraph};
pub use error::{handle_error, try_with_recovery, ArchscanError, ErrorSeverity, OptionExt, Result, ResultExt};
pub use models::{
    config::Settings,
    dependency_graph::{CircularDependency, CouplingMetrics, DependencyGraph, DependencyGraphAnalysis},
    detection::{DetectionResult, EnrichmentResult, TechnologyMatch},
    facts::FactSheet,
    pattern::{PatternMatchResult, Violation},
    report::ScanReport,
};
pub use patterns::PatternMatcher;
pub use plugins::{PluginRegistry, TechnologyPlugin};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
