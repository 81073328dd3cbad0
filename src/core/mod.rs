//! Core functionality for file discovery, parallel parsing and dependency analysis

pub mod analyzer;
pub mod cache;
pub mod parallel;
pub mod scanner;

pub use analyzer::DependencyAnalyzer;
pub use cache::{GraphCache, ProjectGraph};
pub use parallel::{CancellationToken, ProgressUpdate, WorkerPool};
pub use scanner::{GlobIgnore, IgnoreMatcher, Scanner};
