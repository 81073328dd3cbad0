//! Error types and definitions for archscan
//!
//! Errors are split by how callers are expected to react: skippable
//! conditions never reach this type (they are absorbed into skip lists),
//! configuration errors are fatal at startup, resource-limit errors are
//! distinct so callers can retry with tighter filters, and not-found errors
//! are never replaced by a silent default.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Error severity levels for different error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Warning level errors - operation can continue
    Warning,
    /// Error level - current operation fails but overall process can continue
    Error,
    /// Critical level - process should terminate
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Warning => write!(f, "WARNING"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Main error type for archscan operations
#[derive(Debug, Error)]
pub enum ArchscanError {
    /// Standard IO errors
    #[error("IO error: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing errors with file context
    #[error("JSON parsing error in {file}: {source}")]
    JsonParse {
        file: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// JSON serialization error
    #[error("JSON serialization error: {source}")]
    JsonSerialize {
        #[source]
        source: serde_json::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Configuration file not found
    #[error("Configuration file not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration file read errors
    #[error("Error reading configuration file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file parse errors
    #[error("Error parsing configuration file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// TOML parsing errors outside of config files
    #[error("TOML parsing error: {source}")]
    TomlParse {
        #[source]
        source: toml::de::Error,
    },

    /// Invalid path errors
    #[error("Invalid path: {path}")]
    InvalidPath { path: PathBuf },

    /// Glob pattern errors
    #[error("Glob pattern error: {source}")]
    GlobPattern {
        #[source]
        source: glob::PatternError,
    },

    /// A technology dependency edge failed validation
    #[error("Invalid technology dependency {child} -> {parent}: {message}")]
    InvalidTechnologyEdge {
        child: String,
        parent: String,
        message: String,
    },

    /// An architecture pattern spec failed validation
    #[error("Invalid pattern spec '{pattern}': {message}")]
    InvalidPatternSpec { pattern: String, message: String },

    /// A pattern name that no built-in spec answers to
    #[error("Unknown architecture pattern: {name}")]
    UnknownPattern { name: String },

    /// Graph exceeds the configured node or edge cap
    #[error("Graph too large: {nodes} nodes / {edges} edges (limits {max_nodes} / {max_edges})")]
    GraphTooLarge {
        nodes: usize,
        edges: usize,
        max_nodes: usize,
        max_edges: usize,
    },

    /// Module lookup against a built graph failed
    #[error("Module not found in dependency graph: {module}")]
    ModuleNotFound { module: String },

    /// Interrupted operation
    #[error("Operation interrupted")]
    Interrupted,

    /// Worker pool construction failed
    #[error("Thread pool error: {message}")]
    ThreadPool { message: String },

    /// Output file write errors
    #[error("Error writing to output file {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stdout write errors
    #[error("Error writing to stdout: {source}")]
    StdoutWrite {
        #[source]
        source: std::io::Error,
    },

    /// CSV handling errors
    #[error("CSV error: {source}")]
    Csv {
        #[source]
        source: csv::Error,
    },

    /// Generic analysis failure with context
    #[error("Analysis error: {message}")]
    Analysis { message: String },
}

impl ArchscanError {
    /// Get the severity level of this error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // Warning level errors - operation can continue
            ArchscanError::JsonParse { .. } => ErrorSeverity::Warning,
            ArchscanError::ModuleNotFound { .. } => ErrorSeverity::Warning,

            // Critical errors - process should terminate
            ArchscanError::Config { .. } => ErrorSeverity::Critical,
            ArchscanError::ConfigNotFound { .. } => ErrorSeverity::Critical,
            ArchscanError::ConfigRead { .. } => ErrorSeverity::Critical,
            ArchscanError::ConfigParse { .. } => ErrorSeverity::Critical,
            ArchscanError::InvalidTechnologyEdge { .. } => ErrorSeverity::Critical,
            ArchscanError::InvalidPatternSpec { .. } => ErrorSeverity::Critical,
            ArchscanError::StdoutWrite { .. } => ErrorSeverity::Critical,
            ArchscanError::ThreadPool { .. } => ErrorSeverity::Critical,

            // Regular errors - current operation fails but overall process can continue
            _ => ErrorSeverity::Error,
        }
    }

    /// Check if this is a critical error that should terminate the process
    pub fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }

    /// Check if this error is a resource-limit violation callers may retry
    /// with narrower filters
    pub fn is_resource_limit(&self) -> bool {
        matches!(self, ArchscanError::GraphTooLarge { .. })
    }

    /// Check if this error comes from invalid static configuration
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ArchscanError::Config { .. }
                | ArchscanError::ConfigNotFound { .. }
                | ArchscanError::ConfigRead { .. }
                | ArchscanError::ConfigParse { .. }
                | ArchscanError::InvalidTechnologyEdge { .. }
                | ArchscanError::InvalidPatternSpec { .. }
        )
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            ArchscanError::Io { source } => {
                format!("File system error: {}. Check disk space and permissions.", source)
            }
            ArchscanError::InvalidPath { path } => {
                format!("Invalid path: '{}'. Please provide a valid project directory.", path.display())
            }
            ArchscanError::ConfigNotFound { path } => {
                format!("Configuration file not found at '{}'. Create a config file or use command line options.", path.display())
            }
            ArchscanError::GraphTooLarge { nodes, edges, max_nodes, max_edges } => {
                format!(
                    "Dependency graph has {} nodes and {} edges, above the limits of {} and {}. Narrow the scan with --glob or --exclude, or raise max_nodes / max_edges.",
                    nodes, edges, max_nodes, max_edges
                )
            }
            ArchscanError::UnknownPattern { name } => {
                format!("Unknown architecture pattern '{}'. Known patterns: hexagonal, layered, ddd, cqrs, mvc.", name)
            }
            ArchscanError::ModuleNotFound { module } => {
                format!("Module '{}' is not part of the dependency graph.", module)
            }
            // For other errors, use the standard Display implementation
            _ => self.to_string(),
        }
    }

    /// Create an IO error
    pub fn io_error(source: std::io::Error) -> Self {
        ArchscanError::Io { source }
    }

    /// Create a JSON parse error with file context
    pub fn json_parse_error(file: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        ArchscanError::JsonParse {
            file: file.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        ArchscanError::Config {
            message: message.into(),
        }
    }

    /// Create a module-not-found error
    pub fn module_not_found(module: impl Into<String>) -> Self {
        ArchscanError::ModuleNotFound {
            module: module.into(),
        }
    }

    /// Create an invalid pattern spec error
    pub fn invalid_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        ArchscanError::InvalidPatternSpec {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Create an invalid technology edge error
    pub fn invalid_edge(
        child: impl Into<String>,
        parent: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ArchscanError::InvalidTechnologyEdge {
            child: child.into(),
            parent: parent.into(),
            message: message.into(),
        }
    }

    /// Create a generic analysis error
    pub fn analysis_error(message: impl Into<String>) -> Self {
        ArchscanError::Analysis {
            message: message.into(),
        }
    }
}

// Implement From for common error types
impl From<std::io::Error> for ArchscanError {
    fn from(err: std::io::Error) -> Self {
        ArchscanError::io_error(err)
    }
}

impl From<toml::de::Error> for ArchscanError {
    fn from(err: toml::de::Error) -> Self {
        ArchscanError::TomlParse { source: err }
    }
}

impl From<csv::Error> for ArchscanError {
    fn from(err: csv::Error) -> Self {
        ArchscanError::Csv { source: err }
    }
}

impl From<glob::PatternError> for ArchscanError {
    fn from(err: glob::PatternError) -> Self {
        ArchscanError::GlobPattern { source: err }
    }
}

impl From<serde_json::Error> for ArchscanError {
    fn from(err: serde_json::Error) -> Self {
        ArchscanError::JsonSerialize { source: err }
    }
}

/// Result type alias for archscan operations
pub type Result<T> = std::result::Result<T, ArchscanError>;
