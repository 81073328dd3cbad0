//! Per-file structural facts produced by the source parser

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Kind of a top-level or nested declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    Class,
    Function,
}

/// A class or function definition found in a source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub kind: DeclarationKind,
    pub name: String,
    /// Qualified name of the enclosing class or function, if nested
    pub parent: Option<String>,
    /// 1-based first line of the definition
    pub start_line: usize,
    /// 1-based last line of the definition
    pub end_line: usize,
    /// Base classes flattened to dotted strings (empty for functions)
    pub bases: Vec<String>,
    /// Decorator names, with call arguments dropped
    pub decorators: Vec<String>,
    pub is_async: bool,
}

impl Declaration {
    /// `Parent.name` for nested declarations, `name` otherwise
    pub fn qualified_name(&self) -> String {
        match &self.parent {
            Some(parent) => format!("{}.{}", parent, self.name),
            None => self.name.clone(),
        }
    }

    /// Check whether any base ends with the given dotted suffix
    pub fn has_base(&self, base: &str) -> bool {
        self.bases
            .iter()
            .any(|b| b == base || b.ends_with(&format!(".{}", base)))
    }

    /// Check whether any decorator equals or ends with the given name
    pub fn has_decorator(&self, decorator: &str) -> bool {
        self.decorators
            .iter()
            .any(|d| d == decorator || d.ends_with(&format!(".{}", decorator)))
    }
}

/// Syntactic form of an import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    /// `import a.b`
    Plain,
    /// `from a.b import c`
    From,
}

/// Raw import statement as written in the source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStatement {
    pub kind: ImportKind,
    /// Dotted module text without leading dots; empty for `from . import x`
    pub module: String,
    /// Number of leading dots for relative imports
    pub level: usize,
    /// Imported names for `from` imports (`*` for wildcard)
    pub names: Vec<String>,
    pub line: usize,
}

impl ImportStatement {
    pub fn is_relative(&self) -> bool {
        self.level > 0
    }
}

/// Module-level assignment target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleVariable {
    pub name: String,
    pub type_hint: Option<String>,
}

/// Structural facts extracted from one source file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactSheet {
    pub path: PathBuf,
    /// Normalized import targets (relative dots removed)
    pub imports: BTreeSet<String>,
    pub import_statements: Vec<ImportStatement>,
    pub declarations: Vec<Declaration>,
    /// Cyclomatic complexity keyed by qualified declaration name
    pub complexity: BTreeMap<String, u32>,
    pub module_variables: Vec<ModuleVariable>,
}

impl FactSheet {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn classes(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations
            .iter()
            .filter(|d| d.kind == DeclarationKind::Class)
    }

    pub fn functions(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations
            .iter()
            .filter(|d| d.kind == DeclarationKind::Function)
    }

    /// Check whether the file imports `module` or any of its submodules
    pub fn imports_module(&self, module: &str) -> bool {
        self.imports
            .iter()
            .any(|i| i == module || i.starts_with(&format!("{}.", module)))
    }

    /// Look up a declaration by its qualified name
    pub fn declaration(&self, qualified_name: &str) -> Option<&Declaration> {
        self.declarations
            .iter()
            .find(|d| d.qualified_name() == qualified_name)
    }

    pub fn max_complexity(&self) -> u32 {
        self.complexity.values().copied().max().unwrap_or(0)
    }
}

/// Why a single file produced no fact sheet
///
/// This is a skip reason, not a crate error: callers record it and move on.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseFailure {
    #[error("file is {size} bytes, above the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },

    #[error("file is not valid UTF-8 text")]
    Decode,

    #[error("syntax error near line {line}")]
    Syntax { line: usize },

    #[error("grammar could not be loaded: {message}")]
    Grammar { message: String },

    #[error("read failed: {message}")]
    Io { message: String },
}

/// A file left out of an aggregate result, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

impl SkippedFile {
    pub fn new(path: &Path, failure: &ParseFailure) -> Self {
        Self {
            path: path.to_path_buf(),
            reason: failure.to_string(),
        }
    }
}
