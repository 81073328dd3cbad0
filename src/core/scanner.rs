//! Ignore-aware file discovery
//!
//! Every traversal of a project goes through [`Scanner`], which prunes
//! ignored directories before descending into them.

use crate::error::{ArchscanError, Result};
use crate::models::config::Settings;
use glob::Pattern;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use walkdir::WalkDir;

/// Predicate deciding whether a project-relative path is excluded
pub trait IgnoreMatcher: Send + Sync {
    fn is_ignored(&self, path: &Path) -> bool;
}

impl<F> IgnoreMatcher for F
where
    F: Fn(&Path) -> bool + Send + Sync,
{
    fn is_ignored(&self, path: &Path) -> bool {
        self(path)
    }
}

/// Glob-based ignore matcher.
///
/// A path is ignored when a pattern matches the whole relative path or any
/// single component of it, so `__pycache__` excludes that directory at any
/// depth.
#[derive(Debug, Clone, Default)]
pub struct GlobIgnore {
    patterns: Vec<Pattern>,
}

impl GlobIgnore {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| Pattern::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(&settings.exclude_patterns)
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl IgnoreMatcher for GlobIgnore {
    fn is_ignored(&self, path: &Path) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let relative = slash_path(path);
        self.patterns.iter().any(|pattern| {
            pattern.matches(&relative)
                || path.components().any(|c| match c {
                    Component::Normal(name) => pattern.matches(&name.to_string_lossy()),
                    _ => false,
                })
        })
    }
}

/// Walks a project root, skipping ignored paths
pub struct Scanner {
    root: PathBuf,
    ignore: Arc<dyn IgnoreMatcher>,
    file_glob: Pattern,
    /// Pattern applied to bare file names for globs such as `**/*.py`
    name_glob: Option<Pattern>,
}

impl Scanner {
    pub fn new(root: &Path, ignore: Arc<dyn IgnoreMatcher>, file_glob: &str) -> Result<Self> {
        if !root.is_dir() {
            return Err(ArchscanError::InvalidPath {
                path: root.to_path_buf(),
            });
        }
        let name_glob = match file_glob.strip_prefix("**/") {
            Some(rest) if !rest.contains('/') => Some(Pattern::new(rest)?),
            _ if !file_glob.contains('/') => Some(Pattern::new(file_glob)?),
            _ => None,
        };
        Ok(Self {
            root: root.to_path_buf(),
            ignore,
            file_glob: Pattern::new(file_glob)?,
            name_glob,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ignore(&self) -> &Arc<dyn IgnoreMatcher> {
        &self.ignore
    }

    /// Absolute paths of files matching the file glob, sorted
    pub fn source_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = self
            .files()
            .into_iter()
            .filter(|relative| self.matches_glob(relative))
            .map(|relative| self.root.join(relative))
            .collect();
        files.sort();
        files
    }

    /// Relative paths of every non-ignored file, sorted
    pub fn files(&self) -> Vec<PathBuf> {
        self.entries(|entry| entry.file_type().is_file())
    }

    /// Relative paths of every non-ignored directory below the root, sorted
    pub fn directories(&self) -> Vec<PathBuf> {
        self.entries(|entry| entry.file_type().is_dir())
    }

    fn matches_glob(&self, relative: &Path) -> bool {
        if self.file_glob.matches(&slash_path(relative)) {
            return true;
        }
        match (&self.name_glob, relative.file_name()) {
            (Some(pattern), Some(name)) => pattern.matches(&name.to_string_lossy()),
            _ => false,
        }
    }

    fn entries<F>(&self, keep: F) -> Vec<PathBuf>
    where
        F: Fn(&walkdir::DirEntry) -> bool,
    {
        let root = self.root.as_path();
        let mut found: Vec<PathBuf> = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || entry
                        .path()
                        .strip_prefix(root)
                        .map(|relative| !self.ignore.is_ignored(relative))
                        .unwrap_or(true)
            })
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    debug!(error = %err, "skipping unreadable entry");
                    None
                }
            })
            .filter(|entry| entry.depth() > 0 && keep(entry))
            .filter_map(|entry| entry.path().strip_prefix(root).ok().map(Path::to_path_buf))
            .collect();
        found.sort();
        found
    }
}

/// Path text with `/` separators on every platform
fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
