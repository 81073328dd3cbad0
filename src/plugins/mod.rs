//! Per-technology detection and enrichment plugins
//!
//! Every plugin implements [`TechnologyPlugin`]. Plugins read the project
//! only through a shared [`PluginContext`], which owns the file listing and
//! an LRU cache of parsed fact sheets so several plugins looking at the same
//! module parse it once.

pub mod django;
pub mod docker;
pub mod fastapi;
pub mod flask;
pub mod javascript;
pub mod pytest;
pub mod python;
pub mod registry;
pub mod sqlalchemy;

pub use registry::{PluginFactory, PluginRegistry};

use crate::core::scanner::{IgnoreMatcher, Scanner};
use crate::error::Result;
use crate::models::detection::{clamp_confidence, DerivedArtifact, TechnologyFacts};
use crate::models::facts::FactSheet;
use crate::parsers::SourceParser;
use glob::Pattern;
use lru::LruCache;
use parking_lot::Mutex;
use regex::Regex;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Number of fact sheets kept in memory per context
pub const DEFAULT_FACT_CACHE_SIZE: usize = 512;

/// Capability implemented once per technology.
///
/// `detect` must not fail for missing evidence; it returns 0.0 instead.
/// `extract_facts` and `generate_derived_artifacts` only run after the
/// technology has been detected.
pub trait TechnologyPlugin: Send + Sync {
    fn technology(&self) -> &str;

    /// Confidence in [0, 1] that the project uses this technology
    fn detect(&self, ctx: &PluginContext) -> f64;

    fn extract_facts(&self, ctx: &PluginContext) -> Result<TechnologyFacts>;

    fn generate_derived_artifacts(
        &self,
        ctx: &PluginContext,
        facts: &TechnologyFacts,
    ) -> Result<Vec<DerivedArtifact>>;
}

/// Read-only view of one project shared by all plugins of a run
pub struct PluginContext {
    scanner: Scanner,
    parser: Arc<SourceParser>,
    fact_cache: Mutex<LruCache<PathBuf, Arc<FactSheet>>>,
    files: OnceLock<Vec<PathBuf>>,
    directories: OnceLock<Vec<PathBuf>>,
}

impl PluginContext {
    pub fn new(
        root: &Path,
        ignore: Arc<dyn IgnoreMatcher>,
        parser: Arc<SourceParser>,
    ) -> Result<Self> {
        Self::with_cache_size(root, ignore, parser, DEFAULT_FACT_CACHE_SIZE)
    }

    pub fn with_cache_size(
        root: &Path,
        ignore: Arc<dyn IgnoreMatcher>,
        parser: Arc<SourceParser>,
        cache_size: usize,
    ) -> Result<Self> {
        let capacity = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        Ok(Self {
            scanner: Scanner::new(root, ignore, "**/*")?,
            parser,
            fact_cache: Mutex::new(LruCache::new(capacity)),
            files: OnceLock::new(),
            directories: OnceLock::new(),
        })
    }

    pub fn root(&self) -> &Path {
        self.scanner.root()
    }

    /// Every non-ignored file, relative to the root
    pub fn files(&self) -> &[PathBuf] {
        self.files.get_or_init(|| self.scanner.files())
    }

    /// Every non-ignored directory, relative to the root
    pub fn directories(&self) -> &[PathBuf] {
        self.directories.get_or_init(|| self.scanner.directories())
    }

    pub fn python_files(&self) -> impl Iterator<Item = &PathBuf> {
        self.files_with_extension(&["py"])
    }

    pub fn files_with_extension<'a>(
        &'a self,
        extensions: &'a [&'a str],
    ) -> impl Iterator<Item = &'a PathBuf> + 'a {
        self.files().iter().filter(move |f| {
            f.extension()
                .and_then(|e| e.to_str())
                .map(|e| extensions.contains(&e))
                .unwrap_or(false)
        })
    }

    /// Files whose name matches a glob such as `requirements*.txt`
    pub fn files_named(&self, pattern: &str) -> Vec<&PathBuf> {
        let Ok(pattern) = Pattern::new(pattern) else {
            debug!(pattern, "invalid file name pattern");
            return Vec::new();
        };
        self.files()
            .iter()
            .filter(|f| {
                f.file_name()
                    .map(|n| pattern.matches(&n.to_string_lossy()))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Whether a non-ignored file exists at this relative path
    pub fn file_exists(&self, relative: &str) -> bool {
        self.files().iter().any(|f| f == Path::new(relative))
    }

    /// Whether a directory with this name exists at any depth
    pub fn has_directory(&self, name: &str) -> bool {
        self.directories()
            .iter()
            .any(|d| d.file_name().map(|n| n == name).unwrap_or(false))
    }

    /// Whether any path component of the file is `segment`
    pub fn in_directory(path: &Path, segment: &str) -> bool {
        path.parent()
            .map(|p| {
                p.components()
                    .any(|c| matches!(c, Component::Normal(n) if n == segment))
            })
            .unwrap_or(false)
    }

    /// Read a text file, honoring the parser's size limit
    pub fn read_text(&self, relative: &Path) -> Option<String> {
        let path = self.root().join(relative);
        let size = fs::metadata(&path).ok()?.len();
        if size > self.parser.max_file_size() {
            debug!(path = %relative.display(), size, "file too large to read");
            return None;
        }
        fs::read_to_string(&path).ok()
    }

    /// Parsed facts for a Python file; `None` when the file cannot be parsed
    pub fn fact_sheet(&self, relative: &Path) -> Option<Arc<FactSheet>> {
        if let Some(sheet) = self.fact_cache.lock().get(relative) {
            return Some(Arc::clone(sheet));
        }

        // Parse outside the lock; a racing parse of the same file is harmless
        let sheet = match self.parser.parse_file(&self.root().join(relative)) {
            Ok(sheet) => Arc::new(sheet),
            Err(failure) => {
                debug!(path = %relative.display(), reason = %failure, "fact sheet unavailable");
                return None;
            }
        };
        self.fact_cache
            .lock()
            .put(relative.to_path_buf(), Arc::clone(&sheet));
        Some(sheet)
    }

    /// Fact sheets of every parseable Python file, paired with their path
    pub fn fact_sheets(&self) -> Vec<(PathBuf, Arc<FactSheet>)> {
        self.python_files()
            .filter_map(|f| self.fact_sheet(f).map(|s| (f.clone(), s)))
            .collect()
    }

    /// Whether any Python file imports one of the given modules
    pub fn imports_any(&self, modules: &[&str]) -> bool {
        if modules.is_empty() {
            return false;
        }
        self.python_files().any(|f| {
            self.fact_sheet(f)
                .map(|sheet| modules.iter().any(|m| sheet.imports_module(m)))
                .unwrap_or(false)
        })
    }

    /// Whether any file whose name matches one of `file_patterns` contains a
    /// match for one of `regexes`
    pub fn content_matches(&self, file_patterns: &[&str], regexes: &[&str]) -> bool {
        let regexes: Vec<Regex> = regexes
            .iter()
            .filter_map(|r| match Regex::new(r) {
                Ok(re) => Some(re),
                Err(err) => {
                    debug!(pattern = r, error = %err, "invalid content pattern");
                    None
                }
            })
            .collect();
        if regexes.is_empty() {
            return false;
        }
        file_patterns
            .iter()
            .flat_map(|p| self.files_named(p))
            .filter_map(|f| self.read_text(f))
            .any(|text| regexes.iter().any(|re| re.is_match(&text)))
    }
}

/// Weighted evidence phases used by most plugins' `detect`
#[derive(Debug, Clone, Copy)]
pub struct DetectionProfile {
    /// File names (globs) whose presence anywhere counts as a marker
    pub marker_files: &'static [&'static str],
    pub marker_weight: f64,
    /// Modules whose import by any Python file counts as content evidence
    pub import_prefixes: &'static [&'static str],
    /// Files (name globs) searched with `content_patterns`
    pub content_files: &'static [&'static str],
    pub content_patterns: &'static [&'static str],
    pub content_weight: f64,
    /// Conventional directory names
    pub directories: &'static [&'static str],
    pub structure_weight: f64,
}

impl DetectionProfile {
    pub fn total_weight(&self) -> f64 {
        self.marker_weight + self.content_weight + self.structure_weight
    }

    /// Sum of the weights of the phases with evidence, capped at 1.0
    pub fn confidence(&self, ctx: &PluginContext) -> f64 {
        let mut score = 0.0;
        if self.marker_files.iter().any(|m| !ctx.files_named(m).is_empty()) {
            score += self.marker_weight;
        }
        if ctx.imports_any(self.import_prefixes)
            || ctx.content_matches(self.content_files, self.content_patterns)
        {
            score += self.content_weight;
        }
        if self.directories.iter().any(|d| ctx.has_directory(d)) {
            score += self.structure_weight;
        }
        clamp_confidence(score)
    }
}

/// Manifest files consulted by Python technology profiles
pub(crate) const PYTHON_MANIFESTS: &[&str] = &[
    "requirements*.txt",
    "pyproject.toml",
    "Pipfile",
    "setup.py",
    "setup.cfg",
];

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::core::scanner::GlobIgnore;
    use crate::models::config::Settings;
    use tempfile::TempDir;

    /// Write a project tree into a temp dir
    pub fn project(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (relative, content) in files {
            let path = dir.path().join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        dir
    }

    pub fn context(dir: &TempDir) -> PluginContext {
        let ignore = Arc::new(GlobIgnore::from_settings(&Settings::default()).unwrap());
        PluginContext::new(dir.path(), ignore, Arc::new(SourceParser::new())).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{context, project};
    use super::*;

    #[test]
    fn test_context_lists_files_and_directories() {
        let dir = project(&[
            ("app/models.py", "import django\n"),
            ("requirements-dev.txt", "pytest\n"),
            ("node_modules/x/index.js", ""),
        ]);
        let ctx = context(&dir);
        assert!(ctx.file_exists("app/models.py"));
        assert!(!ctx.file_exists("node_modules/x/index.js"));
        assert!(ctx.has_directory("app"));
        assert_eq!(ctx.files_named("requirements*.txt").len(), 1);
        assert_eq!(ctx.python_files().count(), 1);
    }

    #[test]
    fn test_fact_sheets_are_cached() {
        let dir = project(&[("a.py", "import os\n")]);
        let ctx = context(&dir);
        let first = ctx.fact_sheet(Path::new("a.py")).unwrap();
        let second = ctx.fact_sheet(Path::new("a.py")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(ctx.imports_any(&["os"]));
        assert!(!ctx.imports_any(&["sys"]));
    }

    #[test]
    fn test_profile_sums_satisfied_phases() {
        const PROFILE: DetectionProfile = DetectionProfile {
            marker_files: &["manage.py"],
            marker_weight: 0.4,
            import_prefixes: &["django"],
            content_files: PYTHON_MANIFESTS,
            content_patterns: &[r"(?im)^\s*django\b"],
            content_weight: 0.4,
            directories: &["migrations"],
            structure_weight: 0.2,
        };
        let dir = project(&[("manage.py", ""), ("requirements.txt", "Django==5.0\n")]);
        let ctx = context(&dir);
        assert!((PROFILE.confidence(&ctx) - 0.8).abs() < 1e-9);

        let empty = project(&[("README.md", "")]);
        assert_eq!(PROFILE.confidence(&context(&empty)), 0.0);
    }

    #[test]
    fn test_in_directory() {
        assert!(PluginContext::in_directory(Path::new("app/migrations/0001.py"), "migrations"));
        assert!(!PluginContext::in_directory(Path::new("migrations.py"), "migrations"));
    }
}
