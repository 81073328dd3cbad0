//! Scores a project against every architecture pattern spec

use super::builtin::builtin_specs;
use super::spec::{evaluate, DirectoryTree, PatternSpec, MAX_NAMING_BONUS, NAMING_BONUS};
use super::violations::find_violations;
use crate::core::parallel::{CancellationToken, WorkerPool};
use crate::core::scanner::{IgnoreMatcher, Scanner};
use crate::error::{ArchscanError, Result};
use crate::models::config::Settings;
use crate::models::detection::clamp_confidence;
use crate::models::facts::FactSheet;
use crate::models::pattern::PatternMatchResult;
use crate::parsers::SourceParser;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Directory names and parsed modules of one project
struct ProjectSnapshot {
    tree: DirectoryTree,
    /// Fact sheets keyed by path relative to the root
    sheets: Vec<(PathBuf, FactSheet)>,
}

pub struct PatternMatcher {
    specs: Vec<PatternSpec>,
    ignore: Arc<dyn IgnoreMatcher>,
    parser: Arc<SourceParser>,
    pool: WorkerPool,
    file_glob: String,
    cancel: CancellationToken,
}

impl PatternMatcher {
    /// Matcher with the built-in specs
    pub fn new(settings: &Settings, ignore: Arc<dyn IgnoreMatcher>) -> Result<Self> {
        Self {
            specs: Vec::new(),
            ignore,
            parser: Arc::new(SourceParser::with_max_file_size(settings.max_file_size)),
            pool: WorkerPool::from_settings(settings)?,
            file_glob: settings.file_glob.clone(),
            cancel: CancellationToken::new(),
        }
        .with_specs(builtin_specs())
    }

    /// Replace the specs, validating each one
    pub fn with_specs(mut self, specs: Vec<PatternSpec>) -> Result<Self> {
        let mut names = HashSet::new();
        for spec in &specs {
            spec.validate()?;
            if !names.insert(spec.name.as_str()) {
                return Err(ArchscanError::invalid_pattern(spec.name.clone(), "duplicate pattern name"));
            }
        }
        self.specs = specs;
        Ok(self)
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn pattern_names(&self) -> Vec<&str> {
        self.specs.iter().map(|s| s.name.as_str()).collect()
    }

    /// Score every pattern, best match first
    pub fn match_all(&self, root: &Path) -> Result<Vec<PatternMatchResult>> {
        let project = self.snapshot(root)?;
        let mut results = Vec::with_capacity(self.specs.len());
        for spec in &self.specs {
            self.cancel.check()?;
            results.push(self.match_spec(spec, &project));
        }
        results.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        if let Some(best) = results.first() {
            info!(pattern = %best.pattern_name, confidence = best.confidence, "pattern matching complete");
        }
        Ok(results)
    }

    /// Score a single pattern by name
    pub fn match_pattern(&self, root: &Path, name: &str) -> Result<PatternMatchResult> {
        let spec = self
            .specs
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ArchscanError::UnknownPattern {
                name: name.to_string(),
            })?;
        let project = self.snapshot(root)?;
        self.cancel.check()?;
        Ok(self.match_spec(spec, &project))
    }

    fn snapshot(&self, root: &Path) -> Result<ProjectSnapshot> {
        let scanner = Scanner::new(root, Arc::clone(&self.ignore), &self.file_glob)?;
        let tree = DirectoryTree::from_paths(&scanner.directories());

        let parser = Arc::clone(&self.parser);
        let cancel = self.cancel.clone();
        let base = scanner.root().to_path_buf();
        let sheets: Vec<(PathBuf, FactSheet)> = self
            .pool
            .map(scanner.source_files(), move |path: PathBuf| {
                if cancel.is_cancelled() {
                    return None;
                }
                let sheet = parser.parse_file(&path).ok()?;
                let relative = path.strip_prefix(&base).unwrap_or(&path).to_path_buf();
                Some((relative, sheet))
            })
            .into_iter()
            .flatten()
            .collect();
        self.cancel.check()?;

        debug!(directories = tree.len(), modules = sheets.len(), "pattern snapshot ready");
        Ok(ProjectSnapshot { tree, sheets })
    }

    fn match_spec(&self, spec: &PatternSpec, project: &ProjectSnapshot) -> PatternMatchResult {
        let structural = evaluate(&project.tree, spec);
        let mut evidence = structural.evidence;
        let mut confidence = structural.score;

        // Naming conventions only refine a structural match
        if confidence > 0.0 {
            let mut bonus = 0.0;
            for suffix in &spec.class_suffixes {
                let count = project
                    .sheets
                    .iter()
                    .flat_map(|(_, sheet)| sheet.classes())
                    .filter(|c| c.name.len() > suffix.len() && c.name.ends_with(suffix.as_str()))
                    .count();
                if count > 0 {
                    bonus += NAMING_BONUS;
                    evidence.push(format!("naming: {} classes ending in {}", count, suffix));
                }
            }
            confidence += bonus.min(MAX_NAMING_BONUS);
        }

        let violations = find_violations(
            spec,
            project.sheets.iter().map(|(path, sheet)| (path.as_path(), sheet)),
            &structural.forbidden_present,
        );

        PatternMatchResult {
            pattern_name: spec.name.clone(),
            confidence: clamp_confidence(confidence),
            evidence,
            violations,
        }
    }
}
