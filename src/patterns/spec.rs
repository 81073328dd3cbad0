//! Directory-based architecture pattern specifications and scoring

use super::violations::ViolationRule;
use crate::error::{ArchscanError, Result};
use crate::models::detection::clamp_confidence;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, PathBuf};

/// Weight of the optional-directory bonus and the forbidden-directory penalty
pub const OPTIONAL_BONUS: f64 = 0.5;
pub const FORBIDDEN_PENALTY: f64 = 0.5;

/// Confidence added per naming convention found, and its cap
pub const NAMING_BONUS: f64 = 0.05;
pub const MAX_NAMING_BONUS: f64 = 0.15;

/// Declarative description of one architecture style
#[derive(Debug, Clone, PartialEq)]
pub struct PatternSpec {
    pub name: String,
    pub required: Vec<String>,
    pub optional: Vec<String>,
    pub forbidden: Vec<String>,
    /// Other directory names that satisfy a required or optional directory
    pub alternatives: BTreeMap<String, Vec<String>>,
    /// Class name suffixes typical for the style, e.g. `Repository`
    pub class_suffixes: Vec<String>,
    pub violation_rules: Vec<ViolationRule>,
}

impl PatternSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            required: Vec::new(),
            optional: Vec::new(),
            forbidden: Vec::new(),
            alternatives: BTreeMap::new(),
            class_suffixes: Vec::new(),
            violation_rules: Vec::new(),
        }
    }

    pub fn required(mut self, dirs: &[&str]) -> Self {
        self.required = dirs.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn optional(mut self, dirs: &[&str]) -> Self {
        self.optional = dirs.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn forbidden(mut self, dirs: &[&str]) -> Self {
        self.forbidden = dirs.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn alternative(mut self, dir: &str, names: &[&str]) -> Self {
        self.alternatives
            .insert(dir.to_string(), names.iter().map(|n| n.to_string()).collect());
        self
    }

    pub fn class_suffixes(mut self, suffixes: &[&str]) -> Self {
        self.class_suffixes = suffixes.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn rule(mut self, source_dir: &str, forbidden_segment: &str, violation_type: &str) -> Self {
        self.violation_rules
            .push(ViolationRule::new(source_dir, forbidden_segment, violation_type));
        self
    }

    /// A directory name followed by its alternatives
    pub fn names_for<'a>(&'a self, dir: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        std::iter::once(dir).chain(
            self.alternatives
                .get(dir)
                .into_iter()
                .flatten()
                .map(String::as_str),
        )
    }

    /// Reject specs that can never produce a meaningful score
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| Err(ArchscanError::invalid_pattern(self.name.clone(), message));
        if self.name.trim().is_empty() {
            return invalid("pattern name must not be empty");
        }
        if self.required.is_empty() {
            return invalid("at least one required directory is needed");
        }
        let mut all = self
            .required
            .iter()
            .chain(&self.optional)
            .chain(&self.forbidden)
            .chain(self.alternatives.values().flatten());
        if all.any(|d| d.trim().is_empty() || d.contains('/')) {
            return invalid("directory names must be single, non-empty path segments");
        }
        if let Some(dir) = self.required.iter().find(|d| self.forbidden.contains(d)) {
            return Err(ArchscanError::invalid_pattern(
                self.name.clone(),
                format!("'{}' is both required and forbidden", dir),
            ));
        }
        for rule in &self.violation_rules {
            rule.validate(&self.name)?;
        }
        Ok(())
    }
}

/// Every directory name present anywhere in a project
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryTree {
    names: BTreeSet<String>,
}

impl DirectoryTree {
    /// Build from directory paths relative to the project root
    pub fn from_paths<'a>(paths: impl IntoIterator<Item = &'a PathBuf>) -> Self {
        let names = paths
            .into_iter()
            .flat_map(|p| p.components())
            .filter_map(|c| match c {
                Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        Self { names }
    }

    pub fn from_names(names: &[&str]) -> Self {
        Self {
            names: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The first of `dir` and its alternatives that exists
    pub fn find<'a>(&self, spec: &'a PatternSpec, dir: &'a str) -> Option<&'a str> {
        spec.names_for(dir).find(|name| self.contains(name))
    }
}

/// Structural score with the evidence behind it
#[derive(Debug, Clone, PartialEq)]
pub struct StructuralScore {
    /// Unclamped structural score
    pub score: f64,
    pub evidence: Vec<String>,
    pub forbidden_present: Vec<String>,
}

/// Structural score of `tree` against `spec`, clamped to [0, 1]
pub fn score(tree: &DirectoryTree, spec: &PatternSpec) -> f64 {
    clamp_confidence(evaluate(tree, spec).score)
}

/// Required ratio, plus the optional bonus, minus the forbidden penalty
pub fn evaluate(tree: &DirectoryTree, spec: &PatternSpec) -> StructuralScore {
    let mut evidence = Vec::new();

    let mut matched_required = 0;
    for dir in &spec.required {
        if let Some(found) = tree.find(spec, dir) {
            matched_required += 1;
            evidence.push(describe("required", dir, found));
        }
    }

    let mut matched_optional = false;
    for dir in &spec.optional {
        if let Some(found) = tree.find(spec, dir) {
            matched_optional = true;
            evidence.push(describe("optional", dir, found));
        }
    }

    let forbidden_present: Vec<String> = spec
        .forbidden
        .iter()
        .filter(|d| tree.contains(d))
        .cloned()
        .collect();

    let mut score = if spec.required.is_empty() {
        0.0
    } else {
        matched_required as f64 / spec.required.len() as f64
    };
    if matched_optional {
        score += OPTIONAL_BONUS;
    }
    if !forbidden_present.is_empty() {
        score -= FORBIDDEN_PENALTY;
    }

    StructuralScore {
        score,
        evidence,
        forbidden_present,
    }
}

fn describe(kind: &str, dir: &str, found: &str) -> String {
    if dir == found {
        format!("{} directory: {}/", kind, dir)
    } else {
        format!("{} directory: {}/ (as {}/)", kind, dir, found)
    }
}
