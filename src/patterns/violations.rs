//! Static cross-layer import rules

use super::spec::PatternSpec;
use crate::error::{ArchscanError, Result};
use crate::models::facts::FactSheet;
use crate::models::pattern::Violation;
use std::path::{Component, Path};

/// Files under `source_dir` must not import modules containing
/// `forbidden_segment`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViolationRule {
    pub source_dir: String,
    pub forbidden_segment: String,
    pub violation_type: String,
}

impl ViolationRule {
    pub fn new(source_dir: &str, forbidden_segment: &str, violation_type: &str) -> Self {
        Self {
            source_dir: source_dir.to_string(),
            forbidden_segment: forbidden_segment.to_string(),
            violation_type: violation_type.to_string(),
        }
    }

    pub(crate) fn validate(&self, pattern: &str) -> Result<()> {
        if self.source_dir.is_empty() || self.forbidden_segment.is_empty() || self.violation_type.is_empty() {
            return Err(ArchscanError::invalid_pattern(pattern, "violation rules need all three fields"));
        }
        if self.source_dir == self.forbidden_segment {
            return Err(ArchscanError::invalid_pattern(
                pattern,
                format!("rule for '{}' forbids its own directory", self.source_dir),
            ));
        }
        Ok(())
    }

    /// Whether a file lives under the rule's source directory (or an
    /// alternative name of it)
    fn applies_to(&self, spec: &PatternSpec, path: &Path) -> bool {
        let Some(parent) = path.parent() else {
            return false;
        };
        parent.components().any(|c| match c {
            Component::Normal(name) => spec.names_for(&self.source_dir).any(|n| name == n),
            _ => false,
        })
    }

    fn forbids(&self, spec: &PatternSpec, module: &str) -> bool {
        module
            .split('.')
            .any(|segment| spec.names_for(&self.forbidden_segment).any(|n| n == segment))
    }
}

/// Violations of the spec's import rules across a set of fact sheets,
/// plus one `forbidden_directory` violation per forbidden directory present
pub fn find_violations<'a>(
    spec: &PatternSpec,
    sheets: impl IntoIterator<Item = (&'a Path, &'a FactSheet)>,
    forbidden_present: &[String],
) -> Vec<Violation> {
    let mut violations: Vec<Violation> = forbidden_present
        .iter()
        .map(|dir| {
            Violation::new(
                "forbidden_directory",
                format!("{}/ is not expected in a {} architecture", dir, spec.name),
            )
        })
        .collect();

    for (path, sheet) in sheets {
        for rule in &spec.violation_rules {
            if !rule.applies_to(spec, path) {
                continue;
            }
            for module in sheet.imports.iter().filter(|m| rule.forbids(spec, m)) {
                violations.push(Violation::new(
                    rule.violation_type.clone(),
                    format!("{} imports {}", path.display(), module),
                ));
            }
        }
    }
    violations
}
