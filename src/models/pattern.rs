//! Architecture pattern match results

use serde::{Deserialize, Serialize};

/// A structural rule broken by the project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    #[serde(rename = "type")]
    pub violation_type: String,
    pub detail: String,
}

impl Violation {
    pub fn new(violation_type: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            violation_type: violation_type.into(),
            detail: detail.into(),
        }
    }
}

/// How well a project matches one architecture style
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMatchResult {
    pub pattern_name: String,
    pub confidence: f64,
    pub evidence: Vec<String>,
    pub violations: Vec<Violation>,
}

impl PatternMatchResult {
    pub fn is_match(&self, threshold: f64) -> bool {
        self.confidence >= threshold
    }
}
