//! Combined output of one CLI run

use super::dependency_graph::{CouplingMetrics, DependencyGraph, DependencyGraphAnalysis};
use super::detection::{DetectionResult, EnrichmentResult};
use super::pattern::PatternMatchResult;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Neighbourhood of one module in the dependency graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleReport {
    pub module: String,
    pub coupling: CouplingMetrics,
    pub dependencies: Vec<String>,
    pub dependents: Vec<String>,
    /// Longest path from a root; null when the graph is cyclic
    pub depth: Option<usize>,
}

impl ModuleReport {
    /// Fails with `ModuleNotFound` when the module is not in the graph
    pub fn from_graph(graph: &DependencyGraph, module: &str) -> Result<Self> {
        Ok(Self {
            module: module.to_string(),
            coupling: graph.coupling_for(module)?,
            dependencies: graph.dependencies(module)?,
            dependents: graph.dependents(module)?,
            depth: graph.depth(module)?,
        })
    }
}

/// Everything a run produced; sections not requested stay empty
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub project_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection: Option<DetectionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<EnrichmentResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph: Option<DependencyGraphAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<ModuleReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patterns: Option<Vec<PatternMatchResult>>,
}

impl ScanReport {
    pub fn new(project_path: impl Into<PathBuf>) -> Self {
        Self {
            project_path: project_path.into(),
            detection: None,
            enrichment: None,
            graph: None,
            module: None,
            patterns: None,
        }
    }
}
