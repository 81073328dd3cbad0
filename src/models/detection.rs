//! Technology detection results and plugin enrichment output

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Where a piece of detection evidence came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceType {
    Extension,
    ConfigFile,
    Directory,
    ImportStatement,
    Dependency,
}

impl std::fmt::Display for EvidenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvidenceType::Extension => write!(f, "extension"),
            EvidenceType::ConfigFile => write!(f, "config_file"),
            EvidenceType::Directory => write!(f, "directory"),
            EvidenceType::ImportStatement => write!(f, "import_statement"),
            EvidenceType::Dependency => write!(f, "dependency"),
        }
    }
}

/// One detected technology
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnologyMatch {
    pub technology: String,
    /// Confidence in [0, 1]
    pub confidence: f64,
    pub evidence: Vec<String>,
    pub evidence_types: Vec<EvidenceType>,
}

impl TechnologyMatch {
    pub fn new(technology: impl Into<String>, confidence: f64) -> Self {
        Self {
            technology: technology.into(),
            confidence: clamp_confidence(confidence),
            evidence: Vec::new(),
            evidence_types: Vec::new(),
        }
    }

    /// Add typed evidence; evidence types are kept unique
    pub fn add_evidence(&mut self, kind: EvidenceType, detail: impl Into<String>) {
        let detail = detail.into();
        if !self.evidence.contains(&detail) {
            self.evidence.push(detail);
        }
        if !self.evidence_types.contains(&kind) {
            self.evidence_types.push(kind);
        }
    }

    /// Add an untyped note, such as a boosting reason
    pub fn add_note(&mut self, detail: impl Into<String>) {
        let detail = detail.into();
        if !self.evidence.contains(&detail) {
            self.evidence.push(detail);
        }
    }
}

/// Clamp to [0, 1], mapping NaN to 0
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Final technology match set for one project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResult {
    pub matches: BTreeMap<String, TechnologyMatch>,
    pub scan_time_ms: u64,
    pub project_path: PathBuf,
    /// Absorbed plugin failures
    pub warnings: Vec<String>,
}

impl DetectionResult {
    pub fn confidence(&self, technology: &str) -> Option<f64> {
        self.matches.get(technology).map(|m| m.confidence)
    }

    pub fn contains(&self, technology: &str) -> bool {
        self.matches.contains_key(technology)
    }

    /// Matches ordered by descending confidence, then name
    pub fn ranked(&self) -> Vec<&TechnologyMatch> {
        let mut ranked: Vec<&TechnologyMatch> = self.matches.values().collect();
        ranked.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.technology.cmp(&b.technology))
        });
        ranked
    }
}

/// A typed plugin fact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum FactValue {
    Count(usize),
    Flag(bool),
    Ratio(f64),
    Text(String),
    Names(Vec<String>),
}

impl std::fmt::Display for FactValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FactValue::Count(n) => write!(f, "{}", n),
            FactValue::Flag(b) => write!(f, "{}", if *b { "yes" } else { "no" }),
            FactValue::Ratio(r) => write!(f, "{:.2}", r),
            FactValue::Text(t) => write!(f, "{}", t),
            FactValue::Names(names) => write!(f, "{}", names.join(", ")),
        }
    }
}

/// Facts a plugin extracted about its technology
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnologyFacts {
    pub values: BTreeMap<String, FactValue>,
}

impl TechnologyFacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: FactValue) -> &mut Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&FactValue> {
        self.values.get(key)
    }

    pub fn count(&self, key: &str) -> usize {
        match self.values.get(key) {
            Some(FactValue::Count(n)) => *n,
            _ => 0,
        }
    }

    pub fn flag(&self, key: &str) -> bool {
        matches!(self.values.get(key), Some(FactValue::Flag(true)))
    }

    pub fn names(&self, key: &str) -> &[String] {
        match self.values.get(key) {
            Some(FactValue::Names(names)) => names,
            _ => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Kind of artifact a plugin derives from its facts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Rule,
    Documentation,
    Configuration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedArtifact {
    pub kind: ArtifactKind,
    pub name: String,
    pub content: String,
}

impl DerivedArtifact {
    pub fn new(kind: ArtifactKind, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Enrichment stage a plugin failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginStage {
    Detect,
    ExtractFacts,
    GenerateArtifacts,
}

impl std::fmt::Display for PluginStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PluginStage::Detect => write!(f, "detect"),
            PluginStage::ExtractFacts => write!(f, "extract_facts"),
            PluginStage::GenerateArtifacts => write!(f, "generate_derived_artifacts"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginFailure {
    pub technology: String,
    pub stage: PluginStage,
    pub message: String,
}

/// Output of the enrichment pass over detected plugins
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichmentResult {
    pub facts: BTreeMap<String, TechnologyFacts>,
    pub artifacts: BTreeMap<String, Vec<DerivedArtifact>>,
    pub failures: Vec<PluginFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(TechnologyMatch::new("x", 1.7).confidence, 1.0);
        assert_eq!(TechnologyMatch::new("x", -0.2).confidence, 0.0);
        assert_eq!(clamp_confidence(f64::NAN), 0.0);
    }

    #[test]
    fn test_evidence_types_are_unique() {
        let mut m = TechnologyMatch::new("python", 0.6);
        m.add_evidence(EvidenceType::Extension, "12 .py files");
        m.add_evidence(EvidenceType::Extension, "3 .pyi files");
        m.add_evidence(EvidenceType::ConfigFile, "pyproject.toml");
        assert_eq!(m.evidence.len(), 3);
        assert_eq!(
            m.evidence_types,
            vec![EvidenceType::Extension, EvidenceType::ConfigFile]
        );
    }

    #[test]
    fn test_ranked_orders_by_confidence() {
        let mut matches = BTreeMap::new();
        matches.insert("a".to_string(), TechnologyMatch::new("a", 0.6));
        matches.insert("b".to_string(), TechnologyMatch::new("b", 0.9));
        let result = DetectionResult {
            matches,
            scan_time_ms: 1,
            project_path: PathBuf::from("."),
            warnings: vec![],
        };
        let ranked: Vec<&str> = result.ranked().iter().map(|m| m.technology.as_str()).collect();
        assert_eq!(ranked, vec!["b", "a"]);
    }

    #[test]
    fn test_fact_value_serialization() {
        let mut facts = TechnologyFacts::new();
        facts.insert("models", FactValue::Count(3));
        let json = serde_json::to_value(&facts).unwrap();
        assert_eq!(json["values"]["models"]["type"], "count");
        assert_eq!(json["values"]["models"]["value"], 3);
        assert_eq!(facts.count("models"), 3);
        assert_eq!(facts.count("missing"), 0);
    }
}
