//! Technology detection, boosting and plugin isolation

use super::fixtures::{django_hexagonal, project};
use archscan::core::GlobIgnore;
use archscan::detection::{apply_boosting, TechnologyEdge, TechnologyGraph};
use archscan::error::Result;
use archscan::models::detection::{DerivedArtifact, FactValue, PluginStage, TechnologyFacts, TechnologyMatch};
use archscan::plugins::{PluginContext, PluginRegistry, TechnologyPlugin};
use archscan::{ArchscanError, DetectionOrchestrator, Settings};
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;

fn orchestrator() -> DetectionOrchestrator {
    let settings = Settings::default();
    let ignore = Arc::new(GlobIgnore::from_settings(&settings).unwrap());
    DetectionOrchestrator::new(&settings, ignore).unwrap()
}

#[test]
fn test_django_project_detection_and_enrichment() {
    let dir = django_hexagonal();
    let (detection, enrichment) = orchestrator().detect_and_enrich(dir.path()).unwrap();

    let django = detection.confidence("django").unwrap();
    assert!(django >= 0.8);
    assert!(detection.confidence("python").unwrap() >= django);
    assert!(!detection.contains("text"), "generic formats are suppressed");

    let facts = &enrichment.facts["django"];
    assert_eq!(facts.count("model_count"), 1);
    assert_eq!(facts.names("models"), ["OrderAdapter".to_string()]);
    assert!(enrichment.failures.is_empty());
}

#[test]
fn test_hard_edge_raises_parent_to_child_confidence() {
    let graph = TechnologyGraph::new(vec![TechnologyEdge::hard("django", "python")]).unwrap();
    let mut matches = BTreeMap::new();
    matches.insert("django".to_string(), TechnologyMatch::new("django", 1.0));
    matches.insert("python".to_string(), TechnologyMatch::new("python", 0.5));

    assert_eq!(apply_boosting(&mut matches, &graph, 0.5), 1);
    assert_eq!(matches["python"].confidence, 1.0);
    assert_eq!(matches["django"].confidence, 1.0);
}

#[test]
fn test_technology_graph_rejects_self_edges() {
    let err = TechnologyGraph::new(vec![TechnologyEdge::hard("python", "python")]).unwrap_err();
    assert!(matches!(err, ArchscanError::InvalidTechnologyEdge { .. }));
}

struct Steady(&'static str);

impl TechnologyPlugin for Steady {
    fn technology(&self) -> &str {
        self.0
    }

    fn detect(&self, _ctx: &PluginContext) -> f64 {
        0.9
    }

    fn extract_facts(&self, _ctx: &PluginContext) -> Result<TechnologyFacts> {
        let mut facts = TechnologyFacts::new();
        facts.insert("plugin", FactValue::Text(self.0.to_string()));
        Ok(facts)
    }

    fn generate_derived_artifacts(&self, _ctx: &PluginContext, _facts: &TechnologyFacts) -> Result<Vec<DerivedArtifact>> {
        Ok(Vec::new())
    }
}

struct Failing;

impl TechnologyPlugin for Failing {
    fn technology(&self) -> &str {
        "javascript"
    }

    fn detect(&self, _ctx: &PluginContext) -> f64 {
        0.9
    }

    fn extract_facts(&self, _ctx: &PluginContext) -> Result<TechnologyFacts> {
        Err(ArchscanError::analysis_error("cannot read bundle"))
    }

    fn generate_derived_artifacts(&self, _ctx: &PluginContext, _facts: &TechnologyFacts) -> Result<Vec<DerivedArtifact>> {
        Ok(Vec::new())
    }
}

#[test]
fn test_one_failing_plugin_does_not_affect_the_others() {
    let dir = project(&[("app.py", "x = 1\n"), ("web/index.js", "let x = 1;\n"), ("run.sh", "echo hi\n")]);
    let mut registry = PluginRegistry::new();
    registry.register("python", || Box::new(Steady("python")));
    registry.register("shell", || Box::new(Steady("shell")));
    registry.register("javascript", || Box::new(Failing));

    let (detection, enrichment) = orchestrator()
        .with_registry(registry)
        .detect_and_enrich(dir.path())
        .unwrap();

    assert!(detection.contains("python"));
    assert!(detection.contains("shell"));
    assert!(detection.contains("javascript"));

    assert_eq!(enrichment.facts.len(), 2);
    assert!(enrichment.facts["python"].get("plugin").is_some());
    assert!(enrichment.facts["shell"].get("plugin").is_some());
    assert!(!enrichment.facts.contains_key("javascript"));

    assert_eq!(enrichment.failures.len(), 1);
    assert_eq!(enrichment.failures[0].technology, "javascript");
    assert_eq!(enrichment.failures[0].stage, PluginStage::ExtractFacts);
    assert!(enrichment.failures[0].message.contains("cannot read bundle"));
}

fn arb_matches() -> impl Strategy<Value = BTreeMap<String, f64>> {
    let names = prop::sample::select(vec!["django", "flask", "fastapi", "pytest", "python", "pydantic", "alembic", "sqlalchemy"]);
    prop::collection::btree_map(names.prop_map(String::from), 0.0f64..=1.0, 0..6)
}

proptest! {
    #[test]
    fn prop_boosting_never_lowers_confidence(input in arb_matches()) {
        let graph = TechnologyGraph::builtin().unwrap();
        let mut matches: BTreeMap<String, TechnologyMatch> = input
            .iter()
            .map(|(name, confidence)| (name.clone(), TechnologyMatch::new(name.as_str(), *confidence)))
            .collect();

        apply_boosting(&mut matches, &graph, 0.5);
        for (name, before) in &input {
            prop_assert!(matches[name].confidence >= *before);
        }
        for found in matches.values() {
            prop_assert!((0.0..=1.0).contains(&found.confidence));
        }
    }
}
