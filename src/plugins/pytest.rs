//! pytest test framework plugin

use super::{DetectionProfile, PluginContext, TechnologyPlugin, PYTHON_MANIFESTS};
use crate::error::Result;
use crate::models::detection::{ArtifactKind, DerivedArtifact, FactValue, TechnologyFacts};
use glob::Pattern;

const PROFILE: DetectionProfile = DetectionProfile {
    marker_files: &["pytest.ini", "conftest.py"],
    marker_weight: 0.4,
    import_prefixes: &["pytest"],
    content_files: PYTHON_MANIFESTS,
    content_patterns: &[r#"(?im)^\s*["']?pytest\b"#, r"(?m)^\[tool\.pytest"],
    content_weight: 0.3,
    directories: &["tests", "test"],
    structure_weight: 0.3,
};

pub struct PytestPlugin;

impl PytestPlugin {
    fn is_test_file(name: &str) -> bool {
        ["test_*.py", "*_test.py"]
            .iter()
            .filter_map(|p| Pattern::new(p).ok())
            .any(|p| p.matches(name))
    }
}

impl TechnologyPlugin for PytestPlugin {
    fn technology(&self) -> &str {
        "pytest"
    }

    fn detect(&self, ctx: &PluginContext) -> f64 {
        PROFILE.confidence(ctx)
    }

    fn extract_facts(&self, ctx: &PluginContext) -> Result<TechnologyFacts> {
        let mut test_files = 0;
        let mut test_functions = 0;
        let mut fixtures = Vec::new();
        let mut parametrized = 0;

        for (path, sheet) in ctx.fact_sheets() {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if Self::is_test_file(&name) {
                test_files += 1;
                test_functions += sheet
                    .functions()
                    .filter(|f| f.name.starts_with("test"))
                    .count();
            }
            for function in sheet.functions() {
                if function.has_decorator("fixture") {
                    fixtures.push(function.name.clone());
                }
                if function.has_decorator("parametrize") {
                    parametrized += 1;
                }
            }
        }
        fixtures.sort();
        fixtures.dedup();

        let mut facts = TechnologyFacts::new();
        facts
            .insert("test_file_count", FactValue::Count(test_files))
            .insert("test_function_count", FactValue::Count(test_functions))
            .insert("parametrized_tests", FactValue::Count(parametrized))
            .insert("fixtures", FactValue::Names(fixtures))
            .insert("has_conftest", FactValue::Flag(!ctx.files_named("conftest.py").is_empty()));
        Ok(facts)
    }

    fn generate_derived_artifacts(
        &self,
        _ctx: &PluginContext,
        facts: &TechnologyFacts,
    ) -> Result<Vec<DerivedArtifact>> {
        let mut artifacts = vec![DerivedArtifact::new(
            ArtifactKind::Rule,
            "pytest-naming",
            "Name test modules `test_*.py` and test functions `test_*` so pytest collects them.",
        )];
        let fixtures = facts.names("fixtures");
        if !fixtures.is_empty() {
            artifacts.push(DerivedArtifact::new(
                ArtifactKind::Rule,
                "pytest-fixtures",
                format!(
                    "Reuse the shared fixtures before writing new setup code: {}.",
                    fixtures.join(", ")
                ),
            ));
        }
        artifacts.push(DerivedArtifact::new(
            ArtifactKind::Documentation,
            "pytest-overview",
            format!(
                "{} tests in {} files, {} fixtures.",
                facts.count("test_function_count"),
                facts.count("test_file_count"),
                fixtures.len(),
            ),
        ));
        Ok(artifacts)
    }
}
