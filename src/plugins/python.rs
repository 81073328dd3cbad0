//! Python language plugin

use super::{PluginContext, TechnologyPlugin, PYTHON_MANIFESTS};
use crate::error::Result;
use crate::models::detection::{ArtifactKind, DerivedArtifact, FactValue, TechnologyFacts};
use std::path::Path;

/// Functions above this complexity are flagged in the derived rule
const COMPLEXITY_THRESHOLD: u32 = 10;

pub struct PythonPlugin;

impl PythonPlugin {
    fn requires_python(ctx: &PluginContext) -> Option<String> {
        let text = ctx.read_text(Path::new("pyproject.toml"))?;
        let value: toml::Table = toml::from_str(&text).ok()?;
        value
            .get("project")
            .and_then(|p| p.get("requires-python"))
            .or_else(|| {
                value
                    .get("tool")
                    .and_then(|t| t.get("poetry"))
                    .and_then(|p| p.get("dependencies"))
                    .and_then(|d| d.get("python"))
            })
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }
}

impl TechnologyPlugin for PythonPlugin {
    fn technology(&self) -> &str {
        "python"
    }

    /// Source files alone clear the default threshold; manifests and
    /// packages only add to it
    fn detect(&self, ctx: &PluginContext) -> f64 {
        let mut score = 0.0;
        if ctx.python_files().next().is_some() {
            score += 0.6;
        }
        if PYTHON_MANIFESTS.iter().any(|m| !ctx.files_named(m).is_empty()) {
            score += 0.3;
        }
        if !ctx.files_named("__init__.py").is_empty() {
            score += 0.1;
        }
        score
    }

    fn extract_facts(&self, ctx: &PluginContext) -> Result<TechnologyFacts> {
        let sheets = ctx.fact_sheets();
        let module_count = ctx.python_files().count();

        let mut classes = 0;
        let mut functions = 0;
        let mut async_functions = 0;
        let mut complexities = Vec::new();
        let mut complex = Vec::new();
        let mut annotated = 0;
        for (path, sheet) in &sheets {
            classes += sheet.classes().count();
            for function in sheet.functions() {
                functions += 1;
                if function.is_async {
                    async_functions += 1;
                }
            }
            for (name, &value) in &sheet.complexity {
                complexities.push(value);
                if value > COMPLEXITY_THRESHOLD {
                    complex.push(format!("{}:{}", path.display(), name));
                }
            }
            annotated += sheet
                .module_variables
                .iter()
                .filter(|v| v.type_hint.is_some())
                .count();
        }

        let average = if complexities.is_empty() {
            0.0
        } else {
            complexities.iter().map(|&c| c as f64).sum::<f64>() / complexities.len() as f64
        };

        let mut facts = TechnologyFacts::new();
        facts
            .insert("module_count", FactValue::Count(module_count))
            .insert("parsed_module_count", FactValue::Count(sheets.len()))
            .insert("package_count", FactValue::Count(ctx.files_named("__init__.py").len()))
            .insert("class_count", FactValue::Count(classes))
            .insert("function_count", FactValue::Count(functions))
            .insert("async_function_count", FactValue::Count(async_functions))
            .insert(
                "max_complexity",
                FactValue::Count(complexities.iter().copied().max().unwrap_or(0) as usize),
            )
            .insert("average_complexity", FactValue::Ratio(average))
            .insert("complex_functions", FactValue::Names(complex))
            .insert("annotated_module_variables", FactValue::Count(annotated));
        if let Some(version) = Self::requires_python(ctx) {
            facts.insert("requires_python", FactValue::Text(version));
        }
        Ok(facts)
    }

    fn generate_derived_artifacts(
        &self,
        _ctx: &PluginContext,
        facts: &TechnologyFacts,
    ) -> Result<Vec<DerivedArtifact>> {
        let mut artifacts = Vec::new();

        let complex = facts.names("complex_functions");
        let mut rule = format!(
            "Keep function cyclomatic complexity at or below {}.",
            COMPLEXITY_THRESHOLD
        );
        if !complex.is_empty() {
            rule.push_str(&format!(
                " {} declarations currently exceed it: {}.",
                complex.len(),
                complex.join(", ")
            ));
        }
        artifacts.push(DerivedArtifact::new(ArtifactKind::Rule, "python-complexity", rule));

        if facts.count("async_function_count") > 0 {
            artifacts.push(DerivedArtifact::new(
                ArtifactKind::Rule,
                "python-async",
                "Never call blocking I/O from `async def` functions; use the async client of each library.",
            ));
        }

        let mut overview = format!(
            "{} modules in {} packages, {} classes and {} functions.",
            facts.count("module_count"),
            facts.count("package_count"),
            facts.count("class_count"),
            facts.count("function_count"),
        );
        if let Some(FactValue::Text(version)) = facts.get("requires_python") {
            overview.push_str(&format!(" Requires Python {}.", version));
        }
        artifacts.push(DerivedArtifact::new(
            ArtifactKind::Documentation,
            "python-overview",
            overview,
        ));
        Ok(artifacts)
    }
}
