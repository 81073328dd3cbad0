//! JavaScript / Node.js plugin

use super::{DetectionProfile, PluginContext, TechnologyPlugin};
use crate::error::{ArchscanError, Result};
use crate::models::detection::{ArtifactKind, DerivedArtifact, FactValue, TechnologyFacts};
use serde_json::Value;
use std::path::Path;

const PROFILE: DetectionProfile = DetectionProfile {
    marker_files: &["package.json"],
    marker_weight: 0.4,
    import_prefixes: &[],
    content_files: &["*.js", "*.mjs", "*.cjs", "*.jsx"],
    content_patterns: &[
        r"(?m)^\s*import\s",
        r"\brequire\s*\(",
        r"(?m)^\s*export\s",
        r"(?m)^\s*(async\s+)?function\s",
        r"(?m)^\s*(const|let)\s+\w+\s*=",
    ],
    content_weight: 0.4,
    directories: &["public", "static"],
    structure_weight: 0.2,
};

const JS_EXTENSIONS: &[&str] = &["js", "mjs", "cjs", "jsx"];

pub struct JavaScriptPlugin;

impl JavaScriptPlugin {
    fn manifest(ctx: &PluginContext) -> Result<Option<Value>> {
        let path = Path::new("package.json");
        let Some(text) = ctx.read_text(path) else {
            return Ok(None);
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| ArchscanError::json_parse_error(ctx.root().join(path), e))
    }
}

fn section_len(manifest: &Value, key: &str) -> usize {
    manifest
        .get(key)
        .and_then(Value::as_object)
        .map(|o| o.len())
        .unwrap_or(0)
}

impl TechnologyPlugin for JavaScriptPlugin {
    fn technology(&self) -> &str {
        "javascript"
    }

    fn detect(&self, ctx: &PluginContext) -> f64 {
        PROFILE.confidence(ctx)
    }

    fn extract_facts(&self, ctx: &PluginContext) -> Result<TechnologyFacts> {
        let mut facts = TechnologyFacts::new();
        facts
            .insert("source_file_count", FactValue::Count(ctx.files_with_extension(JS_EXTENSIONS).count()))
            .insert(
                "uses_typescript",
                FactValue::Flag(
                    ctx.file_exists("tsconfig.json") || ctx.files_with_extension(&["ts", "tsx"]).next().is_some(),
                ),
            );

        // A broken package.json is a plugin failure, not an empty result
        if let Some(manifest) = Self::manifest(ctx)? {
            let text = |key: &str| manifest.get(key).and_then(Value::as_str).map(str::to_string);
            if let Some(name) = text("name") {
                facts.insert("package_name", FactValue::Text(name));
            }
            if let Some(version) = text("version") {
                facts.insert("package_version", FactValue::Text(version));
            }
            facts
                .insert(
                    "module_type",
                    FactValue::Text(text("type").unwrap_or_else(|| "commonjs".to_string())),
                )
                .insert("dependency_count", FactValue::Count(section_len(&manifest, "dependencies")))
                .insert(
                    "dev_dependency_count",
                    FactValue::Count(section_len(&manifest, "devDependencies")),
                );
            let scripts: Vec<String> = manifest
                .get("scripts")
                .and_then(Value::as_object)
                .map(|o| o.keys().cloned().collect())
                .unwrap_or_default();
            facts.insert("scripts", FactValue::Names(scripts));
        }
        Ok(facts)
    }

    fn generate_derived_artifacts(
        &self,
        _ctx: &PluginContext,
        facts: &TechnologyFacts,
    ) -> Result<Vec<DerivedArtifact>> {
        let mut artifacts = Vec::new();
        if let Some(FactValue::Text(module_type)) = facts.get("module_type") {
            let rule = if module_type == "module" {
                "Use ES module `import`/`export`; `require` is unavailable in this package."
            } else {
                "Use CommonJS `require`/`module.exports` unless a file is named `.mjs`."
            };
            artifacts.push(DerivedArtifact::new(ArtifactKind::Rule, "javascript-modules", rule));
        }
        let scripts = facts.names("scripts");
        if !scripts.is_empty() {
            artifacts.push(DerivedArtifact::new(
                ArtifactKind::Documentation,
                "javascript-scripts",
                format!("Available npm scripts: {}.", scripts.join(", ")),
            ));
        }
        let name = match facts.get("package_name") {
            Some(FactValue::Text(name)) => name.as_str(),
            _ => "unnamed package",
        };
        artifacts.push(DerivedArtifact::new(
            ArtifactKind::Documentation,
            "javascript-overview",
            format!(
                "{}: {} source files, {} dependencies, {} dev dependencies.",
                name,
                facts.count("source_file_count"),
                facts.count("dependency_count"),
                facts.count("dev_dependency_count"),
            ),
        ));
        Ok(artifacts)
    }
}
