//! Flask web framework plugin

use super::{DetectionProfile, PluginContext, TechnologyPlugin, PYTHON_MANIFESTS};
use crate::error::Result;
use crate::models::detection::{ArtifactKind, DerivedArtifact, FactValue, TechnologyFacts};

const PROFILE: DetectionProfile = DetectionProfile {
    marker_files: &["app.py", "wsgi.py"],
    marker_weight: 0.2,
    import_prefixes: &["flask"],
    content_files: PYTHON_MANIFESTS,
    content_patterns: &[r#"(?im)^\s*["']?flask\b"#],
    content_weight: 0.6,
    directories: &["templates", "static"],
    structure_weight: 0.2,
};

const ROUTE_DECORATORS: &[&str] = &["route", "get", "post", "put", "patch", "delete"];

pub struct FlaskPlugin;

impl TechnologyPlugin for FlaskPlugin {
    fn technology(&self) -> &str {
        "flask"
    }

    fn detect(&self, ctx: &PluginContext) -> f64 {
        PROFILE.confidence(ctx)
    }

    fn extract_facts(&self, ctx: &PluginContext) -> Result<TechnologyFacts> {
        let mut routes = 0;
        let mut blueprints = false;
        let mut app_factory = false;

        for (_, sheet) in ctx.fact_sheets() {
            if !sheet.imports_module("flask") {
                continue;
            }
            blueprints |= sheet
                .import_statements
                .iter()
                .any(|s| s.names.iter().any(|n| n == "Blueprint"));
            for function in sheet.functions() {
                if function.parent.is_none() && function.name == "create_app" {
                    app_factory = true;
                }
                // Only dotted decorators: `@app.get`, not a bare `@get`
                if function
                    .decorators
                    .iter()
                    .any(|d| d.contains('.') && ROUTE_DECORATORS.iter().any(|r| decorator_is(d, r)))
                {
                    routes += 1;
                }
            }
        }

        let mut facts = TechnologyFacts::new();
        facts
            .insert("route_count", FactValue::Count(routes))
            .insert("uses_blueprints", FactValue::Flag(blueprints))
            .insert("app_factory", FactValue::Flag(app_factory))
            .insert("has_templates", FactValue::Flag(ctx.has_directory("templates")));
        Ok(facts)
    }

    fn generate_derived_artifacts(
        &self,
        _ctx: &PluginContext,
        facts: &TechnologyFacts,
    ) -> Result<Vec<DerivedArtifact>> {
        let mut artifacts = Vec::new();
        if facts.flag("app_factory") {
            artifacts.push(DerivedArtifact::new(
                ArtifactKind::Rule,
                "flask-app-factory",
                "Create the application through `create_app()`; never import a global app instance from extensions or blueprints.",
            ));
        }
        if facts.flag("uses_blueprints") {
            artifacts.push(DerivedArtifact::new(
                ArtifactKind::Rule,
                "flask-blueprints",
                "Register new routes on a blueprint, not on the application object.",
            ));
        }
        artifacts.push(DerivedArtifact::new(
            ArtifactKind::Documentation,
            "flask-overview",
            format!(
                "{} routes; blueprints: {}; templates: {}.",
                facts.count("route_count"),
                FactValue::Flag(facts.flag("uses_blueprints")),
                FactValue::Flag(facts.flag("has_templates")),
            ),
        ));
        Ok(artifacts)
    }
}

fn decorator_is(decorator: &str, name: &str) -> bool {
    decorator.rsplit('.').next() == Some(name)
}
