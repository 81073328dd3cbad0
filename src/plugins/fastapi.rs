//! FastAPI plugin

use super::{DetectionProfile, PluginContext, TechnologyPlugin, PYTHON_MANIFESTS};
use crate::error::Result;
use crate::models::detection::{ArtifactKind, DerivedArtifact, FactValue, TechnologyFacts};

const PROFILE: DetectionProfile = DetectionProfile {
    marker_files: &["main.py"],
    marker_weight: 0.2,
    import_prefixes: &["fastapi"],
    content_files: PYTHON_MANIFESTS,
    content_patterns: &[r#"(?im)^\s*["']?fastapi\b"#],
    content_weight: 0.6,
    directories: &["routers", "api"],
    structure_weight: 0.2,
};

const HTTP_METHODS: &[&str] = &["get", "post", "put", "patch", "delete", "head", "options", "websocket"];

pub struct FastApiPlugin;

impl TechnologyPlugin for FastApiPlugin {
    fn technology(&self) -> &str {
        "fastapi"
    }

    fn detect(&self, ctx: &PluginContext) -> f64 {
        PROFILE.confidence(ctx)
    }

    fn extract_facts(&self, ctx: &PluginContext) -> Result<TechnologyFacts> {
        let mut endpoints = 0;
        let mut async_endpoints = 0;
        let mut routers = false;
        let mut schemas = Vec::new();
        let mut dependencies = false;

        for (_, sheet) in ctx.fact_sheets() {
            let uses_fastapi = sheet.imports_module("fastapi");
            if uses_fastapi {
                routers |= sheet
                    .import_statements
                    .iter()
                    .any(|s| s.names.iter().any(|n| n == "APIRouter"));
                dependencies |= sheet
                    .import_statements
                    .iter()
                    .any(|s| s.names.iter().any(|n| n == "Depends"));
                for function in sheet.functions() {
                    let is_endpoint = function.decorators.iter().any(|d| {
                        d.contains('.')
                            && d.rsplit('.')
                                .next()
                                .map(|m| HTTP_METHODS.contains(&m))
                                .unwrap_or(false)
                    });
                    if is_endpoint {
                        endpoints += 1;
                        if function.is_async {
                            async_endpoints += 1;
                        }
                    }
                }
            }
            schemas.extend(
                sheet
                    .classes()
                    .filter(|c| c.has_base("BaseModel"))
                    .map(|c| c.name.clone()),
            );
        }

        let async_ratio = if endpoints == 0 {
            0.0
        } else {
            async_endpoints as f64 / endpoints as f64
        };
        schemas.sort();

        let mut facts = TechnologyFacts::new();
        facts
            .insert("endpoint_count", FactValue::Count(endpoints))
            .insert("async_ratio", FactValue::Ratio(async_ratio))
            .insert("uses_routers", FactValue::Flag(routers))
            .insert("uses_dependency_injection", FactValue::Flag(dependencies))
            .insert("pydantic_model_count", FactValue::Count(schemas.len()))
            .insert("pydantic_models", FactValue::Names(schemas));
        Ok(facts)
    }

    fn generate_derived_artifacts(
        &self,
        _ctx: &PluginContext,
        facts: &TechnologyFacts,
    ) -> Result<Vec<DerivedArtifact>> {
        let mut artifacts = Vec::new();
        let ratio = match facts.get("async_ratio") {
            Some(FactValue::Ratio(r)) => *r,
            _ => 0.0,
        };
        if ratio >= 0.5 {
            artifacts.push(DerivedArtifact::new(
                ArtifactKind::Rule,
                "fastapi-async-endpoints",
                "Declare new endpoints with `async def` and await all I/O inside them.",
            ));
        }
        if facts.count("pydantic_model_count") > 0 {
            artifacts.push(DerivedArtifact::new(
                ArtifactKind::Rule,
                "fastapi-schemas",
                "Validate request and response bodies with Pydantic models instead of raw dicts.",
            ));
        }
        artifacts.push(DerivedArtifact::new(
            ArtifactKind::Documentation,
            "fastapi-overview",
            format!(
                "{} endpoints ({:.0}% async), {} Pydantic models, routers: {}.",
                facts.count("endpoint_count"),
                ratio * 100.0,
                facts.count("pydantic_model_count"),
                FactValue::Flag(facts.flag("uses_routers")),
            ),
        ));
        Ok(artifacts)
    }
}
