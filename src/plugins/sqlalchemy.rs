//! SQLAlchemy ORM plugin

use super::{DetectionProfile, PluginContext, TechnologyPlugin, PYTHON_MANIFESTS};
use crate::error::Result;
use crate::models::detection::{ArtifactKind, DerivedArtifact, FactValue, TechnologyFacts};

const PROFILE: DetectionProfile = DetectionProfile {
    marker_files: &["alembic.ini"],
    marker_weight: 0.2,
    import_prefixes: &["sqlalchemy", "flask_sqlalchemy"],
    content_files: PYTHON_MANIFESTS,
    content_patterns: &[r#"(?im)^\s*["']?(flask-)?sqlalchemy\b"#],
    content_weight: 0.6,
    directories: &["models", "alembic"],
    structure_weight: 0.2,
};

/// Declarative base classes a mapped model derives from
const MODEL_BASES: &[&str] = &["Base", "db.Model", "SQLModel"];

pub struct SqlAlchemyPlugin;

impl TechnologyPlugin for SqlAlchemyPlugin {
    fn technology(&self) -> &str {
        "sqlalchemy"
    }

    fn detect(&self, ctx: &PluginContext) -> f64 {
        PROFILE.confidence(ctx)
    }

    fn extract_facts(&self, ctx: &PluginContext) -> Result<TechnologyFacts> {
        let mut models = Vec::new();
        let mut uses_async = false;
        let mut flask_extension = false;

        for (_, sheet) in ctx.fact_sheets() {
            if !sheet.imports_module("sqlalchemy") && !sheet.imports_module("flask_sqlalchemy") {
                continue;
            }
            uses_async |= sheet.imports_module("sqlalchemy.ext.asyncio");
            flask_extension |= sheet.imports_module("flask_sqlalchemy");
            models.extend(
                sheet
                    .classes()
                    // The declarative base itself is not a model
                    .filter(|c| !c.has_base("DeclarativeBase"))
                    .filter(|c| MODEL_BASES.iter().any(|b| c.has_base(b)))
                    .map(|c| c.name.clone()),
            );
        }
        models.sort();

        let mut facts = TechnologyFacts::new();
        facts
            .insert("model_count", FactValue::Count(models.len()))
            .insert("models", FactValue::Names(models))
            .insert("uses_async", FactValue::Flag(uses_async))
            .insert("flask_extension", FactValue::Flag(flask_extension))
            .insert(
                "uses_alembic",
                FactValue::Flag(ctx.file_exists("alembic.ini") || ctx.has_directory("alembic")),
            );
        Ok(facts)
    }

    fn generate_derived_artifacts(
        &self,
        _ctx: &PluginContext,
        facts: &TechnologyFacts,
    ) -> Result<Vec<DerivedArtifact>> {
        let mut artifacts = Vec::new();
        if facts.flag("uses_alembic") {
            artifacts.push(DerivedArtifact::new(
                ArtifactKind::Rule,
                "sqlalchemy-migrations",
                "Change the schema only through Alembic revisions generated with `alembic revision --autogenerate`.",
            ));
        }
        if facts.flag("uses_async") {
            artifacts.push(DerivedArtifact::new(
                ArtifactKind::Rule,
                "sqlalchemy-async-session",
                "Use `AsyncSession` for every query; do not mix sync and async sessions.",
            ));
        }
        artifacts.push(DerivedArtifact::new(
            ArtifactKind::Documentation,
            "sqlalchemy-overview",
            format!(
                "{} mapped models; alembic: {}.",
                facts.count("model_count"),
                FactValue::Flag(facts.flag("uses_alembic")),
            ),
        ));
        Ok(artifacts)
    }
}
