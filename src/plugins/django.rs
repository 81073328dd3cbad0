//! Django web framework plugin

use super::{DetectionProfile, PluginContext, TechnologyPlugin, PYTHON_MANIFESTS};
use crate::error::Result;
use crate::models::detection::{ArtifactKind, DerivedArtifact, FactValue, TechnologyFacts};
use std::collections::BTreeSet;

const PROFILE: DetectionProfile = DetectionProfile {
    marker_files: &["manage.py"],
    marker_weight: 0.4,
    import_prefixes: &["django"],
    content_files: PYTHON_MANIFESTS,
    content_patterns: &[r#"(?im)^\s*["']?django\b"#],
    content_weight: 0.4,
    directories: &["migrations", "templates"],
    structure_weight: 0.2,
};

pub struct DjangoPlugin;

impl TechnologyPlugin for DjangoPlugin {
    fn technology(&self) -> &str {
        "django"
    }

    fn detect(&self, ctx: &PluginContext) -> f64 {
        PROFILE.confidence(ctx)
    }

    fn extract_facts(&self, ctx: &PluginContext) -> Result<TechnologyFacts> {
        let mut models = Vec::new();
        let mut apps = BTreeSet::new();
        let mut views = 0;
        let mut rest_framework = false;

        for (path, sheet) in ctx.fact_sheets() {
            rest_framework |= sheet.imports_module("rest_framework");
            for class in sheet.classes() {
                if class.has_base("Model") {
                    models.push(class.name.clone());
                }
                if class.has_base("AppConfig") {
                    if let Some(app) = path.parent().and_then(|p| p.file_name()) {
                        apps.insert(app.to_string_lossy().into_owned());
                    }
                }
                if class.bases.iter().any(|b| b.ends_with("View") || b.ends_with("ViewSet")) {
                    views += 1;
                }
            }
        }

        let migrations = ctx
            .python_files()
            .filter(|f| PluginContext::in_directory(f, "migrations"))
            .filter(|f| f.file_name().map(|n| n != "__init__.py").unwrap_or(false))
            .count();

        models.sort();
        let mut facts = TechnologyFacts::new();
        facts
            .insert("model_count", FactValue::Count(models.len()))
            .insert("models", FactValue::Names(models))
            .insert("apps", FactValue::Names(apps.into_iter().collect()))
            .insert("class_based_views", FactValue::Count(views))
            .insert("migration_count", FactValue::Count(migrations))
            .insert("rest_framework", FactValue::Flag(rest_framework));
        Ok(facts)
    }

    fn generate_derived_artifacts(
        &self,
        _ctx: &PluginContext,
        facts: &TechnologyFacts,
    ) -> Result<Vec<DerivedArtifact>> {
        let mut artifacts = vec![DerivedArtifact::new(
            ArtifactKind::Rule,
            "django-migrations",
            "Every change to a model needs a migration generated with `makemigrations`; never edit applied migrations.",
        )];
        if facts.flag("rest_framework") {
            artifacts.push(DerivedArtifact::new(
                ArtifactKind::Rule,
                "django-rest-framework",
                "Expose models through serializers and viewsets; keep query logic out of serializers.",
            ));
        }

        let apps = facts.names("apps");
        artifacts.push(DerivedArtifact::new(
            ArtifactKind::Documentation,
            "django-overview",
            format!(
                "{} models across {} apps ({}), {} migrations.",
                facts.count("model_count"),
                apps.len(),
                if apps.is_empty() { "none declared".to_string() } else { apps.join(", ") },
                facts.count("migration_count"),
            ),
        ));
        Ok(artifacts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::test_support::{context, project};

    fn shop() -> tempfile::TempDir {
        project(&[
            ("manage.py", "import django\n"),
            ("requirements.txt", "Django==5.0\ndjangorestframework\n"),
            ("shop/__init__.py", ""),
            (
                "shop/apps.py",
                "from django.apps import AppConfig\n\nclass ShopConfig(AppConfig):\n    name = 'shop'\n",
            ),
            (
                "shop/models.py",
                "from django.db import models\n\nclass Order(models.Model):\n    pass\n\nclass Item(models.Model):\n    pass\n",
            ),
            (
                "shop/views.py",
                "from rest_framework import viewsets\n\nclass OrderViewSet(viewsets.ModelViewSet):\n    pass\n",
            ),
            ("shop/migrations/__init__.py", ""),
            ("shop/migrations/0001_initial.py", "from django.db import migrations\n"),
        ])
    }

    #[test]
    fn test_detect() {
        let dir = shop();
        assert!((DjangoPlugin.detect(&context(&dir)) - 1.0).abs() < 1e-9);

        let plain = project(&[("main.py", "import os\n")]);
        assert_eq!(DjangoPlugin.detect(&context(&plain)), 0.0);
    }

    #[test]
    fn test_facts() {
        let dir = shop();
        let ctx = context(&dir);
        let facts = DjangoPlugin.extract_facts(&ctx).unwrap();
        assert_eq!(facts.count("model_count"), 2);
        assert_eq!(facts.names("models"), ["Item".to_string(), "Order".to_string()]);
        assert_eq!(facts.names("apps"), ["shop".to_string()]);
        assert_eq!(facts.count("class_based_views"), 1);
        assert_eq!(facts.count("migration_count"), 1);
        assert!(facts.flag("rest_framework"));

        let artifacts = DjangoPlugin.generate_derived_artifacts(&ctx, &facts).unwrap();
        assert_eq!(artifacts.len(), 3);
        assert!(artifacts[2].content.starts_with("2 models across 1 apps (shop)"));
    }
}
