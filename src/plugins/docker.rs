//! Docker container plugin

use super::{DetectionProfile, PluginContext, TechnologyPlugin};
use crate::error::{ArchscanError, Result};
use crate::models::detection::{ArtifactKind, DerivedArtifact, FactValue, TechnologyFacts};
use regex::Regex;
use std::collections::BTreeSet;

const DOCKERFILES: &[&str] = &["Dockerfile", "Dockerfile.*", "*.Dockerfile"];

const PROFILE: DetectionProfile = DetectionProfile {
    marker_files: &[
        "Dockerfile",
        "Dockerfile.*",
        "*.Dockerfile",
        "docker-compose*.yml",
        "docker-compose*.yaml",
        "compose.yml",
        "compose.yaml",
    ],
    marker_weight: 0.6,
    import_prefixes: &[],
    content_files: DOCKERFILES,
    content_patterns: &[r"(?im)^\s*FROM\s+\S+"],
    content_weight: 0.3,
    directories: &["docker"],
    structure_weight: 0.1,
};

const FROM_LINE: &str = r"(?im)^\s*FROM\s+(?:--platform=\S+\s+)?(\S+)";
const EXPOSE_LINE: &str = r"(?im)^\s*EXPOSE\s+(.+)$";

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| ArchscanError::analysis_error(format!("docker pattern: {}", e)))
}

pub struct DockerPlugin;

impl TechnologyPlugin for DockerPlugin {
    fn technology(&self) -> &str {
        "docker"
    }

    fn detect(&self, ctx: &PluginContext) -> f64 {
        PROFILE.confidence(ctx)
    }

    fn extract_facts(&self, ctx: &PluginContext) -> Result<TechnologyFacts> {
        let from_line = compile(FROM_LINE)?;
        let expose_line = compile(EXPOSE_LINE)?;
        let dockerfiles: BTreeSet<_> = DOCKERFILES.iter().flat_map(|p| ctx.files_named(p)).collect();
        let mut images = BTreeSet::new();
        let mut ports = BTreeSet::new();
        let mut multi_stage = false;

        for file in &dockerfiles {
            let Some(text) = ctx.read_text(file) else {
                continue;
            };
            let mut stages = 0;
            for captures in from_line.captures_iter(&text) {
                stages += 1;
                images.insert(captures[1].to_string());
            }
            multi_stage |= stages > 1;
            for captures in expose_line.captures_iter(&text) {
                for port in captures[1].split_whitespace() {
                    ports.insert(port.to_string());
                }
            }
        }

        let compose = ["docker-compose*.yml", "docker-compose*.yaml", "compose.yml", "compose.yaml"]
            .iter()
            .any(|p| !ctx.files_named(p).is_empty());

        let mut facts = TechnologyFacts::new();
        facts
            .insert("dockerfile_count", FactValue::Count(dockerfiles.len()))
            .insert("base_images", FactValue::Names(images.into_iter().collect()))
            .insert("exposed_ports", FactValue::Names(ports.into_iter().collect()))
            .insert("multi_stage", FactValue::Flag(multi_stage))
            .insert("uses_compose", FactValue::Flag(compose))
            .insert("has_dockerignore", FactValue::Flag(ctx.file_exists(".dockerignore")));
        Ok(facts)
    }

    fn generate_derived_artifacts(
        &self,
        _ctx: &PluginContext,
        facts: &TechnologyFacts,
    ) -> Result<Vec<DerivedArtifact>> {
        let mut artifacts = Vec::new();
        let unpinned: Vec<&String> = facts
            .names("base_images")
            .iter()
            .filter(|image| !image.contains(':') || image.ends_with(":latest"))
            .collect();
        if !unpinned.is_empty() {
            artifacts.push(DerivedArtifact::new(
                ArtifactKind::Rule,
                "docker-pinned-images",
                format!(
                    "Pin base images to an explicit tag; unpinned: {}.",
                    unpinned.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
                ),
            ));
        }
        if !facts.flag("has_dockerignore") {
            artifacts.push(DerivedArtifact::new(
                ArtifactKind::Configuration,
                ".dockerignore",
                ".git\n__pycache__\n*.pyc\n.venv\nnode_modules\n",
            ));
        }
        artifacts.push(DerivedArtifact::new(
            ArtifactKind::Documentation,
            "docker-overview",
            format!(
                "{} Dockerfiles; base images: {}; exposed ports: {}; compose: {}.",
                facts.count("dockerfile_count"),
                display_names(facts.names("base_images")),
                display_names(facts.names("exposed_ports")),
                FactValue::Flag(facts.flag("uses_compose")),
            ),
        ));
        Ok(artifacts)
    }
}

fn display_names(names: &[String]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::test_support::{context, project};

    const DOCKERFILE: &str = "FROM python:3.12 AS build\nRUN pip install .\n\nFROM python:3.12-slim\nEXPOSE 8000 9000\nCMD [\"app\"]\n";

    #[test]
    fn test_detect() {
        let dir = project(&[("Dockerfile", DOCKERFILE), ("docker-compose.yml", "services: {}\n")]);
        assert!((DockerPlugin.detect(&context(&dir)) - 0.9).abs() < 1e-9);

        let none = project(&[("main.py", "")]);
        assert_eq!(DockerPlugin.detect(&context(&none)), 0.0);
    }

    #[test]
    fn test_facts_and_artifacts() {
        let dir = project(&[("Dockerfile", DOCKERFILE), ("docker/Dockerfile.worker", "FROM alpine\n")]);
        let ctx = context(&dir);
        let facts = DockerPlugin.extract_facts(&ctx).unwrap();
        assert_eq!(facts.count("dockerfile_count"), 2);
        assert_eq!(
            facts.names("base_images"),
            ["alpine".to_string(), "python:3.12".to_string(), "python:3.12-slim".to_string()]
        );
        assert_eq!(facts.names("exposed_ports"), ["8000".to_string(), "9000".to_string()]);
        assert!(facts.flag("multi_stage"));
        assert!(!facts.flag("uses_compose"));

        let artifacts = DockerPlugin.generate_derived_artifacts(&ctx, &facts).unwrap();
        assert_eq!(artifacts[0].name, "docker-pinned-images");
        assert!(artifacts[0].content.contains("alpine"));
        assert_eq!(artifacts[1].kind, ArtifactKind::Configuration);
    }
}
