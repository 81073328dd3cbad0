//! Cheap, plugin-independent technology signals
//!
//! The indicator scan looks at file extensions, well-known marker files,
//! top-level directory names and the dependency manifests at the project
//! root. It never parses source code.

use crate::core::parallel::CancellationToken;
use crate::error::Result;
use crate::models::detection::{EvidenceType, TechnologyMatch};
use crate::plugins::PluginContext;
use glob::Pattern;
use regex::Regex;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use toml::{Table as TomlTable, Value as TomlValue};
use tracing::{debug, warn};

/// Files processed between cancellation checks
const CANCEL_BATCH: usize = 256;

const EXTENSIONS: &[(&str, &str)] = &[
    ("py", "python"),
    ("pyi", "python"),
    ("js", "javascript"),
    ("mjs", "javascript"),
    ("cjs", "javascript"),
    ("jsx", "javascript"),
    ("ts", "typescript"),
    ("tsx", "typescript"),
    ("vue", "vue"),
    ("json", "json"),
    ("yaml", "yaml"),
    ("yml", "yaml"),
    ("md", "markdown"),
    ("txt", "text"),
    ("toml", "toml"),
    ("xml", "xml"),
    ("csv", "csv"),
    ("ini", "ini"),
    ("cfg", "ini"),
    ("sql", "sql"),
    ("sh", "shell"),
    ("html", "html"),
    ("css", "css"),
];

const MARKER_FILES: &[(&str, &str)] = &[
    ("manage.py", "django"),
    ("Dockerfile", "docker"),
    ("Dockerfile.*", "docker"),
    (".dockerignore", "docker"),
    ("docker-compose*.yml", "docker-compose"),
    ("docker-compose*.yaml", "docker-compose"),
    ("compose.yml", "docker-compose"),
    ("compose.yaml", "docker-compose"),
    ("pytest.ini", "pytest"),
    ("conftest.py", "pytest"),
    ("setup.py", "python"),
    ("setup.cfg", "python"),
    ("pyproject.toml", "python"),
    ("Pipfile", "python"),
    ("requirements.txt", "python"),
    ("package.json", "nodejs"),
    ("tsconfig.json", "typescript"),
    ("alembic.ini", "alembic"),
    ("next.config.*", "nextjs"),
    ("jest.config.*", "jest"),
];

const TOP_LEVEL_DIRECTORIES: &[(&str, &str)] = &[("alembic", "alembic"), ("docker", "docker")];

/// Manifest package name (lowercase) to technology
const PACKAGES: &[(&str, &str)] = &[
    ("django", "django"),
    ("djangorestframework", "django"),
    ("flask", "flask"),
    ("fastapi", "fastapi"),
    ("pytest", "pytest"),
    ("sqlalchemy", "sqlalchemy"),
    ("flask-sqlalchemy", "sqlalchemy"),
    ("celery", "celery"),
    ("pydantic", "pydantic"),
    ("alembic", "alembic"),
    ("react", "react"),
    ("react-dom", "react"),
    ("next", "nextjs"),
    ("vue", "vue"),
    ("express", "express"),
    ("typescript", "typescript"),
    ("jest", "jest"),
];

/// Candidate technologies found by the indicator scan
#[derive(Debug, Default)]
pub struct IndicatorScan {
    pub candidates: BTreeMap<String, TechnologyMatch>,
    pub files_scanned: usize,
    /// Manifests that could not be read
    pub warnings: Vec<String>,
}

impl IndicatorScan {
    fn record(&mut self, technology: &str, kind: EvidenceType, detail: impl Into<String>) {
        self.candidates
            .entry(technology.to_string())
            .or_insert_with(|| TechnologyMatch::new(technology, 0.0))
            .add_evidence(kind, detail);
    }

    pub fn technologies(&self) -> impl Iterator<Item = &str> {
        self.candidates.keys().map(String::as_str)
    }
}

/// Collect candidate technologies for a project
pub fn scan_indicators(ctx: &PluginContext, cancel: &CancellationToken) -> Result<IndicatorScan> {
    let markers: Vec<(Pattern, &str)> = MARKER_FILES
        .iter()
        .filter_map(|(glob, tech)| Pattern::new(glob).ok().map(|p| (p, *tech)))
        .collect();

    let mut scan = IndicatorScan::default();
    let mut extension_counts: BTreeMap<(&str, &str), usize> = BTreeMap::new();

    for (i, file) in ctx.files().iter().enumerate() {
        if i % CANCEL_BATCH == 0 {
            cancel.check()?;
        }
        scan.files_scanned += 1;

        if let Some(ext) = file.extension().and_then(|e| e.to_str()) {
            let ext = ext.to_ascii_lowercase();
            if let Some((known, tech)) = EXTENSIONS.iter().find(|(e, _)| *e == ext) {
                *extension_counts.entry((*known, *tech)).or_default() += 1;
            }
        }

        let Some(name) = file.file_name().map(|n| n.to_string_lossy()) else {
            continue;
        };
        for (pattern, tech) in &markers {
            if pattern.matches(&name) {
                scan.record(tech, EvidenceType::ConfigFile, file.display().to_string());
            }
        }
    }

    for ((ext, tech), count) in extension_counts {
        scan.record(tech, EvidenceType::Extension, format!("{} .{} files", count, ext));
    }

    for directory in ctx.directories().iter().filter(|d| d.components().count() == 1) {
        let Some(name) = directory.to_str() else {
            continue;
        };
        if let Some((dir, tech)) = TOP_LEVEL_DIRECTORIES.iter().find(|(d, _)| *d == name) {
            scan.record(tech, EvidenceType::Directory, format!("{}/", dir));
        }
    }

    cancel.check()?;
    scan_manifests(ctx, &mut scan);

    debug!(
        files = scan.files_scanned,
        candidates = scan.candidates.len(),
        "indicator scan complete"
    );
    Ok(scan)
}

fn scan_manifests(ctx: &PluginContext, scan: &mut IndicatorScan) {
    let root_files: Vec<&Path> = ctx
        .files()
        .iter()
        .filter(|f| f.components().count() == 1)
        .map(|f| f.as_path())
        .collect();

    let requirements = Pattern::new("requirements*.txt").ok();
    for file in root_files {
        let lossy = file.to_string_lossy();
        let name: &str = &lossy;
        let packages = if requirements.as_ref().map(|p| p.matches(name)).unwrap_or(false) {
            ctx.read_text(file).map(|text| Ok(requirement_names(&text)))
        } else {
            match name {
                "pyproject.toml" => ctx.read_text(file).map(|text| pyproject_names(&text)),
                "Pipfile" => ctx.read_text(file).map(|text| pipfile_names(&text)),
                "package.json" => ctx.read_text(file).map(|text| package_json_names(&text)),
                _ => continue,
            }
        };

        match packages {
            Some(Ok(names)) => {
                for package in names {
                    if let Some((_, tech)) = PACKAGES.iter().find(|(p, _)| *p == package) {
                        scan.record(tech, EvidenceType::Dependency, format!("{} in {}", package, name));
                    }
                }
            }
            Some(Err(message)) => {
                warn!(manifest = %name, error = %message, "could not read manifest");
                scan.warnings.push(format!("{}: {}", name, message));
            }
            None => {}
        }
    }
}

/// Normalize a requirement specifier to its lowercase package name
fn package_name(spec: &str) -> Option<String> {
    let spec = spec.trim();
    let end = spec
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'))
        .unwrap_or(spec.len());
    let name = spec[..end].trim_end_matches('.');
    (!name.is_empty()).then(|| name.to_ascii_lowercase().replace('_', "-"))
}

fn requirement_names(text: &str) -> BTreeSet<String> {
    let comment = Regex::new(r"\s+#.*$").ok();
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with('-'))
        .map(|l| match &comment {
            Some(re) => re.replace(l, "").into_owned(),
            None => l.to_string(),
        })
        .filter_map(|l| package_name(&l))
        .collect()
}

fn pyproject_names(text: &str) -> std::result::Result<BTreeSet<String>, String> {
    let value: TomlTable = toml::from_str(text).map_err(|e| e.to_string())?;
    let mut names = BTreeSet::new();

    let project = value.get("project");
    let specs = project
        .and_then(|p| p.get("dependencies"))
        .and_then(TomlValue::as_array)
        .into_iter()
        .flatten()
        .chain(
            project
                .and_then(|p| p.get("optional-dependencies"))
                .and_then(TomlValue::as_table)
                .into_iter()
                .flat_map(|t| t.values())
                .filter_map(TomlValue::as_array)
                .flatten(),
        );
    names.extend(specs.filter_map(TomlValue::as_str).filter_map(package_name));

    if let Some(poetry) = value.get("tool").and_then(|t| t.get("poetry")) {
        let tables = poetry
            .get("dependencies")
            .into_iter()
            .chain(poetry.get("dev-dependencies"))
            .chain(
                poetry
                    .get("group")
                    .and_then(TomlValue::as_table)
                    .into_iter()
                    .flat_map(|groups| groups.values())
                    .filter_map(|g| g.get("dependencies")),
            );
        for table in tables.filter_map(TomlValue::as_table) {
            names.extend(table.keys().filter(|k| *k != "python").filter_map(|k| package_name(k)));
        }
    }
    Ok(names)
}

fn pipfile_names(text: &str) -> std::result::Result<BTreeSet<String>, String> {
    let value: TomlTable = toml::from_str(text).map_err(|e| e.to_string())?;
    Ok(["packages", "dev-packages"]
        .iter()
        .filter_map(|section| value.get(*section).and_then(TomlValue::as_table))
        .flat_map(|t| t.keys())
        .filter_map(|k| package_name(k))
        .collect())
}

fn package_json_names(text: &str) -> std::result::Result<BTreeSet<String>, String> {
    let value: JsonValue = serde_json::from_str(text).map_err(|e| e.to_string())?;
    Ok(["dependencies", "devDependencies", "peerDependencies"]
        .iter()
        .filter_map(|section| value.get(section).and_then(JsonValue::as_object))
        .flat_map(|o| o.keys())
        .map(|k| k.to_ascii_lowercase())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::test_support::{context, project};

    #[test]
    fn test_extensions_markers_and_directories() {
        let dir = project(&[
            ("manage.py", ""),
            ("app/models.py", ""),
            ("web/index.js", ""),
            ("README.md", ""),
            ("docker/Dockerfile.api", "FROM python:3.12\n"),
            ("alembic/env.py", ""),
        ]);
        let ctx = context(&dir);
        let scan = scan_indicators(&ctx, &CancellationToken::new()).unwrap();

        let techs: Vec<&str> = scan.technologies().collect();
        assert_eq!(
            techs,
            vec!["alembic", "django", "docker", "javascript", "markdown", "python"]
        );
        assert_eq!(scan.files_scanned, 6);
        assert_eq!(scan.candidates["python"].evidence, vec!["3 .py files"]);
        assert_eq!(
            scan.candidates["docker"].evidence_types,
            vec![EvidenceType::ConfigFile, EvidenceType::Directory]
        );
    }

    #[test]
    fn test_manifest_dependencies() {
        let dir = project(&[
            (
                "requirements.txt",
                "# web\nDjango==5.0  # pinned\ncelery[redis]>=5\n-r dev.txt\n",
            ),
            (
                "pyproject.toml",
                "[project]\ndependencies = [\"FastAPI>=0.110\"]\n[tool.poetry.group.dev.dependencies]\npytest = \"^8\"\n",
            ),
            ("package.json", r#"{"dependencies": {"react": "18"}, "devDependencies": {"jest": "29"}}"#),
        ]);
        let ctx = context(&dir);
        let scan = scan_indicators(&ctx, &CancellationToken::new()).unwrap();
        for tech in ["django", "celery", "fastapi", "pytest", "react", "jest", "nodejs"] {
            assert!(scan.candidates.contains_key(tech), "missing {}", tech);
        }
        assert!(scan.candidates["django"]
            .evidence_types
            .contains(&EvidenceType::Dependency));
        assert!(scan.warnings.is_empty());
    }

    #[test]
    fn test_broken_manifest_is_a_warning() {
        let dir = project(&[("package.json", "{ broken")]);
        let ctx = context(&dir);
        let scan = scan_indicators(&ctx, &CancellationToken::new()).unwrap();
        assert_eq!(scan.warnings.len(), 1);
        assert!(scan.candidates.contains_key("nodejs"));
    }

    #[test]
    fn test_cancelled_scan() {
        let dir = project(&[("a.py", "")]);
        let ctx = context(&dir);
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(scan_indicators(&ctx, &cancel).is_err());
    }

    #[test]
    fn test_package_name() {
        assert_eq!(package_name("Django>=4.2").as_deref(), Some("django"));
        assert_eq!(package_name("flask_sqlalchemy").as_deref(), Some("flask-sqlalchemy"));
        assert_eq!(package_name("celery[redis]").as_deref(), Some("celery"));
        assert_eq!(package_name("  "), None);
    }
}
