//! Dependency graph construction from per-file fact sheets

use crate::error::{ArchscanError, Result};
use crate::models::config::Settings;
use crate::models::dependency_graph::DependencyGraph;
use crate::models::facts::{FactSheet, ImportKind, ImportStatement};
use crate::utils::module_path::{is_package_init, join, module_id, package_of, resolve_relative};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Configuration for dependency graph building
#[derive(Debug, Clone)]
pub struct GraphBuilderConfig {
    pub max_nodes: usize,
    pub max_edges: usize,
    /// Directory prefixes stripped from module ids
    pub source_roots: Vec<String>,
}

impl Default for GraphBuilderConfig {
    fn default() -> Self {
        Self {
            max_nodes: 10_000,
            max_edges: 100_000,
            source_roots: vec!["src".to_string()],
        }
    }
}

impl GraphBuilderConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_nodes: settings.max_nodes,
            max_edges: settings.max_edges,
            source_roots: settings.source_roots.clone(),
        }
    }
}

/// A project file that owns a graph node
struct ProjectModule<'a> {
    id: String,
    relative: PathBuf,
    is_package: bool,
    sheet: &'a FactSheet,
}

/// Builds the module import graph of a project.
///
/// Building is a single-writer reduction over fact sheets that were parsed
/// beforehand, in any order; sheets are sorted by path first so the result
/// does not depend on parse order.
pub struct DependencyGraphBuilder {
    config: GraphBuilderConfig,
}

impl DependencyGraphBuilder {
    pub fn new(config: GraphBuilderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GraphBuilderConfig {
        &self.config
    }

    /// Build the graph; fails with `GraphTooLarge` when a cap is exceeded
    pub fn build(&self, sheets: &[FactSheet], project_root: &Path) -> Result<DependencyGraph> {
        let mut graph = DependencyGraph::new(project_root);
        let modules = self.project_modules(sheets, project_root);
        let known: HashSet<&str> = modules.iter().map(|m| m.id.as_str()).collect();

        for module in &modules {
            graph.add_module(&module.id, Some(module.relative.clone()));
        }
        self.check_limits(&graph)?;

        for module in &modules {
            for statement in &module.sheet.import_statements {
                let mut targets = self.resolve(module, statement, &known);
                targets.sort();
                targets.dedup();
                for target in targets {
                    graph.add_import(&module.id, &target);
                }
            }
            self.check_limits(&graph)?;
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "dependency graph built"
        );
        Ok(graph)
    }

    fn project_modules<'a>(
        &self,
        sheets: &'a [FactSheet],
        project_root: &Path,
    ) -> Vec<ProjectModule<'a>> {
        let mut ordered: Vec<(PathBuf, &FactSheet)> = sheets
            .iter()
            .map(|sheet| {
                let relative = sheet
                    .path
                    .strip_prefix(project_root)
                    .unwrap_or(&sheet.path)
                    .to_path_buf();
                (relative, sheet)
            })
            .collect();
        ordered.sort_by(|a, b| a.0.cmp(&b.0));

        let mut seen = HashSet::new();
        let mut modules = Vec::with_capacity(ordered.len());
        for (relative, sheet) in ordered {
            let Some(id) = module_id(&relative, &self.config.source_roots) else {
                debug!(path = %relative.display(), "file does not map to a module id");
                continue;
            };
            if !seen.insert(id.clone()) {
                debug!(module = %id, path = %relative.display(), "duplicate module id, keeping first");
                continue;
            }
            modules.push(ProjectModule {
                id,
                is_package: is_package_init(&relative),
                relative,
                sheet,
            });
        }
        modules
    }

    /// Graph ids an import statement points at
    fn resolve(
        &self,
        module: &ProjectModule<'_>,
        statement: &ImportStatement,
        known: &HashSet<&str>,
    ) -> Vec<String> {
        if statement.kind == ImportKind::Plain && !statement.is_relative() {
            return vec![longest_known_prefix(&statement.module, known)
                .unwrap_or_else(|| statement.module.clone())];
        }

        let base = if statement.is_relative() {
            let package = package_of(&module.id, module.is_package);
            match resolve_relative(&package, statement.level, &statement.module) {
                Some(base) => base,
                None => {
                    let unresolved = format!("{}{}", ".".repeat(statement.level), statement.module);
                    return vec![unresolved];
                }
            }
        } else {
            statement.module.clone()
        };

        let mut targets = Vec::new();
        let mut needs_base = statement.names.is_empty();
        for name in &statement.names {
            let candidate = join(&base, name);
            if name != "*" && known.contains(candidate.as_str()) {
                targets.push(candidate);
            } else {
                needs_base = true;
            }
        }

        if needs_base {
            if base.is_empty() {
                // `from . import x` at the top level: an unknown `x` is still a dependency
                targets.extend(
                    statement
                        .names
                        .iter()
                        .filter(|n| {
                            n.as_str() != "*"
                                && n.as_str() != module.id
                                && !known.contains(n.as_str())
                        })
                        .cloned(),
                );
            } else {
                let fallback = longest_known_prefix(&base, known).unwrap_or(base);
                if fallback != module.id {
                    targets.push(fallback);
                }
            }
        }
        targets
    }

    fn check_limits(&self, graph: &DependencyGraph) -> Result<()> {
        let nodes = graph.node_count();
        let edges = graph.edge_count();
        if nodes > self.config.max_nodes || edges > self.config.max_edges {
            warn!(nodes, edges, "dependency graph exceeds configured limits");
            return Err(ArchscanError::GraphTooLarge {
                nodes,
                edges,
                max_nodes: self.config.max_nodes,
                max_edges: self.config.max_edges,
            });
        }
        Ok(())
    }
}

impl Default for DependencyGraphBuilder {
    fn default() -> Self {
        Self::new(GraphBuilderConfig::default())
    }
}

/// Longest project module id that is `target` or one of its parents
fn longest_known_prefix(target: &str, known: &HashSet<&str>) -> Option<String> {
    let parts: Vec<&str> = target.split('.').collect();
    (1..=parts.len())
        .rev()
        .map(|n| parts[..n].join("."))
        .find(|candidate| known.contains(candidate.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::SourceParser;

    fn sheet(root: &Path, relative: &str, source: &str) -> FactSheet {
        SourceParser::new()
            .parse_source(source, &root.join(relative))
            .unwrap()
    }

    fn build(files: &[(&str, &str)]) -> DependencyGraph {
        let root = Path::new("/project");
        let sheets: Vec<FactSheet> = files.iter().map(|(p, s)| sheet(root, p, s)).collect();
        DependencyGraphBuilder::default().build(&sheets, root).unwrap()
    }

    #[test]
    fn test_nodes_are_normalized_module_ids() {
        let graph = build(&[
            ("src/pkg/__init__.py", ""),
            ("src/pkg/core.py", ""),
            ("tools/run.py", ""),
        ]);
        assert!(graph.contains("pkg"));
        assert!(graph.contains("pkg.core"));
        assert!(graph.contains("tools.run"));
        assert_eq!(graph.node_count(), 3);
        assert_eq!(
            graph.node("pkg.core").unwrap().path.as_deref(),
            Some(Path::new("src/pkg/core.py"))
        );
    }

    #[test]
    fn test_absolute_import_resolves_to_longest_module() {
        let graph = build(&[
            ("a/__init__.py", ""),
            ("a/b.py", ""),
            ("main.py", "import a.b.c\nimport requests.adapters\n"),
        ]);
        assert_eq!(graph.dependencies("main").unwrap(), vec!["a.b", "requests.adapters"]);
        assert!(graph.node("requests.adapters").unwrap().external);
    }

    #[test]
    fn test_from_import_prefers_submodule() {
        let graph = build(&[
            ("app/__init__.py", ""),
            ("app/models.py", ""),
            ("app/views.py", "from app import models\nfrom app.models import User\n"),
        ]);
        assert_eq!(graph.dependencies("app.views").unwrap(), vec!["app.models"]);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.node("app.views").unwrap().import_count, 2);
    }

    #[test]
    fn test_relative_imports_resolve_against_package() {
        let graph = build(&[
            ("pkg/__init__.py", "from . import util\n"),
            ("pkg/util.py", "from .sub.deep import thing\n"),
            ("pkg/sub/__init__.py", ""),
            ("pkg/sub/deep.py", "from .. import util\nfrom ....outside import x\n"),
        ]);
        assert_eq!(graph.dependencies("pkg").unwrap(), vec!["pkg.util"]);
        assert_eq!(graph.dependencies("pkg.util").unwrap(), vec!["pkg.sub.deep"]);
        let deep = graph.dependencies("pkg.sub.deep").unwrap();
        assert!(deep.contains(&"pkg.util".to_string()));
        assert!(deep.contains(&"....outside".to_string()));
    }

    #[test]
    fn test_unresolved_imports_become_external_nodes() {
        let graph = build(&[("main.py", "import numpy as np\nfrom flask import Flask\n")]);
        assert!(graph.node("numpy").unwrap().external);
        assert!(graph.node("flask").unwrap().external);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_unresolved_top_level_relative_import_is_kept() {
        let graph = build(&[
            ("main.py", "from . import missing, helpers\n"),
            ("helpers.py", ""),
        ]);
        assert_eq!(graph.dependencies("main").unwrap(), vec!["helpers", "missing"]);
        assert!(graph.node("missing").unwrap().external);
        assert!(!graph.node("helpers").unwrap().external);
    }

    #[test]
    fn test_mutual_imports_form_cycle() {
        let graph = build(&[("a.py", "import b\n"), ("b.py", "import a\n")]);
        assert!(graph.is_cyclic());
        let report = graph.detect_cycles(10);
        assert_eq!(report.cycles.len(), 1);
    }

    #[test]
    fn test_package_attribute_import_is_not_a_self_loop() {
        let graph = build(&[("pkg/__init__.py", "from . import VERSION\n")]);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_graph_too_large() {
        let root = Path::new("/project");
        let sheets = vec![sheet(root, "main.py", "import a\nimport b\nimport c\n")];
        let builder = DependencyGraphBuilder::new(GraphBuilderConfig {
            max_nodes: 3,
            ..Default::default()
        });
        let err = builder.build(&sheets, root).unwrap_err();
        assert!(err.is_resource_limit());
        assert!(matches!(
            err,
            ArchscanError::GraphTooLarge { nodes: 4, max_nodes: 3, .. }
        ));
    }

    #[test]
    fn test_build_is_independent_of_sheet_order() {
        let root = Path::new("/project");
        let mut sheets = vec![
            sheet(root, "x.py", "import y\n"),
            sheet(root, "y.py", "import z\n"),
        ];
        let first = DependencyGraphBuilder::default().build(&sheets, root).unwrap();
        sheets.reverse();
        let second = DependencyGraphBuilder::default().build(&sheets, root).unwrap();
        assert_eq!(first.edges(), second.edges());
        assert_eq!(first.to_document().nodes, second.to_document().nodes);
    }
}
