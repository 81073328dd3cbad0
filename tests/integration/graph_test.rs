//! Dependency graph construction and invariants

use super::fixtures::project;
use archscan::core::{DependencyAnalyzer, GlobIgnore};
use archscan::models::dependency_graph::{CycleSeverity, DependencyGraph};
use archscan::{ArchscanError, Settings};
use proptest::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;

fn analyzer(settings: &Settings) -> DependencyAnalyzer {
    let ignore = Arc::new(GlobIgnore::from_settings(settings).unwrap());
    DependencyAnalyzer::new(settings, ignore).unwrap()
}

#[test]
fn test_mutual_imports_form_one_high_cycle() {
    let dir = project(&[
        ("pkg/__init__.py", ""),
        ("pkg/a.py", "import pkg.b\n"),
        ("pkg/b.py", "from pkg import a\n"),
    ]);
    let analysis = analyzer(&Settings::default()).analyze(dir.path()).unwrap();

    assert_eq!(analysis.circular_dependencies.len(), 1);
    let cycle = &analysis.circular_dependencies[0];
    assert_eq!(cycle.severity, CycleSeverity::High);
    assert_eq!(cycle.cycle, vec!["pkg.a", "pkg.b", "pkg.a"]);
    assert!(analysis.metrics.cyclic);
    assert_eq!(analysis.max_depth, None);
}

#[test]
fn test_layered_imports_have_depth() {
    let dir = project(&[
        ("app/__init__.py", ""),
        ("app/api.py", "from app import service\n"),
        ("app/service.py", "from . import repo\nimport requests\n"),
        ("app/repo.py", "import sqlite3\n"),
    ]);
    let analysis = analyzer(&Settings::default()).analyze(dir.path()).unwrap();

    assert!(analysis.circular_dependencies.is_empty());
    assert!(!analysis.metrics.cyclic);
    assert!(analysis.root_nodes.contains(&"app.api".to_string()));
    assert!(analysis.leaf_nodes.contains(&"sqlite3".to_string()));
    assert!(analysis.max_depth.unwrap() >= 2);

    let api = analysis.coupling.iter().find(|c| c.module == "app.api").unwrap();
    assert_eq!(api.afferent, 0);
    assert_eq!(api.instability, 1.0);
}

#[test]
fn test_syntax_errors_and_large_files_are_skipped() {
    let dir = project(&[
        ("good.py", "import bad\n"),
        ("bad.py", "def broken(:\n"),
        ("huge.py", &"x = 1\n".repeat(200)),
    ]);
    let settings = Settings {
        max_file_size: 512,
        ..Settings::default()
    };
    let analysis = analyzer(&settings).analyze(dir.path()).unwrap();

    assert_eq!(analysis.files_parsed, 1);
    assert_eq!(analysis.skipped.len(), 2);
}

#[test]
fn test_graph_limits_are_enforced() {
    let dir = project(&[
        ("a.py", "import b\nimport c\n"),
        ("b.py", "import c\n"),
        ("c.py", ""),
    ]);
    let settings = Settings {
        max_edges: 1,
        cache_enabled: false,
        ..Settings::default()
    };
    let err = analyzer(&settings).analyze(dir.path()).unwrap_err();
    assert!(matches!(err, ArchscanError::GraphTooLarge { .. }));
    assert!(err.is_resource_limit());
}

#[test]
fn test_isolated_module_is_root_and_leaf() {
    let mut graph = DependencyGraph::new("/project");
    graph.add_module("alone", Some(PathBuf::from("alone.py")));

    assert_eq!(graph.roots(), vec!["alone"]);
    assert_eq!(graph.leaves(), vec!["alone"]);
    assert_eq!(graph.depth("alone").unwrap(), Some(0));
    assert_eq!(graph.coupling_for("alone").unwrap().instability, 0.0);
}

fn arb_edges() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (1usize..8).prop_flat_map(|n| (Just(n), prop::collection::vec((0..n, 0..n), 0..20)))
}

fn build((n, edges): &(usize, Vec<(usize, usize)>)) -> DependencyGraph {
    let mut graph = DependencyGraph::new("/project");
    for i in 0..*n {
        graph.add_module(&format!("m{}", i), Some(PathBuf::from(format!("m{}.py", i))));
    }
    for (a, b) in edges {
        graph.add_import(&format!("m{}", a), &format!("m{}", b));
    }
    graph
}

proptest! {
    #[test]
    fn prop_instability_is_bounded(input in arb_edges()) {
        let graph = build(&input);
        for metrics in graph.coupling().values() {
            prop_assert!((0.0..=1.0).contains(&metrics.instability));
            if metrics.afferent + metrics.efferent == 0 {
                prop_assert_eq!(metrics.instability, 0.0);
            }
        }
    }

    #[test]
    fn prop_cycles_found_iff_cyclic(input in arb_edges()) {
        let graph = build(&input);
        let report = graph.detect_cycles(1000);
        prop_assert_eq!(report.cycles.is_empty(), !graph.graph_metrics().cyclic);
    }

    #[test]
    fn prop_document_round_trip(input in arb_edges()) {
        let graph = build(&input);
        let document = graph.to_document();
        let rebuilt = DependencyGraph::from_document(&document).unwrap();
        prop_assert_eq!(rebuilt.to_document(), document);
    }
}
