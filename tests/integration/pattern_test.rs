//! Architecture pattern scoring over real directory trees

use super::fixtures::{django_hexagonal, project};
use archscan::core::GlobIgnore;
use archscan::patterns::PatternSpec;
use archscan::{ArchscanError, PatternMatcher, Settings};
use std::sync::Arc;

fn matcher() -> PatternMatcher {
    let settings = Settings::default();
    let ignore = Arc::new(GlobIgnore::from_settings(&settings).unwrap());
    PatternMatcher::new(&settings, ignore).unwrap()
}

#[test]
fn test_hexagonal_directories_only() {
    let dir = project(&[
        ("domain/order.py", ""),
        ("ports/repository.py", ""),
        ("adapters/db.py", ""),
    ]);
    let result = matcher().match_pattern(dir.path(), "hexagonal").unwrap();

    assert!(result.confidence >= 0.8);
    assert_eq!(result.evidence.len(), 3);
    assert!(result.violations.is_empty());
}

#[test]
fn test_hexagonal_ranks_first_for_hexagonal_project() {
    let dir = django_hexagonal();
    let results = matcher().match_all(dir.path()).unwrap();

    assert_eq!(results.len(), 5);
    assert_eq!(results[0].pattern_name, "hexagonal");
    assert_eq!(results[0].confidence, 1.0);
    assert!(results[0].evidence.iter().any(|e| e.contains("ending in Port")));
    assert!(results.windows(2).all(|w| w[0].confidence >= w[1].confidence));
}

#[test]
fn test_domain_importing_adapter_is_reported() {
    let dir = project(&[
        ("domain/order.py", "from adapters.db import Session\n"),
        ("ports/repository.py", ""),
        ("adapters/db.py", "class Session:\n    pass\n"),
    ]);
    let result = matcher().match_pattern(dir.path(), "hexagonal").unwrap();

    assert_eq!(result.violations.len(), 1);
    assert_eq!(result.violations[0].violation_type, "domain_imports_adapter");
}

#[test]
fn test_forbidden_directory_penalty() {
    let spec = PatternSpec::new("clean")
        .required(&["core"])
        .forbidden(&["legacy"]);
    let matcher = matcher().with_specs(vec![spec]).unwrap();
    let dir = project(&[("core/a.py", ""), ("legacy/b.py", "")]);

    let result = matcher.match_pattern(dir.path(), "clean").unwrap();
    assert!(result.confidence < 1.0);
    assert_eq!(result.violations[0].violation_type, "forbidden_directory");
}

#[test]
fn test_unknown_pattern() {
    let dir = project(&[("a.py", "")]);
    let err = matcher().match_pattern(dir.path(), "microkernel").unwrap_err();
    assert!(matches!(err, ArchscanError::UnknownPattern { .. }));
}
