//! Conversions between source file paths and dotted module ids

use std::path::{Component, Path};

const PACKAGE_INIT: &str = "__init__";

/// Convert a project-relative source path into a dotted module id.
///
/// The extension is dropped, a leading source root (`src/`, or any
/// configured multi-segment root such as `lib/python`) is stripped and a
/// trailing `__init__` collapses to its package. Returns `None` for paths
/// that do not name a module, such as a root-level `__init__.py`.
pub fn module_id(relative: &Path, source_roots: &[String]) -> Option<String> {
    let mut segments: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    let last = segments.pop()?;
    let stem = Path::new(&last)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or(last);
    segments.push(stem);

    for root in source_roots {
        let root_segments: Vec<&str> = root
            .split(['/', '\\'])
            .filter(|s| !s.is_empty())
            .collect();
        if !root_segments.is_empty()
            && segments.len() > root_segments.len()
            && segments.iter().zip(&root_segments).all(|(a, b)| a == b)
        {
            segments.drain(..root_segments.len());
            break;
        }
    }

    if segments.last().map(String::as_str) == Some(PACKAGE_INIT) {
        segments.pop();
    }

    if segments.is_empty() || segments.iter().any(|s| s.is_empty()) {
        return None;
    }

    Some(segments.join("."))
}

/// Check whether the path is a package initializer
pub fn is_package_init(path: &Path) -> bool {
    path.file_stem().and_then(|s| s.to_str()) == Some(PACKAGE_INIT)
}

/// The package a module's relative imports are resolved against
pub fn package_of(module_id: &str, is_package: bool) -> String {
    if is_package {
        return module_id.to_string();
    }
    match module_id.rfind('.') {
        Some(idx) => module_id[..idx].to_string(),
        None => String::new(),
    }
}

/// Resolve a relative import to an absolute dotted id.
///
/// `level` is the number of leading dots. Returns `None` when the import
/// climbs above the top-level package. The result is empty for
/// `from . import x` issued at the top level.
pub fn resolve_relative(package: &str, level: usize, module: &str) -> Option<String> {
    let mut parts: Vec<&str> = package.split('.').filter(|s| !s.is_empty()).collect();
    let climb = level.saturating_sub(1);
    if climb > parts.len() {
        return None;
    }
    parts.truncate(parts.len() - climb);
    if !module.is_empty() {
        parts.extend(module.split('.'));
    }
    Some(parts.join("."))
}

/// Join a base id with a child name, handling an empty base
pub fn join(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", base, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roots() -> Vec<String> {
        vec!["src".to_string()]
    }

    #[test]
    fn test_module_id_strips_extension_and_root() {
        assert_eq!(module_id(Path::new("src/pkg/mod.py"), &roots()), Some("pkg.mod".to_string()));
        assert_eq!(module_id(Path::new("pkg/mod.py"), &roots()), Some("pkg.mod".to_string()));
        assert_eq!(module_id(Path::new("app.py"), &roots()), Some("app".to_string()));
    }

    #[test]
    fn test_module_id_collapses_init() {
        assert_eq!(module_id(Path::new("pkg/__init__.py"), &roots()), Some("pkg".to_string()));
        assert_eq!(module_id(Path::new("src/__init__.py"), &roots()), None);
        assert_eq!(module_id(Path::new("__init__.py"), &roots()), None);
    }

    #[test]
    fn test_module_id_does_not_strip_lone_root_file() {
        // `src.py` is a module named src, not a source root
        assert_eq!(module_id(Path::new("src.py"), &roots()), Some("src".to_string()));
    }

    #[test]
    fn test_module_id_multi_segment_root() {
        let roots = vec!["lib/python".to_string()];
        assert_eq!(module_id(Path::new("lib/python/a/b.py"), &roots), Some("a.b".to_string()));
    }

    #[test]
    fn test_package_of() {
        assert_eq!(package_of("a.b.c", false), "a.b");
        assert_eq!(package_of("a.b", true), "a.b");
        assert_eq!(package_of("top", false), "");
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(resolve_relative("a.b", 1, "c"), Some("a.b.c".to_string()));
        assert_eq!(resolve_relative("a.b", 2, "c"), Some("a.c".to_string()));
        assert_eq!(resolve_relative("a.b", 1, ""), Some("a.b".to_string()));
        assert_eq!(resolve_relative("a", 3, "x"), None);
        assert_eq!(resolve_relative("", 1, "x"), Some("x".to_string()));
    }
}
