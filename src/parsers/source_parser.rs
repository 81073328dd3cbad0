//! Python source parser built on tree-sitter

use super::fact_extractor;
use crate::models::config::DEFAULT_MAX_FILE_SIZE;
use crate::models::facts::{FactSheet, ParseFailure};
use std::fs;
use std::path::Path;
use tracing::debug;
use tree_sitter::{Node, Parser};

/// Turns one Python file into a [`FactSheet`].
///
/// Parsing never executes the analyzed code. Each call builds its own
/// tree-sitter parser, so a single `SourceParser` can be shared across
/// worker threads.
#[derive(Debug, Clone)]
pub struct SourceParser {
    max_file_size: u64,
}

impl SourceParser {
    pub fn new() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    pub fn with_max_file_size(max_file_size: u64) -> Self {
        Self { max_file_size }
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Parse a file from disk
    pub fn parse_file(&self, path: &Path) -> Result<FactSheet, ParseFailure> {
        let metadata = fs::metadata(path).map_err(|e| ParseFailure::Io {
            message: e.to_string(),
        })?;
        if metadata.len() > self.max_file_size {
            debug!(path = %path.display(), size = metadata.len(), "skipping oversized file");
            return Err(ParseFailure::TooLarge {
                size: metadata.len(),
                limit: self.max_file_size,
            });
        }

        let bytes = fs::read(path).map_err(|e| ParseFailure::Io {
            message: e.to_string(),
        })?;
        let source = String::from_utf8(bytes).map_err(|_| ParseFailure::Decode)?;
        self.parse_source(&source, path)
    }

    /// Parse source text already in memory; `path` is recorded on the sheet
    pub fn parse_source(&self, source: &str, path: &Path) -> Result<FactSheet, ParseFailure> {
        let size = source.len() as u64;
        if size > self.max_file_size {
            return Err(ParseFailure::TooLarge {
                size,
                limit: self.max_file_size,
            });
        }

        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| ParseFailure::Grammar {
                message: e.to_string(),
            })?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| ParseFailure::Grammar {
                message: "parser produced no tree".to_string(),
            })?;

        let root = tree.root_node();
        if root.has_error() {
            let line = first_error_line(root).unwrap_or(1);
            debug!(path = %path.display(), line, "skipping file with syntax errors");
            return Err(ParseFailure::Syntax { line });
        }

        Ok(fact_extractor::extract(root, source.as_bytes(), path))
    }
}

impl Default for SourceParser {
    fn default() -> Self {
        Self::new()
    }
}

/// 1-based line of the first error or missing node, in document order
fn first_error_line(root: Node<'_>) -> Option<usize> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node.start_position().row + 1);
        }
        if !node.has_error() {
            continue;
        }
        stack.extend((0..node.child_count()).rev().filter_map(|i| node.child(i)));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::facts::{DeclarationKind, ImportKind};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse(source: &str) -> FactSheet {
        SourceParser::new()
            .parse_source(source, Path::new("pkg/module.py"))
            .unwrap()
    }

    #[test]
    fn test_plain_and_from_imports() {
        let sheet = parse(
            "import os\nimport a.b as ab, c\nfrom x.y import z, w as ww\nfrom m import *\n",
        );
        let imports: Vec<&str> = sheet.imports.iter().map(String::as_str).collect();
        assert_eq!(imports, vec!["a.b", "c", "m", "os", "x.y"]);

        let from = &sheet.import_statements[3];
        assert_eq!(from.kind, ImportKind::From);
        assert_eq!(from.module, "x.y");
        assert_eq!(from.names, vec!["z", "w"]);
        assert_eq!(sheet.import_statements[4].names, vec!["*"]);
        assert_eq!(sheet.import_statements[0].kind, ImportKind::Plain);
    }

    #[test]
    fn test_relative_imports() {
        let sheet = parse("from . import sibling, other\nfrom ..core import engine\n");
        assert!(sheet.imports.contains("sibling"));
        assert!(sheet.imports.contains("other"));
        assert!(sheet.imports.contains("core"));
        assert!(!sheet.imports.iter().any(|i| i.starts_with('.')));

        let first = &sheet.import_statements[0];
        assert_eq!(first.level, 1);
        assert_eq!(first.module, "");
        let second = &sheet.import_statements[1];
        assert_eq!(second.level, 2);
        assert_eq!(second.module, "core");
        assert!(second.is_relative());
    }

    #[test]
    fn test_future_imports_are_ignored() {
        let sheet = parse("from __future__ import annotations\nimport json\n");
        assert_eq!(sheet.imports.len(), 1);
        assert!(sheet.imports.contains("json"));
    }

    #[test]
    fn test_class_bases_and_decorators() {
        let sheet = parse(
            "\
@dataclass
@app.route('/x', methods=['GET'])
class Order(models.Model, Generic[T], metaclass=Meta):
    async def save(self):
        pass
",
        );
        let class = sheet.classes().next().unwrap();
        assert_eq!(class.name, "Order");
        assert_eq!(class.bases, vec!["models.Model", "Generic"]);
        assert_eq!(class.decorators, vec!["dataclass", "app.route"]);
        assert!(class.has_base("Model"));
        assert_eq!(class.start_line, 3);
        assert_eq!(class.end_line, 5);

        let method = sheet.functions().next().unwrap();
        assert_eq!(method.kind, DeclarationKind::Function);
        assert_eq!(method.parent.as_deref(), Some("Order"));
        assert!(method.is_async);
        assert_eq!(sheet.complexity.get("Order.save"), Some(&1));
    }

    #[test]
    fn test_module_variables() {
        let sheet = parse(
            "DEBUG: bool = True\na, b = 1, 2\nx = y = 0\nobj.attr = 3\n\ndef f():\n    local = 1\n",
        );
        let names: Vec<&str> = sheet
            .module_variables
            .iter()
            .map(|v| v.name.as_str())
            .collect();
        assert_eq!(names, vec!["DEBUG", "a", "b", "x", "y"]);
        assert_eq!(sheet.module_variables[0].type_hint.as_deref(), Some("bool"));
        assert_eq!(sheet.module_variables[1].type_hint, None);
    }

    #[test]
    fn test_syntax_error_is_a_skip_reason() {
        let failure = SourceParser::new()
            .parse_source("def broken(:\n    pass\n", Path::new("bad.py"))
            .unwrap_err();
        assert!(matches!(failure, ParseFailure::Syntax { line: 1 }));
    }

    #[test]
    fn test_oversized_source_is_rejected() {
        let parser = SourceParser::with_max_file_size(8);
        let failure = parser
            .parse_source("import os\n", Path::new("big.py"))
            .unwrap_err();
        assert_eq!(failure, ParseFailure::TooLarge { size: 10, limit: 8 });
    }

    #[test]
    fn test_parse_file_rejects_non_utf8() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0x69, 0x6d, 0xff, 0xfe, 0x0a]).unwrap();
        let failure = SourceParser::new().parse_file(file.path()).unwrap_err();
        assert_eq!(failure, ParseFailure::Decode);
    }

    #[test]
    fn test_parse_file_reads_disk() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "import requests").unwrap();
        let sheet = SourceParser::new().parse_file(file.path()).unwrap();
        assert!(sheet.imports.contains("requests"));
        assert_eq!(sheet.path, file.path());
    }

    #[test]
    fn test_deeply_nested_literal() {
        let depth = 50_000;
        let source = format!("x = {}1{}\n", "[".repeat(depth), "]".repeat(depth));
        let sheet = parse(&source);
        assert_eq!(sheet.module_variables.len(), 1);
        assert_eq!(sheet.module_variables[0].name, "x");
    }

    #[test]
    fn test_deeply_nested_expression_in_function() {
        let depth = 50_000;
        let source = format!(
            "def f(a, b, c):\n    return {}a if b else c{}\n\nimport os\n",
            "(".repeat(depth),
            ")".repeat(depth)
        );
        let sheet = parse(&source);
        assert_eq!(sheet.complexity.get("f"), Some(&2));
        assert!(sheet.imports.contains("os"));
    }

    #[test]
    fn test_deeply_nested_syntax_error() {
        let source = format!("x = {}\n", "[".repeat(50_000));
        let failure = SourceParser::new()
            .parse_source(&source, Path::new("deep.py"))
            .unwrap_err();
        assert!(matches!(failure, ParseFailure::Syntax { .. }));
    }

    #[test]
    fn test_missing_file_is_io_failure() {
        let failure = SourceParser::new()
            .parse_file(Path::new("/definitely/not/here.py"))
            .unwrap_err();
        assert!(matches!(failure, ParseFailure::Io { .. }));
    }
}
