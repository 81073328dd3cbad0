//! Walks a Python syntax tree and collects its structural facts

use super::complexity::declaration_complexity;
use crate::models::facts::{
    Declaration, DeclarationKind, FactSheet, ImportKind, ImportStatement, ModuleVariable,
};
use std::path::Path;
use tree_sitter::Node;

const FUTURE_MODULE: &str = "__future__";

/// Extract a fact sheet from a parsed module
pub fn extract(root: Node<'_>, source: &[u8], path: &Path) -> FactSheet {
    let mut extractor = FactExtractor {
        source,
        sheet: FactSheet::new(path),
    };
    extractor.module_variables(root);
    extractor.visit(root, None);
    extractor.sheet
}

struct FactExtractor<'s> {
    source: &'s [u8],
    sheet: FactSheet,
}

impl<'s> FactExtractor<'s> {
    /// Pre-order walk with an explicit stack; nesting depth is bounded only
    /// by the heap
    fn visit(&mut self, root: Node<'_>, scope: Option<&str>) {
        let mut stack: Vec<(Node<'_>, Option<String>)> = vec![(root, scope.map(str::to_string))];
        while let Some((node, scope)) = stack.pop() {
            match node.kind() {
                "import_statement" => self.plain_import(node),
                "import_from_statement" => self.from_import(node),
                "future_import_statement" => {}
                "class_definition" | "function_definition" => {
                    if let Some(body) = self.definition(node, scope.as_deref(), Vec::new()) {
                        stack.push(body);
                    }
                }
                "decorated_definition" => {
                    let decorators = self.decorators(node);
                    if let Some(definition) = node.child_by_field_name("definition") {
                        if let Some(body) = self.definition(definition, scope.as_deref(), decorators) {
                            stack.push(body);
                        }
                    }
                }
                _ => {
                    for child in children(node).into_iter().rev() {
                        stack.push((child, scope.clone()));
                    }
                }
            }
        }
    }

    fn plain_import(&mut self, node: Node<'_>) {
        let line = line_of(node);
        let mut cursor = node.walk();
        let targets: Vec<Node<'_>> = node.children_by_field_name("name", &mut cursor).collect();
        for target in targets {
            let Some(module) = self.imported_name(target) else {
                continue;
            };
            self.sheet.imports.insert(module.clone());
            self.sheet.import_statements.push(ImportStatement {
                kind: ImportKind::Plain,
                module,
                level: 0,
                names: Vec::new(),
                line,
            });
        }
    }

    fn from_import(&mut self, node: Node<'_>) {
        let Some(module_node) = node.child_by_field_name("module_name") else {
            return;
        };

        let (level, module) = match module_node.kind() {
            "relative_import" => {
                let mut level = 0;
                let mut module = String::new();
                for child in children(module_node) {
                    match child.kind() {
                        "import_prefix" => level = self.text(child).matches('.').count(),
                        "dotted_name" => module = self.dotted(child),
                        _ => {}
                    }
                }
                (level, module)
            }
            _ => (0, self.dotted(module_node)),
        };

        if level == 0 && module == FUTURE_MODULE {
            return;
        }

        let mut names = Vec::new();
        if children(node).iter().any(|c| c.kind() == "wildcard_import") {
            names.push("*".to_string());
        } else {
            let mut cursor = node.walk();
            let targets: Vec<Node<'_>> =
                node.children_by_field_name("name", &mut cursor).collect();
            names.extend(targets.into_iter().filter_map(|t| self.imported_name(t)));
        }

        if module.is_empty() {
            // `from . import a, b` pulls in sibling modules
            for name in names.iter().filter(|n| n.as_str() != "*") {
                self.sheet.imports.insert(name.clone());
            }
        } else {
            self.sheet.imports.insert(module.clone());
        }

        self.sheet.import_statements.push(ImportStatement {
            kind: ImportKind::From,
            module,
            level,
            names,
            line: line_of(node),
        });
    }

    /// Name bound by an import target, ignoring any `as` alias
    fn imported_name(&self, target: Node<'_>) -> Option<String> {
        let name = match target.kind() {
            "aliased_import" => target.child_by_field_name("name")?,
            _ => target,
        };
        let dotted = self.dotted(name);
        (!dotted.is_empty()).then_some(dotted)
    }

    /// Record a declaration and hand back its body to visit in the new scope
    fn definition<'t>(
        &mut self,
        node: Node<'t>,
        scope: Option<&str>,
        decorators: Vec<String>,
    ) -> Option<(Node<'t>, Option<String>)> {
        let kind = match node.kind() {
            "class_definition" => DeclarationKind::Class,
            "function_definition" => DeclarationKind::Function,
            _ => return None,
        };
        let name = node.child_by_field_name("name").map(|n| self.text(n))?;

        let bases = match kind {
            DeclarationKind::Class => node
                .child_by_field_name("superclasses")
                .map(|args| self.bases(args))
                .unwrap_or_default(),
            DeclarationKind::Function => Vec::new(),
        };
        let is_async = kind == DeclarationKind::Function
            && node.child(0).map(|c| c.kind() == "async").unwrap_or(false);

        let declaration = Declaration {
            kind,
            name,
            parent: scope.map(str::to_string),
            start_line: line_of(node),
            end_line: node.end_position().row + 1,
            bases,
            decorators,
            is_async,
        };
        let qualified = declaration.qualified_name();

        let body = node.child_by_field_name("body");
        let complexity = body.map(declaration_complexity).unwrap_or(1);
        self.sheet.complexity.insert(qualified.clone(), complexity);
        self.sheet.declarations.push(declaration);

        body.map(|body| (body, Some(qualified)))
    }

    fn bases(&self, arguments: Node<'_>) -> Vec<String> {
        children(arguments)
            .into_iter()
            .filter(|c| c.is_named())
            .filter_map(|arg| match arg.kind() {
                "identifier" | "attribute" => Some(self.dotted(arg)),
                // Generic[T] and friends keep their base name
                "subscript" => arg.child_by_field_name("value").map(|v| self.dotted(v)),
                _ => None,
            })
            .filter(|b| !b.is_empty())
            .collect()
    }

    fn decorators(&self, decorated: Node<'_>) -> Vec<String> {
        children(decorated)
            .into_iter()
            .filter(|c| c.kind() == "decorator")
            .filter_map(|decorator| {
                let expression = children(decorator).into_iter().find(|c| c.is_named())?;
                let target = match expression.kind() {
                    "call" => expression.child_by_field_name("function")?,
                    _ => expression,
                };
                let name = self.dotted(target);
                (!name.is_empty()).then_some(name)
            })
            .collect()
    }

    /// Module-level assignment targets
    fn module_variables(&mut self, root: Node<'_>) {
        for statement in children(root) {
            if statement.kind() != "expression_statement" {
                continue;
            }
            for child in children(statement) {
                if child.kind() == "assignment" {
                    self.assignment(child);
                }
            }
        }
    }

    fn assignment(&mut self, node: Node<'_>) {
        let mut next = Some(node);
        while let Some(node) = next {
            let type_hint = node.child_by_field_name("type").map(|t| self.text(t));
            if let Some(left) = node.child_by_field_name("left") {
                match left.kind() {
                    "identifier" => self.push_variable(self.text(left), type_hint),
                    "pattern_list" | "tuple_pattern" | "list_pattern" => {
                        for target in children(left) {
                            if target.kind() == "identifier" {
                                self.push_variable(self.text(target), None);
                            }
                        }
                    }
                    _ => {}
                }
            }
            // a = b = value
            next = node
                .child_by_field_name("right")
                .filter(|right| right.kind() == "assignment");
        }
    }

    fn push_variable(&mut self, name: String, type_hint: Option<String>) {
        if self.sheet.module_variables.iter().any(|v| v.name == name) {
            return;
        }
        self.sheet.module_variables.push(ModuleVariable { name, type_hint });
    }

    fn text(&self, node: Node<'_>) -> String {
        node.utf8_text(self.source).unwrap_or("").to_string()
    }

    /// Node text with whitespace removed, so `a . b` reads as `a.b`
    fn dotted(&self, node: Node<'_>) -> String {
        self.text(node).split_whitespace().collect()
    }
}

fn children(node: Node<'_>) -> Vec<Node<'_>> {
    (0..node.child_count()).filter_map(|i| node.child(i)).collect()
}

fn line_of(node: Node<'_>) -> usize {
    node.start_position().row + 1
}
