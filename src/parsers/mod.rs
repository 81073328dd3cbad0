//! Source parsing and dependency graph construction
//!
//! The source parser turns Python files into fact sheets with tree-sitter;
//! the graph builder reduces a project's fact sheets into a module graph.

pub mod complexity;
pub mod dependency_graph_builder;
pub mod fact_extractor;
pub mod source_parser;

pub use dependency_graph_builder::{DependencyGraphBuilder, GraphBuilderConfig};
pub use source_parser::SourceParser;
