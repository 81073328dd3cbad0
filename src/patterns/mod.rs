//! Architecture pattern matching
//!
//! Each style (hexagonal, layered, ddd, cqrs, mvc) is a [`PatternSpec`]:
//! required, optional and forbidden directory names scored against the
//! project's directory tree, a class-naming pass that can only refine a
//! structural match, and a list of cross-layer import rules reported as
//! violations.

pub mod builtin;
pub mod matcher;
pub mod spec;
pub mod violations;

pub use builtin::builtin_specs;
pub use matcher::PatternMatcher;
pub use spec::{evaluate, score, DirectoryTree, PatternSpec, StructuralScore};
pub use violations::{find_violations, ViolationRule};
