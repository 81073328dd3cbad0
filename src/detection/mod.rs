//! Technology detection
//!
//! Detection runs in two phases: a cheap indicator scan proposes candidate
//! technologies, then only the plugins of those candidates are loaded and
//! asked for a confidence. The combined matches are boosted once along the
//! technology relationship graph.

pub mod boosting;
pub mod indicators;
pub mod orchestrator;
pub mod tech_graph;

pub use boosting::apply_boosting;
pub use indicators::{scan_indicators, IndicatorScan};
pub use orchestrator::{DetectionOptions, DetectionOrchestrator};
pub use tech_graph::{BoostRule, EdgeKind, TechnologyEdge, TechnologyGraph};
