//! Module dependency graph and its analyses
//!
//! Nodes live in a petgraph arena and are addressed by their normalized
//! dotted id through a side index, so import cycles never become ownership
//! cycles.

use crate::error::{ArchscanError, Result};
use crate::models::facts::SkippedFile;
use crate::utils::cycles::elementary_cycles;
use chrono::{DateTime, Utc};
use petgraph::algo::{connected_components, tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Default cap on the number of enumerated cycles
pub const DEFAULT_MAX_CYCLES: usize = 1000;

/// A module in the dependency graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleNode {
    /// Normalized dot-separated id without file extension
    pub id: String,
    /// Project-relative source file; none for external modules
    pub path: Option<PathBuf>,
    /// True when the module was imported but not found in the project
    pub external: bool,
    /// Import statements pointing out of this module
    pub import_count: usize,
}

/// An import relationship between two modules
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImportEdge {
    pub weight: f64,
}

impl Default for ImportEdge {
    fn default() -> Self {
        Self { weight: 1.0 }
    }
}

/// Severity of a circular dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleSeverity {
    High,
    Medium,
    Low,
}

impl CycleSeverity {
    /// Severity for a cycle with `length` distinct modules
    pub fn for_length(length: usize) -> Self {
        match length {
            0..=2 => CycleSeverity::High,
            3..=5 => CycleSeverity::Medium,
            _ => CycleSeverity::Low,
        }
    }

    pub fn rank(&self) -> u8 {
        match self {
            CycleSeverity::High => 0,
            CycleSeverity::Medium => 1,
            CycleSeverity::Low => 2,
        }
    }
}

impl std::fmt::Display for CycleSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CycleSeverity::High => write!(f, "high"),
            CycleSeverity::Medium => write!(f, "medium"),
            CycleSeverity::Low => write!(f, "low"),
        }
    }
}

/// A closed import cycle (first id == last id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircularDependency {
    pub cycle: Vec<String>,
    pub severity: CycleSeverity,
    pub suggestion: String,
}

impl CircularDependency {
    /// Build from an open cycle listing each module once
    pub fn from_open_cycle(mut modules: Vec<String>) -> Self {
        let length = modules.len();
        let severity = CycleSeverity::for_length(length);
        let suggestion = suggestion_for(&modules);
        if let Some(first) = modules.first().cloned() {
            modules.push(first);
        }
        Self {
            cycle: modules,
            severity,
            suggestion,
        }
    }

    /// Number of distinct modules in the cycle
    pub fn len(&self) -> usize {
        self.cycle.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.cycle.is_empty()
    }
}

fn suggestion_for(modules: &[String]) -> String {
    match modules {
        [only] => format!("Remove the import of '{}' from itself", only),
        [a, b] => format!(
            "Break the mutual import between '{}' and '{}' by moving shared code into a third module or importing lazily inside the function that needs it",
            a, b
        ),
        _ if modules.len() <= 5 => format!(
            "Introduce an interface or move shared code so one of {} no longer imports the next",
            modules.join(" -> ")
        ),
        _ => format!(
            "Review layering: {} modules form a long import chain starting at '{}'",
            modules.len(),
            modules[0]
        ),
    }
}

/// Afferent/efferent coupling for one module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouplingMetrics {
    pub module: String,
    /// In-degree: modules importing this one
    pub afferent: usize,
    /// Out-degree: modules this one imports
    pub efferent: usize,
    /// efferent / (efferent + afferent), 0.0 for isolated modules
    pub instability: f64,
}

impl CouplingMetrics {
    pub fn new(module: impl Into<String>, afferent: usize, efferent: usize) -> Self {
        let total = afferent + efferent;
        let instability = if total == 0 {
            0.0
        } else {
            efferent as f64 / total as f64
        };
        Self {
            module: module.into(),
            afferent,
            efferent,
            instability,
        }
    }
}

/// Whole-graph shape metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphMetrics {
    pub node_count: usize,
    pub edge_count: usize,
    pub avg_in_degree: f64,
    pub avg_out_degree: f64,
    pub max_in_degree: usize,
    pub max_out_degree: usize,
    pub cyclic: bool,
    /// Longest path in edges; null when the graph is cyclic
    pub longest_path: Option<usize>,
    pub strongly_connected_components: usize,
    pub weakly_connected_components: usize,
    pub density: f64,
}

/// Plain serialization form of a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub directed: bool,
    pub metadata: GraphMetadata,
    pub nodes: Vec<ModuleNode>,
    pub edges: Vec<EdgeRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphMetadata {
    pub project_root: PathBuf,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
    pub weight: f64,
}

/// Outcome of a bounded cycle enumeration, in module ids
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub cycles: Vec<Vec<String>>,
    pub truncated: bool,
}

/// Directed graph of module import relationships
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<ModuleNode, ImportEdge>,
    index: HashMap<String, NodeIndex>,
    project_root: PathBuf,
    created_at: DateTime<Utc>,
}

impl DependencyGraph {
    /// Create an empty graph for a project
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
            project_root: project_root.into(),
            created_at: Utc::now(),
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Add a project module, upgrading an existing external node in place
    pub fn add_module(&mut self, id: &str, path: Option<PathBuf>) -> NodeIndex {
        if let Some(&idx) = self.index.get(id) {
            let node = &mut self.graph[idx];
            if node.external && path.is_some() {
                node.external = false;
                node.path = path;
            }
            return idx;
        }
        let idx = self.graph.add_node(ModuleNode {
            id: id.to_string(),
            path,
            external: false,
            import_count: 0,
        });
        self.index.insert(id.to_string(), idx);
        idx
    }

    /// Add a module that is imported but not part of the project
    pub fn add_external(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(ModuleNode {
            id: id.to_string(),
            path: None,
            external: true,
            import_count: 0,
        });
        self.index.insert(id.to_string(), idx);
        idx
    }

    /// Record one import from `source` to `target`.
    ///
    /// Repeated imports collapse into a single edge; each call still counts
    /// toward the source's `import_count`. Unknown targets become external
    /// nodes. Returns true when a new edge was created.
    pub fn add_import(&mut self, source: &str, target: &str) -> bool {
        let from = match self.index.get(source) {
            Some(&idx) => idx,
            None => self.add_external(source),
        };
        let to = match self.index.get(target) {
            Some(&idx) => idx,
            None => self.add_external(target),
        };

        self.graph[from].import_count += 1;

        if self.graph.find_edge(from, to).is_some() {
            return false;
        }
        self.graph.add_edge(from, to, ImportEdge::default());
        true
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&ModuleNode> {
        self.index.get(id).map(|idx| &self.graph[*idx])
    }

    /// All nodes, sorted by id
    pub fn nodes(&self) -> Vec<&ModuleNode> {
        let mut nodes: Vec<&ModuleNode> = self.graph.node_weights().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }

    /// All edges as (source, target, weight), sorted by (source, target)
    pub fn edges(&self) -> Vec<(String, String, f64)> {
        let mut edges: Vec<(String, String, f64)> = self
            .graph
            .edge_references()
            .map(|e| {
                (
                    self.graph[e.source()].id.clone(),
                    self.graph[e.target()].id.clone(),
                    e.weight().weight,
                )
            })
            .collect();
        edges.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
        edges
    }

    fn lookup(&self, id: &str) -> Result<NodeIndex> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| ArchscanError::module_not_found(id))
    }

    /// Modules imported by `id`, sorted
    pub fn dependencies(&self, id: &str) -> Result<Vec<String>> {
        let idx = self.lookup(id)?;
        Ok(self.sorted_ids(self.graph.neighbors_directed(idx, Direction::Outgoing)))
    }

    /// Modules importing `id`, sorted
    pub fn dependents(&self, id: &str) -> Result<Vec<String>> {
        let idx = self.lookup(id)?;
        Ok(self.sorted_ids(self.graph.neighbors_directed(idx, Direction::Incoming)))
    }

    fn sorted_ids(&self, indices: impl Iterator<Item = NodeIndex>) -> Vec<String> {
        let mut ids: Vec<String> = indices.map(|i| self.graph[i].id.clone()).collect();
        ids.sort();
        ids.dedup();
        ids
    }

    fn in_degree(&self, idx: NodeIndex) -> usize {
        self.graph.edges_directed(idx, Direction::Incoming).count()
    }

    fn out_degree(&self, idx: NodeIndex) -> usize {
        self.graph.edges_directed(idx, Direction::Outgoing).count()
    }

    /// Modules with in-degree 0, sorted
    pub fn roots(&self) -> Vec<String> {
        self.sorted_ids(
            self.graph
                .node_indices()
                .filter(|i| self.in_degree(*i) == 0),
        )
    }

    /// Modules with out-degree 0, sorted
    pub fn leaves(&self) -> Vec<String> {
        self.sorted_ids(
            self.graph
                .node_indices()
                .filter(|i| self.out_degree(*i) == 0),
        )
    }

    /// Whether the graph contains any cycle, self-imports included
    pub fn is_cyclic(&self) -> bool {
        toposort(&self.graph, None).is_err()
    }

    /// Enumerate elementary cycles, shortest first.
    ///
    /// Each cycle is open (a module appears once) and rotated to start at
    /// its lexicographically smallest id.
    pub fn detect_cycles(&self, max_cycles: usize) -> CycleReport {
        let search = elementary_cycles(&self.graph, max_cycles);
        let mut cycles: Vec<Vec<String>> = search
            .cycles
            .into_iter()
            .map(|cycle| {
                let mut ids: Vec<String> =
                    cycle.into_iter().map(|i| self.graph[i].id.clone()).collect();
                let start = ids
                    .iter()
                    .enumerate()
                    .min_by(|a, b| a.1.cmp(b.1))
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                ids.rotate_left(start);
                ids
            })
            .collect();
        cycles.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

        CycleReport {
            cycles,
            truncated: search.truncated,
        }
    }

    /// Cycles as closed, classified circular dependencies sorted by
    /// (severity, length)
    pub fn circular_dependencies(&self, max_cycles: usize) -> (Vec<CircularDependency>, bool) {
        let report = self.detect_cycles(max_cycles);
        let mut deps: Vec<CircularDependency> = report
            .cycles
            .into_iter()
            .map(CircularDependency::from_open_cycle)
            .collect();
        deps.sort_by(|a, b| {
            (a.severity.rank(), a.len())
                .cmp(&(b.severity.rank(), b.len()))
                .then_with(|| a.cycle.cmp(&b.cycle))
        });
        (deps, report.truncated)
    }

    /// Coupling metrics for every module, keyed by id
    pub fn coupling(&self) -> BTreeMap<String, CouplingMetrics> {
        self.graph
            .node_indices()
            .map(|idx| {
                let id = self.graph[idx].id.clone();
                let metrics = CouplingMetrics::new(id.clone(), self.in_degree(idx), self.out_degree(idx));
                (id, metrics)
            })
            .collect()
    }

    /// Coupling metrics for one module
    pub fn coupling_for(&self, id: &str) -> Result<CouplingMetrics> {
        let idx = self.lookup(id)?;
        Ok(CouplingMetrics::new(id, self.in_degree(idx), self.out_degree(idx)))
    }

    /// Longest-path depth of every node from the roots; `None` when cyclic
    fn depths(&self) -> Option<HashMap<NodeIndex, usize>> {
        let order = toposort(&self.graph, None).ok()?;
        let mut depths: HashMap<NodeIndex, usize> = HashMap::with_capacity(order.len());
        for idx in order {
            let depth = self
                .graph
                .neighbors_directed(idx, Direction::Incoming)
                .filter_map(|p| depths.get(&p))
                .map(|d| d + 1)
                .max()
                .unwrap_or(0);
            depths.insert(idx, depth);
        }
        Some(depths)
    }

    /// Longest path from any root to `id`, `None` when the graph is cyclic
    pub fn depth(&self, id: &str) -> Result<Option<usize>> {
        let idx = self.lookup(id)?;
        Ok(self.depths().and_then(|d| d.get(&idx).copied()))
    }

    /// Length in edges of the longest path, `None` when the graph is cyclic
    pub fn longest_path(&self) -> Option<usize> {
        self.depths()
            .map(|d| d.values().copied().max().unwrap_or(0))
    }

    pub fn graph_metrics(&self) -> GraphMetrics {
        let node_count = self.node_count();
        let edge_count = self.edge_count();
        let in_degrees: Vec<usize> = self.graph.node_indices().map(|i| self.in_degree(i)).collect();
        let out_degrees: Vec<usize> = self.graph.node_indices().map(|i| self.out_degree(i)).collect();

        let average = |total: usize| {
            if node_count == 0 {
                0.0
            } else {
                total as f64 / node_count as f64
            }
        };
        let density = if node_count > 1 {
            edge_count as f64 / (node_count as f64 * (node_count as f64 - 1.0))
        } else {
            0.0
        };
        let longest_path = self.longest_path();

        GraphMetrics {
            node_count,
            edge_count,
            avg_in_degree: average(in_degrees.iter().sum()),
            avg_out_degree: average(out_degrees.iter().sum()),
            max_in_degree: in_degrees.iter().copied().max().unwrap_or(0),
            max_out_degree: out_degrees.iter().copied().max().unwrap_or(0),
            cyclic: longest_path.is_none(),
            longest_path,
            strongly_connected_components: tarjan_scc(&self.graph).len(),
            weakly_connected_components: connected_components(&self.graph),
            density,
        }
    }

    /// Serialize to the plain node/edge form
    pub fn to_document(&self) -> GraphDocument {
        GraphDocument {
            directed: true,
            metadata: GraphMetadata {
                project_root: self.project_root.clone(),
                created_at: self.created_at,
            },
            nodes: self.nodes().into_iter().cloned().collect(),
            edges: self
                .edges()
                .into_iter()
                .map(|(source, target, weight)| EdgeRecord { source, target, weight })
                .collect(),
        }
    }

    /// Rebuild a graph from its plain form, preserving every attribute
    pub fn from_document(document: &GraphDocument) -> Result<Self> {
        if !document.directed {
            return Err(ArchscanError::analysis_error(
                "graph document is undirected; only directed graphs are supported",
            ));
        }

        let mut graph = Self {
            graph: DiGraph::with_capacity(document.nodes.len(), document.edges.len()),
            index: HashMap::with_capacity(document.nodes.len()),
            project_root: document.metadata.project_root.clone(),
            created_at: document.metadata.created_at,
        };

        for node in &document.nodes {
            if graph.index.contains_key(&node.id) {
                return Err(ArchscanError::analysis_error(format!(
                    "graph document lists node '{}' twice",
                    node.id
                )));
            }
            let idx = graph.graph.add_node(node.clone());
            graph.index.insert(node.id.clone(), idx);
        }

        for edge in &document.edges {
            let from = graph.lookup(&edge.source)?;
            let to = graph.lookup(&edge.target)?;
            graph.graph.update_edge(from, to, ImportEdge { weight: edge.weight });
        }

        Ok(graph)
    }

    /// Render as Graphviz DOT; edges on a cycle are red, external nodes dashed
    pub fn to_dot(&self) -> String {
        let mut component_of: HashMap<NodeIndex, usize> = HashMap::new();
        let mut cyclic_component: Vec<bool> = Vec::new();
        for (c, component) in tarjan_scc(&self.graph).into_iter().enumerate() {
            cyclic_component.push(component.len() > 1);
            for idx in component {
                component_of.insert(idx, c);
            }
        }
        let on_cycle = |from: NodeIndex, to: NodeIndex| {
            if from == to {
                return true;
            }
            match (component_of.get(&from), component_of.get(&to)) {
                (Some(a), Some(b)) => a == b && cyclic_component[*a],
                _ => false,
            }
        };

        let mut dot = String::from("digraph dependencies {\n");
        dot.push_str("  rankdir=LR;\n");
        dot.push_str("  node [shape=box];\n\n");

        for node in self.nodes() {
            if node.external {
                dot.push_str(&format!("  \"{}\" [style=dashed];\n", escape(&node.id)));
            } else {
                dot.push_str(&format!("  \"{}\";\n", escape(&node.id)));
            }
        }

        dot.push('\n');

        let mut edges: Vec<(NodeIndex, NodeIndex)> = self
            .graph
            .edge_references()
            .map(|e| (e.source(), e.target()))
            .collect();
        edges.sort_by(|a, b| {
            (&self.graph[a.0].id, &self.graph[a.1].id).cmp(&(&self.graph[b.0].id, &self.graph[b.1].id))
        });

        for (from, to) in edges {
            let attrs = if on_cycle(from, to) { " [color=red]" } else { "" };
            dot.push_str(&format!(
                "  \"{}\" -> \"{}\"{};\n",
                escape(&self.graph[from].id),
                escape(&self.graph[to].id),
                attrs
            ));
        }

        dot.push_str("}\n");
        dot
    }
}

fn escape(id: &str) -> String {
    id.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Aggregate analysis of a project's dependency graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyGraphAnalysis {
    pub project_root: PathBuf,
    pub node_count: usize,
    pub edge_count: usize,
    pub circular_dependencies: Vec<CircularDependency>,
    pub cycles_truncated: bool,
    /// Coupling per module, sorted by module id
    pub coupling: Vec<CouplingMetrics>,
    pub root_nodes: Vec<String>,
    pub leaf_nodes: Vec<String>,
    /// Longest path through the graph; null when cycles exist
    pub max_depth: Option<usize>,
    pub metrics: GraphMetrics,
    pub files_parsed: usize,
    pub skipped: Vec<SkippedFile>,
    pub analyzed_at: DateTime<Utc>,
}

impl DependencyGraphAnalysis {
    /// Analyze a built graph
    pub fn from_graph(graph: &DependencyGraph, max_cycles: usize) -> Self {
        let (circular_dependencies, cycles_truncated) = graph.circular_dependencies(max_cycles);
        let metrics = graph.graph_metrics();
        Self {
            project_root: graph.project_root().to_path_buf(),
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            circular_dependencies,
            cycles_truncated,
            coupling: graph.coupling().into_values().collect(),
            root_nodes: graph.roots(),
            leaf_nodes: graph.leaves(),
            max_depth: metrics.longest_path,
            metrics,
            files_parsed: 0,
            skipped: Vec::new(),
            analyzed_at: Utc::now(),
        }
    }

    /// Attach parse bookkeeping from the build step
    pub fn with_parse_summary(mut self, files_parsed: usize, skipped: Vec<SkippedFile>) -> Self {
        self.files_parsed = files_parsed;
        self.skipped = skipped;
        self
    }
}
