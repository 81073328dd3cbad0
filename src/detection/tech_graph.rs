//! Static "technology A implies technology B" relationships

use crate::error::{ArchscanError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// How strongly a child technology implies its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// The parent is certainly present when the child is
    Hard,
    /// The child makes the parent more likely
    Soft,
}

/// Confidence transfer along an edge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoostRule {
    /// Parent takes at least the child's confidence
    Match,
    /// Parent gains `child * m`, with 0 < m <= 1
    Multiplier(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnologyEdge {
    pub child: String,
    pub parent: String,
    pub kind: EdgeKind,
    pub boost: BoostRule,
}

impl TechnologyEdge {
    pub fn hard(child: &str, parent: &str) -> Self {
        Self {
            child: child.to_string(),
            parent: parent.to_string(),
            kind: EdgeKind::Hard,
            boost: BoostRule::Match,
        }
    }

    pub fn soft(child: &str, parent: &str, multiplier: f64) -> Self {
        Self {
            child: child.to_string(),
            parent: parent.to_string(),
            kind: EdgeKind::Soft,
            boost: BoostRule::Multiplier(multiplier),
        }
    }

    fn validate(&self) -> Result<()> {
        let invalid = |message: &str| {
            Err(ArchscanError::invalid_edge(
                self.child.clone(),
                self.parent.clone(),
                message,
            ))
        };

        if self.child.trim().is_empty() || self.parent.trim().is_empty() {
            return invalid("technology names must not be empty");
        }
        if self.child == self.parent {
            return invalid("a technology cannot imply itself");
        }
        match (self.kind, self.boost) {
            (EdgeKind::Hard, BoostRule::Match) => Ok(()),
            (EdgeKind::Soft, BoostRule::Multiplier(m)) if m > 0.0 && m <= 1.0 => Ok(()),
            (EdgeKind::Soft, BoostRule::Multiplier(_)) => {
                invalid("soft multiplier must be in (0, 1]")
            }
            (EdgeKind::Hard, _) => invalid("hard edges transfer the full confidence"),
            (EdgeKind::Soft, _) => invalid("soft edges need a multiplier"),
        }
    }
}

/// Validated, read-only technology relationship graph
#[derive(Debug, Clone)]
pub struct TechnologyGraph {
    edges: Vec<TechnologyEdge>,
    by_child: HashMap<String, Vec<usize>>,
}

impl TechnologyGraph {
    /// Build a graph, rejecting invalid or duplicate edges
    pub fn new(edges: Vec<TechnologyEdge>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut by_child: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, edge) in edges.iter().enumerate() {
            edge.validate()?;
            if !seen.insert((edge.child.as_str(), edge.parent.as_str())) {
                return Err(ArchscanError::invalid_edge(
                    edge.child.clone(),
                    edge.parent.clone(),
                    "duplicate edge",
                ));
            }
            by_child.entry(edge.child.clone()).or_default().push(i);
        }
        Ok(Self { edges, by_child })
    }

    /// The curated relationships shipped with archscan
    pub fn builtin() -> Result<Self> {
        Self::new(vec![
            TechnologyEdge::hard("django", "python"),
            TechnologyEdge::hard("flask", "python"),
            TechnologyEdge::hard("fastapi", "python"),
            TechnologyEdge::hard("pytest", "python"),
            TechnologyEdge::hard("sqlalchemy", "python"),
            TechnologyEdge::hard("celery", "python"),
            TechnologyEdge::hard("pydantic", "python"),
            TechnologyEdge::soft("fastapi", "pydantic", 0.5),
            TechnologyEdge::soft("alembic", "sqlalchemy", 0.6),
            TechnologyEdge::hard("react", "javascript"),
            TechnologyEdge::hard("nextjs", "react"),
            TechnologyEdge::hard("nextjs", "javascript"),
            TechnologyEdge::hard("vue", "javascript"),
            TechnologyEdge::hard("express", "nodejs"),
            TechnologyEdge::hard("nodejs", "javascript"),
            TechnologyEdge::soft("typescript", "javascript", 0.8),
            TechnologyEdge::hard("jest", "javascript"),
            TechnologyEdge::hard("docker-compose", "docker"),
        ])
    }

    pub fn edges(&self) -> &[TechnologyEdge] {
        &self.edges
    }

    /// Outgoing edges of a child technology
    pub fn parents_of<'a>(&'a self, child: &str) -> impl Iterator<Item = &'a TechnologyEdge> + 'a {
        self.by_child
            .get(child)
            .into_iter()
            .flatten()
            .map(move |&i| &self.edges[i])
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}
