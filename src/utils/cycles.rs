//! Elementary cycle enumeration over directed graphs
//!
//! Johnson's algorithm, run separately inside each non-trivial strongly
//! connected component found by `tarjan_scc`. Enumeration stops once the
//! caller's limit is reached and the result is marked truncated.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet, VecDeque};

/// Result of a bounded cycle search
#[derive(Debug, Clone, Default)]
pub struct CycleSearch {
    /// Each cycle lists its nodes once, in edge order, without repeating the start
    pub cycles: Vec<Vec<NodeIndex>>,
    /// True when more cycles exist than the limit allowed
    pub truncated: bool,
}

/// Enumerate elementary cycles, including self-loops, up to `limit`
pub fn elementary_cycles<N, E>(graph: &DiGraph<N, E>, limit: usize) -> CycleSearch {
    let mut search = CycleSearch::default();
    if limit == 0 {
        search.truncated = petgraph::algo::is_cyclic_directed(graph);
        return search;
    }

    let mut components = tarjan_scc(graph);
    for component in components.iter_mut() {
        component.sort_unstable();
    }
    components.sort_unstable();

    for component in components {
        let self_loop = component.len() == 1 && graph.contains_edge(component[0], component[0]);
        if component.len() < 2 && !self_loop {
            continue;
        }

        let local: HashMap<NodeIndex, usize> = component
            .iter()
            .enumerate()
            .map(|(i, idx)| (*idx, i))
            .collect();
        let adjacency: Vec<Vec<usize>> = component
            .iter()
            .map(|idx| {
                let mut next: Vec<usize> = graph
                    .neighbors(*idx)
                    .filter_map(|n| local.get(&n).copied())
                    .collect();
                next.sort_unstable();
                next.dedup();
                next
            })
            .collect();

        let mut johnson = Johnson::new(&adjacency, limit - search.cycles.len());
        johnson.run();
        search.truncated |= johnson.truncated;
        search.cycles.extend(
            johnson
                .found
                .into_iter()
                .map(|cycle| cycle.into_iter().map(|i| component[i]).collect()),
        );

        if search.truncated {
            break;
        }
    }

    search
}

struct Johnson<'a> {
    adjacency: &'a [Vec<usize>],
    limit: usize,
    start: usize,
    members: HashSet<usize>,
    blocked: Vec<bool>,
    blocked_by: Vec<HashSet<usize>>,
    stack: Vec<usize>,
    found: Vec<Vec<usize>>,
    truncated: bool,
}

impl<'a> Johnson<'a> {
    fn new(adjacency: &'a [Vec<usize>], limit: usize) -> Self {
        let n = adjacency.len();
        Self {
            adjacency,
            limit,
            start: 0,
            members: HashSet::new(),
            blocked: vec![false; n],
            blocked_by: vec![HashSet::new(); n],
            stack: Vec::new(),
            found: Vec::new(),
            truncated: false,
        }
    }

    fn run(&mut self) {
        for start in 0..self.adjacency.len() {
            self.members = self.component_of(start);
            let self_loop = self.adjacency[start].contains(&start);
            if self.members.len() < 2 && !self_loop {
                continue;
            }

            self.start = start;
            for &m in &self.members {
                self.blocked[m] = false;
                self.blocked_by[m].clear();
            }
            self.circuit(start);

            if self.truncated {
                return;
            }
        }
    }

    /// Strongly connected component containing `start` within nodes >= start
    fn component_of(&self, start: usize) -> HashSet<usize> {
        let forward = self.reach(start, |v| self.adjacency[v].clone());
        let mut reverse: Vec<Vec<usize>> = vec![Vec::new(); self.adjacency.len()];
        for (v, next) in self.adjacency.iter().enumerate() {
            for &w in next {
                reverse[w].push(v);
            }
        }
        let backward = self.reach(start, |v| reverse[v].clone());
        forward.intersection(&backward).copied().collect()
    }

    fn reach<F>(&self, start: usize, next: F) -> HashSet<usize>
    where
        F: Fn(usize) -> Vec<usize>,
    {
        let mut seen = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(v) = queue.pop_front() {
            for w in next(v) {
                if w >= start && seen.insert(w) {
                    queue.push_back(w);
                }
            }
        }
        seen
    }

    fn circuit(&mut self, v: usize) -> bool {
        let mut closed = false;
        self.stack.push(v);
        self.blocked[v] = true;

        let adjacency = self.adjacency;
        for &w in &adjacency[v] {
            if self.truncated {
                break;
            }
            if !self.members.contains(&w) {
                continue;
            }
            if w == self.start {
                if self.found.len() >= self.limit {
                    self.truncated = true;
                    break;
                }
                self.found.push(self.stack.clone());
                closed = true;
            } else if !self.blocked[w] && self.circuit(w) {
                closed = true;
            }
        }

        if closed {
            self.unblock(v);
        } else {
            for &w in &adjacency[v] {
                if self.members.contains(&w) {
                    self.blocked_by[w].insert(v);
                }
            }
        }

        self.stack.pop();
        closed
    }

    fn unblock(&mut self, v: usize) {
        self.blocked[v] = false;
        let waiting: Vec<usize> = self.blocked_by[v].drain().collect();
        for w in waiting {
            if self.blocked[w] {
                self.unblock(w);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(u32, u32)], nodes: u32) -> DiGraph<(), ()> {
        let mut g = DiGraph::new();
        for _ in 0..nodes {
            g.add_node(());
        }
        for (a, b) in edges {
            g.add_edge(NodeIndex::new(*a as usize), NodeIndex::new(*b as usize), ());
        }
        g
    }

    #[test]
    fn test_acyclic_graph_has_no_cycles() {
        let g = graph(&[(0, 1), (1, 2), (0, 2)], 3);
        let search = elementary_cycles(&g, 100);
        assert!(search.cycles.is_empty());
        assert!(!search.truncated);
    }

    #[test]
    fn test_two_node_cycle() {
        let g = graph(&[(0, 1), (1, 0)], 2);
        let search = elementary_cycles(&g, 100);
        assert_eq!(search.cycles.len(), 1);
        assert_eq!(search.cycles[0].len(), 2);
    }

    #[test]
    fn test_self_loop_is_a_cycle() {
        let g = graph(&[(0, 0), (0, 1)], 2);
        let search = elementary_cycles(&g, 100);
        assert_eq!(search.cycles, vec![vec![NodeIndex::new(0)]]);
    }

    #[test]
    fn test_overlapping_cycles_are_all_found() {
        // 0 -> 1 -> 2 -> 0 and 0 -> 2 -> 0
        let g = graph(&[(0, 1), (1, 2), (2, 0), (0, 2)], 3);
        let search = elementary_cycles(&g, 100);
        assert_eq!(search.cycles.len(), 2);
        let mut lengths: Vec<usize> = search.cycles.iter().map(Vec::len).collect();
        lengths.sort_unstable();
        assert_eq!(lengths, vec![2, 3]);
    }

    #[test]
    fn test_complete_graph_cycle_count() {
        // K4 has 20 elementary cycles: 6 of length 2, 8 of length 3, 6 of length 4
        let mut edges = Vec::new();
        for a in 0..4 {
            for b in 0..4 {
                if a != b {
                    edges.push((a, b));
                }
            }
        }
        let g = graph(&edges, 4);
        let search = elementary_cycles(&g, 1000);
        assert_eq!(search.cycles.len(), 20);
        assert!(!search.truncated);
    }

    #[test]
    fn test_limit_truncates() {
        let mut edges = Vec::new();
        for a in 0..4 {
            for b in 0..4 {
                if a != b {
                    edges.push((a, b));
                }
            }
        }
        let g = graph(&edges, 4);
        let search = elementary_cycles(&g, 5);
        assert_eq!(search.cycles.len(), 5);
        assert!(search.truncated);
    }
}
