//! Caching functionality for built dependency graphs
//!
//! This module provides a thread-safe, time-boxed cache keyed by project
//! root so repeated analyses of the same tree skip parsing.

use crate::error::Result;
use crate::models::dependency_graph::DependencyGraph;
use crate::models::facts::SkippedFile;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default lifetime of a cached graph
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// A built graph together with the parse summary that produced it
#[derive(Debug)]
pub struct ProjectGraph {
    pub graph: DependencyGraph,
    pub files_parsed: usize,
    pub skipped: Vec<SkippedFile>,
}

/// Cache entry with timestamp for TTL-based expiration
struct CacheEntry {
    value: Arc<ProjectGraph>,
    built_at: Instant,
}

/// Cache statistics snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: usize,
    pub misses: usize,
}

impl CacheStats {
    /// Get the cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Single-writer, multi-reader graph cache.
///
/// Readers share the lock; a rebuild runs outside the lock and the finished
/// graph replaces the entry in one write.
pub struct GraphCache {
    entries: RwLock<HashMap<PathBuf, CacheEntry>>,
    ttl: Duration,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl GraphCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn with_ttl_secs(ttl_secs: u64) -> Self {
        Self::new(Duration::from_secs(ttl_secs))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get a cached graph if it is still fresh
    pub fn get(&self, root: &Path) -> Option<Arc<ProjectGraph>> {
        let entries = self.entries.read();
        let entry = entries.get(root)?;
        if entry.built_at.elapsed() >= self.ttl {
            return None;
        }
        Some(Arc::clone(&entry.value))
    }

    /// Store a graph, replacing any previous entry for the root
    pub fn insert(&self, root: &Path, value: ProjectGraph) -> Arc<ProjectGraph> {
        let value = Arc::new(value);
        self.entries.write().insert(
            root.to_path_buf(),
            CacheEntry {
                value: Arc::clone(&value),
                built_at: Instant::now(),
            },
        );
        value
    }

    /// Return the fresh cached graph, or build and store a new one.
    ///
    /// `rebuild` forces a build even when a fresh entry exists. A failed
    /// build leaves the previous entry untouched.
    pub fn get_or_build<F>(&self, root: &Path, rebuild: bool, build: F) -> Result<Arc<ProjectGraph>>
    where
        F: FnOnce() -> Result<ProjectGraph>,
    {
        if !rebuild {
            if let Some(cached) = self.get(root) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(root = %root.display(), "graph cache hit");
                return Ok(cached);
            }
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(root = %root.display(), rebuild, "graph cache miss");

        let built = build()?;
        Ok(self.insert(root, built))
    }

    /// Drop the entry for a root; returns whether one existed
    pub fn invalidate(&self, root: &Path) -> bool {
        self.entries.write().remove(root).is_some()
    }

    /// Clear the cache
    pub fn clear(&self) {
        self.entries.write().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Remove expired entries
    pub fn cleanup_expired(&self) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.built_at.elapsed() < self.ttl);
        before - entries.len()
    }

    /// Get the number of cached entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for GraphCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArchscanError;
    use std::cell::Cell;

    fn project_graph(root: &Path) -> ProjectGraph {
        let mut graph = DependencyGraph::new(root);
        graph.add_module("app", None);
        ProjectGraph {
            graph,
            files_parsed: 1,
            skipped: Vec::new(),
        }
    }

    #[test]
    fn test_fresh_entry_is_reused() {
        let cache = GraphCache::default();
        let root = Path::new("/project");
        let builds = Cell::new(0);
        let build = || {
            builds.set(builds.get() + 1);
            Ok(project_graph(root))
        };

        let first = cache.get_or_build(root, false, build).unwrap();
        let second = cache
            .get_or_build(root, false, || {
                builds.set(builds.get() + 1);
                Ok(project_graph(root))
            })
            .unwrap();
        assert_eq!(builds.get(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats(), CacheStats { entries: 1, hits: 1, misses: 1 });
    }

    #[test]
    fn test_rebuild_replaces_entry() {
        let cache = GraphCache::default();
        let root = Path::new("/project");
        let first = cache.get_or_build(root, false, || Ok(project_graph(root))).unwrap();
        let second = cache.get_or_build(root, true, || Ok(project_graph(root))).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expired_entry_is_rebuilt() {
        let cache = GraphCache::new(Duration::ZERO);
        let root = Path::new("/project");
        cache.insert(root, project_graph(root));
        assert!(cache.get(root).is_none());
        assert_eq!(cache.cleanup_expired(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_failed_build_keeps_previous_entry() {
        let cache = GraphCache::new(Duration::ZERO);
        let root = Path::new("/project");
        cache.insert(root, project_graph(root));
        let result = cache.get_or_build(root, true, || Err(ArchscanError::Interrupted));
        assert!(result.is_err());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate() {
        let cache = GraphCache::default();
        let root = Path::new("/project");
        cache.insert(root, project_graph(root));
        assert!(cache.invalidate(root));
        assert!(!cache.invalidate(root));
        assert_eq!(cache.stats().hit_rate(), 0.0);
    }
}
