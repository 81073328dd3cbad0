//! End-to-end dependency analysis
//!
//! Scans a project for source files, parses them on the worker pool and
//! reduces the fact sheets into a dependency graph on the calling thread.

use crate::core::cache::{GraphCache, ProjectGraph};
use crate::core::parallel::{CancellationToken, ProgressUpdate, WorkerPool};
use crate::core::scanner::{IgnoreMatcher, Scanner};
use crate::error::Result;
use crate::models::config::Settings;
use crate::models::dependency_graph::DependencyGraphAnalysis;
use crate::models::facts::{FactSheet, SkippedFile};
use crate::parsers::{DependencyGraphBuilder, GraphBuilderConfig, SourceParser};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Dependency analyzer for one configuration
pub struct DependencyAnalyzer {
    ignore: Arc<dyn IgnoreMatcher>,
    parser: Arc<SourceParser>,
    builder: DependencyGraphBuilder,
    pool: WorkerPool,
    file_glob: String,
    max_cycles: usize,
    cache: Option<Arc<GraphCache>>,
    cancel: CancellationToken,
}

impl DependencyAnalyzer {
    /// Create an analyzer; the graph cache is enabled per settings
    pub fn new(settings: &Settings, ignore: Arc<dyn IgnoreMatcher>) -> Result<Self> {
        let cache = if settings.cache_enabled {
            Some(Arc::new(GraphCache::with_ttl_secs(settings.cache_ttl_secs)))
        } else {
            None
        };

        Ok(Self {
            ignore,
            parser: Arc::new(SourceParser::with_max_file_size(settings.max_file_size)),
            builder: DependencyGraphBuilder::new(GraphBuilderConfig::from_settings(settings)),
            pool: WorkerPool::from_settings(settings)?,
            file_glob: settings.file_glob.clone(),
            max_cycles: settings.max_cycles,
            cache,
            cancel: CancellationToken::new(),
        })
    }

    /// Share a cache between analyzers
    pub fn with_cache(mut self, cache: Arc<GraphCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Get the cache if enabled
    pub fn cache(&self) -> Option<&Arc<GraphCache>> {
        self.cache.as_ref()
    }

    /// Build (or reuse) the project graph
    pub fn build_graph(&self, root: &Path, rebuild: bool) -> Result<Arc<ProjectGraph>> {
        self.build_graph_with_progress(root, rebuild, |_| {})
    }

    pub fn build_graph_with_progress<P>(
        &self,
        root: &Path,
        rebuild: bool,
        progress_callback: P,
    ) -> Result<Arc<ProjectGraph>>
    where
        P: Fn(ProgressUpdate) + Send + Sync,
    {
        match &self.cache {
            Some(cache) => cache.get_or_build(&cache_key(root), rebuild, || {
                self.parse_and_build(root, progress_callback)
            }),
            None => self.parse_and_build(root, progress_callback).map(Arc::new),
        }
    }

    /// Analyze the dependency graph of a project
    pub fn analyze(&self, root: &Path) -> Result<DependencyGraphAnalysis> {
        self.analyze_with_progress(root, |_| {})
    }

    pub fn analyze_with_progress<P>(
        &self,
        root: &Path,
        progress_callback: P,
    ) -> Result<DependencyGraphAnalysis>
    where
        P: Fn(ProgressUpdate) + Send + Sync,
    {
        let project = self.build_graph_with_progress(root, false, progress_callback)?;
        let analysis = DependencyGraphAnalysis::from_graph(&project.graph, self.max_cycles)
            .with_parse_summary(project.files_parsed, project.skipped.clone());
        info!(
            modules = analysis.node_count,
            imports = analysis.edge_count,
            cycles = analysis.circular_dependencies.len(),
            "dependency analysis complete"
        );
        Ok(analysis)
    }

    /// Parse every source file under `root`, recording skips
    pub fn parse_project<P>(&self, root: &Path, progress_callback: P) -> Result<(Vec<FactSheet>, Vec<SkippedFile>)>
    where
        P: Fn(ProgressUpdate) + Send + Sync,
    {
        let scanner = Scanner::new(root, Arc::clone(&self.ignore), &self.file_glob)?;
        let files = scanner.source_files();
        debug!(root = %root.display(), files = files.len(), "parsing source files");

        let parser = Arc::clone(&self.parser);
        let cancel = self.cancel.clone();
        let outcomes = self.pool.map_with_progress(
            files,
            move |path: PathBuf| {
                // Checked between files only; a started parse always finishes
                if cancel.is_cancelled() {
                    return None;
                }
                let outcome = parser.parse_file(&path);
                Some((path, outcome))
            },
            progress_callback,
        );
        self.cancel.check()?;

        let mut sheets = Vec::with_capacity(outcomes.len());
        let mut skipped = Vec::new();
        for (path, outcome) in outcomes.into_iter().flatten() {
            match outcome {
                Ok(sheet) => sheets.push(sheet),
                Err(failure) => {
                    let relative = path.strip_prefix(root).unwrap_or(&path);
                    debug!(path = %relative.display(), reason = %failure, "skipped file");
                    skipped.push(SkippedFile::new(relative, &failure));
                }
            }
        }
        if !skipped.is_empty() {
            info!(skipped = skipped.len(), "some files could not be parsed");
        }
        Ok((sheets, skipped))
    }

    fn parse_and_build<P>(&self, root: &Path, progress_callback: P) -> Result<ProjectGraph>
    where
        P: Fn(ProgressUpdate) + Send + Sync,
    {
        let (sheets, skipped) = self.parse_project(root, progress_callback)?;
        let graph = self.builder.build(&sheets, root)?;
        Ok(ProjectGraph {
            graph,
            files_parsed: sheets.len(),
            skipped,
        })
    }
}

fn cache_key(root: &Path) -> PathBuf {
    root.canonicalize().unwrap_or_else(|_| root.to_path_buf())
}
