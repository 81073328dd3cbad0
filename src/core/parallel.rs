//! Parallel processing utilities

use crate::error::{ArchscanError, Result};
use crate::models::config::Settings;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Progress update information for parallel operations
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub current: usize,
    pub total: usize,
    pub message: String,
}

impl ProgressUpdate {
    /// Create a new progress update
    pub fn new(current: usize, total: usize, message: impl Into<String>) -> Self {
        Self {
            current,
            total,
            message: message.into(),
        }
    }

    /// Calculate progress percentage
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.current as f64 / self.total as f64) * 100.0
        }
    }
}

/// Cooperative cancellation flag shared between a caller and a running job.
///
/// Work is only abandoned between units (files, plugins, patterns), never in
/// the middle of one.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fail with `Interrupted` once cancelled
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(ArchscanError::Interrupted)
        } else {
            Ok(())
        }
    }
}

/// Bounded worker pool for per-file work
pub struct WorkerPool {
    pool: Option<rayon::ThreadPool>,
}

impl WorkerPool {
    /// Create a pool of `workers` threads, or a sequential runner
    pub fn new(workers: usize, parallel: bool) -> Result<Self> {
        if !parallel {
            return Ok(Self { pool: None });
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("archscan-worker-{}", i))
            .build()
            .map_err(|e| ArchscanError::ThreadPool {
                message: e.to_string(),
            })?;
        Ok(Self { pool: Some(pool) })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(settings.workers, settings.parallel)
    }

    pub fn is_parallel(&self) -> bool {
        self.pool.is_some()
    }

    pub fn threads(&self) -> usize {
        self.pool.as_ref().map(|p| p.current_num_threads()).unwrap_or(1)
    }

    /// Apply `f` to every item; output order follows input order
    pub fn map<T, F, R>(&self, items: Vec<T>, f: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Send + Sync,
    {
        match &self.pool {
            Some(pool) => pool.install(|| parallel_process(items, f)),
            None => items.into_iter().map(f).collect(),
        }
    }

    /// Like [`WorkerPool::map`], reporting each finished item
    pub fn map_with_progress<T, F, R, P>(&self, items: Vec<T>, f: F, progress_callback: P) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Send + Sync,
        P: Fn(ProgressUpdate) + Send + Sync,
    {
        match &self.pool {
            Some(pool) => pool.install(|| parallel_process_with_progress(items, f, progress_callback)),
            None => {
                let total = items.len();
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| {
                        let result = f(item);
                        progress_callback(ProgressUpdate::new(
                            i + 1,
                            total,
                            format!("Parsing file {}/{}", i + 1, total),
                        ));
                        result
                    })
                    .collect()
            }
        }
    }
}

/// Execute a function in parallel on a collection of items
pub fn parallel_process<T, F, R>(items: Vec<T>, f: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Send + Sync,
{
    items.into_par_iter().map(f).collect()
}

/// Execute a function in parallel on a collection of items with progress reporting
pub fn parallel_process_with_progress<T, F, R, P>(
    items: Vec<T>,
    f: F,
    progress_callback: P,
) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Send + Sync,
    P: Fn(ProgressUpdate) + Send + Sync,
{
    let total = items.len();
    let counter = AtomicUsize::new(0);

    items
        .into_par_iter()
        .map(|item| {
            let result = f(item);
            let done = counter.fetch_add(1, Ordering::SeqCst) + 1;
            progress_callback(ProgressUpdate::new(
                done,
                total,
                format!("Parsing file {}/{}", done, total),
            ));
            result
        })
        .collect()
}
