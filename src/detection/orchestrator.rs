//! Two-phase technology detection and plugin enrichment

use super::boosting::apply_boosting;
use super::indicators::{scan_indicators, IndicatorScan};
use super::tech_graph::{EdgeKind, TechnologyGraph};
use crate::core::parallel::CancellationToken;
use crate::core::scanner::IgnoreMatcher;
use crate::error::Result;
use crate::models::config::Settings;
use crate::models::detection::{
    clamp_confidence, DetectionResult, EnrichmentResult, PluginFailure, PluginStage,
    TechnologyMatch,
};
use crate::parsers::SourceParser;
use crate::plugins::{PluginContext, PluginRegistry};
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Thresholds that decide which candidates survive detection
#[derive(Debug, Clone)]
pub struct DetectionOptions {
    pub min_confidence: f64,
    /// Confidence given to candidates that have no plugin
    pub indicator_only_confidence: f64,
    /// Generic formats never reported on indicator evidence alone
    pub noise_technologies: BTreeSet<String>,
}

impl DetectionOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            min_confidence: settings.min_confidence,
            indicator_only_confidence: settings.indicator_only_confidence,
            noise_technologies: settings.noise_technologies.iter().cloned().collect(),
        }
    }
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Runs the indicator scan, selective plugin detection and boosting
pub struct DetectionOrchestrator {
    options: DetectionOptions,
    ignore: Arc<dyn IgnoreMatcher>,
    parser: Arc<SourceParser>,
    registry: PluginRegistry,
    graph: TechnologyGraph,
    cancel: CancellationToken,
}

impl DetectionOrchestrator {
    /// Orchestrator with the built-in plugins and technology graph
    pub fn new(settings: &Settings, ignore: Arc<dyn IgnoreMatcher>) -> Result<Self> {
        Ok(Self {
            options: DetectionOptions::from_settings(settings),
            ignore,
            parser: Arc::new(SourceParser::with_max_file_size(settings.max_file_size)),
            registry: PluginRegistry::builtin(),
            graph: TechnologyGraph::builtin()?,
            cancel: CancellationToken::new(),
        })
    }

    pub fn with_registry(mut self, registry: PluginRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_graph(mut self, graph: TechnologyGraph) -> Self {
        self.graph = graph;
        self
    }

    pub fn with_options(mut self, options: DetectionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn options(&self) -> &DetectionOptions {
        &self.options
    }

    fn context(&self, root: &Path) -> Result<PluginContext> {
        PluginContext::new(root, Arc::clone(&self.ignore), Arc::clone(&self.parser))
    }

    /// Detect the technologies used by a project
    pub fn detect(&self, root: &Path) -> Result<DetectionResult> {
        let ctx = self.context(root)?;
        self.detect_in(&ctx)
    }

    /// Extract facts and derived artifacts for every detected technology
    pub fn enrich(&self, detection: &DetectionResult) -> Result<EnrichmentResult> {
        let ctx = self.context(&detection.project_path)?;
        self.enrich_in(&ctx, detection)
    }

    /// Detection followed by enrichment over one shared context
    pub fn detect_and_enrich(&self, root: &Path) -> Result<(DetectionResult, EnrichmentResult)> {
        let ctx = self.context(root)?;
        let detection = self.detect_in(&ctx)?;
        let enrichment = self.enrich_in(&ctx, &detection)?;
        Ok((detection, enrichment))
    }

    fn detect_in(&self, ctx: &PluginContext) -> Result<DetectionResult> {
        let started = Instant::now();
        let scan = scan_indicators(ctx, &self.cancel)?;
        let mut warnings = scan.warnings.clone();
        let mut matches = BTreeMap::new();

        for technology in self.candidates(&scan) {
            self.cancel.check()?;

            if self.options.noise_technologies.contains(&technology) {
                debug!(technology = %technology, "suppressing generic format");
                continue;
            }
            let indicator = scan.candidates.get(&technology);

            let Some(plugin) = self.registry.get(&technology) else {
                // Indicator-only evidence
                let confidence = clamp_confidence(self.options.indicator_only_confidence);
                if let (Some(indicator), true) = (indicator, confidence >= self.options.min_confidence) {
                    let mut found = indicator.clone();
                    found.confidence = confidence;
                    matches.insert(technology, found);
                }
                continue;
            };

            let confidence = match catch_unwind(AssertUnwindSafe(|| plugin.detect(ctx))) {
                Ok(confidence) => confidence,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    warn!(technology = %technology, error = %message, "plugin detect panicked");
                    warnings.push(format!("{}: detect failed: {}", technology, message));
                    continue;
                }
            };

            debug!(technology = %technology, confidence, "plugin detect");
            if confidence < self.options.min_confidence {
                continue;
            }
            let mut found = indicator
                .cloned()
                .unwrap_or_else(|| TechnologyMatch::new(technology.as_str(), 0.0));
            found.confidence = clamp_confidence(confidence);
            found.add_note(format!("{} plugin ({:.2})", technology, found.confidence));
            matches.insert(technology, found);
        }

        let fired = apply_boosting(&mut matches, &self.graph, self.options.min_confidence);
        let result = DetectionResult {
            matches,
            scan_time_ms: started.elapsed().as_millis() as u64,
            project_path: ctx.root().to_path_buf(),
            warnings,
        };
        info!(
            technologies = result.matches.len(),
            boosts = fired,
            elapsed_ms = result.scan_time_ms,
            "technology detection complete"
        );
        Ok(result)
    }

    /// Indicator candidates, plus plugins of technologies that hard-imply a
    /// candidate (a `python` candidate brings in the Python frameworks)
    fn candidates(&self, scan: &IndicatorScan) -> BTreeSet<String> {
        let mut candidates: BTreeSet<String> = scan.candidates.keys().cloned().collect();
        for edge in self.graph.edges() {
            if edge.kind == EdgeKind::Hard
                && candidates.contains(&edge.parent)
                && self.registry.has_plugin(&edge.child)
            {
                candidates.insert(edge.child.clone());
            }
        }
        candidates
    }

    fn enrich_in(&self, ctx: &PluginContext, detection: &DetectionResult) -> Result<EnrichmentResult> {
        let mut enrichment = EnrichmentResult::default();

        for technology in detection.matches.keys() {
            self.cancel.check()?;
            let Some(plugin) = self.registry.get(technology) else {
                continue;
            };

            let facts = match run_stage(technology, PluginStage::ExtractFacts, || plugin.extract_facts(ctx)) {
                Ok(facts) => facts,
                Err(failure) => {
                    enrichment.failures.push(failure);
                    continue;
                }
            };
            match run_stage(technology, PluginStage::GenerateArtifacts, || {
                plugin.generate_derived_artifacts(ctx, &facts)
            }) {
                Ok(artifacts) => {
                    enrichment.artifacts.insert(technology.clone(), artifacts);
                }
                Err(failure) => enrichment.failures.push(failure),
            }
            enrichment.facts.insert(technology.clone(), facts);
        }

        info!(
            enriched = enrichment.facts.len(),
            failures = enrichment.failures.len(),
            "plugin enrichment complete"
        );
        Ok(enrichment)
    }
}

/// Run one plugin stage, turning errors and panics into a failure record
fn run_stage<T, F>(technology: &str, stage: PluginStage, f: F) -> std::result::Result<T, PluginFailure>
where
    F: FnOnce() -> Result<T>,
{
    let message = match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => return Ok(value),
        Ok(Err(err)) => err.to_string(),
        Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
    };
    warn!(technology, stage = %stage, error = %message, "plugin stage failed");
    Err(PluginFailure {
        technology: technology.to_string(),
        stage,
        message,
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
