//! Output formatting functionality
//!
//! Each section of a [`ScanReport`] renders independently, so a report
//! holding only detection results prints only the technology section.

use crate::error::Result;
use crate::models::dependency_graph::{CycleSeverity, DependencyGraphAnalysis};
use crate::models::detection::{DetectionResult, EnrichmentResult};
use crate::models::pattern::PatternMatchResult;
use crate::models::report::{ModuleReport, ScanReport};
use ansi_term::Colour::{Blue, Cyan, Green, Red, Yellow};
use ansi_term::Style;

/// Modules listed in the non-verbose instability table
const TOP_UNSTABLE: usize = 10;

struct Painter {
    use_colors: bool,
}

impl Painter {
    fn paint(&self, style: Style, text: impl AsRef<str>) -> String {
        if self.use_colors {
            style.paint(text.as_ref()).to_string()
        } else {
            text.as_ref().to_string()
        }
    }

    fn heading(&self, text: &str) -> String {
        format!("{}\n", self.paint(Blue.bold(), text))
    }

    fn confidence(&self, confidence: f64) -> String {
        let text = format!("{:>3.0}%", confidence * 100.0);
        let style = if confidence >= 0.8 {
            Green.normal()
        } else if confidence >= 0.5 {
            Yellow.normal()
        } else {
            Style::new().dimmed()
        };
        self.paint(style, text)
    }

    fn severity(&self, severity: CycleSeverity) -> String {
        let style = match severity {
            CycleSeverity::High => Red.bold(),
            CycleSeverity::Medium => Yellow.normal(),
            CycleSeverity::Low => Style::new().dimmed(),
        };
        self.paint(style, severity.to_string().to_uppercase())
    }
}

/// Format a report as human-readable text
pub fn format_report_text(report: &ScanReport, use_colors: bool, verbose: bool) -> String {
    let painter = Painter { use_colors };
    let mut output = format!(
        "{} {}\n",
        painter.paint(Style::new().bold(), "archscan report for"),
        report.project_path.display()
    );

    if let Some(detection) = &report.detection {
        output.push('\n');
        output.push_str(&format_detection_text(detection, &painter, verbose));
    }
    if let Some(enrichment) = &report.enrichment {
        output.push('\n');
        output.push_str(&format_enrichment_text(enrichment, &painter, verbose));
    }
    if let Some(graph) = &report.graph {
        output.push('\n');
        output.push_str(&format_graph_text(graph, &painter, verbose));
    }
    if let Some(module) = &report.module {
        output.push('\n');
        output.push_str(&format_module_text(module, &painter));
    }
    if let Some(patterns) = &report.patterns {
        output.push('\n');
        output.push_str(&format_patterns_text(patterns, &painter, verbose));
    }

    output
}

fn format_detection_text(detection: &DetectionResult, painter: &Painter, verbose: bool) -> String {
    let mut output = painter.heading("Technologies");

    let ranked = detection.ranked();
    if ranked.is_empty() {
        output.push_str("  No technologies detected\n");
    }
    for m in ranked {
        output.push_str(&format!(
            "  {} {}\n",
            painter.confidence(m.confidence),
            painter.paint(Cyan.bold(), &m.technology)
        ));
        if verbose {
            for evidence in &m.evidence {
                output.push_str(&format!("         - {}\n", evidence));
            }
        }
    }

    output.push_str(&format!("  Scan time: {}ms\n", detection.scan_time_ms));
    for warning in &detection.warnings {
        output.push_str(&format!("  {} {}\n", painter.paint(Yellow.bold(), "warning:"), warning));
    }
    output
}

fn format_enrichment_text(enrichment: &EnrichmentResult, painter: &Painter, verbose: bool) -> String {
    let mut output = painter.heading("Technology Details");

    for (technology, facts) in &enrichment.facts {
        output.push_str(&format!("  {}\n", painter.paint(Cyan.bold(), technology)));
        for (key, value) in &facts.values {
            output.push_str(&format!("    {}: {}\n", key, value));
        }
        if let Some(artifacts) = enrichment.artifacts.get(technology) {
            for artifact in artifacts {
                if verbose {
                    output.push_str(&format!("    [{:?}] {}: {}\n", artifact.kind, artifact.name, artifact.content));
                } else {
                    output.push_str(&format!("    [{:?}] {}\n", artifact.kind, artifact.name));
                }
            }
        }
    }

    for failure in &enrichment.failures {
        output.push_str(&format!(
            "  {} {} failed in {}: {}\n",
            painter.paint(Red.bold(), "plugin error:"),
            failure.technology,
            failure.stage,
            failure.message
        ));
    }
    output
}

fn format_graph_text(graph: &DependencyGraphAnalysis, painter: &Painter, verbose: bool) -> String {
    let mut output = painter.heading("Dependency Graph");

    output.push_str(&format!("  Modules: {}\n", graph.node_count));
    output.push_str(&format!("  Imports: {}\n", graph.edge_count));
    output.push_str(&format!(
        "  Files parsed: {} ({} skipped)\n",
        graph.files_parsed,
        graph.skipped.len()
    ));
    output.push_str(&format!(
        "  Max depth: {}\n",
        graph
            .max_depth
            .map(|d| d.to_string())
            .unwrap_or_else(|| "undefined (cyclic)".to_string())
    ));
    output.push_str(&format!(
        "  Roots: {}, leaves: {}, components: {}\n",
        graph.root_nodes.len(),
        graph.leaf_nodes.len(),
        graph.metrics.weakly_connected_components
    ));

    if graph.circular_dependencies.is_empty() {
        output.push_str(&format!("  {}\n", painter.paint(Green.normal(), "No circular dependencies")));
    } else {
        output.push_str(&format!(
            "  Circular dependencies: {}{}\n",
            graph.circular_dependencies.len(),
            if graph.cycles_truncated { " (truncated)" } else { "" }
        ));
        for dep in &graph.circular_dependencies {
            output.push_str(&format!("    [{}] {}\n", painter.severity(dep.severity), dep.cycle.join(" -> ")));
            if verbose {
                output.push_str(&format!("      {}\n", dep.suggestion));
            }
        }
    }

    let mut unstable: Vec<_> = graph.coupling.iter().filter(|c| c.afferent + c.efferent > 0).collect();
    unstable.sort_by(|a, b| {
        b.instability
            .total_cmp(&a.instability)
            .then_with(|| b.efferent.cmp(&a.efferent))
            .then_with(|| a.module.cmp(&b.module))
    });
    if !verbose {
        unstable.truncate(TOP_UNSTABLE);
    }
    if !unstable.is_empty() {
        output.push_str("  Coupling (instability, Ca, Ce):\n");
        for c in unstable {
            output.push_str(&format!(
                "    {:.2}  {:>3} {:>3}  {}\n",
                c.instability, c.afferent, c.efferent, c.module
            ));
        }
    }

    if verbose {
        for skipped in &graph.skipped {
            output.push_str(&format!("  skipped {}: {}\n", skipped.path.display(), skipped.reason));
        }
    }
    output
}

fn format_module_text(module: &ModuleReport, painter: &Painter) -> String {
    let mut output = painter.heading(&format!("Module {}", module.module));
    output.push_str(&format!(
        "  Afferent: {}, efferent: {}, instability: {:.2}\n",
        module.coupling.afferent, module.coupling.efferent, module.coupling.instability
    ));
    output.push_str(&format!(
        "  Depth: {}\n",
        module.depth.map(|d| d.to_string()).unwrap_or_else(|| "undefined (cyclic)".to_string())
    ));
    output.push_str(&format!("  Imports: {}\n", join_or_none(&module.dependencies)));
    output.push_str(&format!("  Imported by: {}\n", join_or_none(&module.dependents)));
    output
}

fn join_or_none(ids: &[String]) -> String {
    if ids.is_empty() {
        "none".to_string()
    } else {
        ids.join(", ")
    }
}

fn format_patterns_text(patterns: &[PatternMatchResult], painter: &Painter, verbose: bool) -> String {
    let mut output = painter.heading("Architecture Patterns");

    for result in patterns {
        output.push_str(&format!(
            "  {} {}\n",
            painter.confidence(result.confidence),
            painter.paint(Cyan.bold(), &result.pattern_name)
        ));
        if verbose {
            for evidence in &result.evidence {
                output.push_str(&format!("         - {}\n", evidence));
            }
        }
        for violation in &result.violations {
            output.push_str(&format!(
                "         {} {}: {}\n",
                painter.paint(Red.normal(), "!"),
                violation.violation_type,
                violation.detail
            ));
        }
    }
    output
}

/// One line per requested section
pub fn format_report_summary(report: &ScanReport) -> String {
    let mut output = String::new();
    if let Some(detection) = &report.detection {
        let ranked = detection.ranked();
        let names: Vec<&str> = ranked.iter().map(|m| m.technology.as_str()).collect();
        output.push_str(&format!("technologies: {}\n", join_or_none_str(&names)));
    }
    if let Some(graph) = &report.graph {
        output.push_str(&format!(
            "graph: {} modules, {} imports, {} cycles\n",
            graph.node_count,
            graph.edge_count,
            graph.circular_dependencies.len()
        ));
    }
    if let Some(module) = &report.module {
        output.push_str(&format!(
            "module {}: instability {:.2}\n",
            module.module, module.coupling.instability
        ));
    }
    if let Some(best) = report.patterns.as_ref().and_then(|p| p.first()) {
        output.push_str(&format!(
            "pattern: {} ({:.0}%, {} violations)\n",
            best.pattern_name,
            best.confidence * 100.0,
            best.violations.len()
        ));
    }
    output
}

fn join_or_none_str(names: &[&str]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

/// Format a report as pretty-printed JSON
pub fn format_report_json(report: &ScanReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Format a report as CSV with `section,name,value,detail` rows
pub fn format_report_csv(report: &ScanReport) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["section", "name", "value", "detail"])?;

    if let Some(detection) = &report.detection {
        for m in detection.ranked() {
            writer.write_record([
                "technology",
                m.technology.as_str(),
                &format!("{:.2}", m.confidence),
                &m.evidence.join("; "),
            ])?;
        }
        for warning in &detection.warnings {
            writer.write_record(["warning", "detection", "", warning.as_str()])?;
        }
    }

    if let Some(enrichment) = &report.enrichment {
        for (technology, facts) in &enrichment.facts {
            for (key, value) in &facts.values {
                writer.write_record(["fact", &format!("{}.{}", technology, key), &value.to_string(), ""])?;
            }
        }
        for (technology, artifacts) in &enrichment.artifacts {
            for artifact in artifacts {
                writer.write_record([
                    "artifact",
                    technology.as_str(),
                    artifact.name.as_str(),
                    &format!("{:?}", artifact.kind).to_lowercase(),
                ])?;
            }
        }
        for failure in &enrichment.failures {
            writer.write_record([
                "plugin_failure",
                failure.technology.as_str(),
                &failure.stage.to_string(),
                failure.message.as_str(),
            ])?;
        }
    }

    if let Some(graph) = &report.graph {
        let max_depth = graph.max_depth.map(|d| d.to_string()).unwrap_or_default();
        for (name, value) in [
            ("node_count", graph.node_count.to_string()),
            ("edge_count", graph.edge_count.to_string()),
            ("files_parsed", graph.files_parsed.to_string()),
            ("max_depth", max_depth),
            ("cyclic", graph.metrics.cyclic.to_string()),
        ] {
            writer.write_record(["graph", name, &value, ""])?;
        }
        for dep in &graph.circular_dependencies {
            writer.write_record([
                "cycle",
                &dep.severity.to_string(),
                &dep.len().to_string(),
                &dep.cycle.join(" -> "),
            ])?;
        }
        for c in &graph.coupling {
            writer.write_record([
                "coupling",
                c.module.as_str(),
                &format!("{:.4}", c.instability),
                &format!("afferent={};efferent={}", c.afferent, c.efferent),
            ])?;
        }
        for skipped in &graph.skipped {
            writer.write_record(["skipped", &skipped.path.display().to_string(), "", skipped.reason.as_str()])?;
        }
    }

    if let Some(module) = &report.module {
        writer.write_record([
            "module",
            module.module.as_str(),
            &format!("{:.4}", module.coupling.instability),
            &format!("imports={};imported_by={}", module.dependencies.join("|"), module.dependents.join("|")),
        ])?;
    }

    if let Some(patterns) = &report.patterns {
        for result in patterns {
            writer.write_record([
                "pattern",
                result.pattern_name.as_str(),
                &format!("{:.2}", result.confidence),
                &result.evidence.join("; "),
            ])?;
            for violation in &result.violations {
                writer.write_record([
                    "violation",
                    result.pattern_name.as_str(),
                    violation.violation_type.as_str(),
                    violation.detail.as_str(),
                ])?;
            }
        }
    }

    let data = writer
        .into_inner()
        .map_err(|e| crate::error::ArchscanError::io_error(e.into_error()))?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}
