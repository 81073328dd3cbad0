//! Full runs through configuration, analysis and formatting

use super::fixtures::{django_hexagonal, project};
use archscan::cli::{analyze_path, Commands};
use archscan::config::{load_config_with_env_prefix, CliArgs};
use archscan::models::config::OutputFormat;
use archscan::output::create_formatter;
use archscan::ArchscanError;
use std::fs;

#[test]
fn test_full_analysis_of_django_project() {
    let dir = django_hexagonal();
    let report = analyze_path(dir.path(), &Commands::All).unwrap();

    let detection = report.detection.as_ref().unwrap();
    assert!(detection.contains("django"));
    assert!(detection.contains("python"));

    let graph = report.graph.as_ref().unwrap();
    assert!(graph.files_parsed >= 8);
    assert!(graph.circular_dependencies.is_empty());
    assert!(graph.coupling.iter().any(|c| c.module == "shop.domain.order"));

    let patterns = report.patterns.as_ref().unwrap();
    assert_eq!(patterns[0].pattern_name, "hexagonal");

    let json = create_formatter(OutputFormat::Json, false, false, false).format(&report).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(value["detection"]["matches"]["django"]["confidence"].as_f64().unwrap() >= 0.8);
    assert_eq!(value["patterns"][0]["pattern_name"], "hexagonal");

    let text = create_formatter(OutputFormat::Text, false, false, false).format(&report).unwrap();
    assert!(text.contains("Technologies"));
    assert!(text.contains("Architecture Patterns"));
}

#[test]
fn test_module_report_through_graph_command() {
    let dir = django_hexagonal();
    let report = analyze_path(
        dir.path(),
        &Commands::Graph {
            dot: None,
            module: Some("shop.domain.order".to_string()),
        },
    )
    .unwrap();

    let module = report.module.unwrap();
    assert_eq!(module.dependencies, vec!["shop.ports.repository".to_string()]);
    assert!(module.dependents.contains(&"shop.adapters.orm".to_string()));
    assert_eq!(module.coupling.efferent, 1);
}

#[test]
fn test_config_file_and_cli_precedence() {
    let dir = project(&[("a.py", "")]);
    let config_path = dir.path().join("archscan.toml");
    fs::write(
        &config_path,
        "min_confidence = 0.7\nmax_cycles = 10\noutput_format = \"csv\"\n",
    )
    .unwrap();

    let cli = CliArgs {
        path: Some(dir.path().to_path_buf()),
        output_format: Some(OutputFormat::Json),
        config: Some(config_path),
        ..CliArgs::default()
    };
    let settings = load_config_with_env_prefix(cli, "ARCHSCAN_E2E").unwrap();

    assert_eq!(settings.min_confidence, 0.7);
    assert_eq!(settings.max_cycles, 10);
    assert_eq!(settings.output_format, OutputFormat::Json);
    assert_eq!(settings.scan_path, dir.path());
}

#[test]
fn test_malformed_config_is_reported() {
    let dir = project(&[("a.py", "")]);
    let config_path = dir.path().join("broken.toml");
    fs::write(&config_path, "min_confidence = [\n").unwrap();

    let cli = CliArgs {
        path: Some(dir.path().to_path_buf()),
        config: Some(config_path),
        ..CliArgs::default()
    };
    let err = load_config_with_env_prefix(cli, "ARCHSCAN_E2E_BAD").unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_empty_project() {
    let dir = project(&[]);
    let report = analyze_path(dir.path(), &Commands::All).unwrap();

    assert!(report.detection.unwrap().matches.is_empty());
    let graph = report.graph.unwrap();
    assert_eq!(graph.node_count, 0);
    assert_eq!(graph.max_depth, Some(0));
    assert!(report.patterns.unwrap().iter().all(|p| p.confidence == 0.0));
}

#[test]
fn test_unknown_pattern_from_command() {
    let dir = project(&[("a.py", "")]);
    let err = analyze_path(
        dir.path(),
        &Commands::Patterns {
            pattern: Some("nope".to_string()),
        },
    )
    .unwrap_err();
    assert!(matches!(err, ArchscanError::UnknownPattern { .. }));
}
