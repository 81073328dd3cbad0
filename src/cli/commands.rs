//! Command implementations

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::args::{Args, Commands};
use crate::config::{self, file::DEFAULT_CONFIG_FILE, CliArgs};
use crate::core::{DependencyAnalyzer, GlobIgnore, IgnoreMatcher};
use crate::detection::DetectionOrchestrator;
use crate::error::{ArchscanError, ErrorSeverity, Result};
use crate::models::config::Settings;
use crate::models::dependency_graph::DependencyGraphAnalysis;
use crate::models::report::{ModuleReport, ScanReport};
use crate::output::{
    create_formatter, create_progress_callback, create_writer, FileWriter, OutputWriter, ProgressReporter,
};
use crate::patterns::PatternMatcher;
use tracing::{debug, info};

/// Top-level command
#[derive(Debug)]
pub enum Command {
    /// Run one or more analyses and print the report
    Analyze(Args),
    /// Write a default configuration file
    Init,
}

impl Command {
    pub fn from_args(args: Args) -> Self {
        if args.init {
            return Command::Init;
        }
        Command::Analyze(args)
    }

    /// Execute the command
    pub fn execute(&self) -> Result<()> {
        match self {
            Command::Analyze(args) => {
                let settings = config::load_config(CliArgs::from_args(args))?;
                debug!(?settings, "settings loaded");

                let report = Analysis::new(&settings)?.run(&args.analysis())?;

                let formatter =
                    create_formatter(settings.output_format, settings.use_colors, settings.verbose, settings.quiet);
                let content = formatter.format(&report)?;
                create_writer(settings.output_file.as_ref()).write(&content)?;

                if let Some(path) = &settings.output_file {
                    if !settings.quiet {
                        eprintln!("Report written to {}", path.display());
                    }
                }
                Ok(())
            }
            Command::Init => init_config(Path::new(DEFAULT_CONFIG_FILE)),
        }
    }

    /// Run the command and map errors to an exit code
    pub fn run(&self) -> i32 {
        match self.execute() {
            Ok(()) => 0,
            Err(err) => {
                eprintln!("{}: {}", err.severity(), err.user_message());
                if let Some(hint) = suggestion(&err) {
                    eprintln!("Suggestion: {}", hint);
                }
                match err.severity() {
                    ErrorSeverity::Warning | ErrorSeverity::Error => 1,
                    ErrorSeverity::Critical => 2,
                }
            }
        }
    }
}

fn suggestion(err: &ArchscanError) -> Option<&'static str> {
    match err {
        ArchscanError::InvalidPath { .. } => Some("Check that the path exists and is a directory"),
        ArchscanError::ConfigNotFound { .. } => {
            Some("Run `archscan --init` to create .archscan.toml or pass an existing file with --config")
        }
        ArchscanError::ConfigParse { .. } | ArchscanError::Config { .. } => {
            Some("Compare your configuration with the template written by `archscan --init`")
        }
        ArchscanError::OutputWrite { .. } => Some("Create the output directory first or choose another --output-file"),
        _ => None,
    }
}

/// Write the default config unless one already exists
fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        println!("Configuration file already exists at: {}", path.display());
        println!("To overwrite it, delete the file first and run this command again.");
        return Ok(());
    }

    config::create_default_config(path)?;
    println!("Created default configuration file at: {}", path.display());
    println!("Every setting is commented out; uncomment the ones you want to change.");
    Ok(())
}

/// Engines wired from one set of settings
struct Analysis<'a> {
    settings: &'a Settings,
    ignore: Arc<dyn IgnoreMatcher>,
    reporter: Arc<ProgressReporter>,
}

impl<'a> Analysis<'a> {
    fn new(settings: &'a Settings) -> Result<Self> {
        let ignore: Arc<dyn IgnoreMatcher> = Arc::new(GlobIgnore::from_settings(settings)?);
        let reporter = Arc::new(ProgressReporter::new(
            settings.show_progress && !settings.quiet,
            settings.verbose,
        ));
        Ok(Self {
            settings,
            ignore,
            reporter,
        })
    }

    fn root(&self) -> &Path {
        &self.settings.scan_path
    }

    fn run(&self, command: &Commands) -> Result<ScanReport> {
        let mut report = ScanReport::new(self.root());
        info!(root = %self.root().display(), ?command, "starting analysis");

        let result = match command {
            Commands::Detect { enrich } => self.detect(*enrich, &mut report),
            Commands::Graph { dot, module } => self.graph(dot.as_deref(), module.as_deref(), &mut report),
            Commands::Patterns { pattern } => self.patterns(pattern.as_deref(), &mut report),
            Commands::All => self
                .detect(true, &mut report)
                .and_then(|_| self.graph(None, None, &mut report))
                .and_then(|_| self.patterns(None, &mut report)),
        };
        if result.is_err() {
            self.reporter.abandon();
        }
        result.map(|_| report)
    }

    fn detect(&self, enrich: bool, report: &mut ScanReport) -> Result<()> {
        let orchestrator = DetectionOrchestrator::new(self.settings, Arc::clone(&self.ignore))?;
        let spinner = self.reporter.spinner("Detecting technologies");

        let detection = orchestrator.detect(self.root())?;
        if enrich {
            report.enrichment = Some(orchestrator.enrich(&detection)?);
        }
        if let Some(spinner) = spinner {
            spinner.finish_with_message(format!("Detected {} technologies", detection.matches.len()));
        }
        report.detection = Some(detection);
        Ok(())
    }

    fn graph(&self, dot: Option<&Path>, module: Option<&str>, report: &mut ScanReport) -> Result<()> {
        let analyzer = DependencyAnalyzer::new(self.settings, Arc::clone(&self.ignore))?;

        self.reporter.start(0, "Parsing source files");
        let project = analyzer.build_graph_with_progress(
            self.root(),
            false,
            create_progress_callback(Arc::clone(&self.reporter)),
        )?;
        self.reporter.finish(&format!("Parsed {} files", project.files_parsed));

        if let Some(path) = dot {
            FileWriter::new(path).write(&project.graph.to_dot())?;
            info!(path = %path.display(), "wrote DOT graph");
        }
        if let Some(module) = module {
            report.module = Some(ModuleReport::from_graph(&project.graph, module)?);
        }

        report.graph = Some(
            DependencyGraphAnalysis::from_graph(&project.graph, self.settings.max_cycles)
                .with_parse_summary(project.files_parsed, project.skipped.clone()),
        );
        Ok(())
    }

    fn patterns(&self, pattern: Option<&str>, report: &mut ScanReport) -> Result<()> {
        let matcher = PatternMatcher::new(self.settings, Arc::clone(&self.ignore))?;
        let results = match pattern {
            Some(name) => vec![matcher.match_pattern(self.root(), name)?],
            None => matcher.match_all(self.root())?,
        };
        report.patterns = Some(results);
        Ok(())
    }
}

/// Run an analysis against `root` with otherwise default settings
pub fn analyze_path(root: impl Into<PathBuf>, command: &Commands) -> Result<ScanReport> {
    let settings = Settings {
        scan_path: root.into(),
        show_progress: false,
        ..Settings::default()
    };
    config::SettingsValidator::validate(&settings)?;
    Analysis::new(&settings)?.run(command)
}
