//! CLI command handlers.
//!
//! Every handler returns `anyhow::Result` and adds context at the edge;
//! the library crates keep their typed errors.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use rebtest_core::{AnalysisResult, Error, GeneratorConfig};
use rebtest_engine::{GenerationPlan, GenerationReport, Generator, TestCase};
use serde::Serialize;
use tracing::info;

use crate::cli::{Commands, GenerateOptions, OutputFormat};

/// Execute a CLI command.
pub fn execute_command(command: Commands) -> Result<()> {
    match command {
        Commands::Generate {
            analysis,
            options,
            output,
            format,
        } => cmd_generate(&analysis, &options, output.as_deref(), format),

        Commands::Inspect { analysis, options } => cmd_inspect(&analysis, &options),
    }
}

/// Full JSON output: the report followed by every test case.
#[derive(Debug, Serialize)]
pub struct GenerationOutput {
    pub report: GenerationReport,
    pub test_cases: Vec<TestCase>,
}

/// Merge the optional config file with command-line overrides.
///
/// # Errors
///
/// Returns an error if the config file cannot be loaded or the merged
/// configuration is invalid.
pub fn resolve_config(options: &GenerateOptions) -> Result<GeneratorConfig> {
    let mut config = match &options.config {
        Some(path) => GeneratorConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => GeneratorConfig::default(),
    };

    if let Some(cap) = options.max_test_cases {
        config = config.with_max_test_cases(cap);
    }
    if let Some(cap) = options.max_permutations {
        config = config.with_max_permutations_per_group(cap);
    }
    if let Some(policy) = options.cycle_policy {
        config = config.with_cycle_policy(policy);
    }
    if options.ignore_self_targets {
        config = config.with_ignore_self_targets(true);
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Load an analysis and run the generator up to emission.
///
/// # Errors
///
/// Returns an error if the analysis cannot be read or parsed, or if planning
/// fails.
pub fn load_plan(analysis_path: &Path, options: &GenerateOptions) -> Result<GenerationPlan> {
    let config = resolve_config(options)?;
    let analysis = AnalysisResult::from_path(analysis_path)
        .with_context(|| format!("Failed to load analysis {}", analysis_path.display()))?;

    info!(
        path = %analysis_path.display(),
        classes = analysis.actors.len(),
        instances = analysis.main_instances.len(),
        "Loaded analysis"
    );

    Generator::new(config)
        .plan(&analysis)
        .context("Test generation failed")
}

/// Generate test cases and write them to `output` or stdout.
///
/// # Errors
///
/// Returns an error if planning fails or the output cannot be written.
pub fn cmd_generate(
    analysis_path: &Path,
    options: &GenerateOptions,
    output: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let plan = load_plan(analysis_path, options)?;

    let written = match output {
        Some(path) => {
            let file = File::create(path).map_err(|e| Error::file_write_failed(path, e.to_string()))?;
            write_generation(&plan, format, &mut BufWriter::new(file))
                .with_context(|| format!("Failed to write {}", path.display()))?
        }
        None => write_generation(&plan, format, &mut io::stdout().lock())?,
    };

    info!(
        test_cases = written,
        warnings = plan.diagnostics().warning_count(),
        "Generation complete"
    );
    Ok(())
}

/// Print the report of an analysis.
///
/// # Errors
///
/// Returns an error if planning fails or stdout cannot be written.
pub fn cmd_inspect(analysis_path: &Path, options: &GenerateOptions) -> Result<()> {
    let plan = load_plan(analysis_path, options)?;
    write_report(&plan.report(), &mut io::stdout().lock())
}

/// Serialize the plan's output in `format`, returning the test case count.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_generation<W: Write>(
    plan: &GenerationPlan,
    format: OutputFormat,
    writer: &mut W,
) -> Result<usize> {
    let count = match format {
        OutputFormat::Json => {
            let output = GenerationOutput {
                report: plan.report(),
                test_cases: plan.test_cases().collect(),
            };
            serde_json::to_writer_pretty(&mut *writer, &output)?;
            writeln!(writer)?;
            output.test_cases.len()
        }
        OutputFormat::Jsonl => plan.test_cases().try_fold(0usize, |count, case| {
            serde_json::to_writer(&mut *writer, &case)?;
            writeln!(writer)?;
            Ok::<usize, anyhow::Error>(count.saturating_add(1))
        })?,
    };

    writer.flush()?;
    Ok(count)
}

/// Serialize a report as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_report<W: Write>(report: &GenerationReport, writer: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, report)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
