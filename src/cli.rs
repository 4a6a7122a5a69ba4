//! CLI command definitions using clap.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use rebtest_core::CyclePolicy;

/// rebtest - prioritized test generation for actor models
#[derive(Parser, Debug)]
#[command(name = "rebtest")]
#[command(version)]
#[command(about = "Generate scheduling-priority test cases for actor models")]
#[command(
    long_about = "rebtest reads the analysis of an actor model, derives which actors and handlers may race, and emits one test case per priority assignment that must be covered."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate test cases from an analysis file
    Generate {
        /// Analysis JSON file
        analysis: PathBuf,

        #[command(flatten)]
        options: GenerateOptions,

        /// Write output to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format. `json` holds every test case in memory before
        /// writing; use `jsonl` to stream large outputs
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Print the dependency report without test cases
    Inspect {
        /// Analysis JSON file
        analysis: PathBuf,

        #[command(flatten)]
        options: GenerateOptions,
    },
}

/// Options shared by every command that runs the generator.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct GenerateOptions {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Stop after this many test cases
    #[arg(long)]
    pub max_test_cases: Option<usize>,

    /// Cap on permutations per actor group or handler component
    #[arg(long)]
    pub max_permutations: Option<usize>,

    /// Group-graph cycle handling (resolve, reject)
    #[arg(long)]
    pub cycle_policy: Option<CyclePolicy>,

    /// A common target that is one of the two senders creates no dependency
    #[arg(long, default_value_t = false)]
    pub ignore_self_targets: bool,
}

/// Output format for generated test cases.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One JSON document holding the report and all test cases, buffered in memory
    #[default]
    Json,
    /// One test case per line, streamed as generated
    Jsonl,
}
