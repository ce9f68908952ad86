//! merge-pyproject-toml CLI
//!
//! Merges a template pyproject.toml into an existing one, keeping the
//! project's `[build-system]` and `[project]` tables.

use clap::Parser;
use pyproject_tools::merge::{merge_pyproject, MergeReport, ToolMergeMode};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "merge-pyproject-toml")]
#[command(about = "Merge a template pyproject.toml into an existing one", version)]
struct Cli {
    /// Existing pyproject.toml (treated as empty if it does not exist)
    existing: PathBuf,

    /// Template pyproject.toml with tool configurations
    template: PathBuf,

    /// Where to write the result (default: the existing file)
    output: Option<PathBuf>,

    /// Replace tool configs (black, mypy, etc.) with template versions
    #[arg(long)]
    overwrite_tools: bool,

    /// Output in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let mode = if cli.overwrite_tools {
        ToolMergeMode::Overwrite
    } else {
        ToolMergeMode::Additive
    };

    let report = match merge_pyproject(&cli.existing, &cli.template, cli.output.as_deref(), mode) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error merging pyproject.toml: {}", e);
            process::exit(1);
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
    } else {
        print_human(&report);
    }
}

fn print_human(report: &MergeReport) {
    println!("Successfully merged pyproject.toml configurations");
    if let Some(ref output) = report.output {
        println!("  Output: {}", output.display());
    }
    if report.existing_found {
        println!("  - Preserved existing [build-system] and [project] sections");
    }
    if report.overwrite_tools {
        println!("  - Replaced tool configurations (black, mypy, etc.) with template versions");
        println!("  - Selectively merged pytest: preserved project-specific settings, standardized format");
        println!("  - Preserved other custom tools (hatch, poetry, etc.)");
    } else {
        println!("  - Preserved existing tool configurations");
        println!("  - Added missing tool configurations from template");
    }
    if !report.added_tools.is_empty() {
        println!("  Added: {}", report.added_tools.join(", "));
    }
    if !report.replaced_tools.is_empty() {
        println!("  Replaced: {}", report.replaced_tools.join(", "));
    }
    if !report.merged_tools.is_empty() {
        println!("  Merged: {}", report.merged_tools.join(", "));
    }
    if report.fixed_multiline_strings {
        println!("  - Fixed Black extend-exclude formatting to use triple quotes");
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
