//! fix-duplicate-toml-sections CLI
//!
//! Merges duplicate `[tool.pytest.ini_options]` tables in a pyproject.toml so
//! the file parses again.

use clap::Parser;
use pyproject_tools::repair::{fix_duplicate_sections, RepairReport, PYTEST_SECTION};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fix-duplicate-toml-sections")]
#[command(about = "Merge duplicate [tool.pytest.ini_options] sections", version)]
struct Cli {
    /// The pyproject.toml to repair in place
    file: PathBuf,

    /// Do not write <file>.backup before rewriting
    #[arg(long)]
    no_backup: bool,

    /// Output in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let report = match fix_duplicate_sections(&cli.file, !cli.no_backup) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error fixing file: {}", e);
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

fn print_human(report: &RepairReport) {
    if !report.fixed {
        println!("No duplicate [{}] sections found", PYTEST_SECTION);
        println!();
        println!("No fixes needed.");
        return;
    }

    if let Some(ref backup) = report.backup {
        println!("Created backup: {}", backup.display());
    }
    println!("Found {} [{}] sections", report.sections_found, PYTEST_SECTION);
    for (i, offset) in report.section_offsets.iter().enumerate() {
        println!("  Section {} at position {}", i + 1, offset);
    }
    if !report.merged_keys.is_empty() {
        println!("  Merged duplicate keys: {}", report.merged_keys.join(", "));
    }
    println!("Fixed duplicate sections in {}", report.path.display());
    println!("Merged {} sections into one", report.sections_found);
    println!();
    println!("File has been fixed. You can now run merge-pyproject-toml.");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
