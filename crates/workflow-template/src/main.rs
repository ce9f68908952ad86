//! process-workflow-template CLI
//!
//! Renders a GitHub Actions workflow template for the current project.

use clap::Parser;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;
use workflow_template::{render_workflow, QualityConfig, DEFAULT_CONFIG_FILE};

#[derive(Parser)]
#[command(name = "process-workflow-template")]
#[command(about = "Resolve conditional blocks in a workflow template", version)]
struct Cli {
    /// Workflow template to process
    input: PathBuf,

    /// Where to write the processed workflow
    output: PathBuf,

    /// Project root probed for frontend/backend paths
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Path to quality config (default: <root>/.quality-config.yaml)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.root.join(DEFAULT_CONFIG_FILE));
    let config = QualityConfig::load(&cli.root, &config_path);

    if let Err(e) = render_workflow(&cli.input, &cli.output, &config) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    if cli.json {
        let output = serde_json::json!({
            "input": cli.input,
            "output": cli.output,
            "config": config,
        });
        match serde_json::to_string_pretty(&output) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
    } else {
        println!(
            "Processed template: {} -> {}",
            cli.input.display(),
            cli.output.display()
        );
        println!(
            "Phase: {}, Frontend: {}, Backend: {}",
            config.current_phase, config.has_frontend, config.has_backend
        );
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
