//! Workflow template processor
//!
//! Turns a GitHub Actions workflow template into a concrete workflow by
//! resolving its `{{#IF_<NAME>}}` ... `{{/IF_<NAME>}}` blocks against the
//! project's quality phase and layout.

pub mod config;
pub mod template;

pub use config::{ConfigError, QualityConfig, DEFAULT_CONFIG_FILE};
pub use template::{kept_phase_blocks, process_template, PHASE_BLOCKS};

use std::fs;
use std::path::{Path, PathBuf};

/// Errors from [`render_workflow`]
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Template file {0} not found")]
    TemplateNotFound(PathBuf),

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid marker pattern: {0}")]
    Pattern(#[from] regex_lite::Error),
}

/// Process the template at `input` and write the result to `output`,
/// creating the output's parent directories.
pub fn render_workflow(
    input: &Path,
    output: &Path,
    config: &QualityConfig,
) -> Result<(), WorkflowError> {
    if !input.exists() {
        return Err(WorkflowError::TemplateNotFound(input.to_path_buf()));
    }

    let content = fs::read_to_string(input).map_err(|source| WorkflowError::Io {
        path: input.to_path_buf(),
        source,
    })?;
    let processed = process_template(&content, config)?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| WorkflowError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(output, processed).map_err(|source| WorkflowError::Io {
        path: output.to_path_buf(),
        source,
    })?;

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        phase = config.current_phase,
        "rendered workflow"
    );
    Ok(())
}
