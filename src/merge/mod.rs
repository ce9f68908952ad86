//! pyproject.toml merge
//!
//! Combines an existing pyproject.toml with a template:
//! 1. `[build-system]` and `[project]` always come from the existing file
//! 2. `[tool.*]` follows the selected [`ToolMergeMode`]
//! 3. Other existing top-level tables are carried through
//! 4. The rendered text gets the `extend-exclude` post-fix

mod postfix;
mod pytest;
mod recursive;

pub use postfix::{fix_multiline_strings, ESCAPED_EXTEND_EXCLUDE, LITERAL_EXTEND_EXCLUDE};
pub use pytest::{
    extract_coverage_args, merge_ini_options, merge_markers, merge_pytest_selectively,
    COVERAGE_PREFIX, STRUCTURE_KEYS,
};
pub use recursive::merge_preserving;

use std::path::{Path, PathBuf};

use serde::Serialize;
use toml::{Table, Value};

use crate::document::{self, DocumentError};

/// Sections owned by the project, never touched by the merge
pub const PRESERVED_SECTIONS: &[&str] = &["build-system", "project"];

/// Tools replaced wholesale in overwrite mode (matched as name prefixes)
pub const OVERWRITE_TOOLS: &[&str] = &["black", "isort", "mypy", "coverage", "flake8", "ruff"];

/// Tool merged field by field in overwrite mode
pub const SELECTIVE_TOOL: &str = "pytest";

/// How template `[tool.*]` tables are combined with existing ones
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolMergeMode {
    /// Add missing tools and keys; existing values always win
    #[default]
    Additive,
    /// Replace allow-listed tools, merge pytest selectively, add the rest
    Overwrite,
}

/// What a merge did
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeReport {
    /// Whether overwrite mode was used
    pub overwrite_tools: bool,

    /// Whether the existing file was present
    pub existing_found: bool,

    /// Where the merged document was written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,

    /// Project-owned sections copied from the existing file
    pub preserved_sections: Vec<String>,

    /// Template tools that were not in the existing file
    pub added_tools: Vec<String>,

    /// Tools replaced by the template's version
    pub replaced_tools: Vec<String>,

    /// Tools merged key by key (additive) or selectively (pytest)
    pub merged_tools: Vec<String>,

    /// Whether the `extend-exclude` post-fix fired
    pub fixed_multiline_strings: bool,
}

/// Errors from [`merge_pyproject`]
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("Template file {0} does not exist")]
    TemplateNotFound(PathBuf),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Whether `tool` is replaced wholesale in overwrite mode.
pub fn is_overwrite_tool(tool: &str) -> bool {
    OVERWRITE_TOOLS.iter().any(|prefix| tool.starts_with(prefix))
}

/// Merge two parsed documents.
pub fn merge_documents(
    existing: &Table,
    template: &Table,
    mode: ToolMergeMode,
) -> (Table, MergeReport) {
    let mut report = MergeReport {
        overwrite_tools: mode == ToolMergeMode::Overwrite,
        ..MergeReport::default()
    };
    let mut merged = Table::new();

    for section in PRESERVED_SECTIONS {
        if let Some(value) = existing.get(*section) {
            merged.insert(section.to_string(), value.clone());
            report.preserved_sections.push(section.to_string());
        }
    }

    let mut tools = existing
        .get("tool")
        .and_then(Value::as_table)
        .cloned()
        .unwrap_or_default();

    if let Some(template_tools) = template.get("tool").and_then(Value::as_table) {
        for (name, config) in template_tools {
            match mode {
                ToolMergeMode::Additive => {
                    merge_tool_additive(&mut tools, name, config, &mut report)
                }
                ToolMergeMode::Overwrite => {
                    merge_tool_overwrite(&mut tools, name, config, &mut report)
                }
            }
        }
    }

    if !tools.is_empty() || existing.contains_key("tool") {
        merged.insert("tool".to_string(), Value::Table(tools));
    }

    for (key, value) in existing {
        if !merged.contains_key(key) {
            merged.insert(key.clone(), value.clone());
        }
    }

    (merged, report)
}

fn merge_tool_additive(tools: &mut Table, name: &str, config: &Value, report: &mut MergeReport) {
    match tools.get_mut(name) {
        None => {
            tracing::debug!(tool = name, "adding tool from template");
            tools.insert(name.to_string(), config.clone());
            report.added_tools.push(name.to_string());
        }
        Some(Value::Table(existing_config)) => {
            if let Value::Table(template_config) = config {
                merge_preserving(existing_config, template_config);
                report.merged_tools.push(name.to_string());
            }
        }
        Some(_) => {
            tracing::debug!(tool = name, "keeping existing non-table tool value");
        }
    }
}

fn merge_tool_overwrite(tools: &mut Table, name: &str, config: &Value, report: &mut MergeReport) {
    if name == SELECTIVE_TOOL {
        let merged = match config {
            Value::Table(template_config) => {
                let existing_config = tools
                    .get(name)
                    .and_then(Value::as_table)
                    .cloned()
                    .unwrap_or_default();
                Value::Table(merge_pytest_selectively(&existing_config, template_config))
            }
            other => other.clone(),
        };
        tracing::debug!(tool = name, "selectively merging tool");
        tools.insert(name.to_string(), merged);
        report.merged_tools.push(name.to_string());
    } else if is_overwrite_tool(name) {
        tracing::debug!(tool = name, "replacing tool with template version");
        tools.insert(name.to_string(), config.clone());
        report.replaced_tools.push(name.to_string());
    } else if !tools.contains_key(name) {
        tracing::debug!(tool = name, "adding tool from template");
        tools.insert(name.to_string(), config.clone());
        report.added_tools.push(name.to_string());
    }
}

/// Merge `template_path` into `existing_path` and write the result.
///
/// The result goes to `output_path`, or back to `existing_path` when not
/// given. A missing existing file is treated as empty. Both inputs are
/// validated before anything is written.
pub fn merge_pyproject(
    existing_path: &Path,
    template_path: &Path,
    output_path: Option<&Path>,
    mode: ToolMergeMode,
) -> Result<MergeReport, MergeError> {
    let existing_found = existing_path.exists();
    let existing = if existing_found {
        document::load(existing_path)?
    } else {
        tracing::debug!(path = %existing_path.display(), "existing file missing, starting empty");
        Table::new()
    };

    if !template_path.exists() {
        return Err(MergeError::TemplateNotFound(template_path.to_path_buf()));
    }
    let template = document::load(template_path)?;

    let (merged, mut report) = merge_documents(&existing, &template, mode);

    let rendered = document::render(&merged)?;
    let (content, fixed) = fix_multiline_strings(&rendered);

    let output = output_path.unwrap_or(existing_path);
    document::write(output, &content)?;

    report.existing_found = existing_found;
    report.output = Some(output.to_path_buf());
    report.fixed_multiline_strings = fixed;
    Ok(report)
}
