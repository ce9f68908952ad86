//! Duplicate `[tool.pytest.ini_options]` repair
//!
//! Templates appended to an existing pyproject.toml often leave two
//! `[tool.pytest.ini_options]` tables behind, which TOML parsers reject.
//! The repair merges every occurrence into a single table placed where the
//! first one was:
//! - Arrays: union of their string items, first-seen order
//! - Scalars: first occurrence wins
//!
//! Works on raw text, since the broken file cannot be parsed.

mod section;

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::document::find_headers;
use section::{merge_sections, parse_entries, render_section};

/// The table this repair knows how to merge
pub const PYTEST_SECTION: &str = "tool.pytest.ini_options";

/// Suffix appended to the file name for the pre-repair copy
pub const BACKUP_SUFFIX: &str = ".backup";

/// Errors from [`fix_duplicate_sections`]
#[derive(Debug, thiserror::Error)]
pub enum RepairError {
    #[error("File {0} does not exist")]
    NotFound(PathBuf),

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result of repairing text in memory
#[derive(Debug, Clone)]
pub struct RepairedContent {
    /// Full file text with the sections merged
    pub content: String,

    /// Byte offsets of the original section headers
    pub section_offsets: Vec<usize>,

    /// Keys that appeared in more than one section
    pub merged_keys: Vec<String>,
}

/// Outcome of a repair run
#[derive(Debug, Clone, Serialize)]
pub struct RepairReport {
    pub path: PathBuf,

    /// Whether the file was rewritten
    pub fixed: bool,

    /// Number of `[tool.pytest.ini_options]` sections found
    pub sections_found: usize,

    /// Byte offsets of the sections before the repair
    pub section_offsets: Vec<usize>,

    pub merged_keys: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
}

/// Span of one section: its header through the start of the next header.
#[derive(Debug, Clone, Copy)]
struct Span {
    start: usize,
    body_start: usize,
    end: usize,
}

fn pytest_spans(content: &str) -> Vec<Span> {
    let headers = find_headers(content);
    headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !h.is_array && h.name == PYTEST_SECTION)
        .map(|(i, h)| Span {
            start: h.start,
            body_start: h.line_end,
            end: headers.get(i + 1).map_or(content.len(), |next| next.start),
        })
        .collect()
}

/// Number of `[tool.pytest.ini_options]` sections in `content`.
pub fn count_sections(content: &str) -> usize {
    pytest_spans(content).len()
}

/// Merge duplicate `[tool.pytest.ini_options]` sections in `content`.
///
/// Returns `None` when there is at most one such section.
pub fn repair_content(content: &str) -> Option<RepairedContent> {
    let spans = pytest_spans(content);
    if spans.len() <= 1 {
        return None;
    }

    let merged = merge_sections(
        spans
            .iter()
            .map(|span| parse_entries(&content[span.body_start..span.end])),
    );
    let merged_text = render_section(PYTEST_SECTION, &merged.entries);

    let mut out = String::with_capacity(content.len());
    let mut cursor = 0;
    for (i, span) in spans.iter().enumerate() {
        out.push_str(&content[cursor..span.start]);
        if i == 0 {
            out.push_str(&merged_text);
            out.push('\n');
        }
        cursor = span.end;
    }
    out.push_str(&content[cursor..]);

    Some(RepairedContent {
        content: out,
        section_offsets: spans.iter().map(|s| s.start).collect(),
        merged_keys: merged.merged_keys,
    })
}

/// Path of the backup written next to `path`.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Repair the file at `path` in place.
///
/// When duplicates are found and `backup` is set, the original is copied to
/// `<path>.backup` before the file is rewritten. A file without duplicates is
/// left untouched.
pub fn fix_duplicate_sections(path: &Path, backup: bool) -> Result<RepairReport, RepairError> {
    if !path.exists() {
        return Err(RepairError::NotFound(path.to_path_buf()));
    }
    let io_err = |source| RepairError::Io {
        path: path.to_path_buf(),
        source,
    };

    let content = fs::read_to_string(path).map_err(io_err)?;

    let Some(repaired) = repair_content(&content) else {
        tracing::debug!(path = %path.display(), "no duplicate sections");
        return Ok(RepairReport {
            path: path.to_path_buf(),
            fixed: false,
            sections_found: count_sections(&content),
            section_offsets: Vec::new(),
            merged_keys: Vec::new(),
            backup: None,
        });
    };

    tracing::info!(
        path = %path.display(),
        sections = repaired.section_offsets.len(),
        "merging duplicate [{}] sections",
        PYTEST_SECTION
    );

    let backup = if backup {
        let dest = backup_path(path);
        fs::write(&dest, &content).map_err(|source| RepairError::Io {
            path: dest.clone(),
            source,
        })?;
        Some(dest)
    } else {
        None
    };

    fs::write(path, &repaired.content).map_err(io_err)?;

    Ok(RepairReport {
        path: path.to_path_buf(),
        fixed: true,
        sections_found: repaired.section_offsets.len(),
        section_offsets: repaired.section_offsets,
        merged_keys: repaired.merged_keys,
        backup,
    })
}
