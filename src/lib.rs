//! pyproject-tools - keep a project's pyproject.toml in line with a template
//!
//! Two operations over pyproject.toml files:
//! - [`repair`]: merge duplicate `[tool.pytest.ini_options]` tables left behind
//!   by naive template appends
//! - [`merge`]: combine an existing pyproject.toml with a template, keeping the
//!   project's own `[build-system]` and `[project]` tables

pub mod document;
pub mod merge;
pub mod repair;

pub use document::DocumentError;
pub use merge::{merge_documents, merge_pyproject, MergeError, MergeReport, ToolMergeMode};
pub use repair::{fix_duplicate_sections, repair_content, RepairError, RepairReport};
