//! pyproject.toml documents
//!
//! Loading, validation and rendering of TOML documents. Parse failures caused
//! by a table declared twice are turned into a targeted diagnostic naming the
//! section and walking through the manual fix.

mod headers;

pub use headers::{find_headers, first_repeated_header, header_count, SectionHeader};
pub(crate) use headers::ScanState;

use std::fs;
use std::path::{Path, PathBuf};

use regex_lite::Regex;
use toml::Table;

/// Errors raised while reading, validating or writing a document
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}", duplicate_section_help(.path, .section))]
    DuplicateSection { path: PathBuf, section: String },

    #[error("Invalid TOML file {path}: {message}")]
    Invalid { path: PathBuf, message: String },

    #[error("Failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Read and parse a TOML document.
pub fn load(path: &Path) -> Result<Table, DocumentError> {
    let content = fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&content, path)
}

/// Parse TOML text. `path` is only used for diagnostics.
pub fn parse(content: &str, path: &Path) -> Result<Table, DocumentError> {
    toml::from_str::<Table>(content).map_err(|e| classify_parse_error(path, content, &e))
}

/// Serialize a document, arrays laid out one item per line.
pub fn render(table: &Table) -> Result<String, DocumentError> {
    Ok(toml::to_string_pretty(table)?)
}

/// Write text to `path`, mapping failures to [`DocumentError::Io`].
pub fn write(path: &Path, content: &str) -> Result<(), DocumentError> {
    fs::write(path, content).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn classify_parse_error(path: &Path, content: &str, err: &toml::de::Error) -> DocumentError {
    let message = err.message();

    if message.contains("duplicate key") {
        let section = duplicate_key_path(message)
            .filter(|name| header_count(content, name) > 1)
            .or_else(|| first_repeated_header(content));

        if let Some(section) = section {
            tracing::debug!(%section, "parse failure caused by duplicate section");
            return DocumentError::DuplicateSection {
                path: path.to_path_buf(),
                section,
            };
        }
    }

    DocumentError::Invalid {
        path: path.to_path_buf(),
        message: err.to_string().trim_end().to_string(),
    }
}

/// Extract the dotted path from a parser message such as
/// "duplicate key `ini_options` in table `tool.pytest`".
fn duplicate_key_path(message: &str) -> Option<String> {
    let in_table = Regex::new(r"duplicate key `([^`]+)` in table `([^`]+)`").ok()?;
    if let Some(caps) = in_table.captures(message) {
        return Some(format!("{}.{}", &caps[2], &caps[1]));
    }

    let at_root = Regex::new(r"duplicate key `([^`]+)` in document root").ok()?;
    at_root.captures(message).map(|caps| caps[1].to_string())
}

fn duplicate_section_help(path: &Path, section: &str) -> String {
    let path = path.display();
    format!(
        "Duplicate TOML section detected in {path}

The file contains multiple [{section}] sections, which is invalid TOML.

SOLUTION: Fix the duplicate sections manually:

1. Open {path} in a text editor
2. Search for \"[{section}]\" (you'll find multiple instances)
3. Manually merge the duplicate sections:
   - Combine all unique settings from both sections
   - Keep only ONE [{section}] header
   - Remove the duplicate section headers
4. Re-run the merge

Example for [tool.pytest.ini_options] duplicates:
   BEFORE (invalid):
   [tool.pytest.ini_options]
   testpaths = [\"tests\"]
   addopts = \"--cov\"

   [tool.pytest.ini_options]  <- DUPLICATE!
   markers = [\"slow\"]

   AFTER (valid):
   [tool.pytest.ini_options]
   testpaths = [\"tests\"]
   addopts = \"--cov\"
   markers = [\"slow\"]

For [tool.pytest.ini_options], `fix-duplicate-toml-sections {path}` merges them automatically."
    )
}
