//! Post-serialization fix for Black's `extend-exclude`
//!
//! Serializers that only emit basic strings write Black's verbose regex as a
//! single line full of `\n` escapes. Black accepts it, but nobody can read or
//! edit it. This pass swaps that exact rendering for the literal block the
//! template ships with. It is a fixed replacement, not a general formatter.

/// `extend-exclude` as written by a basic-string-only serializer
pub const ESCAPED_EXTEND_EXCLUDE: &str = r#"extend-exclude = "/(\n  # directories\n  \\.eggs\n  | \\.git\n  | \\.hg\n  | \\.mypy_cache\n  | \\.tox\n  | \\.venv\n  | build\n  | dist\n)/\n""#;

/// The same value as a multi-line literal string
pub const LITERAL_EXTEND_EXCLUDE: &str = r"extend-exclude = '''
/(
  # directories
  \.eggs
  | \.git
  | \.hg
  | \.mypy_cache
  | \.tox
  | \.venv
  | build
  | dist
)/
'''";

/// Replace the escaped `extend-exclude` rendering, if present.
///
/// Returns the new text and whether a replacement happened.
pub fn fix_multiline_strings(content: &str) -> (String, bool) {
    if content.contains(ESCAPED_EXTEND_EXCLUDE) {
        tracing::info!("rewrote Black extend-exclude as a triple-quoted literal");
        (
            content.replace(ESCAPED_EXTEND_EXCLUDE, LITERAL_EXTEND_EXCLUDE),
            true,
        )
    } else {
        (content.to_string(), false)
    }
}
