//! Key/value parsing and merging for raw section bodies
//!
//! Values are kept as the raw text that followed `=`, so anything the merge
//! does not touch is written back exactly as it was found.

use crate::document::ScanState;

/// One `key = value` entry of a section body
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Entry {
    pub key: String,
    pub value: String,
}

/// Entries merged across duplicate sections
#[derive(Debug, Default)]
pub(crate) struct MergedSection {
    pub entries: Vec<Entry>,
    /// Keys that appeared in more than one section, in first-seen order
    pub merged_keys: Vec<String>,
}

/// Parse the body of a section (the text between its header and the next
/// header). Blank lines and comment lines are skipped. A value whose brackets
/// are still open at end of line continues onto the following lines.
pub(crate) fn parse_entries(body: &str) -> Vec<Entry> {
    let mut entries = Vec::new();
    let mut state = ScanState::default();
    let mut pending: Option<Entry> = None;

    for line in body.lines() {
        if let Some(entry) = pending.as_mut() {
            entry.value.push('\n');
            entry.value.push_str(line.trim_end());
            state.advance(line);
            if state.at_top_level() {
                entries.extend(pending.take());
            }
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some((key, value)) = trimmed.split_once('=') else {
            continue;
        };

        let entry = Entry {
            key: key.trim().to_string(),
            value: value.trim().to_string(),
        };
        state.advance(&entry.value);
        if state.at_top_level() {
            entries.push(entry);
        } else {
            pending = Some(entry);
        }
    }

    entries.extend(pending);
    entries
}

/// Merge the entries of several sections. Array values are unioned, scalar
/// values keep their first occurrence.
pub(crate) fn merge_sections<I>(sections: I) -> MergedSection
where
    I: IntoIterator<Item = Vec<Entry>>,
{
    let mut merged = MergedSection::default();

    for entry in sections.into_iter().flatten() {
        let Some(idx) = merged.entries.iter().position(|e| e.key == entry.key) else {
            merged.entries.push(entry);
            continue;
        };
        let existing = &mut merged.entries[idx];

        tracing::debug!(key = %entry.key, "merging duplicate key");
        if !merged.merged_keys.contains(&entry.key) {
            merged.merged_keys.push(entry.key.clone());
        }

        match (string_items(&existing.value), string_items(&entry.value)) {
            (Some(mut items), Some(more)) => {
                for item in more {
                    if !items.iter().any(|i| item_text(i) == item_text(&item)) {
                        items.push(item);
                    }
                }
                if !items.is_empty() {
                    existing.value = render_array(&items);
                }
            }
            _ => {
                tracing::debug!(key = %entry.key, value = %existing.value, "keeping first value");
            }
        }
    }

    merged
}

/// Render a merged section under `header`.
pub(crate) fn render_section(header: &str, entries: &[Entry]) -> String {
    let mut out = format!("[{header}]\n");
    for entry in entries {
        out.push_str(&entry.key);
        out.push_str(" = ");
        out.push_str(&entry.value);
        out.push('\n');
    }
    out
}

/// String items of a raw array value, in order, each with its original
/// quoting. `None` when the value is not an array made only of single-line
/// basic or literal strings.
fn string_items(value: &str) -> Option<Vec<String>> {
    let inner = value.trim().strip_prefix('[')?.strip_suffix(']')?;
    let mut items = Vec::new();
    let mut need_comma = false;
    let mut chars = inner.char_indices();

    while let Some((start, c)) = chars.next() {
        match c {
            ',' if need_comma => need_comma = false,
            c if c.is_whitespace() => {}
            '#' => {
                for (_, c) in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '"' | '\'' if !need_comma => {
                let mut escaped = false;
                let mut end = None;
                for (i, next) in chars.by_ref() {
                    if next == '\n' {
                        return None;
                    }
                    if c == '"' && escaped {
                        escaped = false;
                    } else if c == '"' && next == '\\' {
                        escaped = true;
                    } else if next == c {
                        end = Some(i);
                        break;
                    }
                }
                items.push(inner[start..=end?].to_string());
                need_comma = true;
            }
            _ => return None,
        }
    }

    Some(items)
}

/// Text of a quoted item without its quotes.
fn item_text(item: &str) -> &str {
    &item[1..item.len() - 1]
}

fn render_array(items: &[String]) -> String {
    format!("[\n    {},\n]", items.join(",\n    "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, value: &str) -> Entry {
        Entry {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_parse_single_line_entries() {
        let body = "\n# comment\ntestpaths = [\"tests\"]\naddopts = \"-ra\"\n\n";
        assert_eq!(
            parse_entries(body),
            vec![entry("testpaths", "[\"tests\"]"), entry("addopts", "\"-ra\"")]
        );
    }

    #[test]
    fn test_parse_multiline_array() {
        let body = "markers = [\n    \"slow: long\",\n    \"db: database\",\n]\nminversion = \"7.0\"\n";
        let entries = parse_entries(body);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].key, "markers");
        assert_eq!(
            entries[0].value,
            "[\n    \"slow: long\",\n    \"db: database\",\n]"
        );
        assert_eq!(entries[1], entry("minversion", "\"7.0\""));
    }

    #[test]
    fn test_merge_unions_arrays_in_order() {
        let merged = merge_sections(vec![
            vec![entry("testpaths", "[\"tests\", \"unit\"]")],
            vec![entry("testpaths", "[\"unit\", \"integration\"]")],
        ]);

        assert_eq!(merged.merged_keys, vec!["testpaths"]);
        assert_eq!(
            merged.entries[0].value,
            "[\n    \"tests\",\n    \"unit\",\n    \"integration\",\n]"
        );
    }

    #[test]
    fn test_merge_keeps_first_scalar() {
        let merged = merge_sections(vec![
            vec![entry("addopts", "\"-ra\"")],
            vec![entry("addopts", "\"-q\""), entry("minversion", "\"7.0\"")],
        ]);

        assert_eq!(
            merged.entries,
            vec![entry("addopts", "\"-ra\""), entry("minversion", "\"7.0\"")]
        );
        assert_eq!(merged.merged_keys, vec!["addopts"]);
    }

    #[test]
    fn test_merge_array_with_scalar_keeps_first() {
        let merged = merge_sections(vec![
            vec![entry("addopts", "[\"-ra\"]")],
            vec![entry("addopts", "\"-q\"")],
        ]);
        assert_eq!(merged.entries, vec![entry("addopts", "[\"-ra\"]")]);
    }

    #[test]
    fn test_string_items_keep_quoting() {
        assert_eq!(
            string_items("[\"a\", 'b']").unwrap(),
            vec!["\"a\"", "'b'"]
        );
        assert_eq!(
            string_items("[\n    \"x\\\"y\", # note\n    'c:\\d',\n]").unwrap(),
            vec!["\"x\\\"y\"", "'c:\\d'"]
        );
        assert!(string_items("[]").unwrap().is_empty());
    }

    #[test]
    fn test_string_items_reject_other_arrays() {
        assert!(string_items("[1, 2]").is_none());
        assert!(string_items("[{ include = \"demo\" }]").is_none());
        assert!(string_items("[\"a\" \"b\"]").is_none());
        assert!(string_items("[\"a\", \"b").is_none());
        assert!(string_items("\"[a]\"").is_none());
    }

    #[test]
    fn test_merge_unions_literal_strings() {
        let merged = merge_sections(vec![
            vec![entry("python_files", "['test_*.py']")],
            vec![entry("python_files", "['check_*.py', \"test_*.py\"]")],
        ]);
        assert_eq!(
            merged.entries[0].value,
            "[\n    'test_*.py',\n    'check_*.py',\n]"
        );
    }

    #[test]
    fn test_merge_non_string_arrays_keeps_first() {
        let merged = merge_sections(vec![
            vec![entry("x", "[1, 2]")],
            vec![entry("x", "[3]")],
        ]);
        assert_eq!(merged.entries, vec![entry("x", "[1, 2]")]);
        assert_eq!(merged.merged_keys, vec!["x"]);
    }

    #[test]
    fn test_merge_empty_arrays_keeps_first() {
        let merged = merge_sections(vec![
            vec![entry("markers", "[]")],
            vec![entry("markers", "[ ]")],
        ]);
        assert_eq!(merged.entries, vec![entry("markers", "[]")]);

        let merged = merge_sections(vec![
            vec![entry("markers", "[]")],
            vec![entry("markers", "[\"slow\"]")],
        ]);
        assert_eq!(merged.entries[0].value, "[\n    \"slow\",\n]");
    }

    #[test]
    fn test_render_section() {
        let rendered = render_section(
            "tool.pytest.ini_options",
            &[entry("minversion", "\"7.0\""), entry("testpaths", "[\"tests\"]")],
        );
        assert_eq!(
            rendered,
            "[tool.pytest.ini_options]\nminversion = \"7.0\"\ntestpaths = [\"tests\"]\n"
        );
    }
}
