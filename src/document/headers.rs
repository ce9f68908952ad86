//! Line-level scanning of TOML table headers
//!
//! Works on raw text so it can describe files the parser rejects (the
//! duplicate-section case). Lines inside multi-line arrays and multi-line
//! strings are never treated as headers.

/// A `[table]` or `[[array.of.tables]]` header found in raw TOML text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionHeader {
    /// Dotted table path, whitespace-trimmed (e.g. `tool.pytest.ini_options`)
    pub name: String,

    /// Byte offset of the start of the header line
    pub start: usize,

    /// Byte offset just past the header line (including its newline)
    pub line_end: usize,

    /// True for `[[...]]` array-of-tables headers
    pub is_array: bool,
}

/// Find every table header in `content`, in file order.
pub fn find_headers(content: &str) -> Vec<SectionHeader> {
    let mut headers = Vec::new();
    let mut state = ScanState::default();
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let start = offset;
        offset += line.len();

        if state.at_top_level() {
            if let Some((name, is_array)) = parse_header(line) {
                headers.push(SectionHeader {
                    name,
                    start,
                    line_end: offset,
                    is_array,
                });
                continue;
            }
        }
        state.advance(line);
    }

    headers
}

/// Name of the first standard table header declared more than once.
pub fn first_repeated_header(content: &str) -> Option<String> {
    let headers = find_headers(content);
    headers
        .iter()
        .enumerate()
        .find(|(i, h)| {
            !h.is_array
                && headers[..*i]
                    .iter()
                    .any(|prev| !prev.is_array && prev.name == h.name)
        })
        .map(|(_, h)| h.name.clone())
}

/// Number of standard (non-array) headers named `name`.
pub fn header_count(content: &str, name: &str) -> usize {
    find_headers(content)
        .iter()
        .filter(|h| !h.is_array && h.name == name)
        .count()
}

/// Parse a header line, returning the table path and whether it is `[[...]]`.
fn parse_header(line: &str) -> Option<(String, bool)> {
    let trimmed = line.trim();
    let (inner, is_array) = if let Some(rest) = trimmed.strip_prefix("[[") {
        (rest.split_once("]]")?.0, true)
    } else {
        (trimmed.strip_prefix('[')?.split_once(']')?.0, false)
    };

    let name = inner
        .split('.')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(".");
    if name.is_empty() || name.contains('=') {
        return None;
    }
    Some((name, is_array))
}

/// Tracks whether the scanner is inside a multi-line value.
#[derive(Debug, Default)]
pub(crate) struct ScanState {
    depth: i32,
    open_string: Option<&'static str>,
}

impl ScanState {
    pub(crate) fn at_top_level(&self) -> bool {
        self.depth <= 0 && self.open_string.is_none()
    }

    /// Feed one line of a value (or a key/value line) through the scanner.
    pub(crate) fn advance(&mut self, line: &str) {
        let mut rest = line;

        if let Some(delim) = self.open_string {
            match rest.find(delim) {
                Some(pos) => {
                    self.open_string = None;
                    rest = &rest[pos + delim.len()..];
                }
                None => return,
            }
        }

        let (delta, open) = bracket_delta(rest);
        self.depth = (self.depth + delta).max(0);
        self.open_string = open;
    }
}

/// Net bracket depth change of a line, ignoring brackets inside strings and
/// comments. Also reports a multi-line string left open at end of line.
pub(crate) fn bracket_delta(line: &str) -> (i32, Option<&'static str>) {
    let bytes = line.as_bytes();
    let mut delta = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'#' => break,
            b'[' => delta += 1,
            b']' => delta -= 1,
            quote @ (b'"' | b'\'') => {
                let triple: &'static str = if quote == b'"' { "\"\"\"" } else { "'''" };
                if line[i..].starts_with(triple) {
                    match line[i + 3..].find(triple) {
                        Some(end) => i += 3 + end + 3,
                        None => return (delta, Some(triple)),
                    }
                    continue;
                }
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    if quote == b'"' && bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }

    (delta, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_standard_and_array_headers() {
        let content = "[project]\nname = \"x\"\n\n[[tool.mypy.overrides]]\nmodule = \"a\"\n";
        let headers = find_headers(content);

        assert_eq!(headers.len(), 2);
        assert_eq!(headers[0].name, "project");
        assert_eq!(headers[0].start, 0);
        assert!(!headers[0].is_array);
        assert_eq!(headers[1].name, "tool.mypy.overrides");
        assert!(headers[1].is_array);
    }

    #[test]
    fn test_array_lines_are_not_headers() {
        let content = "[tool.x]\nvalues = [\n    [1, 2],\n    [3],\n]\n[tool.y]\n";
        let names: Vec<_> = find_headers(content).into_iter().map(|h| h.name).collect();
        assert_eq!(names, vec!["tool.x", "tool.y"]);
    }

    #[test]
    fn test_multiline_string_lines_are_not_headers() {
        let content = "[tool.black]\nextend-exclude = '''\n[not-a-header]\n'''\n[tool.isort]\n";
        let names: Vec<_> = find_headers(content).into_iter().map(|h| h.name).collect();
        assert_eq!(names, vec!["tool.black", "tool.isort"]);
    }

    #[test]
    fn test_first_repeated_header() {
        let content = "[a]\nx = 1\n[b]\n[a]\ny = 2\n";
        assert_eq!(first_repeated_header(content), Some("a".to_string()));
        assert_eq!(header_count(content, "a"), 2);
        assert_eq!(first_repeated_header("[a]\n[b]\n"), None);
    }

    #[test]
    fn test_bracket_delta_ignores_strings_and_comments() {
        assert_eq!(bracket_delta("markers = [\"a[b\", # ]]]\n"), (1, None));
        assert_eq!(bracket_delta("]\n"), (-1, None));
        assert_eq!(bracket_delta("x = '''\n"), (0, Some("'''")));
    }
}
