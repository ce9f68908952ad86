//! Selective merge of `[tool.pytest]` in overwrite mode
//!
//! The template standardizes the format; the project keeps what only it can
//! know. Per `ini_options` key:
//! - `minversion`: template
//! - `testpaths`, `python_files`, `python_classes`, `python_functions`:
//!   existing, else template
//! - `addopts`: template options plus the existing coverage options
//! - `markers`: template markers, then existing markers with new names
//! - anything else: existing, then template

use toml::{Table, Value};

/// Keys describing the project layout, owned by the existing document
pub const STRUCTURE_KEYS: &[&str] = &[
    "testpaths",
    "python_files",
    "python_classes",
    "python_functions",
];

/// Prefix of pytest-cov options carried over from the existing `addopts`
pub const COVERAGE_PREFIX: &str = "--cov";

/// Merge two `[tool.pytest]` tables.
///
/// When neither side has an `ini_options` table the template is used as is.
pub fn merge_pytest_selectively(existing: &Table, template: &Table) -> Table {
    let existing_ini = existing.get("ini_options").and_then(Value::as_table);
    let template_ini = template.get("ini_options").and_then(Value::as_table);

    if existing_ini.is_none() && template_ini.is_none() {
        return template.clone();
    }

    let empty = Table::new();
    let mut merged = Table::new();
    merged.insert(
        "ini_options".to_string(),
        Value::Table(merge_ini_options(
            existing_ini.unwrap_or(&empty),
            template_ini.unwrap_or(&empty),
        )),
    );

    // Other [tool.pytest] keys are kept too, existing first
    for (key, value) in existing.iter().chain(template.iter()) {
        if !merged.contains_key(key) {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Merge two `[tool.pytest.ini_options]` tables.
pub fn merge_ini_options(existing: &Table, template: &Table) -> Table {
    let mut merged = Table::new();

    if let Some(minversion) = template.get("minversion") {
        merged.insert("minversion".to_string(), minversion.clone());
    }

    for key in STRUCTURE_KEYS {
        if let Some(value) = existing.get(*key).or_else(|| template.get(*key)) {
            merged.insert(key.to_string(), value.clone());
        }
    }

    match existing.get("addopts").filter(|v| !is_empty(v)) {
        Some(existing_addopts) => {
            let (coverage, _) = extract_coverage_args(existing_addopts);
            let standard = template.get("addopts").map(option_tokens).unwrap_or_default();
            tracing::debug!(?coverage, "keeping coverage options from existing addopts");
            let combined = dedup(standard.into_iter().chain(coverage));
            merged.insert("addopts".to_string(), Value::String(combined.join(" ")));
        }
        None => {
            if let Some(template_addopts) = template.get("addopts") {
                merged.insert("addopts".to_string(), template_addopts.clone());
            }
        }
    }

    let markers = merge_markers(existing.get("markers"), template.get("markers"));
    if !markers.is_empty() {
        merged.insert("markers".to_string(), Value::Array(markers));
    }

    for (key, value) in existing.iter().chain(template.iter()) {
        if !merged.contains_key(key) {
            merged.insert(key.clone(), value.clone());
        }
    }

    merged
}

/// Split `addopts` into coverage options and everything else.
///
/// Coverage options start with `--cov`; a bare `--cov` also takes the next
/// token when that token is not itself an option.
pub fn extract_coverage_args(addopts: &Value) -> (Vec<String>, Vec<String>) {
    let args = option_tokens(addopts);
    let mut coverage = Vec::new();
    let mut other = Vec::new();

    let mut iter = args.into_iter().peekable();
    while let Some(arg) = iter.next() {
        if !arg.starts_with(COVERAGE_PREFIX) {
            other.push(arg);
            continue;
        }
        let takes_value = arg == COVERAGE_PREFIX;
        coverage.push(arg);
        if takes_value {
            if let Some(value) = iter.next_if(|next| !next.starts_with('-')) {
                coverage.push(value);
            }
        }
    }

    (coverage, other)
}

/// Union of two marker lists by marker name, template first.
pub fn merge_markers(existing: Option<&Value>, template: Option<&Value>) -> Vec<Value> {
    let mut names: Vec<String> = Vec::new();
    let mut merged = Vec::new();

    let items = |markers: Option<&Value>| -> Vec<Value> {
        markers
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    };

    for marker in items(template).into_iter().chain(items(existing)) {
        let name = marker_name(&marker);
        if !names.contains(&name) {
            names.push(name);
            merged.push(marker);
        }
    }
    merged
}

/// Marker name: the text before the first `:`, trimmed.
fn marker_name(marker: &Value) -> String {
    match marker {
        Value::String(s) => s.split(':').next().unwrap_or_default().trim().to_string(),
        other => other.to_string(),
    }
}

/// Whitespace-separated option tokens of a string or array `addopts`.
fn option_tokens(value: &Value) -> Vec<String> {
    let joined = match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    };
    joined.split_whitespace().map(str::to_string).collect()
}

fn dedup(args: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for arg in args {
        if !unique.contains(&arg) {
            unique.push(arg);
        }
    }
    unique
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Table(table) => table.is_empty(),
        _ => false,
    }
}
