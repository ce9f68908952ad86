//! Conditional block processing
//!
//! Blocks are delimited by `{{#IF_<NAME>}}` and `{{/IF_<NAME>}}`. A kept
//! block loses its markers; a dropped block loses markers and content. Blocks
//! do not nest: the first close marker after an open marker ends the block.

use regex_lite::Regex;

use crate::config::QualityConfig;

/// Block kept when the project has a frontend
pub const FRONTEND_BLOCK: &str = "HAS_FRONTEND";

/// Block kept when the project has a backend
pub const BACKEND_BLOCK: &str = "HAS_BACKEND";

/// Every phase block, in processing order
pub const PHASE_BLOCKS: &[&str] = &[
    "PHASE_0",
    "PHASE_1",
    "PHASE_2",
    "PHASE_3",
    "PHASE_1_OR_HIGHER",
    "PHASE_2_OR_HIGHER",
];

/// Phase blocks kept at `phase`.
///
/// Phase 3 and above share one set; there is no separate tier past
/// `PHASE_2_OR_HIGHER`.
pub fn kept_phase_blocks(phase: i64) -> &'static [&'static str] {
    match phase {
        0 => &["PHASE_0"],
        1 => &["PHASE_1", "PHASE_1_OR_HIGHER"],
        2 => &["PHASE_2", "PHASE_1_OR_HIGHER", "PHASE_2_OR_HIGHER"],
        p if p >= 3 => &["PHASE_3", "PHASE_1_OR_HIGHER", "PHASE_2_OR_HIGHER"],
        _ => &[],
    }
}

fn open_marker(name: &str) -> String {
    format!("{{{{#IF_{name}}}}}")
}

fn close_marker(name: &str) -> String {
    format!("{{{{/IF_{name}}}}}")
}

/// Strip the markers of every `name` block, keeping the content. A newline
/// right after a marker goes with it.
pub fn unwrap_block(content: &str, name: &str) -> String {
    let open = open_marker(name);
    let close = close_marker(name);
    content
        .replace(&format!("{open}\n"), "")
        .replace(&open, "")
        .replace(&format!("{close}\n"), "")
        .replace(&close, "")
}

/// Remove every `name` block, markers and content, plus one newline after the
/// close marker. An open marker without a close marker is left alone.
pub fn remove_block(content: &str, name: &str) -> Result<String, regex_lite::Error> {
    let pattern = format!(
        r"(?s){}.*?{}\n?",
        regex_lite::escape(&open_marker(name)),
        regex_lite::escape(&close_marker(name)),
    );
    let re = Regex::new(&pattern)?;
    Ok(re.replace_all(content, "").into_owned())
}

fn apply_block(content: &str, name: &str, keep: bool) -> Result<String, regex_lite::Error> {
    tracing::debug!(block = name, keep, "processing block");
    if keep {
        Ok(unwrap_block(content, name))
    } else {
        remove_block(content, name)
    }
}

/// Resolve all conditional blocks in a workflow template.
pub fn process_template(content: &str, config: &QualityConfig) -> Result<String, regex_lite::Error> {
    let mut out = apply_block(content, FRONTEND_BLOCK, config.has_frontend)?;
    out = apply_block(&out, BACKEND_BLOCK, config.has_backend)?;

    let kept = kept_phase_blocks(config.current_phase);
    for phase in PHASE_BLOCKS {
        out = apply_block(&out, phase, kept.contains(phase))?;
    }
    Ok(out)
}
