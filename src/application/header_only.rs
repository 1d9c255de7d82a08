//! Detection of hunks and patches whose changes touch only diff headers.
//!
//! Diffs of patch files often change nothing but the embedded `index`,
//! `---`/`+++` and `@@` lines when the patch is regenerated. Those hunks
//! carry no reviewable change.

use crate::domain::{Hunk, ParsedPatch};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref INDEX_LINE_RE: Regex =
        Regex::new(r"^index [0-9a-fA-F]+\.\.[0-9a-fA-F]+(?: [0-7]+)?$").expect("index line regex");
}

/// True if `content` (a line with its outer diff marker already removed)
/// looks like a diff header line.
pub fn is_header_line(content: &str) -> bool {
    content.starts_with("+++")
        || content.starts_with("---")
        || content.starts_with("@@ -")
        || content.starts_with("@@ +")
        || INDEX_LINE_RE.is_match(content.trim_end())
}

/// True for an addition or removal whose content is not a header line.
pub fn is_non_header_change(line: &str) -> bool {
    line.strip_prefix('+')
        .or_else(|| line.strip_prefix('-'))
        .is_some_and(|content| !is_header_line(content))
}

pub fn is_header_only_hunk(hunk: &Hunk) -> bool {
    !hunk.lines.iter().any(|line| is_non_header_change(line))
}

/// A patch is header-only when none of its hunks has a non-header change.
pub fn is_header_only_patch(patch: &ParsedPatch) -> bool {
    patch.hunks.iter().all(is_header_only_hunk)
}
