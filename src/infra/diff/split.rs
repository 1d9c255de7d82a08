//! Splits a combined multi-file diff into per-file patches and classifies
//! each file's change from its `diff --git` header block.
//!
//! This is a best-effort heuristic: paths containing spaces are not
//! supported, and classification reads header lines by position.

use crate::domain::{FileDetails, FileStatus};
use lazy_static::lazy_static;
use regex::Regex;

pub const BINARY_FILE_PLACEHOLDER: &str = "Cannot show binary file";

lazy_static! {
    static ref FILE_BOUNDARY_RE: Regex =
        Regex::new(r"(?m)^diff --git a/(\S+) b/(\S+)\r?$").expect("file boundary regex");
    static ref BINARY_LINE_RE: Regex =
        Regex::new(r"^Binary files .* differ$").expect("binary files regex");
}

/// Splits `text` at every `diff --git a/<path> b/<path>` line.
pub fn split_multi_file_patch(text: &str) -> Vec<FileDetails> {
    let boundaries: Vec<_> = FILE_BOUNDARY_RE.captures_iter(text).collect();
    let mut files = Vec::with_capacity(boundaries.len());

    for (idx, caps) in boundaries.iter().enumerate() {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let end = boundaries
            .get(idx + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(text.len());
        let content = &text[whole.start()..end];
        let from_file = caps[1].to_string();
        let to_file = caps[2].to_string();

        let header: Vec<&str> = content.lines().take(3).collect();
        let status = classify_file_status(&from_file, &to_file, &header);

        let content = match header.get(2) {
            Some(line) if BINARY_LINE_RE.is_match(line.trim_end()) => {
                binary_placeholder_patch(&from_file, &to_file)
            }
            _ => content.to_string(),
        };

        files.push(FileDetails {
            from_file,
            to_file,
            content,
            status,
        });
    }

    files
}

/// Classifies a file from the first lines of its header block, starting
/// with the `diff --git` line itself.
pub fn classify_file_status(from_file: &str, to_file: &str, header: &[&str]) -> FileStatus {
    let second = header.get(1).map(|line| line.trim_end()).unwrap_or("");

    if second.starts_with("deleted file mode") {
        FileStatus::Removed
    } else if second.starts_with("new file mode") {
        FileStatus::Added
    } else if from_file != to_file {
        if second == "similarity index 100%" {
            FileStatus::Renamed
        } else {
            FileStatus::RenamedModified
        }
    } else {
        FileStatus::Modified
    }
}

/// A one-line patch shown in place of binary content.
pub fn binary_placeholder_patch(from_file: &str, to_file: &str) -> String {
    format!(
        "diff --git a/{from_file} b/{to_file}\n--- a/{from_file}\n+++ b/{to_file}\n@@ -1,1 +1,1 @@\n {BINARY_FILE_PLACEHOLDER}\n"
    )
}
