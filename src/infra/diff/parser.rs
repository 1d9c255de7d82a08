//! Unified diff parser.
//!
//! Turns raw diff text into [`ParsedPatch`] values, one per file, keeping each
//! hunk's raw lines (markers and no-newline sentinels included) so the line
//! processor sees exactly what the diff said.

use crate::domain::{DiffError, Hunk, ParsedPatch, is_no_newline_sentinel};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HUNK_HEADER_RE: Regex =
        Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@ ?(.*)$")
            .expect("hunk header regex");
    static ref GIT_HEADER_RE: Regex =
        Regex::new(r"^diff --git a/(\S+) b/(\S+)").expect("git header regex");
}

struct PendingPatch {
    patch: ParsedPatch,
    // Set once `---`/`+++` lines named the files.
    has_markers: bool,
}

impl PendingPatch {
    fn new(old_file_name: Option<String>, new_file_name: Option<String>) -> Self {
        Self {
            patch: ParsedPatch {
                old_file_name,
                new_file_name,
                hunks: Vec::new(),
            },
            has_markers: false,
        }
    }
}

/// Parses every file in `text`. Empty input yields no patches.
pub fn parse_patches(text: &str) -> Result<Vec<ParsedPatch>, DiffError> {
    let lines: Vec<&str> = text.lines().collect();
    let mut patches = Vec::new();
    let mut current: Option<PendingPatch> = None;

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];

        if let Some(caps) = GIT_HEADER_RE.captures(line) {
            if let Some(done) = current.take() {
                patches.push(done.patch);
            }
            current = Some(PendingPatch::new(
                Some(caps[1].to_string()),
                Some(caps[2].to_string()),
            ));
            i += 1;
            continue;
        }

        if line.starts_with("--- ")
            && let Some(next) = lines.get(i + 1)
            && next.starts_with("+++ ")
        {
            let old_name = parse_file_name(&line[4..]);
            let new_name = parse_file_name(&next[4..]);
            match current.as_mut() {
                Some(pending) if !pending.has_markers && pending.patch.hunks.is_empty() => {
                    pending.patch.old_file_name = old_name;
                    pending.patch.new_file_name = new_name;
                    pending.has_markers = true;
                }
                _ => {
                    if let Some(done) = current.take() {
                        patches.push(done.patch);
                    }
                    let mut pending = PendingPatch::new(old_name, new_name);
                    pending.has_markers = true;
                    current = Some(pending);
                }
            }
            i += 2;
            continue;
        }

        if HUNK_HEADER_RE.is_match(line) {
            let (hunk, next) = parse_hunk(&lines, i)?;
            current
                .get_or_insert_with(|| PendingPatch::new(None, None))
                .patch
                .hunks
                .push(hunk);
            i = next;
            continue;
        }

        // index, mode, similarity and binary lines carry no hunk data.
        i += 1;
    }

    if let Some(done) = current.take() {
        patches.push(done.patch);
    }

    Ok(patches)
}

/// Parses text that must describe exactly one file.
pub fn parse_single_patch(text: &str) -> Result<ParsedPatch, DiffError> {
    let mut patches = parse_patches(text)?;
    if patches.len() != 1 {
        return Err(DiffError::UnsupportedFormat(format!(
            "expected exactly one file in patch, found {}",
            patches.len()
        )));
    }
    Ok(patches.remove(0))
}

fn parse_hunk(lines: &[&str], start: usize) -> Result<(Hunk, usize), DiffError> {
    let header = lines[start];
    let caps = HUNK_HEADER_RE
        .captures(header)
        .ok_or_else(|| DiffError::Parse(format!("invalid hunk header: {header}")))?;

    let number = |idx: usize, default: u32| -> Result<u32, DiffError> {
        match caps.get(idx) {
            Some(m) => m
                .as_str()
                .parse()
                .map_err(|_| DiffError::Parse(format!("invalid number in hunk header: {header}"))),
            None => Ok(default),
        }
    };

    let old_start = number(1, 0)?;
    let old_lines = number(2, 1)?;
    let new_start = number(3, 0)?;
    let new_lines = number(4, 1)?;
    if old_start.checked_add(old_lines).is_none() || new_start.checked_add(new_lines).is_none() {
        return Err(DiffError::Parse(format!(
            "hunk '{header}' describes a line range past {}",
            u32::MAX
        )));
    }
    let section = caps
        .get(5)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    let mut old_remaining = old_lines;
    let mut new_remaining = new_lines;
    let mut body = Vec::new();

    let mut i = start + 1;
    while i < lines.len() {
        let line = lines[i];
        if is_no_newline_sentinel(line) {
            body.push(line.to_string());
            i += 1;
            continue;
        }
        if old_remaining == 0 && new_remaining == 0 {
            break;
        }

        let (takes_old, takes_new, raw) = match line.chars().next() {
            Some('+') => (false, true, line.to_string()),
            Some('-') => (true, false, line.to_string()),
            Some(' ') => (true, true, line.to_string()),
            // Some tools strip the space from blank context lines.
            None => (true, true, " ".to_string()),
            Some(_) => break,
        };

        if (takes_old && old_remaining == 0) || (takes_new && new_remaining == 0) {
            return Err(DiffError::Parse(format!(
                "hunk '{header}' has more lines than its header declares"
            )));
        }
        if takes_old {
            old_remaining -= 1;
        }
        if takes_new {
            new_remaining -= 1;
        }
        body.push(raw);
        i += 1;
    }

    if old_remaining > 0 || new_remaining > 0 {
        return Err(DiffError::Parse(format!(
            "hunk '{header}' is truncated: {old_remaining} old and {new_remaining} new lines missing"
        )));
    }

    Ok((
        Hunk {
            old_start,
            old_lines,
            new_start,
            new_lines,
            section,
            header_text: header.trim_end_matches('\r').to_string(),
            lines: body,
        },
        i,
    ))
}

fn parse_file_name(raw: &str) -> Option<String> {
    let name = raw.split('\t').next().unwrap_or(raw).trim();
    let name = name.trim_matches('"');
    if name == "/dev/null" {
        return None;
    }
    let stripped = name
        .strip_prefix("a/")
        .or_else(|| name.strip_prefix("b/"))
        .unwrap_or(name);
    Some(stripped.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_FILES: &str = "diff --git a/src/main.rs b/src/main.rs
index 1111111..2222222 100644
--- a/src/main.rs
+++ b/src/main.rs
@@ -1,3 +1,4 @@ fn main() {
 fn main() {
-    println!(\"hi\");
+    println!(\"hello\");
+    println!(\"world\");
 }
diff --git a/src/lib.rs b/src/lib.rs
new file mode 100644
--- /dev/null
+++ b/src/lib.rs
@@ -0,0 +1 @@
+pub fn add() {}
\\ No newline at end of file
";

    #[test]
    fn test_parse_two_files() {
        let patches = parse_patches(TWO_FILES).unwrap();
        assert_eq!(patches.len(), 2);

        let main = &patches[0];
        assert_eq!(main.old_file_name.as_deref(), Some("src/main.rs"));
        assert_eq!(main.hunks.len(), 1);
        let hunk = &main.hunks[0];
        assert_eq!((hunk.old_start, hunk.old_lines), (1, 3));
        assert_eq!((hunk.new_start, hunk.new_lines), (1, 4));
        assert_eq!(hunk.section, "fn main() {");
        assert_eq!(hunk.lines.len(), 5);
        assert_eq!(hunk.lines[1], "-    println!(\"hi\");");

        let lib = &patches[1];
        assert_eq!(lib.old_file_name, None);
        assert_eq!(lib.new_file_name.as_deref(), Some("src/lib.rs"));
        let hunk = &lib.hunks[0];
        assert_eq!(hunk.new_lines, 1);
        assert_eq!(hunk.lines, vec!["+pub fn add() {}", "\\ No newline at end of file"]);
    }

    #[test]
    fn test_blank_context_line_normalized() {
        let text = "--- a/x.txt\n+++ b/x.txt\n@@ -1,3 +1,3 @@\n a\n\n-b\n+c\n";
        let patch = parse_single_patch(text).unwrap();
        assert_eq!(patch.hunks[0].lines, vec![" a", " ", "-b", "+c"]);
    }

    #[test]
    fn test_file_without_hunks_keeps_git_names() {
        let text = "diff --git a/img.png b/img.png\nindex 1..2 100644\nBinary files a/img.png and b/img.png differ\n";
        let patch = parse_single_patch(text).unwrap();
        assert_eq!(patch.new_file_name.as_deref(), Some("img.png"));
        assert!(patch.hunks.is_empty());
    }

    #[test]
    fn test_single_patch_rejects_multiple_files() {
        let err = parse_single_patch(TWO_FILES).unwrap_err();
        assert!(matches!(err, DiffError::UnsupportedFormat(_)));
        let err = parse_single_patch("").unwrap_err();
        assert!(matches!(err, DiffError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_header_text_is_kept_verbatim() {
        let text = "--- a/x.rs\n+++ b/x.rs\n@@ -5 +5 @@ fn main()\n-a\n+b\n";
        let hunk = &parse_single_patch(text).unwrap().hunks[0];
        assert_eq!(hunk.old_lines, 1);
        assert_eq!(hunk.header(), "@@ -5 +5 @@ fn main()");
    }

    #[test]
    fn test_line_range_overflow_is_an_error() {
        let text = "--- a/x.rs\n+++ b/x.rs\n@@ -4294967295,2 +1,2 @@\n a\n b\n";
        assert!(matches!(parse_single_patch(text), Err(DiffError::Parse(_))));
        let text = "--- a/x.rs\n+++ b/x.rs\n@@ -1,2 +4294967295,2 @@\n a\n b\n";
        assert!(matches!(parse_single_patch(text), Err(DiffError::Parse(_))));
    }

    #[test]
    fn test_truncated_hunk_is_an_error() {
        let text = "--- a/x\n+++ b/x\n@@ -1,3 +1,3 @@\n a\n";
        assert!(matches!(parse_patches(text), Err(DiffError::Parse(_))));
    }

    #[test]
    fn test_headerless_hunk_and_timestamps() {
        let text = "--- a/x.c\t2024-01-01 10:00:00\n+++ b/x.c\t2024-01-02 10:00:00\n@@ -5 +5 @@\n-a\n+b\n";
        let patch = parse_single_patch(text).unwrap();
        assert_eq!(patch.old_file_name.as_deref(), Some("x.c"));
        assert_eq!(patch.hunks[0].old_start, 5);
        assert_eq!(patch.hunks[0].old_lines, 1);

        let bare = parse_single_patch("@@ -1 +1 @@\n-a\n+b\n").unwrap();
        assert_eq!(bare.old_file_name, None);
        assert_eq!(bare.hunks.len(), 1);
    }

    #[test]
    fn test_multiple_hunks_in_one_file() {
        let text = "--- a/x\n+++ b/x\n@@ -1,2 +1,2 @@\n a\n-b\n+B\n@@ -10,1 +10,2 @@\n z\n+zz\n";
        let patch = parse_single_patch(text).unwrap();
        assert_eq!(patch.hunks.len(), 2);
        assert_eq!(patch.hunks[1].new_start, 10);
        assert_eq!(patch.hunks[1].lines, vec![" z", "+zz"]);
    }
}
