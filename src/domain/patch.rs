use serde::{Deserialize, Serialize};

/// The literal line git emits after a line lacking a trailing newline.
pub const NO_NEWLINE_SENTINEL: &str = "\\ No newline at end of file";

/// Returns true for the "no newline at end of file" marker line.
///
/// Git localizes the message, so any line starting with a backslash counts.
pub fn is_no_newline_sentinel(line: &str) -> bool {
    line.starts_with('\\')
}

/// One file's diff. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedPatch {
    pub old_file_name: Option<String>,
    pub new_file_name: Option<String>,
    pub hunks: Vec<Hunk>,
}

impl ParsedPatch {
    /// The path used for language detection: the new name unless the file
    /// was removed.
    pub fn display_path(&self) -> Option<&str> {
        self.new_file_name
            .as_deref()
            .or(self.old_file_name.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    pub old_start: u32,
    pub old_lines: u32,
    pub new_start: u32,
    pub new_lines: u32,
    /// Text after the closing `@@`, e.g. the enclosing function signature.
    pub section: String,
    /// The `@@` line exactly as it appeared in the diff. Empty for hunks
    /// built in code.
    #[serde(default)]
    pub header_text: String,
    /// Raw lines including their leading `+`, `-` or ` ` marker, and any
    /// no-newline sentinel lines.
    pub lines: Vec<String>,
}

impl Hunk {
    /// The `@@` header line. Falls back to `@@ -a,b +c,d @@ section` when
    /// the original text is unknown.
    pub fn header(&self) -> String {
        if !self.header_text.is_empty() {
            return self.header_text.clone();
        }
        let mut header = format!(
            "@@ -{},{} +{},{} @@",
            self.old_start, self.old_lines, self.new_start, self.new_lines
        );
        if !self.section.is_empty() {
            header.push(' ');
            header.push_str(&self.section);
        }
        header
    }
}
