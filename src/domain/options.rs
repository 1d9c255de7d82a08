use serde::{Deserialize, Serialize};

pub const DEFAULT_THEME: &str = "InspiredGitHub";

/// Options that change how rows are generated. Rows are cached per
/// (file, options) so every field here must be part of the hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderOptions {
    pub syntax_highlighting: bool,
    /// Theme name passed to the highlight provider.
    pub theme: String,
    pub word_diff: bool,
    pub hide_header_only_hunks: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            syntax_highlighting: true,
            theme: DEFAULT_THEME.to_string(),
            word_diff: true,
            hide_header_only_hunks: true,
        }
    }
}
