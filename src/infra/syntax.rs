//! Syntax highlighting with incremental grammar state.
//!
//! A [`HighlightProvider`] colors one line at a time and hands back the
//! grammar state needed to continue on the next line of the same side, so
//! constructs spanning lines (block comments, strings) stay correct.

use crate::domain::{DEFAULT_THEME, HighlightError, Rgb};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use syntect::highlighting::{Color, HighlightIterator, HighlightState, Highlighter, ThemeSet};
use syntect::parsing::{ParseState, ScopeStack, SyntaxReference, SyntaxSet};

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

const PLAIN_TEXT: &str = "Plain Text";
const MAX_LINE_LENGTH: usize = 2000;

static EXTENSION_TABLE: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("rs", "Rust"),
        ("java", "Java"),
        ("js", "JavaScript"),
        ("mjs", "JavaScript"),
        ("cjs", "JavaScript"),
        ("jsx", "JavaScript"),
        ("ts", "JavaScript"),
        ("tsx", "JavaScript"),
        ("py", "Python"),
        ("rb", "Ruby"),
        ("go", "Go"),
        ("c", "C"),
        ("h", "C"),
        ("cpp", "C++"),
        ("cc", "C++"),
        ("cxx", "C++"),
        ("hpp", "C++"),
        ("cs", "C#"),
        ("php", "PHP"),
        ("sh", "Bourne Again Shell (bash)"),
        ("bash", "Bourne Again Shell (bash)"),
        ("zsh", "Bourne Again Shell (bash)"),
        ("json", "JSON"),
        ("yml", "YAML"),
        ("yaml", "YAML"),
        ("xml", "XML"),
        ("html", "HTML"),
        ("htm", "HTML"),
        ("css", "CSS"),
        ("md", "Markdown"),
        ("sql", "SQL"),
        ("lua", "Lua"),
        ("scala", "Scala"),
        ("hs", "Haskell"),
        ("pl", "Perl"),
        ("groovy", "Groovy"),
        ("gradle", "Groovy"),
        ("patch", "Diff"),
        ("diff", "Diff"),
    ])
});

/// A language guess for a file, resolved to a syntect syntax name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Language {
    name: String,
}

impl Language {
    pub fn plain_text() -> Self {
        Self {
            name: PLAIN_TEXT.to_string(),
        }
    }

    /// Guesses the language from a path's extension (or its file name for
    /// files like `Makefile`).
    pub fn from_path(path: &str) -> Self {
        let path = std::path::Path::new(path);
        let extension = path.extension().and_then(|ext| ext.to_str());

        if let Some(ext) = extension {
            let lower = ext.to_ascii_lowercase();
            if let Some(name) = EXTENSION_TABLE.get(lower.as_str()) {
                return Self {
                    name: (*name).to_string(),
                };
            }
        }

        let candidate = extension.or_else(|| path.file_name().and_then(|name| name.to_str()));
        candidate
            .and_then(|token| SYNTAX_SET.find_syntax_by_extension(token))
            .map(|syntax| Self {
                name: syntax.name.clone(),
            })
            .unwrap_or_else(Self::plain_text)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_plain_text(&self) -> bool {
        self.name == PLAIN_TEXT
    }

    fn syntax(&self) -> &'static SyntaxReference {
        SYNTAX_SET
            .find_syntax_by_name(&self.name)
            .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightToken {
    pub text: String,
    pub color: Rgb,
    /// Byte offset of the token within the line.
    pub offset: usize,
}

impl HighlightToken {
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }
}

#[derive(Debug, Clone)]
pub struct HighlightedLine<S> {
    pub tokens: Vec<HighlightToken>,
    pub state: S,
}

#[async_trait]
pub trait HighlightProvider: Send + Sync {
    /// Opaque continuation state carried between lines.
    type State: Clone + Send + Sync + 'static;

    async fn tokenize(
        &self,
        text: &str,
        language: &Language,
        theme: &str,
        state: Option<Self::State>,
    ) -> Result<HighlightedLine<Self::State>, HighlightError>;
}

#[derive(Clone)]
pub struct SyntectState {
    parse: ParseState,
    highlight: HighlightState,
}

impl fmt::Debug for SyntectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntectState").finish_non_exhaustive()
    }
}

/// Highlighter backed by syntect's bundled syntaxes and themes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntectHighlighter;

impl SyntectHighlighter {
    pub fn new() -> Self {
        Self
    }

    pub fn available_themes() -> Vec<&'static str> {
        THEME_SET.themes.keys().map(String::as_str).collect()
    }

    pub fn has_theme(theme: &str) -> bool {
        THEME_SET.themes.contains_key(theme)
    }

    fn tokenize_line(
        &self,
        text: &str,
        language: &Language,
        theme_name: &str,
        state: Option<SyntectState>,
    ) -> Result<HighlightedLine<SyntectState>, HighlightError> {
        let theme = THEME_SET
            .themes
            .get(theme_name)
            .ok_or_else(|| HighlightError::UnknownTheme(theme_name.to_string()))?;
        let default_color = theme
            .settings
            .foreground
            .map(to_rgb)
            .unwrap_or(Rgb::new(0, 0, 0));
        let highlighter = Highlighter::new(theme);

        let mut state = state.unwrap_or_else(|| SyntectState {
            parse: ParseState::new(language.syntax()),
            highlight: HighlightState::new(&highlighter, ScopeStack::new()),
        });

        if text.len() > MAX_LINE_LENGTH {
            return Ok(HighlightedLine {
                tokens: vec![HighlightToken {
                    text: text.to_string(),
                    color: default_color,
                    offset: 0,
                }],
                state,
            });
        }

        let line = format!("{text}\n");
        let ops = state
            .parse
            .parse_line(&line, &SYNTAX_SET)
            .map_err(|err| HighlightError::Tokenize(format!("{err:?}")))?;

        let mut tokens = Vec::new();
        let mut offset = 0;
        for (style, piece) in HighlightIterator::new(&mut state.highlight, &ops, &line, &highlighter) {
            let end = (offset + piece.len()).min(text.len());
            if end > offset {
                tokens.push(HighlightToken {
                    text: text[offset..end].to_string(),
                    color: to_rgb(style.foreground),
                    offset,
                });
            }
            offset += piece.len();
        }

        if tokens.is_empty() && !text.is_empty() {
            tokens.push(HighlightToken {
                text: text.to_string(),
                color: default_color,
                offset: 0,
            });
        }

        Ok(HighlightedLine { tokens, state })
    }
}

#[async_trait]
impl HighlightProvider for SyntectHighlighter {
    type State = SyntectState;

    async fn tokenize(
        &self,
        text: &str,
        language: &Language,
        theme: &str,
        state: Option<SyntectState>,
    ) -> Result<HighlightedLine<SyntectState>, HighlightError> {
        self.tokenize_line(text, language, theme, state)
    }
}

fn to_rgb(color: Color) -> Rgb {
    Rgb::new(color.r, color.g, color.b)
}
