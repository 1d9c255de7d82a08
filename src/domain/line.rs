//! Display rows produced by the line processor.

use serde::{Deserialize, Serialize};

pub const NO_NEWLINE_CAPTION: &str = "No trailing newline";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchLineType {
    Header,
    Context,
    Add,
    Remove,
    Spacer,
}

impl PatchLineType {
    /// Diff marker shown in front of the row, if the row carries one.
    pub fn prefix(&self) -> Option<char> {
        match self {
            PatchLineType::Add => Some('+'),
            PatchLineType::Remove => Some('-'),
            PatchLineType::Context => Some(' '),
            PatchLineType::Header | PatchLineType::Spacer => None,
        }
    }
}

/// Marker type of a line inside a nested patch file (a `.patch` or `.diff`
/// file that is itself being diffed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InnerPatchLineType {
    Add,
    Remove,
    #[default]
    None,
}

/// Word-diff emphasis applied to a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emphasis {
    Added,
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentIcon {
    NoNewline,
}

/// A run of text within a row.
///
/// `emphasis` (diff highlight background) and `foreground` (syntax color)
/// are independent and composited by the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LineSegment {
    /// `None` for icon-only segments.
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<SegmentIcon>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emphasis: Option<Emphasis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreground: Option<Rgb>,
}

impl LineSegment {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn styled(text: impl Into<String>, emphasis: Option<Emphasis>, foreground: Option<Rgb>) -> Self {
        Self {
            text: Some(text.into()),
            emphasis,
            foreground,
            ..Default::default()
        }
    }

    pub fn no_newline_icon() -> Self {
        Self {
            text: None,
            icon: Some(SegmentIcon::NoNewline),
            caption: Some(NO_NEWLINE_CAPTION.to_string()),
            ..Default::default()
        }
    }

    pub fn text_str(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// A single display row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchLine {
    #[serde(rename = "type")]
    pub kind: PatchLineType,
    pub content: Vec<LineSegment>,
    pub inner_kind: InnerPatchLineType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_line_no: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_line_no: Option<u32>,
    /// Set for rows with no visible text.
    #[serde(default)]
    pub line_break: bool,
}

impl PatchLine {
    pub fn header(text: impl Into<String>) -> Self {
        Self {
            kind: PatchLineType::Header,
            content: vec![LineSegment::plain(text)],
            inner_kind: InnerPatchLineType::None,
            old_line_no: None,
            new_line_no: None,
            line_break: false,
        }
    }

    pub fn spacer() -> Self {
        Self {
            kind: PatchLineType::Spacer,
            content: Vec::new(),
            inner_kind: InnerPatchLineType::None,
            old_line_no: None,
            new_line_no: None,
            line_break: false,
        }
    }

    /// Concatenated text of all text segments.
    pub fn text(&self) -> String {
        self.content.iter().map(LineSegment::text_str).collect()
    }

    pub fn has_emphasis(&self) -> bool {
        self.content.iter().any(|segment| segment.emphasis.is_some())
    }
}
