use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Added,
    Removed,
    Modified,
    Renamed,
    RenamedModified,
}

impl FileStatus {
    /// Single-character badge used in compact listings.
    pub fn badge(&self) -> char {
        match self {
            FileStatus::Added => '+',
            FileStatus::Removed => '-',
            FileStatus::Modified => '*',
            FileStatus::Renamed | FileStatus::RenamedModified => '>',
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileStatus::Added => "added",
            FileStatus::Removed => "removed",
            FileStatus::Modified => "modified",
            FileStatus::Renamed => "renamed",
            FileStatus::RenamedModified => "renamed_modified",
        };
        f.write_str(s)
    }
}

/// Per-file patch metadata handed to the viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDetails {
    pub from_file: String,
    pub to_file: String,
    /// Raw unified diff text for this file only.
    pub content: String,
    pub status: FileStatus,
}

impl FileDetails {
    /// Path shown for the file: the old path for removals, the new one
    /// otherwise.
    pub fn path(&self) -> &str {
        match self.status {
            FileStatus::Removed => &self.from_file,
            _ => &self.to_file,
        }
    }

    pub fn extension(&self) -> Option<&str> {
        std::path::Path::new(self.path())
            .extension()
            .and_then(|ext| ext.to_str())
    }

    /// True when the file is itself a patch, so its lines carry nested diff
    /// markers.
    pub fn is_nested_patch(&self) -> bool {
        is_patch_path(&self.from_file) || is_patch_path(&self.to_file)
    }
}

pub fn is_patch_path(path: &str) -> bool {
    path.ends_with(".patch") || path.ends_with(".diff")
}
