//! Patch text read from a file or from stdin (`-`).

use crate::domain::{FileDetails, FileStatus, SourceError};
use crate::infra::diff::{parse_patches, split_multi_file_patch};
use crate::infra::vcs::traits::{DiffProvider, FetchedDiff};
use async_trait::async_trait;
use tokio::io::AsyncReadExt;

pub const STDIN_REF: &str = "-";

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalPatchProvider;

impl LocalPatchProvider {
    pub fn new() -> Self {
        Self
    }
}

/// Splits patch text into files. Text without `diff --git` boundaries is
/// treated as a single file named from its `---`/`+++` headers.
pub fn files_from_text(text: &str, fallback_name: &str) -> Vec<FileDetails> {
    let files = split_multi_file_patch(text);
    if !files.is_empty() || text.trim().is_empty() {
        return files;
    }

    let (old_name, new_name) = match parse_patches(text) {
        Ok(patches) => patches
            .into_iter()
            .next()
            .map(|patch| (patch.old_file_name, patch.new_file_name))
            .unwrap_or_default(),
        Err(err) => {
            log::debug!("Could not read file names from {fallback_name}: {err}");
            (None, None)
        }
    };

    let status = match (&old_name, &new_name) {
        (None, Some(_)) => FileStatus::Added,
        (Some(_), None) => FileStatus::Removed,
        (Some(old), Some(new)) if old != new => FileStatus::RenamedModified,
        _ => FileStatus::Modified,
    };
    let from_file = old_name
        .clone()
        .or_else(|| new_name.clone())
        .unwrap_or_else(|| fallback_name.to_string());
    let to_file = new_name.or(old_name).unwrap_or_else(|| fallback_name.to_string());

    vec![FileDetails {
        from_file,
        to_file,
        content: text.to_string(),
        status,
    }]
}

#[async_trait]
impl DiffProvider for LocalPatchProvider {
    fn id(&self) -> &str {
        "local"
    }

    fn name(&self) -> &str {
        "Patch file"
    }

    fn matches_ref(&self, reference: &str) -> bool {
        !reference.trim().is_empty()
    }

    async fn fetch(&self, reference: &str) -> Result<FetchedDiff, SourceError> {
        let text = if reference == STDIN_REF {
            let mut text = String::new();
            tokio::io::stdin().read_to_string(&mut text).await?;
            text
        } else {
            tokio::fs::read_to_string(reference).await?
        };

        let title = if reference == STDIN_REF {
            "stdin".to_string()
        } else {
            reference.to_string()
        };
        let files = files_from_text(&text, &title);
        log::info!("Read {} files from {title}", files.len());

        Ok(FetchedDiff {
            title,
            files,
            blobs: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_unified_diff_is_one_file() {
        let text = "--- a/notes.txt\n+++ b/notes.txt\n@@ -1 +1 @@\n-old\n+new\n";
        let files = files_from_text(text, "x.patch");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].to_file, "notes.txt");
        assert_eq!(files[0].status, FileStatus::Modified);
        assert_eq!(files[0].content, text);
    }

    #[test]
    fn test_git_diff_is_split() {
        let text = "diff --git a/a.rs b/a.rs\n--- a/a.rs\n+++ b/a.rs\n@@ -1 +1 @@\n-a\n+b\ndiff --git a/b.rs b/b.rs\n--- a/b.rs\n+++ b/b.rs\n@@ -1 +1 @@\n-c\n+d\n";
        let files = files_from_text(text, "x.patch");
        assert_eq!(files.len(), 2);
        assert_eq!(files[1].path(), "b.rs");
    }

    #[test]
    fn test_empty_text_has_no_files() {
        assert!(files_from_text("\n", "empty.patch").is_empty());
    }

    #[tokio::test]
    async fn test_fetch_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("change.diff");
        std::fs::write(&path, "--- /dev/null\n+++ b/new.txt\n@@ -0,0 +1 @@\n+hi\n").unwrap();

        let fetched = LocalPatchProvider::new()
            .fetch(path.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(fetched.files.len(), 1);
        assert_eq!(fetched.files[0].status, FileStatus::Added);
        assert!(fetched.blobs.is_none());
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let err = LocalPatchProvider::new()
            .fetch("/definitely/not/here.patch")
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
    }
}
