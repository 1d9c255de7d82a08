use crate::domain::ParsedPatch;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FileStats {
    pub added: usize,
    pub removed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    pub total_added: usize,
    pub total_removed: usize,
    /// One entry per file, in file order.
    pub files: Vec<FileStats>,
}

/// Counts added and removed lines over every hunk of a patch.
pub fn count_patch(patch: &ParsedPatch) -> FileStats {
    let mut stats = FileStats::default();
    for line in patch.hunks.iter().flat_map(|hunk| hunk.lines.iter()) {
        match line.as_bytes().first() {
            Some(b'+') => stats.added += 1,
            Some(b'-') => stats.removed += 1,
            _ => {}
        }
    }
    stats
}

/// Aggregates per-file counts. Files without a parsed patch (images,
/// unparseable text) count as zero.
pub fn compute_stats<'a, I>(patches: I) -> DiffStats
where
    I: IntoIterator<Item = Option<&'a ParsedPatch>>,
{
    let files: Vec<FileStats> = patches
        .into_iter()
        .map(|patch| patch.map(count_patch).unwrap_or_default())
        .collect();

    DiffStats {
        total_added: files.iter().map(|file| file.added).sum(),
        total_removed: files.iter().map(|file| file.removed).sum(),
        files,
    }
}
