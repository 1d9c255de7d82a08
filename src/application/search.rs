//! Case-insensitive substring search over the lines of every file.

use crate::domain::{ParsedPatch, is_no_newline_sentinel};
use regex::RegexBuilder;
use serde::Serialize;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineMatches {
    /// Index into the hunk's raw lines.
    pub line_index: usize,
    /// Byte ranges within the line text, diff marker excluded.
    pub ranges: Vec<Range<usize>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HunkMatches {
    pub hunk_index: usize,
    pub lines: Vec<LineMatches>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMatches {
    pub file_index: usize,
    pub match_count: usize,
    pub hunks: Vec<HunkMatches>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub total_matches: usize,
    /// Files with at least one match, in file order.
    pub files: Vec<FileMatches>,
    /// Running match totals aligned with `files`.
    cumulative: Vec<usize>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.total_matches == 0
    }

    /// Maps a 1-based global match number to the index of the file holding it.
    pub fn file_for_match(&self, match_number: usize) -> Option<usize> {
        if match_number == 0 || match_number > self.total_matches {
            return None;
        }
        let position = self.cumulative.partition_point(|&end| end < match_number);
        self.files.get(position).map(|file| file.file_index)
    }

    pub fn matches_in_file(&self, file_index: usize) -> Option<&FileMatches> {
        self.files.iter().find(|file| file.file_index == file_index)
    }
}

/// Searches every line of every patch for `query`, ignoring case.
/// Matches within a line do not overlap.
pub fn search_patches<'a, I>(query: &str, patches: I) -> SearchResults
where
    I: IntoIterator<Item = (usize, &'a ParsedPatch)>,
{
    let mut results = SearchResults {
        query: query.to_string(),
        ..SearchResults::default()
    };
    if query.is_empty() {
        return results;
    }

    let pattern = match RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
    {
        Ok(pattern) => pattern,
        Err(err) => {
            log::warn!("Cannot search for {query:?}: {err}");
            return results;
        }
    };

    for (file_index, patch) in patches {
        let mut match_count = 0;
        let mut hunks = Vec::new();

        for (hunk_index, hunk) in patch.hunks.iter().enumerate() {
            let mut lines = Vec::new();
            for (line_index, raw) in hunk.lines.iter().enumerate() {
                if is_no_newline_sentinel(raw) {
                    continue;
                }
                let mut chars = raw.chars();
                chars.next();
                let ranges: Vec<Range<usize>> = pattern
                    .find_iter(chars.as_str())
                    .map(|found| found.range())
                    .collect();
                if !ranges.is_empty() {
                    match_count += ranges.len();
                    lines.push(LineMatches { line_index, ranges });
                }
            }
            if !lines.is_empty() {
                hunks.push(HunkMatches { hunk_index, lines });
            }
        }

        if match_count > 0 {
            results.total_matches += match_count;
            results.cumulative.push(results.total_matches);
            results.files.push(FileMatches {
                file_index,
                match_count,
                hunks,
            });
        }
    }

    results
}
