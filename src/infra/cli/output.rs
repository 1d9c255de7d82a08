//! Plain-text rendering of viewer rows for the terminal.

use crate::application::file_tree::{FileTreeEntry, TreeNode};
use crate::application::search::SearchResults;
use crate::application::stats::DiffStats;
use crate::domain::{Emphasis, FileDetails, LineSegment, PatchLine, PatchLineType, SegmentIcon};
use std::fmt::Write;

const NUMBER_WIDTH: usize = 5;

fn number(value: Option<u32>) -> String {
    value.map(|n| n.to_string()).unwrap_or_default()
}

/// Word-diff emphasis is shown as `[-removed-]` and `{+added+}`.
fn format_segments(segments: &[LineSegment]) -> String {
    let mut out = String::new();
    let mut open: Option<Emphasis> = None;

    for segment in segments {
        if open != segment.emphasis {
            close(&mut out, open);
            match segment.emphasis {
                Some(Emphasis::Removed) => out.push_str("[-"),
                Some(Emphasis::Added) => out.push_str("{+"),
                None => {}
            }
            open = segment.emphasis;
        }
        match segment.icon {
            Some(SegmentIcon::NoNewline) => {
                out.push_str("⏎ ");
                out.push_str(segment.caption.as_deref().unwrap_or_default());
            }
            None => out.push_str(segment.text_str()),
        }
    }
    close(&mut out, open);
    out
}

fn close(out: &mut String, emphasis: Option<Emphasis>) {
    match emphasis {
        Some(Emphasis::Removed) => out.push_str("-]"),
        Some(Emphasis::Added) => out.push_str("+}"),
        None => {}
    }
}

pub fn format_row(line: &PatchLine) -> String {
    match line.kind {
        PatchLineType::Spacer => String::new(),
        PatchLineType::Header => format!(
            "{:>width$} {}",
            "",
            format_segments(&line.content),
            width = NUMBER_WIDTH * 2 + 1
        ),
        _ => {
            let text = if line.line_break {
                String::new()
            } else {
                format_segments(&line.content)
            };
            format!(
                "{:>width$} {:>width$} {}{}",
                number(line.old_line_no),
                number(line.new_line_no),
                line.kind.prefix().unwrap_or(' '),
                text,
                width = NUMBER_WIDTH
            )
            .trim_end()
            .to_string()
        }
    }
}

pub fn format_file_heading(index: usize, file: &FileDetails, checked: bool) -> String {
    let mark = if checked { "x" } else { " " };
    let path = if file.from_file != file.to_file {
        format!("{} → {}", file.from_file, file.to_file)
    } else {
        file.to_file.clone()
    };
    format!("[{mark}] {} {path} ({}) #{}", file.status.badge(), file.status, index + 1)
}

pub fn format_stats(stats: &DiffStats, files: &[&FileDetails]) -> String {
    let mut out = String::new();
    for (file, counts) in files.iter().zip(&stats.files) {
        let _ = writeln!(out, "{:>6} {:>6}  {}", format!("+{}", counts.added), format!("-{}", counts.removed), file.path());
    }
    let _ = writeln!(
        out,
        "{} files changed, {} insertions(+), {} deletions(-)",
        files.len(),
        stats.total_added,
        stats.total_removed
    );
    out
}

pub fn format_tree(nodes: &[TreeNode<FileTreeEntry>]) -> String {
    let mut out = String::new();
    write_tree(&mut out, nodes, 0);
    out
}

fn write_tree(out: &mut String, nodes: &[TreeNode<FileTreeEntry>], depth: usize) {
    for node in nodes {
        let indent = "  ".repeat(depth);
        match &node.data {
            FileTreeEntry::Directory { name, .. } => {
                let _ = writeln!(out, "{indent}{name}/");
            }
            FileTreeEntry::File { name, file_index, .. } => {
                let _ = writeln!(out, "{indent}{name}  #{}", file_index + 1);
            }
        }
        write_tree(out, &node.children, depth + 1);
    }
}

pub fn format_search_summary(results: &SearchResults, files: &[&FileDetails]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} matches for {:?}", results.total_matches, results.query);
    for file in &results.files {
        let path = files.get(file.file_index).map(|f| f.path()).unwrap_or("?");
        let _ = writeln!(out, "  {path}: {}", file.match_count);
    }
    out
}
