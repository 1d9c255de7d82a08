//! End-to-end checks of the text pipeline: raw diff text in, display rows out.

use patchview::application::header_only::{is_header_only_hunk, is_header_only_patch};
use patchview::application::{HunkContext, LineProcessor, LineProcessorPool, render_patch};
use patchview::domain::{
    Emphasis, FileStatus, Hunk, NO_NEWLINE_CAPTION, PatchLine, PatchLineType, RenderOptions,
    SegmentIcon,
};
use patchview::infra::diff::{classify_file_status, parse_single_patch, split_multi_file_patch, tokenize};
use patchview::infra::syntax::{Language, SyntectHighlighter};

const MULTI_FILE_DIFF: &str = "diff --git a/src/math.rs b/src/math.rs
index 83db48f..bf269f4 100644
--- a/src/math.rs
+++ b/src/math.rs
@@ -1,5 +1,6 @@
 pub fn add(a: i32, b: i32) -> i32 {
-    a + b
+    let sum = a + b;
+    sum
 }

 pub fn sub(a: i32, b: i32) -> i32 {
@@ -10,3 +11,3 @@ pub fn mul(a: i32, b: i32) -> i32 {
 fn helper() {
-    foo(1)
+    foo(2)
 }
diff --git a/docs/old.md b/docs/old.md
deleted file mode 100644
index 5716ca5..0000000
--- a/docs/old.md
+++ /dev/null
@@ -1,2 +0,0 @@
-# Old
-gone
diff --git a/assets/a.txt b/assets/b.txt
similarity index 100%
rename from assets/a.txt
rename to assets/b.txt
";

fn plain_options() -> RenderOptions {
    RenderOptions {
        syntax_highlighting: false,
        ..RenderOptions::default()
    }
}

async fn process(hunk: &Hunk, options: &RenderOptions) -> Vec<PatchLine> {
    let highlighter = SyntectHighlighter::new();
    let language = Language::plain_text();
    let ctx = HunkContext {
        highlighter: &highlighter,
        language: &language,
        options,
        nested_patch: false,
    };
    LineProcessor::new()
        .process(hunk, &ctx)
        .await
        .expect("hunk renders")
}

fn hunk(lines: &[&str]) -> Hunk {
    Hunk {
        old_start: 1,
        old_lines: 0,
        new_start: 1,
        new_lines: 0,
        section: String::new(),
        header_text: String::new(),
        lines: lines.iter().map(|line| line.to_string()).collect(),
    }
}

fn rows_of(rows: &[PatchLine], kind: PatchLineType) -> Vec<&PatchLine> {
    rows.iter().filter(|row| row.kind == kind).collect()
}

#[test]
fn test_multi_file_split_classifies_each_file() {
    let files = split_multi_file_patch(MULTI_FILE_DIFF);
    let summary: Vec<_> = files
        .iter()
        .map(|file| (file.to_file.as_str(), file.status))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("src/math.rs", FileStatus::Modified),
            ("docs/old.md", FileStatus::Removed),
            ("assets/b.txt", FileStatus::Renamed),
        ]
    );
    assert_eq!(files[2].from_file, "assets/a.txt");
}

#[test]
fn test_status_classification_from_header_lines() {
    let added = ["diff --git a/x b/x", "new file mode 100644"];
    let removed = ["diff --git a/x b/x", "deleted file mode 100644"];
    let renamed = ["diff --git a/x b/y", "similarity index 100%"];
    assert_eq!(classify_file_status("x", "x", &added), FileStatus::Added);
    assert_eq!(classify_file_status("x", "x", &removed), FileStatus::Removed);
    assert_eq!(classify_file_status("x", "y", &renamed), FileStatus::Renamed);
}

#[test]
fn test_tokenizer_splits_on_delimiters() {
    assert_eq!(tokenize("a.b(c)"), vec!["a", ".", "b", "(", "c", ")"]);
    assert!(tokenize("").is_empty());
}

#[tokio::test]
async fn test_line_numbers_increase_from_hunk_start() {
    let files = split_multi_file_patch(MULTI_FILE_DIFF);
    let patch = parse_single_patch(&files[0].content).unwrap();
    assert_eq!(patch.hunks.len(), 2);

    for hunk in &patch.hunks {
        let rows = process(hunk, &plain_options()).await;
        let old: Vec<u32> = rows.iter().filter_map(|row| row.old_line_no).collect();
        let new: Vec<u32> = rows.iter().filter_map(|row| row.new_line_no).collect();

        assert_eq!(old.first(), Some(&hunk.old_start));
        assert_eq!(new.first(), Some(&hunk.new_start));
        assert!(old.windows(2).all(|pair| pair[1] == pair[0] + 1));
        assert!(new.windows(2).all(|pair| pair[1] == pair[0] + 1));
    }
}

#[tokio::test]
async fn test_context_rows_carry_both_numbers() {
    let patch = parse_single_patch(&split_multi_file_patch(MULTI_FILE_DIFF)[0].content).unwrap();
    let rows = process(&patch.hunks[0], &plain_options()).await;

    assert_eq!(rows[0].kind, PatchLineType::Header);
    assert_eq!((rows[0].old_line_no, rows[0].new_line_no), (None, None));
    for row in rows_of(&rows, PatchLineType::Context) {
        assert!(row.old_line_no.is_some() && row.new_line_no.is_some());
    }
}

#[tokio::test]
async fn test_processing_is_repeatable() {
    let patch = parse_single_patch(&split_multi_file_patch(MULTI_FILE_DIFF)[0].content).unwrap();
    let options = RenderOptions::default();
    let language = Language::from_path("src/math.rs");
    let highlighter = SyntectHighlighter::new();
    let ctx = HunkContext {
        highlighter: &highlighter,
        language: &language,
        options: &options,
        nested_patch: false,
    };
    let pool = LineProcessorPool::new();

    let first = render_patch(&patch, &ctx, &pool).await.unwrap();
    let second = render_patch(&patch, &ctx, &pool).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].lines.last(), Some(&PatchLine::spacer()));
}

#[tokio::test]
async fn test_equal_blocks_are_word_diffed() {
    let rows = process(&hunk(&["-foo", "-bar", "+foo", "+baz"]), &plain_options()).await;
    let removed = rows_of(&rows, PatchLineType::Remove);
    let added = rows_of(&rows, PatchLineType::Add);
    assert_eq!((removed.len(), added.len()), (2, 2));

    assert!(!removed[0].has_emphasis());
    assert!(!added[0].has_emphasis());

    let emphasized = |row: &PatchLine, emphasis| -> Vec<String> {
        row.content
            .iter()
            .filter(|segment| segment.emphasis == Some(emphasis))
            .map(|segment| segment.text_str().to_string())
            .collect()
    };
    assert_eq!(emphasized(removed[1], Emphasis::Removed), vec!["bar"]);
    assert_eq!(emphasized(added[1], Emphasis::Added), vec!["baz"]);
}

#[tokio::test]
async fn test_unequal_blocks_skip_word_diff() {
    let rows = process(&hunk(&["-one", "-two", "+three"]), &plain_options()).await;
    let kinds: Vec<_> = rows.iter().skip(1).map(|row| row.kind).collect();
    assert_eq!(
        kinds,
        vec![PatchLineType::Remove, PatchLineType::Remove, PatchLineType::Add]
    );
    assert!(rows.iter().all(|row| !row.has_emphasis()));
}

#[tokio::test]
async fn test_missing_trailing_newline_becomes_icon() {
    let rows = process(
        &hunk(&[" keep", "-foo", "\\ No newline at end of file"]),
        &plain_options(),
    )
    .await;
    let removed = rows_of(&rows, PatchLineType::Remove);
    assert_eq!(removed.len(), 1);

    let content = &removed[0].content;
    let icon = content.last().unwrap();
    assert_eq!(icon.icon, Some(SegmentIcon::NoNewline));
    assert_eq!(icon.caption.as_deref(), Some(NO_NEWLINE_CAPTION));
    let text: String = content[..content.len() - 1]
        .iter()
        .map(|segment| segment.text_str())
        .collect();
    assert_eq!(text, "foo");
}

#[test]
fn test_header_only_detection() {
    let index_only = hunk(&[
        " diff --git a/x b/x",
        "-index abc123..def456 100644",
        "+index 111111..222222 100644",
    ]);
    assert!(is_header_only_hunk(&index_only));

    let real_change = hunk(&["-index abc123..def456 100644", "+let x = 1;"]);
    assert!(!is_header_only_hunk(&real_change));

    let files = split_multi_file_patch(MULTI_FILE_DIFF);
    let patch = parse_single_patch(&files[0].content).unwrap();
    assert!(!is_header_only_patch(&patch));
}

#[tokio::test]
async fn test_header_row_keeps_original_hunk_line() {
    let patch = parse_single_patch("--- a/x.rs\n+++ b/x.rs\n@@ -5 +5 @@ fn main()\n-a\n+b\n").unwrap();
    let rows = process(&patch.hunks[0], &plain_options()).await;
    assert_eq!(rows[0].kind, PatchLineType::Header);
    assert_eq!(rows[0].text(), "@@ -5 +5 @@ fn main()");
    assert_eq!(rows[1].old_line_no, Some(5));
}

#[test]
fn test_hunk_range_past_u32_is_rejected() {
    let text = "--- a/x.rs\n+++ b/x.rs\n@@ -4294967295,2 +1,2 @@\n a\n b\n";
    assert!(parse_single_patch(text).is_err());
}
