//! Loads a patch file from disk into a viewer configured from a config file.

use patchview::domain::PatchLineType;
use patchview::infra::app_config::load_config_from;
use patchview::infra::vcs::local::LocalPatchProvider;
use patchview::infra::vcs::traits::DiffProvider;
use patchview::state::DiffViewer;

const PATCH: &str = "diff --git a/src/config.rs b/src/config.rs
index 1111111..2222222 100644
--- a/src/config.rs
+++ b/src/config.rs
@@ -1,3 +1,3 @@
 pub struct Config {
-    pub retries: u8,
+    pub retries: u16,
 }
diff --git a/README.md b/README.md
index 3333333..4444444 100644
--- a/README.md
+++ b/README.md
@@ -1,2 +1,3 @@
 # Config
+Retries default to 3.
 See src/config.rs
";

#[tokio::test]
async fn test_patch_file_round_trip_through_viewer() {
    let dir = tempfile::tempdir().unwrap();
    let patch_path = dir.path().join("change.patch");
    std::fs::write(&patch_path, PATCH).unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(&config_path, "syntax_highlighting = false\nrender_cache_capacity = 4\n").unwrap();

    let config = load_config_from(&config_path);
    assert!(!config.syntax_highlighting);
    assert!(config.word_diff);

    let fetched = LocalPatchProvider::new()
        .fetch(patch_path.to_str().unwrap())
        .await
        .unwrap();
    let viewer = DiffViewer::from_config(&config);
    viewer.load(fetched.title, fetched.files, fetched.blobs);
    assert_eq!(viewer.file_count(), 2);

    let rows = viewer.render_file(0).await.unwrap();
    let removed = rows[0]
        .lines
        .iter()
        .find(|line| line.kind == PatchLineType::Remove)
        .unwrap();
    assert_eq!(removed.text(), "    pub retries: u8,");
    assert!(removed.has_emphasis());
    assert!(removed.content.iter().all(|segment| segment.foreground.is_none()));

    let stats = viewer.stats();
    assert_eq!((stats.total_added, stats.total_removed), (2, 1));

    let results = viewer.search_now("CONFIG").unwrap();
    assert_eq!(results.total_matches, 3);
    assert_eq!(viewer.jump_to_match(3), Some(1));
    assert_eq!(viewer.selected_file(), Some(1));
}
