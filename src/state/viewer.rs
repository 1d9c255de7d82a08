//! The diff viewer: one loaded file set plus everything derived from it.
//!
//! File patches are parsed lazily on first use. Rendered rows are cached per
//! (file content, render options). Stats and search results are published
//! through generation-tagged slots so a recomputation started before a
//! reload can never replace results computed after it.

use crate::application::file_tree::{FileTreeEntry, TreeNode, build_file_tree};
use crate::application::header_only::is_header_only_patch;
use crate::application::line_processor::{HunkContext, LineProcessorPool, RenderedHunk, render_patch};
use crate::application::search::{SearchResults, search_patches};
use crate::application::stats::{DiffStats, compute_stats};
use crate::domain::{DiffError, FileDetails, ParsedPatch, RenderOptions, SourceError};
use crate::infra::app_config::AppConfig;
use crate::infra::diff::parse_single_patch;
use crate::infra::hash::hash_value;
use crate::infra::image::{BlobSource, ImageDiff, is_image_path};
use crate::infra::syntax::{HighlightProvider, Language, SyntectHighlighter};
use crate::state::debounce::Debouncer;
use crate::state::latest::Latest;
use lru::LruCache;
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;

pub struct ViewerFile {
    pub details: FileDetails,
    pub is_image: bool,
    /// Content hash used as the file's cache identity.
    pub identity: u64,
    patch: OnceCell<Result<Arc<ParsedPatch>, DiffError>>,
}

impl ViewerFile {
    fn new(details: FileDetails) -> Self {
        let is_image = is_image_path(details.path());
        let identity = hash_value(&(&details.from_file, &details.to_file, &details.content));
        Self {
            details,
            is_image,
            identity,
            patch: OnceCell::new(),
        }
    }

    /// The file's patch, parsed on first call.
    pub fn patch(&self) -> Result<Arc<ParsedPatch>, DiffError> {
        self.patch
            .get_or_init(|| {
                parse_single_patch(&self.details.content)
                    .map(Arc::new)
                    .inspect_err(|err| log::warn!("Cannot parse {}: {err}", self.details.path()))
            })
            .clone()
    }

    /// The patch of a text file, or `None` for images and unparseable text.
    pub fn text_patch(&self) -> Option<Arc<ParsedPatch>> {
        if self.is_image {
            return None;
        }
        self.patch().ok()
    }
}

/// An immutable snapshot of loaded files.
pub struct FileSet {
    pub generation: u64,
    files: Vec<ViewerFile>,
}

impl FileSet {
    fn new(generation: u64, files: Vec<FileDetails>) -> Self {
        Self {
            generation,
            files: files.into_iter().map(ViewerFile::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ViewerFile> {
        self.files.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ViewerFile> {
        self.files.iter()
    }

    fn stats(&self) -> DiffStats {
        let patches: Vec<Option<Arc<ParsedPatch>>> = self.files.iter().map(ViewerFile::text_patch).collect();
        compute_stats(patches.iter().map(|patch| patch.as_deref()))
    }

    fn search(&self, query: &str) -> SearchResults {
        let patches: Vec<(usize, Arc<ParsedPatch>)> = self
            .files
            .iter()
            .enumerate()
            .filter_map(|(index, file)| file.text_patch().map(|patch| (index, patch)))
            .collect();
        search_patches(query, patches.iter().map(|(index, patch)| (*index, patch.as_ref())))
    }
}

#[derive(Debug, Clone, Default)]
struct UiState {
    collapsed: Vec<bool>,
    checked: Vec<bool>,
    /// Set once the user toggled the checkbox; auto-checking never
    /// overrides a manual choice.
    checked_by_user: Vec<bool>,
    selected: Option<usize>,
}

impl UiState {
    fn new(count: usize) -> Self {
        Self {
            collapsed: vec![false; count],
            checked: vec![false; count],
            checked_by_user: vec![false; count],
            selected: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewerSettings {
    pub cache_capacity: usize,
    pub search_debounce: Duration,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            cache_capacity: 256,
            search_debounce: Duration::from_millis(500),
        }
    }
}

impl From<&AppConfig> for ViewerSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            cache_capacity: config.render_cache_capacity,
            search_debounce: config.search_debounce(),
        }
    }
}

type CacheKey = (u64, u64);

pub struct DiffViewer<H: HighlightProvider = SyntectHighlighter> {
    highlighter: Arc<H>,
    options: RwLock<RenderOptions>,
    files: RwLock<Arc<FileSet>>,
    title: RwLock<String>,
    ui: Mutex<UiState>,
    cache: Mutex<LruCache<CacheKey, Arc<[RenderedHunk]>>>,
    pool: LineProcessorPool<H::State>,
    blobs: RwLock<Option<Arc<dyn BlobSource>>>,
    images: Mutex<HashMap<usize, Arc<ImageDiff>>>,
    next_generation: AtomicU64,
    stats: Latest<DiffStats>,
    search: Arc<Latest<SearchResults>>,
    search_generation: AtomicU64,
    search_query: Mutex<String>,
    search_debouncer: Debouncer,
}

impl DiffViewer<SyntectHighlighter> {
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Arc::new(SyntectHighlighter::new()),
            config.render_options(),
            ViewerSettings::from(config),
        )
    }
}

impl<H: HighlightProvider> DiffViewer<H> {
    pub fn new(highlighter: Arc<H>, options: RenderOptions, settings: ViewerSettings) -> Self {
        let capacity = NonZeroUsize::new(settings.cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            highlighter,
            options: RwLock::new(options),
            files: RwLock::new(Arc::new(FileSet::new(0, Vec::new()))),
            title: RwLock::new(String::new()),
            ui: Mutex::new(UiState::default()),
            cache: Mutex::new(LruCache::new(capacity)),
            pool: LineProcessorPool::new(),
            blobs: RwLock::new(None),
            images: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(0),
            stats: Latest::new(),
            search: Arc::new(Latest::new()),
            search_generation: AtomicU64::new(0),
            search_query: Mutex::new(String::new()),
            search_debouncer: Debouncer::new(settings.search_debounce),
        }
    }

    /// Replaces the loaded files. Image handles of the previous set are
    /// released and every derived view is invalidated.
    pub fn load(&self, title: impl Into<String>, files: Vec<FileDetails>, blobs: Option<Arc<dyn BlobSource>>) {
        self.release_images();
        self.search_debouncer.cancel();

        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let file_set = Arc::new(FileSet::new(generation, files));
        let count = file_set.len();

        *self.files.write() = file_set;
        *self.title.write() = title.into();
        *self.blobs.write() = blobs;
        *self.ui.lock() = UiState::new(count);
        self.cache.lock().clear();
        self.search_query.lock().clear();
        let search_generation = self.search_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.search.invalidate(search_generation);

        self.refresh_auto_checks();
        log::info!("Loaded {count} files (generation {generation})");
    }

    pub fn files(&self) -> Arc<FileSet> {
        self.files.read().clone()
    }

    pub fn file_count(&self) -> usize {
        self.files.read().len()
    }

    pub fn title(&self) -> String {
        self.title.read().clone()
    }

    pub fn options(&self) -> RenderOptions {
        self.options.read().clone()
    }

    /// Changing options that affect rows drops every cached rendering.
    pub fn set_options(&self, options: RenderOptions) {
        let mut current = self.options.write();
        if *current == options {
            return;
        }
        log::debug!("Render options changed, clearing {} cached files", self.cache.lock().len());
        *current = options;
        self.cache.lock().clear();
    }

    /// Rows of one file, from cache when the file and options are unchanged.
    /// Image files have no rows.
    pub async fn render_file(&self, index: usize) -> Result<Arc<[RenderedHunk]>, DiffError> {
        let files = self.files();
        let file = files.get(index).ok_or(DiffError::FileNotFound(index))?;
        if file.is_image {
            return Ok(Arc::from(Vec::new()));
        }

        let options = self.options();
        let key = (file.identity, hash_value(&options));
        let cached = self.cache.lock().get(&key).cloned();
        if let Some(rows) = cached {
            return Ok(rows);
        }

        let patch = file.patch()?;
        let language = Language::from_path(file.details.path());
        let ctx = HunkContext {
            highlighter: self.highlighter.as_ref(),
            language: &language,
            options: &options,
            nested_patch: file.details.is_nested_patch(),
        };
        let rows: Arc<[RenderedHunk]> = render_patch(&patch, &ctx, &self.pool).await?.into();

        let still_current = self.files.read().generation == files.generation && *self.options.read() == options;
        if still_current {
            self.cache.lock().put(key, rows.clone());
        }
        Ok(rows)
    }

    /// Renders every file concurrently, in file order.
    pub async fn render_all(&self) -> Vec<Result<Arc<[RenderedHunk]>, DiffError>> {
        let count = self.file_count();
        futures::future::join_all((0..count).map(|index| self.render_file(index))).await
    }

    pub fn is_collapsed(&self, index: usize) -> bool {
        self.ui.lock().collapsed.get(index).copied().unwrap_or(false)
    }

    pub fn toggle_collapsed(&self, index: usize) {
        if let Some(collapsed) = self.ui.lock().collapsed.get_mut(index) {
            *collapsed = !*collapsed;
        }
    }

    pub fn set_all_collapsed(&self, collapsed: bool) {
        self.ui.lock().collapsed.fill(collapsed);
    }

    pub fn is_checked(&self, index: usize) -> bool {
        self.ui.lock().checked.get(index).copied().unwrap_or(false)
    }

    /// Records a manual review mark. Manual marks win over auto-checking.
    pub fn set_checked(&self, index: usize, checked: bool) {
        let mut ui = self.ui.lock();
        if index < ui.checked.len() {
            ui.checked[index] = checked;
            ui.checked_by_user[index] = true;
        }
    }

    pub fn checked_count(&self) -> usize {
        self.ui.lock().checked.iter().filter(|checked| **checked).count()
    }

    /// Marks files whose changes touch only diff headers as checked, unless
    /// the user already decided for that file.
    pub fn refresh_auto_checks(&self) {
        let files = self.files();
        let header_only: Vec<bool> = files
            .iter()
            .map(|file| file.text_patch().is_some_and(|patch| is_header_only_patch(&patch)))
            .collect();

        let mut ui = self.ui.lock();
        for (index, header_only) in header_only.into_iter().enumerate() {
            if header_only && index < ui.checked.len() && !ui.checked_by_user[index] {
                ui.checked[index] = true;
            }
        }
    }

    pub fn select_file(&self, index: usize) -> bool {
        if index >= self.file_count() {
            return false;
        }
        self.ui.lock().selected = Some(index);
        true
    }

    pub fn selected_file(&self) -> Option<usize> {
        self.ui.lock().selected
    }

    pub fn file_tree(&self) -> Vec<TreeNode<FileTreeEntry>> {
        let files = self.files();
        build_file_tree(files.iter().enumerate().map(|(index, file)| (index, file.details.path())))
    }

    /// Stats for the current file set, computed on first request.
    pub fn stats(&self) -> Arc<DiffStats> {
        let files = self.files();
        if self.stats.generation() == files.generation
            && let Some(stats) = self.stats.get()
        {
            return stats;
        }

        let stats = files.stats();
        self.stats.offer(files.generation, stats.clone());
        self.stats.get().unwrap_or_else(|| Arc::new(stats))
    }

    /// Debounced search: only the last query of a burst is computed, and
    /// results of superseded queries are discarded.
    pub fn set_search_query(&self, query: &str) -> JoinHandle<()> {
        let generation = self.search_generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.search_query.lock() = query.to_string();

        let files = self.files();
        let latest = self.search.clone();
        let query = query.to_string();
        self.search_debouncer.schedule(move || async move {
            let results = files.search(&query);
            if latest.offer(generation, results) {
                log::debug!("Search for {query:?} finished");
            } else {
                log::debug!("Discarding stale results for {query:?}");
            }
        })
    }

    /// Runs a search immediately, bypassing the debounce delay.
    pub fn search_now(&self, query: &str) -> Option<Arc<SearchResults>> {
        let generation = self.search_generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.search_query.lock() = query.to_string();
        self.search.offer(generation, self.files().search(query));
        self.search.get()
    }

    pub fn search_query(&self) -> String {
        self.search_query.lock().clone()
    }

    pub fn search_results(&self) -> Option<Arc<SearchResults>> {
        self.search.get()
    }

    /// Selects and expands the file holding the 1-based `match_number`.
    pub fn jump_to_match(&self, match_number: usize) -> Option<usize> {
        let results = self.search.get()?;
        let file_index = results.file_for_match(match_number)?;
        let mut ui = self.ui.lock();
        ui.selected = Some(file_index);
        if let Some(collapsed) = ui.collapsed.get_mut(file_index) {
            *collapsed = false;
        }
        Some(file_index)
    }

    /// Image handles for an image file, created on first request.
    pub fn image_diff(&self, index: usize) -> Result<Option<Arc<ImageDiff>>, SourceError> {
        let files = self.files();
        let Some(file) = files.get(index).filter(|file| file.is_image) else {
            return Ok(None);
        };

        let mut images = self.images.lock();
        if let Some(diff) = images.get(&index) {
            return Ok(Some(diff.clone()));
        }
        let blobs = self
            .blobs
            .read()
            .clone()
            .ok_or_else(|| SourceError::NoBlobSource(file.details.path().to_string()))?;
        let diff = Arc::new(ImageDiff::for_file(&file.details, blobs));
        images.insert(index, diff.clone());
        Ok(Some(diff))
    }

    fn release_images(&self) {
        let released: Vec<Arc<ImageDiff>> = self.images.lock().drain().map(|(_, diff)| diff).collect();
        if !released.is_empty() {
            log::debug!("Releasing {} image previews", released.len());
        }
        for diff in released {
            diff.release();
        }
    }
}

impl<H: HighlightProvider> Drop for DiffViewer<H> {
    fn drop(&mut self) {
        self.release_images();
    }
}
