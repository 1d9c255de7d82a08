//! Image files in a diff are shown side by side instead of as text.
//!
//! The bytes of each side are fetched lazily from a [`BlobSource`] the
//! first time they are needed and memoized until the handle is released.

use crate::domain::{FileDetails, FileStatus, SourceError};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use parking_lot::Mutex;
use std::io::Cursor;
use std::sync::Arc;
use tokio::sync::OnceCell;

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp", "ico", "avif", "svg"];

pub fn is_image_path(path: &str) -> bool {
    std::path::Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

fn mime_type(path: &str) -> &'static str {
    let ext = std::path::Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Revision {
    /// The version before the change.
    Base,
    /// The version after the change.
    Head,
}

/// Fetches raw file contents at one side of the diff.
#[async_trait]
pub trait BlobSource: Send + Sync {
    async fn fetch_blob(&self, path: &str, revision: Revision) -> Result<Vec<u8>, SourceError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

impl ImageBlob {
    /// `data:` URL usable directly as an image source.
    pub fn resource_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }

    /// Pixel dimensions, if the format can be decoded.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        image::ImageReader::new(Cursor::new(&self.bytes))
            .with_guessed_format()
            .ok()?
            .into_dimensions()
            .ok()
    }
}

/// One side of an image diff.
pub struct ImageHandle {
    path: String,
    revision: Revision,
    source: Arc<dyn BlobSource>,
    blob: Mutex<Arc<OnceCell<Arc<ImageBlob>>>>,
}

impl ImageHandle {
    pub fn new(path: impl Into<String>, revision: Revision, source: Arc<dyn BlobSource>) -> Self {
        Self {
            path: path.into(),
            revision,
            source,
            blob: Mutex::new(Arc::new(OnceCell::new())),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    pub fn is_resolved(&self) -> bool {
        self.blob.lock().initialized()
    }

    /// Fetches the bytes on first use. Concurrent callers share one fetch;
    /// failures are not memoized.
    pub async fn resolve(&self) -> Result<Arc<ImageBlob>, SourceError> {
        let cell = self.blob.lock().clone();
        let blob = cell
            .get_or_try_init(|| async {
                log::debug!("Fetching {:?} image {}", self.revision, self.path);
                let bytes = self.source.fetch_blob(&self.path, self.revision).await?;
                Ok::<_, SourceError>(Arc::new(ImageBlob {
                    bytes,
                    mime_type: mime_type(&self.path),
                }))
            })
            .await?;
        Ok(blob.clone())
    }

    /// Drops the memoized bytes.
    pub fn release(&self) {
        *self.blob.lock() = Arc::new(OnceCell::new());
    }
}

/// The old and new sides of a changed image. Added files have no old side,
/// removed files no new side.
pub struct ImageDiff {
    pub old: Option<ImageHandle>,
    pub new: Option<ImageHandle>,
}

impl ImageDiff {
    pub fn for_file(file: &FileDetails, source: Arc<dyn BlobSource>) -> Self {
        let old = (file.status != FileStatus::Added)
            .then(|| ImageHandle::new(file.from_file.clone(), Revision::Base, source.clone()));
        let new = (file.status != FileStatus::Removed)
            .then(|| ImageHandle::new(file.to_file.clone(), Revision::Head, source));
        Self { old, new }
    }

    pub fn release(&self) {
        for handle in self.old.iter().chain(self.new.iter()) {
            handle.release();
        }
    }
}
