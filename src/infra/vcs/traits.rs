use crate::domain::{FileDetails, SourceError};
use crate::infra::image::BlobSource;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// A diff obtained from a provider, already split per file.
#[derive(Clone)]
pub struct FetchedDiff {
    pub title: String,
    pub files: Vec<FileDetails>,
    /// Source of raw file contents for image previews, when the provider
    /// can supply them.
    pub blobs: Option<Arc<dyn BlobSource>>,
}

impl fmt::Debug for FetchedDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchedDiff")
            .field("title", &self.title)
            .field("files", &self.files.len())
            .field("blobs", &self.blobs.is_some())
            .finish()
    }
}

#[async_trait]
pub trait DiffProvider: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn matches_ref(&self, reference: &str) -> bool;
    async fn fetch(&self, reference: &str) -> Result<FetchedDiff, SourceError>;
}
