//! Viewer state shared between front-ends.

pub mod debounce;
pub mod latest;
pub mod viewer;


pub use viewer::{DiffViewer, FileSet, ViewerFile, ViewerSettings};
