//! Application layer (use-cases, policies).
//!
//! Turns parsed patches into display rows and derives the views built on
//! top of them (stats, search, file tree) without depending on any
//! front-end or network source.

pub mod file_tree;
pub mod header_only;
pub mod line_processor;
pub mod search;
pub mod stats;

pub use line_processor::{HunkContext, LineProcessor, LineProcessorPool, RenderedHunk, render_patch};
