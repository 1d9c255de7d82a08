//! Infrastructure layer (adapters/implementations).
//!
//! Diff text parsing, syntax highlighting, configuration, image blobs and
//! the network/file sources diffs are loaded from.

pub mod app_config;
pub mod cli;
pub mod diff;
pub mod hash;
pub mod image;
pub mod syntax;
pub mod vcs;
