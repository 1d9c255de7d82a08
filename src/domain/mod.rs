//! Domain types for patchview.
//! Defines the patch model, the display rows produced from it and the error types.

pub mod error;
pub mod file;
pub mod line;
pub mod options;
pub mod patch;

pub use error::*;
pub use file::*;
pub use line::*;
pub use options::*;
pub use patch::*;
