//! Unified diff text handling: parsing, multi-file splitting and tokenizing.

pub mod parser;
pub mod split;
pub mod tokenizer;

pub use parser::{parse_patches, parse_single_patch};
pub use split::{classify_file_status, split_multi_file_patch};
pub use tokenizer::tokenize;
