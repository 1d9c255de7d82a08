//! Terminal front-end helpers.

pub mod output;
