pub mod github;
pub mod local;
pub mod registry;
pub mod traits;
