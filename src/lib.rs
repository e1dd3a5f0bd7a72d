pub mod batcher;
pub mod config;
pub mod error;
pub mod executor;
pub mod pipeline;
pub mod session;
pub mod splitter;
pub mod store;

pub type Result<T> = std::result::Result<T, error::LoadError>;
