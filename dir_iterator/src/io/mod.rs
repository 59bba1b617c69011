//! I/O adapters for the iteration engine: scanning, progress storage, loading, config.

pub mod config;
pub mod image_loader;
pub mod loader;
pub mod scan;
pub mod state_store;
