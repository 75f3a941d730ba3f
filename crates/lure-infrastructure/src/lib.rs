//! Infrastructure layer for LURE.
//!
//! Concrete implementations of the core's storage seam and configuration
//! loading from the platform config directory.

pub mod config_loader;
pub mod paths;
pub mod session_store;

pub use config_loader::ConfigLoader;
pub use paths::{LurePaths, PathError};
pub use session_store::InMemorySessionStore;
