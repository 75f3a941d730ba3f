//! Domain layer of the engagement orchestration core.
//!
//! Everything in this crate is synchronous and free of I/O except the trait seams
//! (`SessionStore`, `CallbackTransport`, `ReplyGenerator`) that the outer crates
//! implement.

pub mod callback;
pub mod config;
pub mod conversation;
pub mod error;
pub mod intelligence;
pub mod persona;
pub mod random;
pub mod reply;
pub mod report;
pub mod session;
pub mod temporal;

// Re-export common error type
pub use error::LureError;
