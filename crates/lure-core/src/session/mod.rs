//! Session model, per-session handle and the store abstraction.
//!
//! # Module Structure
//!
//! - `model`: `ConversationSession`, `Turn` and operator-facing summaries
//! - `handle`: Shared handle serializing access to one session
//! - `store`: `SessionStore` trait implemented by the infrastructure layer

mod handle;
mod model;
mod store;

pub use handle::SessionHandle;
pub use model::{ConversationSession, FollowUp, SessionStatus, SessionSummary, Turn};
pub use store::SessionStore;
