use super::handle::SessionHandle;
use crate::error::Result;
use async_trait::async_trait;

/// An abstract keyed table of live sessions.
///
/// The orchestrator receives a store instead of reaching for a global map, so
/// tests and separate engagement services each get isolated instances.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Finds a session by its ID.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(handle))`: Session found
    /// - `Ok(None)`: Session not found
    async fn find_by_id(&self, session_id: &str) -> Result<Option<SessionHandle>>;

    /// Inserts `handle` unless a session with the same ID already exists.
    ///
    /// # Returns
    ///
    /// The stored handle: the existing one when the ID was taken, otherwise `handle`.
    async fn insert_if_absent(&self, handle: SessionHandle) -> Result<SessionHandle>;

    /// Removes a session, returning its handle if it was present.
    async fn remove(&self, session_id: &str) -> Result<Option<SessionHandle>>;

    /// Returns handles to every stored session.
    async fn list_all(&self) -> Result<Vec<SessionHandle>>;
}
