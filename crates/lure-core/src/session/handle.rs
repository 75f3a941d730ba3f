use super::model::ConversationSession;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, TryLockError};
use tokio_util::sync::CancellationToken;

/// Shared handle to one session.
///
/// The session mutex is the per-session owner: extraction, state evaluation
/// and finalization checks run while holding it. The submission gate is held
/// across a whole report submission so that two submissions never overlap,
/// while the session mutex itself is released during network attempts.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: Arc<str>,
    session: Arc<Mutex<ConversationSession>>,
    submission: Arc<Mutex<()>>,
    cancel: CancellationToken,
}

impl SessionHandle {
    /// Wraps a session. `cancel` is normally a child of the process-wide token.
    pub fn new(session: ConversationSession, cancel: CancellationToken) -> Self {
        Self {
            id: Arc::from(session.id()),
            session: Arc::new(Mutex::new(session)),
            submission: Arc::new(Mutex::new(())),
            cancel,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn lock(&self) -> MutexGuard<'_, ConversationSession> {
        self.session.lock().await
    }

    /// Locks only if no operation currently owns the session.
    pub fn try_lock(&self) -> Result<MutexGuard<'_, ConversationSession>, TryLockError> {
        self.session.try_lock()
    }

    pub async fn lock_submission(&self) -> MutexGuard<'_, ()> {
        self.submission.lock().await
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Whether a kill signal reached this session, directly or through the process token.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn ptr_eq(&self, other: &SessionHandle) -> bool {
        Arc::ptr_eq(&self.session, &other.session)
    }
}
