//! Session store: session-keyed conversation state with an explicit
//! lifecycle, replacing ambient per-user globals.
//!
//! The map itself sits behind a std `Mutex` (short critical sections only);
//! each session's state sits behind its own `tokio::sync::Mutex`, which a
//! turn holds from prompt construction through reply so that a second
//! message for the same session queues instead of racing. Turns in
//! different sessions interleave freely.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Local;
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use crate::error::ChatError;
use crate::types::ConversationState;

/// Shared handle to one session's state.
pub type SessionHandle = Arc<AsyncMutex<ConversationState>>;

/// Session-keyed store of conversation state, owned by the orchestrator.
pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, SessionHandle>>,
    /// Idle sessions older than this are discarded on next contact.
    timeout_minutes: u32,
}

impl SessionStore {
    /// Create an empty store with the given idle timeout.
    pub fn new(timeout_minutes: u32) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            timeout_minutes,
        }
    }

    /// Look up an existing session or create a fresh gathering-phase one.
    ///
    /// With `requested = None` a new session is always created from
    /// `initial_query`. With `Some(id)` the session must exist and be live;
    /// an unknown or expired id fails with [`ChatError::SessionNotFound`];
    /// the caller decides whether to start over, never this store.
    pub fn get_or_create(
        &self,
        requested: Option<Uuid>,
        initial_query: &str,
    ) -> Result<(Uuid, SessionHandle), ChatError> {
        let mut sessions = self.lock_map()?;

        if let Some(id) = requested {
            match sessions.get(&id) {
                Some(handle) if !self.is_expired(handle) => {
                    return Ok((id, Arc::clone(handle)));
                }
                Some(_) => {
                    // Expired: discard and report not-found.
                    sessions.remove(&id);
                    return Err(ChatError::SessionNotFound(id));
                }
                None => return Err(ChatError::SessionNotFound(id)),
            }
        }

        let id = Uuid::new_v4();
        let handle = Arc::new(AsyncMutex::new(ConversationState::new(initial_query)));
        sessions.insert(id, Arc::clone(&handle));
        tracing::debug!(session_id = %id, "session created");
        Ok((id, handle))
    }

    /// Fetch a live session handle without creating one.
    pub fn get(&self, id: Uuid) -> Result<SessionHandle, ChatError> {
        let sessions = self.lock_map()?;
        sessions
            .get(&id)
            .filter(|handle| !self.is_expired(handle))
            .map(Arc::clone)
            .ok_or(ChatError::SessionNotFound(id))
    }

    /// Remove a session (successful execution or explicit cancellation).
    ///
    /// Returns true when a session was actually removed.
    pub fn reset(&self, id: Uuid) -> Result<bool, ChatError> {
        let mut sessions = self.lock_map()?;
        let removed = sessions.remove(&id).is_some();
        if removed {
            tracing::debug!(session_id = %id, "session reset");
        }
        Ok(removed)
    }

    /// Number of tracked sessions (expired ones included until touched).
    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// True when no sessions are tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // -- Private helpers --

    fn lock_map(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, SessionHandle>>, ChatError> {
        self.sessions
            .lock()
            .map_err(|e| ChatError::Storage(format!("session lock poisoned: {}", e)))
    }

    /// A session with a turn in flight (lock held) is live by definition;
    /// otherwise compare its last activity against the idle timeout.
    fn is_expired(&self, handle: &SessionHandle) -> bool {
        match handle.try_lock() {
            Ok(state) => {
                let now = Local::now().timestamp();
                let timeout_secs = i64::from(self.timeout_minutes) * 60;
                now - state.last_message_at > timeout_secs
            }
            Err(_) => false,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
