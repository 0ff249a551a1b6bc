//! Protocol session state.
//!
//! Sessions live for the lifetime of the process and hold a single
//! `initialized` flag. Restarting the server loses them; clients recover
//! by re-sending `initialize`, which is safe to call any number of times.
//! The trait exists so a multi-instance deployment can back this with a
//! shared cache instead.

use std::collections::HashMap;
use std::sync::Mutex;

/// Per-session protocol state.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionState {
    pub initialized: bool,
}

/// Storage for protocol sessions keyed by the wire session id.
pub trait SessionStore: Send + Sync {
    /// Create the session if absent and return its state.
    fn ensure(&self, session_id: &str) -> SessionState;

    /// Mark a session initialized, creating it if absent.
    fn mark_initialized(&self, session_id: &str);

    /// Current state, if the session exists.
    fn get(&self, session_id: &str) -> Option<SessionState>;
}

/// Process-local session store.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, SessionState>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn ensure(&self, session_id: &str) -> SessionState {
        let mut sessions = self.sessions.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *sessions.entry(session_id.to_string()).or_default()
    }

    fn mark_initialized(&self, session_id: &str) {
        let mut sessions = self.sessions.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        sessions
            .entry(session_id.to_string())
            .or_default()
            .initialized = true;
    }

    fn get(&self, session_id: &str) -> Option<SessionState> {
        let sessions = self.sessions.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        sessions.get(session_id).copied()
    }
}
