use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Storage for linked Trello tokens, keyed by session id.
///
/// Implementations must be cheap to call from request handlers; the in-memory
/// store is the default, anything shared across processes can implement this
/// trait instead.
pub trait SessionStore: Send + Sync {
    /// Token linked to the session, if any
    fn token(&self, session_id: &str) -> Option<String>;

    /// Link a token to the session, replacing any previous one
    fn link(&self, session_id: &str, token: String);
}

/// Process-local session store with LRU eviction
pub struct MemorySessionStore {
    sessions: Mutex<LruCache<String, String>>,
}

impl MemorySessionStore {
    /// Create a store holding at most `capacity` sessions (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            sessions: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Number of linked sessions and store capacity
    pub fn stats(&self) -> (usize, usize) {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        (sessions.len(), sessions.cap().get())
    }
}

impl SessionStore for MemorySessionStore {
    fn token(&self, session_id: &str) -> Option<String> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.get(session_id).cloned()
    }

    fn link(&self, session_id: &str, token: String) {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.put(session_id.to_string(), token);
    }
}
