//! Admin session
//!
//! The bearer token is the entire admin "session". It is modelled as
//! an explicit value object behind a shared handle, injected into the
//! HTTP client rather than read ad hoc from storage at call time.

use shared::util::now_millis;
use std::sync::{Arc, RwLock};

/// Session data held for the lifetime of the admin surface.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Bearer token for admin API authentication
    pub token: Option<String>,
    /// Optional expiry (Unix millis); an expired token is treated as absent
    pub expires_at: Option<i64>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the token after a successful login.
    pub fn set_login(&mut self, token: String, expires_at: Option<i64>) {
        self.token = Some(token);
        self.expires_at = expires_at;
    }

    /// Drop all credentials.
    pub fn clear(&mut self) {
        self.token = None;
        self.expires_at = None;
    }

    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(at) => now_millis() >= at,
            None => false,
        }
    }

    /// The token, if present and not expired.
    pub fn token(&self) -> Option<&str> {
        if self.is_expired() {
            return None;
        }
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}

/// Shared handle to the session, cloned into every client that needs it.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<Session>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_login(&self, token: impl Into<String>, expires_at: Option<i64>) {
        let mut session = self.inner.write().expect("session lock poisoned");
        session.set_login(token.into(), expires_at);
    }

    pub fn clear(&self) {
        let mut session = self.inner.write().expect("session lock poisoned");
        session.clear();
    }

    pub fn token(&self) -> Option<String> {
        let session = self.inner.read().expect("session lock poisoned");
        session.token().map(str::to_string)
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_lifecycle() {
        let handle = SessionHandle::new();
        assert!(!handle.is_authenticated());

        handle.set_login("tok-1", None);
        assert_eq!(handle.token().as_deref(), Some("tok-1"));

        handle.clear();
        assert!(handle.token().is_none());
    }

    #[test]
    fn test_expired_token_is_absent() {
        let mut session = Session::new();
        session.set_login("tok".into(), Some(now_millis() - 1_000));
        assert!(session.is_expired());
        assert!(session.token().is_none());

        session.set_login("tok".into(), Some(now_millis() + 60_000));
        assert!(session.token().is_some());
    }
}
