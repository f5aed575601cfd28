//! Client session holder
//!
//! Two states, Anonymous and Authenticated. The current state lives in a
//! `watch` cell so any number of observers see every transition; the token
//! itself is mirrored into a [`KeyValueStore`] so it survives restarts.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::error::ClientError;
use super::storage::{KeyValueStore, TOKEN_KEY};

/// Unauthenticated entry point
pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated { token: String },
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Authenticated { token } => Some(token),
            Self::Anonymous => None,
        }
    }
}

/// Where the consumer should go next
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub to: String,
}

impl Navigation {
    pub fn to_login() -> Self {
        Self {
            to: LOGIN_PATH.to_string(),
        }
    }
}

pub struct SessionHolder {
    storage: Arc<dyn KeyValueStore>,
    state: watch::Sender<SessionState>,
}

impl SessionHolder {
    /// Start from whatever token was persisted.
    ///
    /// A stored token is trusted without asking the server; it is only
    /// dropped once a request using it comes back 401. Unreadable storage
    /// starts the session anonymous.
    pub fn rehydrate(storage: Arc<dyn KeyValueStore>) -> Self {
        let initial = match storage.get(TOKEN_KEY) {
            Ok(Some(token)) if !token.is_empty() => {
                debug!("Rehydrated persisted session token");
                SessionState::Authenticated { token }
            }
            Ok(_) => SessionState::Anonymous,
            Err(e) => {
                warn!(error = %e, "Could not read persisted session, starting anonymous");
                SessionState::Anonymous
            }
        };

        let (state, _) = watch::channel(initial);
        Self { storage, state }
    }

    /// Enter the authenticated state and persist the token.
    ///
    /// The in-memory state changes even if persisting fails; the error is
    /// still returned so the caller knows the session will not survive a
    /// restart.
    pub fn login(&self, token: impl Into<String>) -> Result<(), ClientError> {
        let token = token.into();
        let mut persisted = Ok(());
        self.state.send_modify(|state| {
            persisted = self.storage.set(TOKEN_KEY, &token);
            *state = SessionState::Authenticated { token };
        });
        persisted
    }

    /// Drop the token everywhere and point the consumer at the login view
    pub fn logout(&self) -> Navigation {
        self.state.send_modify(|state| {
            self.clear_persisted();
            *state = SessionState::Anonymous;
        });
        Navigation::to_login()
    }

    /// Log out only if `token` is still the current session token.
    ///
    /// A rejection of a token that has since been replaced by a newer login
    /// leaves the newer session alone. Returns whether the session ended.
    pub fn expire(&self, token: &str) -> bool {
        self.state.send_if_modified(|state| {
            if state.token() != Some(token) {
                return false;
            }
            self.clear_persisted();
            *state = SessionState::Anonymous;
            true
        })
    }

    fn clear_persisted(&self) {
        if let Err(e) = self.storage.remove(TOKEN_KEY) {
            warn!(error = %e, "Failed to clear persisted session token");
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn token(&self) -> Option<String> {
        self.state.borrow().token().map(str::to_string)
    }

    /// Observe state transitions
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::storage::{FileKeyValueStore, MemoryKeyValueStore};

    #[test]
    fn test_starts_anonymous_without_token() {
        let session = SessionHolder::rehydrate(Arc::new(MemoryKeyValueStore::new()));
        assert_eq!(session.state(), SessionState::Anonymous);
        assert!(!session.is_authenticated());
        assert_eq!(session.token(), None);
    }

    #[test]
    fn test_login_persists_and_logout_clears() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        let session = SessionHolder::rehydrate(storage.clone());

        session.login("tok-1").unwrap();
        assert!(session.is_authenticated());
        assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("tok-1"));

        let nav = session.logout();
        assert_eq!(nav.to, LOGIN_PATH);
        assert!(!session.is_authenticated());
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_rehydrates_across_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        {
            let session = SessionHolder::rehydrate(Arc::new(FileKeyValueStore::new(&path)));
            session.login("persisted-token").unwrap();
        }

        let session = SessionHolder::rehydrate(Arc::new(FileKeyValueStore::new(&path)));
        assert_eq!(session.token().as_deref(), Some("persisted-token"));
    }

    #[test]
    fn test_corrupt_storage_starts_anonymous() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{{{").unwrap();

        let session = SessionHolder::rehydrate(Arc::new(FileKeyValueStore::new(&path)));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_subscribers_see_transitions() {
        let session = SessionHolder::rehydrate(Arc::new(MemoryKeyValueStore::new()));
        let mut rx = session.subscribe();

        session.login("tok").unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_authenticated());

        session.logout();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), SessionState::Anonymous);
    }

    #[test]
    fn test_expire_ignores_replaced_token() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        let session = SessionHolder::rehydrate(storage.clone());
        session.login("old").unwrap();
        session.login("new").unwrap();

        assert!(!session.expire("old"));
        assert_eq!(session.token().as_deref(), Some("new"));
        assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("new"));

        assert!(session.expire("new"));
        assert!(!session.is_authenticated());
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_login_replaces_previous_token() {
        let session = SessionHolder::rehydrate(Arc::new(MemoryKeyValueStore::new()));
        session.login("first").unwrap();
        session.login("second").unwrap();
        assert_eq!(session.token().as_deref(), Some("second"));
    }
}
