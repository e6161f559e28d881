//! Session state for the API client
//!
//! The auth token is the only state kept across requests. It lives in a
//! `TokenStore` (memory, or a sled tree on disk) and is cached by
//! `SessionContext`, which the client reads on every request.

use std::path::Path;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, info};

/// Key of the single slot the token is persisted under
pub const TOKEN_SLOT: &str = "auth_token";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("Stored token is not valid UTF-8")]
    InvalidToken,
}

/// Persistence backend for the auth token
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, SessionError>;
    fn save(&self, token: &str) -> Result<(), SessionError>;
    fn clear(&self) -> Result<(), SessionError>;
}

/// Non-persistent store; the token is gone when the process exits
#[derive(Default)]
pub struct MemoryTokenStore {
    slot: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self { slot: RwLock::new(Some(token.into())) }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, SessionError> {
        Ok(self.slot.read().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, token: &str) -> Result<(), SessionError> {
        *self.slot.write().unwrap_or_else(|e| e.into_inner()) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.slot.write().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

/// Token persisted in the `session` tree of a sled database
#[derive(Clone)]
pub struct SledTokenStore {
    tree: sled::Tree,
}

impl SledTokenStore {
    /// Open or create the sled database at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let db = sled::open(path)?;
        Self::from_db(&db)
    }

    /// Use the `session` tree of an already open database
    pub fn from_db(db: &sled::Db) -> Result<Self, SessionError> {
        let tree = db.open_tree("session")?;
        Ok(Self { tree })
    }
}

impl TokenStore for SledTokenStore {
    fn load(&self) -> Result<Option<String>, SessionError> {
        match self.tree.get(TOKEN_SLOT.as_bytes())? {
            Some(bytes) => String::from_utf8(bytes.to_vec())
                .map(Some)
                .map_err(|_| SessionError::InvalidToken),
            None => Ok(None),
        }
    }

    fn save(&self, token: &str) -> Result<(), SessionError> {
        self.tree.insert(TOKEN_SLOT.as_bytes(), token.as_bytes())?;
        self.tree.flush()?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        self.tree.remove(TOKEN_SLOT.as_bytes())?;
        self.tree.flush()?;
        Ok(())
    }
}

/// Shared handle to the current credential. Cloning shares the same session.
#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn TokenStore>,
    token: Arc<RwLock<Option<String>>>,
}

impl SessionContext {
    /// Wrap `store`, loading whatever token it already holds
    pub fn new(store: impl TokenStore + 'static) -> Result<Self, SessionError> {
        let token = store.load()?;
        debug!(has_token = token.is_some(), "session loaded");
        Ok(Self {
            store: Arc::new(store),
            token: Arc::new(RwLock::new(token)),
        })
    }

    /// Fresh in-memory session with no token
    pub fn anonymous() -> Self {
        Self {
            store: Arc::new(MemoryTokenStore::new()),
            token: Arc::new(RwLock::new(None)),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.read().unwrap_or_else(|e| e.into_inner()).is_some()
    }

    /// Persist `token` and make it current
    pub fn login(&self, token: impl Into<String>) -> Result<(), SessionError> {
        let token = token.into();
        self.store.save(&token)?;
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = Some(token);
        info!("session token stored");
        Ok(())
    }

    /// Forget the token, both cached and persisted
    pub fn logout(&self) -> Result<(), SessionError> {
        self.store.clear()?;
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = None;
        info!("session token cleared");
        Ok(())
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
