//! Shared session objects.
//!
//! A [`Session`] is always handled through a [`SessionRef`] (an `Arc`). The
//! request context holds one in its session slot, and an authenticated
//! result may carry one too. After a successful authentication the two must
//! be the *same* object, which callers check with [`Arc::ptr_eq`].
//!
//! Session data is interior-mutable so that handlers can write to the
//! session through the shared handle and the persistence layer wrapping the
//! pipeline observes the writes.

use crate::error::CoreResult;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Shared handle to a [`Session`].
pub type SessionRef = Arc<Session>;

/// A key/value session object.
///
/// # Example
///
/// ```
/// use cerberus_core::Session;
///
/// let session = Session::new();
/// session.insert("user_id", "u-42").unwrap();
///
/// let user_id: Option<String> = session.get("user_id").unwrap();
/// assert_eq!(user_id.as_deref(), Some("u-42"));
/// assert!(session.is_modified());
/// ```
pub struct Session {
    id: String,
    data: RwLock<Map<String, Value>>,
    is_new: bool,
    modified: AtomicBool,
}

impl Session {
    /// Creates a fresh, empty session with a new UUID v7 identifier.
    #[must_use]
    pub fn new() -> SessionRef {
        Arc::new(Self {
            id: Uuid::now_v7().to_string(),
            data: RwLock::new(Map::new()),
            is_new: true,
            modified: AtomicBool::new(false),
        })
    }

    /// Rehydrates a session previously persisted under `id`.
    #[must_use]
    pub fn load(id: impl Into<String>, data: Map<String, Value>) -> SessionRef {
        Arc::new(Self {
            id: id.into(),
            data: RwLock::new(data),
            is_new: false,
            modified: AtomicBool::new(false),
        })
    }

    /// Returns the session identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether this session was created during the current request.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Whether the session data changed since it was created or loaded.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.modified.load(Ordering::Acquire)
    }

    /// Returns the raw JSON value stored under `key`.
    #[must_use]
    pub fn get_value(&self, key: &str) -> Option<Value> {
        self.data.read().get(key).cloned()
    }

    /// Returns the value stored under `key`, deserialized into `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> CoreResult<Option<T>> {
        match self.get_value(key) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Stores `value` under `key`.
    pub fn insert<T: Serialize>(&self, key: impl Into<String>, value: T) -> CoreResult<()> {
        let value = serde_json::to_value(value)?;
        self.data.write().insert(key.into(), value);
        self.modified.store(true, Ordering::Release);
        Ok(())
    }

    /// Removes and returns the value stored under `key`.
    pub fn remove(&self, key: &str) -> Option<Value> {
        let removed = self.data.write().remove(key);
        if removed.is_some() {
            self.modified.store(true, Ordering::Release);
        }
        removed
    }

    /// Whether a value is stored under `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.read().contains_key(key)
    }

    /// Returns a copy of the whole session map, e.g. for persistence.
    #[must_use]
    pub fn snapshot(&self) -> Map<String, Value> {
        self.data.read().clone()
    }
}

impl fmt::Debug for Session {
    // Session values may hold credentials, so only keys are printed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self.data.read().keys().cloned().collect();
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("keys", &keys)
            .field("is_new", &self.is_new)
            .field("modified", &self.is_modified())
            .finish()
    }
}
