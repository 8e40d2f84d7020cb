use std::collections::HashMap;
use std::collections::hash_map;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::codec::{Scalar, SessionValue};
use crate::session::errors::SessionError;
use crate::session::main::ClientFingerprint;

/// Key holding the authenticated user id. Reserved; never settable through
/// the generic map interface.
pub const KEY_AUTH_USER: &str = "auth_user_id";

/// Key holding the client fingerprint bound to the session. Reserved.
pub const KEY_FINGERPRINT: &str = "client_fingerprint";

const RESERVED_KEYS: [&str; 2] = [KEY_AUTH_USER, KEY_FINGERPRINT];

/// A persisted session row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct SessionRecord {
    /// Opaque session id, 36 characters from the alphanumeric alphabet
    pub id: String,
    /// When the session was last touched by a valid request
    pub last_accessed: DateTime<Utc>,
    /// Encoded session map, NULL while the map is empty
    pub session_data: Option<String>,
}

/// The in-memory, per-request session state.
///
/// Security-relevant entries live under reserved keys that only the typed
/// accessors can write; request-driven code goes through [`SessionMap::insert`],
/// which refuses them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionMap {
    entries: HashMap<String, SessionValue>,
}

impl SessionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_entries(entries: HashMap<String, SessionValue>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, SessionValue> {
        self.entries.iter()
    }

    pub fn get(&self, key: &str) -> Option<&SessionValue> {
        self.entries.get(key)
    }

    /// Insert a value under a non-reserved key.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: SessionValue,
    ) -> Result<(), SessionError> {
        let key = key.into();
        if RESERVED_KEYS.contains(&key.as_str()) {
            return Err(SessionError::ReservedKey(key));
        }
        self.entries.insert(key, value);
        Ok(())
    }

    /// Remove a non-reserved key.
    pub fn remove(&mut self, key: &str) -> Result<Option<SessionValue>, SessionError> {
        if RESERVED_KEYS.contains(&key) {
            return Err(SessionError::ReservedKey(key.to_string()));
        }
        Ok(self.entries.remove(key))
    }

    pub fn authenticated_user(&self) -> Option<&str> {
        self.entries.get(KEY_AUTH_USER).and_then(SessionValue::as_text)
    }

    /// Record a successful authentication. Called by the login flow after
    /// credential verification, never from request-supplied data.
    pub fn set_authenticated_user(&mut self, user_id: &str) {
        self.entries
            .insert(KEY_AUTH_USER.to_string(), SessionValue::text(user_id));
    }

    pub fn clear_authenticated_user(&mut self) {
        self.entries.remove(KEY_AUTH_USER);
    }

    /// The fingerprint string bound to this session, if it is present and
    /// well-shaped.
    pub fn fingerprint(&self) -> Option<&str> {
        match self.entries.get(KEY_FINGERPRINT) {
            Some(SessionValue::Scalar(Scalar::Text(text))) => Some(text),
            _ => None,
        }
    }

    pub(crate) fn bind_fingerprint(&mut self, fingerprint: ClientFingerprint) {
        self.entries.insert(
            KEY_FINGERPRINT.to_string(),
            SessionValue::text(fingerprint.into_inner()),
        );
    }
}
