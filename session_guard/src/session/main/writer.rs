//! The post-action session write hook.

use http::HeaderMap;

use crate::codec::encode_session_map;
use crate::session::errors::SessionError;
use crate::session::storage::SessionStore;

use super::cookie::set_session_cookie;
use super::lifecycle::ResolvedSession;

/// Persists the session map at most once per request.
///
/// The hook may be registered more than once on a request's completion path;
/// the armed flag flips on first consultation, so later invocations are
/// no-ops.
#[derive(Debug)]
pub struct SessionWriter {
    armed: bool,
}

impl Default for SessionWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionWriter {
    pub fn new() -> Self {
        Self { armed: true }
    }

    /// Consult-and-disarm. The first call returns true, every later call
    /// false.
    pub fn should_write(&mut self) -> bool {
        std::mem::replace(&mut self.armed, false)
    }

    /// Encode the session map, persist it under the (possibly rekeyed)
    /// session id, and set the session cookie on the response headers.
    pub async fn persist(
        &mut self,
        session: &ResolvedSession,
        response_headers: &mut HeaderMap,
    ) -> Result<(), SessionError> {
        if !self.should_write() {
            tracing::debug!(session_id = %session.id, "Session already written for this request");
            return Ok(());
        }

        let blob = if session.map.is_empty() {
            None
        } else {
            Some(encode_session_map(&session.map)?)
        };
        SessionStore::save_data(&session.id, blob.as_deref()).await?;
        set_session_cookie(response_headers, &session.id)?;
        Ok(())
    }
}
