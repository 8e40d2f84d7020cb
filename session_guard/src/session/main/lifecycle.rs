//! Per-request session resolution and rekeying.
//!
//! The dispatch framework calls [`resolve_session`] before any business
//! logic runs and threads the returned [`ResolvedSession`] through the
//! request explicitly; nothing in this subsystem keeps ambient per-request
//! state. Raised error kinds are translated to responses by the caller.

use chrono::Utc;
use http::HeaderMap;

use crate::codec::decode_session_map;
use crate::session::config::{SESSION_IDLE_TIMEOUT, SESSION_LOGIN_ENDPOINTS};
use crate::session::errors::SessionError;
use crate::session::storage::SessionStore;
use crate::session::types::{KEY_FINGERPRINT, SessionMap};

use super::cookie::get_session_id_from_headers;
use super::fingerprint::ClientFingerprint;
use super::hijack::verify_client;

/// The per-request session context, threaded explicitly from resolution
/// through business logic to the writer.
#[derive(Debug, Clone)]
pub struct ResolvedSession {
    /// Session id the writer will persist under; updated after a rekey.
    pub id: String,
    pub map: SessionMap,
    minted: bool,
}

impl ResolvedSession {
    /// True when the id was freshly minted this request and no row has been
    /// persisted for it yet.
    pub fn is_new(&self) -> bool {
        self.minted
    }

    /// Adopt the id returned by [`rekey_session`].
    pub fn adopt_id(&mut self, id: String) {
        self.id = id;
    }
}

/// Whether the endpoint is one of the designated login/first-factor
/// endpoints that may be reached without an authenticated session.
pub fn is_login_endpoint(endpoint: &str) -> bool {
    SESSION_LOGIN_ENDPOINTS.iter().any(|e| e == endpoint)
}

fn minted_session() -> Result<ResolvedSession, SessionError> {
    let id = SessionStore::mint_id()?;
    tracing::debug!(session_id = %id, "Minted a fresh session id");
    Ok(ResolvedSession {
        id,
        map: SessionMap::new(),
        minted: true,
    })
}

/// Resolve the request's session: mint, reject, expire, or load-and-verify.
pub async fn resolve_session(
    headers: &HeaderMap,
    endpoint: &str,
) -> Result<ResolvedSession, SessionError> {
    let Some(session_id) = get_session_id_from_headers(headers)? else {
        return minted_session();
    };

    let Some(record) = SessionStore::get(session_id).await? else {
        if is_login_endpoint(endpoint) {
            // A stale or fabricated id at a login endpoint is replaced
            // silently; the visitor is about to authenticate anyway.
            return minted_session();
        }
        tracing::debug!(session_id = %session_id, "Unknown session id on a protected endpoint");
        return Err(SessionError::UnknownSession);
    };

    let idle_seconds = Utc::now()
        .signed_duration_since(record.last_accessed)
        .num_seconds();
    if idle_seconds > *SESSION_IDLE_TIMEOUT as i64 {
        tracing::debug!(
            session_id = %session_id,
            idle_seconds,
            "Session exceeded the idle timeout"
        );
        return Err(SessionError::Timeout(idle_seconds));
    }

    SessionStore::create_or_touch(Some(session_id)).await?;

    let mut map = match record.session_data.as_deref() {
        Some(blob) => decode_session_map(blob),
        None => SessionMap::new(),
    };

    // First-touch binding: a session that has never seen a fingerprint is
    // bound to this client before verification runs.
    if map.get(KEY_FINGERPRINT).is_none() {
        map.bind_fingerprint(ClientFingerprint::from_headers(headers));
    }

    verify_client(&map, headers)?;

    if !is_login_endpoint(endpoint) && map.authenticated_user().is_none() {
        return Err(SessionError::AuthenticationRequired);
    }

    Ok(ResolvedSession {
        id: session_id.to_string(),
        map,
        minted: false,
    })
}

/// Replace the session id after a successful authentication, carrying the
/// stored data forward and deleting the old row. Returns `None` when no
/// prior session existed.
pub async fn rekey_session(current: Option<&str>) -> Result<Option<String>, SessionError> {
    let Some(old_id) = current else {
        return Ok(None);
    };

    let old_record = SessionStore::get(old_id).await?;
    let fresh = SessionStore::create_or_touch(None)
        .await?
        .ok_or_else(|| SessionError::Integrity("session insert produced no row".to_string()))?;

    match old_record {
        Some(old_record) => {
            if let Some(data) = old_record.session_data.as_deref() {
                if !data.is_empty() {
                    SessionStore::save_data(&fresh.id, Some(data)).await?;
                }
            }
            SessionStore::delete(old_id).await?;
        }
        None => {
            tracing::debug!(session_id = %old_id, "Rekey found no row for the prior id");
        }
    }

    tracing::debug!(old_id = %old_id, new_id = %fresh.id, "Session rekeyed");
    Ok(Some(fresh.id))
}

/// Remove a stale session row after a Timeout raise.
pub async fn expire_session(id: &str) -> Result<(), SessionError> {
    SessionStore::delete(id).await
}
