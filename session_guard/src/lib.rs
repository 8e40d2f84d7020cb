//! session_guard - Session security for cookie-identified web sessions
//!
//! This crate provides issuance and storage of opaque session identities,
//! hijack detection via client fingerprinting, idle-expiration enforcement,
//! identity rekeying on authentication, and a compact self-describing
//! encoding for arbitrary session state.
//!
//! The surrounding dispatch framework resolves the session before business
//! logic runs, threads the resulting [`ResolvedSession`] through the
//! request, and invokes the [`SessionWriter`] exactly once afterwards; every
//! raised [`SessionError`] kind is translated into a response by that
//! framework, never here.

mod codec;
mod session;
mod storage;
mod utils;

#[cfg(test)]
mod test_utils;

pub use codec::{
    CodecError, Scalar, SessionValue, decode_session_map, encode_session_map, pack_ids,
    unpack_ids,
};

pub use session::{
    ClientFingerprint, HijackEvidence, HmacSha256Hasher, KEY_AUTH_USER, KEY_FINGERPRINT,
    MemoryNonceRegistry, Nonce, NonceEngine, NonceRegistry, ResolvedSession,
    SESSION_COOKIE_MAX_AGE, SESSION_COOKIE_NAME, SESSION_IDLE_TIMEOUT, SESSION_LOGIN_ENDPOINTS,
    SaltedHasher, SessionError, SessionMap, SessionRecord, SessionStore, SessionWriter,
    expire_session, is_login_endpoint, prepare_logout_response, rekey_session, resolve_session,
    verify_client, verify_nonce,
};

/// Initialize the session subsystem's storage layer
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    session::init().await?;
    Ok(())
}
