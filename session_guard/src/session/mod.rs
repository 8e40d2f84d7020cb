mod config;
mod errors;
mod main;
mod storage;
mod types;

pub use config::{
    SESSION_COOKIE_MAX_AGE, SESSION_COOKIE_NAME, SESSION_IDLE_TIMEOUT, SESSION_LOGIN_ENDPOINTS,
};
pub use errors::{HijackEvidence, SessionError};
pub use main::{
    ClientFingerprint, HmacSha256Hasher, MemoryNonceRegistry, Nonce, NonceEngine, NonceRegistry,
    ResolvedSession, SaltedHasher, SessionWriter, expire_session, is_login_endpoint,
    prepare_logout_response, rekey_session, resolve_session, verify_client, verify_nonce,
};
pub use storage::SessionStore;
pub use types::{KEY_AUTH_USER, KEY_FINGERPRINT, SessionMap, SessionRecord};

/// Initialize the session store tables
pub(crate) async fn init() -> Result<(), SessionError> {
    storage::SessionStore::init().await
}
