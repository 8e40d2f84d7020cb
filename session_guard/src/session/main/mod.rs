mod cookie;
mod fingerprint;
mod hijack;
mod lifecycle;
mod nonce;
mod writer;

#[cfg(test)]
mod lifecycle_security_tests;

pub use cookie::prepare_logout_response;
pub use fingerprint::ClientFingerprint;
pub use hijack::{verify_client, verify_nonce};
pub use lifecycle::{
    ResolvedSession, expire_session, is_login_endpoint, rekey_session, resolve_session,
};
pub use nonce::{
    HmacSha256Hasher, MemoryNonceRegistry, Nonce, NonceEngine, NonceRegistry, SaltedHasher,
};
pub use writer::SessionWriter;
