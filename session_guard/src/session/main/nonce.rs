//! Fingerprint-bound nonce derivation and comparison.
//!
//! A nonce is the salted one-way hash of the client fingerprint and an
//! issuance timestamp, salted by the username it was issued for. Storage and
//! expiry of issued nonces are the registry's concern; this module only
//! defines how a nonce's value is derived and compared.

use std::collections::HashMap;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use http::HeaderMap;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;

use super::fingerprint::ClientFingerprint;

type HmacSha256 = Hmac<Sha256>;

/// A short-lived, fingerprint-bound token.
#[derive(Debug, Clone)]
pub struct Nonce {
    pub value: String,
    pub issued_at: DateTime<Utc>,
    pub username: String,
}

impl Nonce {
    /// Two nonces match when the issuance time and the hash value agree.
    /// The value comparison is constant-time.
    pub fn matches(&self, other: &Nonce) -> bool {
        self.issued_at.timestamp() == other.issued_at.timestamp()
            && bool::from(self.value.as_bytes().ct_eq(other.value.as_bytes()))
    }
}

impl PartialEq for Nonce {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other)
    }
}

/// The crypto primitive contract: a one-way salted hash.
pub trait SaltedHasher: Send + Sync {
    fn hash(&self, input: &str, salt: &str) -> String;
}

/// Default hasher: HMAC-SHA256 keyed by the salt, base64url output.
#[derive(Debug, Clone, Copy, Default)]
pub struct HmacSha256Hasher;

impl SaltedHasher for HmacSha256Hasher {
    fn hash(&self, input: &str, salt: &str) -> String {
        let mut mac =
            HmacSha256::new_from_slice(salt.as_bytes()).expect("HMAC can take key of any size");
        mac.update(input.as_bytes());
        let result = mac.finalize().into_bytes();
        URL_SAFE_NO_PAD.encode(result)
    }
}

/// Derives and compares nonces. Issued-nonce bookkeeping lives behind
/// [`NonceRegistry`].
#[derive(Debug, Default)]
pub struct NonceEngine<H: SaltedHasher = HmacSha256Hasher> {
    hasher: H,
}

impl NonceEngine<HmacSha256Hasher> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<H: SaltedHasher> NonceEngine<H> {
    pub fn with_hasher(hasher: H) -> Self {
        Self { hasher }
    }

    /// Derive a nonce for the requesting client: hash of
    /// `fingerprint ++ timestamp`, salted by `username`.
    pub fn issue(&self, headers: &HeaderMap, username: &str, at: DateTime<Utc>) -> Nonce {
        let fingerprint = ClientFingerprint::from_headers(headers);
        let input = format!("{}{}", fingerprint.as_str(), at.timestamp());
        Nonce {
            value: self.hasher.hash(&input, username),
            issued_at: at,
            username: username.to_string(),
        }
    }
}

/// Tracks the nonce most recently issued for each session id. Storage and
/// expiry policy belong to the implementor.
#[async_trait]
pub trait NonceRegistry: Send + Sync {
    async fn expected(&self, session_id: &str) -> Option<Nonce>;
    async fn record(&self, session_id: &str, nonce: Nonce);
}

/// In-process registry, sufficient for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct MemoryNonceRegistry {
    entries: Mutex<HashMap<String, Nonce>>,
}

impl MemoryNonceRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NonceRegistry for MemoryNonceRegistry {
    async fn expected(&self, session_id: &str) -> Option<Nonce> {
        self.entries.lock().await.get(session_id).cloned()
    }

    async fn record(&self, session_id: &str, nonce: Nonce) {
        self.entries.lock().await.insert(session_id.to_string(), nonce);
    }
}
