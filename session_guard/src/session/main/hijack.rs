//! Session hijack detection.

use http::HeaderMap;

use crate::codec::{Scalar, SessionValue};
use crate::session::errors::{HijackEvidence, SessionError};
use crate::session::types::{KEY_FINGERPRINT, SessionMap};

use super::fingerprint::ClientFingerprint;
use super::nonce::{Nonce, NonceRegistry};

/// Compare the fingerprint bound to the session against one freshly built
/// from the current request.
pub fn verify_client(map: &SessionMap, headers: &HeaderMap) -> Result<(), SessionError> {
    if map.authenticated_user().is_some() && map.get(KEY_FINGERPRINT).is_none() {
        let fresh = ClientFingerprint::from_headers(headers).into_inner();
        tracing::error!(
            fresh_fingerprint = %fresh,
            "Authenticated session has no bound fingerprint"
        );
        return Err(SessionError::Hijacking(HijackEvidence::FingerprintUnbound {
            fresh,
        }));
    }

    let stored = match map.get(KEY_FINGERPRINT) {
        Some(SessionValue::Scalar(Scalar::Text(stored))) => stored.as_str(),
        Some(other) => {
            tracing::error!(value = ?other, "Stored fingerprint has an unexpected shape");
            return Err(SessionError::Integrity(
                "stored fingerprint has an unexpected shape".to_string(),
            ));
        }
        None => {
            return Err(SessionError::Integrity(
                "stored fingerprint is missing".to_string(),
            ));
        }
    };

    let fresh = ClientFingerprint::from_headers(headers);
    if fresh.as_str() != stored {
        tracing::error!(
            stored_fingerprint = %stored,
            fresh_fingerprint = %fresh.as_str(),
            "Client fingerprint mismatch"
        );
        return Err(SessionError::Hijacking(HijackEvidence::FingerprintMismatch {
            stored: stored.to_string(),
            fresh: fresh.into_inner(),
        }));
    }

    Ok(())
}

/// Validate a supplied nonce against the registry's expectation for the
/// session. With no session id there is nothing to protect yet.
pub async fn verify_nonce(
    session_id: Option<&str>,
    supplied: Option<&Nonce>,
    registry: &dyn NonceRegistry,
) -> Result<(), SessionError> {
    let Some(session_id) = session_id else {
        return Ok(());
    };

    let expected = registry.expected(session_id).await;
    match (supplied, expected) {
        (Some(supplied), Some(expected)) if supplied.matches(&expected) => Ok(()),
        (supplied, _) => {
            tracing::error!(
                session_id = %session_id,
                supplied_nonce = ?supplied.map(|n| n.value.as_str()),
                "Nonce missing or mismatched"
            );
            Err(SessionError::Hijacking(HijackEvidence::NonceMismatch {
                session_id: session_id.to_string(),
                supplied: supplied.map(|n| n.value.clone()),
            }))
        }
    }
}
