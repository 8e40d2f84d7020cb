use std::fmt;

use thiserror::Error;

use crate::codec::CodecError;
use crate::utils::UtilError;

/// Forensic detail attached to a hijack raise; always also logged at error
/// severity at the raise site.
#[derive(Debug, Clone, PartialEq)]
pub enum HijackEvidence {
    /// The fingerprint bound to the session differs from the one computed
    /// from the current request.
    FingerprintMismatch { stored: String, fresh: String },

    /// The session carries an authenticated user but no bound fingerprint.
    FingerprintUnbound { fresh: String },

    /// The supplied nonce is missing or does not match the registry's
    /// expectation for this session.
    NonceMismatch {
        session_id: String,
        supplied: Option<String>,
    },
}

impl fmt::Display for HijackEvidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HijackEvidence::FingerprintMismatch { stored, fresh } => {
                write!(f, "fingerprint mismatch (stored={stored:?}, fresh={fresh:?})")
            }
            HijackEvidence::FingerprintUnbound { fresh } => {
                write!(f, "authenticated session without a bound fingerprint (fresh={fresh:?})")
            }
            HijackEvidence::NonceMismatch {
                session_id,
                supplied,
            } => {
                write!(f, "nonce mismatch for session {session_id} (supplied={supplied:?})")
            }
        }
    }
}

#[derive(Debug, Error, Clone)]
pub enum SessionError {
    /// Session id not found and the endpoint is not a login endpoint.
    #[error("Unknown session id")]
    UnknownSession,

    /// Idle duration exceeded the expiry threshold.
    #[error("Session expired after {0} seconds of inactivity")]
    Timeout(i64),

    /// Fingerprint or nonce mismatch.
    #[error("Session hijacking detected: {0}")]
    Hijacking(HijackEvidence),

    /// Valid, non-expired session without an authenticated user on a
    /// protected endpoint.
    #[error("Authentication required")]
    AuthenticationRequired,

    /// A store operation affected an unexpected number of rows, or stored
    /// session state has an unexpected shape. Fatal; the transaction is
    /// rolled back.
    #[error("Integrity violation: {0}")]
    Integrity(String),

    #[error("Invalid session id: {0}")]
    InvalidSessionId(String),

    #[error("Reserved session key: {0}")]
    ReservedKey(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Header error: {0}")]
    HeaderError(String),

    /// Error from codec operations
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Error from utils operations
    #[error("Utils error: {0}")]
    Utils(#[from] UtilError),
}
