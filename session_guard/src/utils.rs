use http::header::{HeaderMap, SET_COOKIE};
use ring::rand::SecureRandom;

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum UtilError {
    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Cookie error: {0}")]
    Cookie(String),
}

const TOKEN_ALPHABET: &[u8; 62] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

// Largest multiple of 62 that fits in a byte; bytes at or above it are
// redrawn so every alphabet character is equally likely.
const REJECTION_BOUND: u8 = 248;

/// Generate a random token of `len` characters drawn uniformly from the
/// 62-character alphanumeric alphabet.
pub(crate) fn gen_alphanumeric(len: usize) -> Result<String, UtilError> {
    let rng = ring::rand::SystemRandom::new();
    let mut token = String::with_capacity(len);
    let mut buf = [0u8; 64];

    while token.len() < len {
        rng.fill(&mut buf)
            .map_err(|_| UtilError::Crypto("Failed to generate random bytes".to_string()))?;
        for &byte in &buf {
            if byte < REJECTION_BOUND {
                token.push(TOKEN_ALPHABET[(byte % 62) as usize] as char);
                if token.len() == len {
                    break;
                }
            }
        }
    }

    Ok(token)
}

pub(crate) fn header_set_cookie(
    headers: &mut HeaderMap,
    name: String,
    value: String,
    max_age: i64,
) -> Result<(), UtilError> {
    let cookie =
        format!("{name}={value}; SameSite=Lax; Secure; HttpOnly; Path=/; Max-Age={max_age}");
    headers.append(
        SET_COOKIE,
        cookie
            .parse()
            .map_err(|_| UtilError::Cookie("Failed to parse cookie".to_string()))?,
    );
    Ok(())
}
