use std::sync::LazyLock;

pub static SESSION_COOKIE_NAME: LazyLock<String> = LazyLock::new(|| {
    std::env::var("SESSION_COOKIE_NAME")
        .ok()
        .unwrap_or("__Host-SessionId".to_string())
});

pub static SESSION_COOKIE_MAX_AGE: LazyLock<u64> = LazyLock::new(|| {
    std::env::var("SESSION_COOKIE_MAX_AGE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(900)
});

/// Idle seconds after which a session is treated as expired. Default 15 minutes.
pub static SESSION_IDLE_TIMEOUT: LazyLock<u64> = LazyLock::new(|| {
    std::env::var("SESSION_IDLE_TIMEOUT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(900)
});

/// Endpoints that may be reached without an authenticated session and that
/// silently mint a fresh session id when the presented one is unknown.
pub static SESSION_LOGIN_ENDPOINTS: LazyLock<Vec<String>> = LazyLock::new(|| {
    std::env::var("SESSION_LOGIN_ENDPOINTS")
        .ok()
        .unwrap_or("login,first_factor".to_string())
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
});

pub(crate) const SESSION_ID_LENGTH: usize = 36;
