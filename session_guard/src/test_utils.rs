//! Shared test initialization and helpers.
//!
//! Tests run against a shared-cache in-memory SQLite database so every pool
//! connection sees the same data. Store-touching tests are `#[serial]`
//! because the data store is process-global.

use std::sync::Once;

use chrono::Utc;
use http::header::{COOKIE, USER_AGENT};
use http::{HeaderMap, HeaderValue};

use crate::codec::encode_session_map;
use crate::session::{ClientFingerprint, SESSION_COOKIE_NAME, SessionMap, SessionStore};

/// Centralized test initialization for all tests across the crate.
pub async fn init_test_environment() {
    static ENV_INIT: Once = Once::new();
    ENV_INIT.call_once(|| {
        // Prefer .env_test settings; fall back to an in-process default so
        // `cargo test` works with no environment at all.
        if dotenvy::from_filename(".env_test").is_err() {
            dotenvy::dotenv().ok();
        }
        if std::env::var("GENERIC_DATA_STORE_TYPE").is_err() {
            unsafe { std::env::set_var("GENERIC_DATA_STORE_TYPE", "sqlite") };
        }
        if std::env::var("GENERIC_DATA_STORE_URL").is_err() {
            unsafe {
                std::env::set_var(
                    "GENERIC_DATA_STORE_URL",
                    "sqlite:file:session_guard_test?mode=memory&cache=shared",
                )
            };
        }
    });

    if let Err(e) = SessionStore::init().await {
        tracing::warn!("Session store initialization failed in tests: {e}");
    }
}

/// Request headers for a fixed test client, optionally carrying the session
/// cookie.
pub fn request_headers(session_id: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0"));
    if let Some(id) = session_id {
        let cookie = format!("{}={}", SESSION_COOKIE_NAME.as_str(), id);
        headers.insert(COOKIE, HeaderValue::from_str(&cookie).unwrap());
    }
    headers
}

/// Persist a session bound to `headers`, optionally authenticated, and
/// return its id.
pub async fn seeded_session(headers: &HeaderMap, user: Option<&str>) -> String {
    let record = SessionStore::create_or_touch(None).await.unwrap().unwrap();
    let mut map = SessionMap::new();
    map.bind_fingerprint(ClientFingerprint::from_headers(headers));
    if let Some(user) = user {
        map.set_authenticated_user(user);
    }
    let blob = encode_session_map(&map).unwrap();
    SessionStore::save_data(&record.id, Some(&blob)).await.unwrap();
    record.id
}

/// Rewind a session's `last_accessed` by `seconds`.
pub async fn backdate_session(id: &str, seconds: i64) {
    let store = crate::storage::GENERIC_DATA_STORE.lock().await;
    let pool = store.as_sqlite().expect("tests run on sqlite");
    sqlx::query(&format!(
        "UPDATE {} SET last_accessed = ? WHERE id = ?",
        crate::storage::DB_TABLE_SESSIONS.as_str()
    ))
    .bind(Utc::now() - chrono::Duration::seconds(seconds))
    .bind(id)
    .execute(pool)
    .await
    .unwrap();
}
