//! Session security tests for fixation, hijacking, and related attacks.
//!
//! These complement the per-module tests by walking whole attack scenarios
//! through the public lifecycle API:
//! - Session fixation attempts
//! - Session hijacking via stolen cookies
//! - Corrupted stored state degrading to logged-out instead of crashing
//! - Post-authentication rekeying

#[cfg(test)]
mod tests {
    use http::HeaderValue;
    use http::header::USER_AGENT;
    use serial_test::serial;

    use crate::codec::decode_session_map;
    use crate::session::errors::{HijackEvidence, SessionError};
    use crate::session::main::lifecycle::{rekey_session, resolve_session};
    use crate::session::main::writer::SessionWriter;
    use crate::session::storage::SessionStore;
    use crate::test_utils::{init_test_environment, request_headers, seeded_session};

    #[tokio::test]
    #[serial]
    async fn test_fixated_id_is_not_adopted_at_login() {
        init_test_environment().await;

        // The attacker plants a syntactically valid id that has no row.
        let planted = SessionStore::mint_id().unwrap();
        let resolved = resolve_session(&request_headers(Some(&planted)), "login")
            .await
            .unwrap();

        // The victim gets a fresh id, not the planted one.
        assert_ne!(resolved.id, planted);
        assert!(resolved.is_new());
    }

    #[tokio::test]
    #[serial]
    async fn test_rekey_on_login_invalidates_the_pre_auth_id() {
        init_test_environment().await;

        // A pre-auth session the attacker may have observed.
        let headers = request_headers(None);
        let pre_auth_id = seeded_session(&headers, None).await;

        let mut resolved = resolve_session(&request_headers(Some(&pre_auth_id)), "login")
            .await
            .unwrap();
        resolved.map.set_authenticated_user("alice");

        let new_id = rekey_session(Some(&resolved.id)).await.unwrap().unwrap();
        resolved.adopt_id(new_id.clone());

        let mut response_headers = http::HeaderMap::new();
        SessionWriter::new()
            .persist(&resolved, &mut response_headers)
            .await
            .unwrap();

        // The observed id is dead; the new row carries the authenticated map.
        assert!(SessionStore::get(&pre_auth_id).await.unwrap().is_none());
        let record = SessionStore::get(&new_id).await.unwrap().unwrap();
        let map = decode_session_map(record.session_data.as_deref().unwrap());
        assert_eq!(map.authenticated_user(), Some("alice"));

        SessionStore::delete(&new_id).await.unwrap();
    }

    #[tokio::test]
    #[serial]
    async fn test_stolen_cookie_from_other_client_is_rejected() {
        init_test_environment().await;

        let victim_headers = request_headers(None);
        let id = seeded_session(&victim_headers, Some("alice")).await;

        // Same cookie, different client.
        let mut attacker_headers = request_headers(Some(&id));
        attacker_headers.insert(USER_AGENT, HeaderValue::from_static("curl/8.0"));

        let err = resolve_session(&attacker_headers, "dashboard")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Hijacking(HijackEvidence::FingerprintMismatch { .. })
        ));

        SessionStore::delete(&id).await.unwrap();
    }

    #[tokio::test]
    #[serial]
    async fn test_first_touch_binding_locks_out_later_clients() {
        init_test_environment().await;

        // A persisted session that has never seen a fingerprint.
        let record = SessionStore::create_or_touch(None).await.unwrap().unwrap();

        // First toucher binds their client.
        let first = resolve_session(&request_headers(Some(&record.id)), "login")
            .await
            .unwrap();
        let mut response_headers = http::HeaderMap::new();
        SessionWriter::new()
            .persist(&first, &mut response_headers)
            .await
            .unwrap();

        // A different client presenting the same cookie is now a hijacker.
        let mut other = request_headers(Some(&record.id));
        other.insert(USER_AGENT, HeaderValue::from_static("curl/8.0"));
        let err = resolve_session(&other, "login").await.unwrap_err();
        assert!(matches!(err, SessionError::Hijacking(_)));

        SessionStore::delete(&record.id).await.unwrap();
    }

    #[tokio::test]
    #[serial]
    async fn test_corrupted_session_data_degrades_to_logged_out() {
        init_test_environment().await;

        let record = SessionStore::create_or_touch(None).await.unwrap().unwrap();
        SessionStore::save_data(&record.id, Some("%%% definitely not a blob %%%"))
            .await
            .unwrap();

        // The request still resolves; the map just came back empty, so the
        // protected endpoint demands authentication rather than crashing.
        let err = resolve_session(&request_headers(Some(&record.id)), "dashboard")
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::AuthenticationRequired));

        // At a login endpoint the same session is usable and freshly bound.
        let resolved = resolve_session(&request_headers(Some(&record.id)), "login")
            .await
            .unwrap();
        assert_eq!(resolved.map.authenticated_user(), None);
        assert!(resolved.map.fingerprint().is_some());

        SessionStore::delete(&record.id).await.unwrap();
    }
}
