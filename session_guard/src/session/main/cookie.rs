use headers::Cookie;
use http::header::{COOKIE, HeaderMap};

use crate::session::config::{SESSION_COOKIE_MAX_AGE, SESSION_COOKIE_NAME, SESSION_ID_LENGTH};
use crate::session::errors::SessionError;
use crate::session::storage::SessionStore;
use crate::utils::header_set_cookie;

/// A cookie value qualifies as a usable session id only when it has the
/// fixed length and stays inside the alphanumeric alphabet; anything else is
/// treated as if no id were presented.
pub(crate) fn is_usable_session_id(id: &str) -> bool {
    id.len() == SESSION_ID_LENGTH && id.bytes().all(|b| b.is_ascii_alphanumeric())
}

pub(crate) fn get_session_id_from_headers(
    headers: &HeaderMap,
) -> Result<Option<&str>, SessionError> {
    let Some(cookie_header) = headers.get(COOKIE) else {
        tracing::debug!("No cookie header found");
        return Ok(None);
    };

    let cookie_str = cookie_header.to_str().map_err(|e| {
        tracing::error!("Invalid cookie header: {}", e);
        SessionError::HeaderError("Invalid cookie header".to_string())
    })?;

    let cookie_name = SESSION_COOKIE_NAME.as_str();
    let session_id = cookie_str.split(';').map(|s| s.trim()).find_map(|s| {
        let mut parts = s.splitn(2, '=');
        match (parts.next(), parts.next()) {
            (Some(k), Some(v)) if k == cookie_name => Some(v),
            _ => None,
        }
    });

    match session_id {
        Some(id) if is_usable_session_id(id) => Ok(Some(id)),
        Some(id) => {
            tracing::debug!("Discarding malformed session cookie value: {id:?}");
            Ok(None)
        }
        None => {
            tracing::debug!("No session cookie '{}' found in cookies", cookie_name);
            Ok(None)
        }
    }
}

/// Instruct the response layer to carry the session id cookie.
pub(crate) fn set_session_cookie(
    headers: &mut HeaderMap,
    session_id: &str,
) -> Result<(), SessionError> {
    header_set_cookie(
        headers,
        SESSION_COOKIE_NAME.to_string(),
        session_id.to_string(),
        *SESSION_COOKIE_MAX_AGE as i64,
    )?;
    Ok(())
}

/// Prepare a logout response by expiring the session cookie and deleting the
/// session row from storage.
pub async fn prepare_logout_response(cookies: Cookie) -> Result<HeaderMap, SessionError> {
    let mut headers = HeaderMap::new();
    header_set_cookie(
        &mut headers,
        SESSION_COOKIE_NAME.to_string(),
        "expired".to_string(),
        -86400,
    )?;
    if let Some(session_id) = cookies.get(SESSION_COOKIE_NAME.as_str()) {
        SessionStore::delete(session_id).await?;
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use http::header::SET_COOKIE;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn valid_id() -> String {
        "A".repeat(SESSION_ID_LENGTH)
    }

    #[test]
    fn test_extracts_session_cookie_among_others() {
        let id = valid_id();
        let headers = headers_with_cookie(&format!(
            "other=1; {}={}; theme=dark",
            SESSION_COOKIE_NAME.as_str(),
            id
        ));
        assert_eq!(get_session_id_from_headers(&headers).unwrap(), Some(id.as_str()));
    }

    #[test]
    fn test_no_cookie_header_yields_none() {
        assert_eq!(get_session_id_from_headers(&HeaderMap::new()).unwrap(), None);
    }

    #[test]
    fn test_malformed_id_is_discarded() {
        let too_long = "A".repeat(SESSION_ID_LENGTH + 1);
        let wrong_alphabet = format!("{}!", "A".repeat(SESSION_ID_LENGTH - 1));
        for bad in ["short", too_long.as_str(), wrong_alphabet.as_str()] {
            let headers =
                headers_with_cookie(&format!("{}={}", SESSION_COOKIE_NAME.as_str(), bad));
            assert_eq!(get_session_id_from_headers(&headers).unwrap(), None);
        }
    }

    #[test]
    fn test_set_session_cookie_emits_header() {
        let mut headers = HeaderMap::new();
        let id = valid_id();
        set_session_cookie(&mut headers, &id).unwrap();
        let value = headers.get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(value.contains(&id));
        assert!(value.contains("HttpOnly"));
    }
}
