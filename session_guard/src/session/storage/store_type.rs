use chrono::Utc;

use crate::session::config::SESSION_ID_LENGTH;
use crate::session::errors::SessionError;
use crate::session::types::SessionRecord;
use crate::storage::GENERIC_DATA_STORE;
use crate::utils::gen_alphanumeric;

use super::postgres::*;
use super::sqlite::*;

/// Durable CRUD for session rows.
///
/// Every operation opens and releases its own storage transaction; no
/// connection is held across unrelated operations. Writes and deletes that
/// would affect more than one row are rolled back and raised as
/// [`SessionError::Integrity`].
pub struct SessionStore;

impl SessionStore {
    /// Initialize the session table
    pub(crate) async fn init() -> Result<(), SessionError> {
        let store = GENERIC_DATA_STORE.lock().await;

        match (store.as_sqlite(), store.as_postgres()) {
            (Some(pool), _) => create_tables_sqlite(pool).await,
            (_, Some(pool)) => create_tables_postgres(pool).await,
            _ => Err(SessionError::Storage(
                "Unsupported database type".to_string(),
            )),
        }
    }

    /// Generate a fresh session id without persisting anything.
    pub fn mint_id() -> Result<String, SessionError> {
        Ok(gen_alphanumeric(SESSION_ID_LENGTH)?)
    }

    /// With no id, insert a fresh row (retrying on the vanishingly rare id
    /// collision) and return it. With an id, update `last_accessed`; `None`
    /// means the id is unknown and is for the caller to handle.
    #[tracing::instrument]
    pub async fn create_or_touch(id: Option<&str>) -> Result<Option<SessionRecord>, SessionError> {
        let store = GENERIC_DATA_STORE.lock().await;
        let now = Utc::now();

        match id {
            Some(id) => {
                if let Some(pool) = store.as_sqlite() {
                    touch_session_sqlite(pool, id, now).await
                } else if let Some(pool) = store.as_postgres() {
                    touch_session_postgres(pool, id, now).await
                } else {
                    Err(SessionError::Storage(
                        "Unsupported database type".to_string(),
                    ))
                }
            }
            None => loop {
                let id = Self::mint_id()?;
                let inserted = if let Some(pool) = store.as_sqlite() {
                    insert_session_sqlite(pool, &id, now).await?
                } else if let Some(pool) = store.as_postgres() {
                    insert_session_postgres(pool, &id, now).await?
                } else {
                    return Err(SessionError::Storage(
                        "Unsupported database type".to_string(),
                    ));
                };
                if inserted {
                    return Ok(Some(SessionRecord {
                        id,
                        last_accessed: now,
                        session_data: None,
                    }));
                }
                tracing::debug!("Session id collision, retrying with a fresh id");
            },
        }
    }

    /// Point lookup by id, no side effects.
    #[tracing::instrument]
    pub async fn get(id: &str) -> Result<Option<SessionRecord>, SessionError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            get_session_sqlite(pool, id).await
        } else if let Some(pool) = store.as_postgres() {
            get_session_postgres(pool, id).await
        } else {
            Err(SessionError::Storage(
                "Unsupported database type".to_string(),
            ))
        }
    }

    /// Delete the row for an id. Deleting an unknown id raises
    /// [`SessionError::InvalidSessionId`].
    #[tracing::instrument]
    pub async fn delete(id: &str) -> Result<(), SessionError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            delete_session_sqlite(pool, id).await
        } else if let Some(pool) = store.as_postgres() {
            delete_session_postgres(pool, id).await
        } else {
            Err(SessionError::Storage(
                "Unsupported database type".to_string(),
            ))
        }
    }

    /// Upsert the encoded session data for an id, touching `last_accessed`.
    pub async fn save_data(id: &str, data: Option<&str>) -> Result<(), SessionError> {
        let store = GENERIC_DATA_STORE.lock().await;
        let now = Utc::now();

        if let Some(pool) = store.as_sqlite() {
            save_session_data_sqlite(pool, id, data, now).await
        } else if let Some(pool) = store.as_postgres() {
            save_session_data_postgres(pool, id, data, now).await
        } else {
            Err(SessionError::Storage(
                "Unsupported database type".to_string(),
            ))
        }
    }
}
