use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite};

use crate::session::errors::SessionError;
use crate::session::types::SessionRecord;
use crate::storage::DB_TABLE_SESSIONS;

// SQLite implementations
pub(super) async fn create_tables_sqlite(pool: &Pool<Sqlite>) -> Result<(), SessionError> {
    let table_name = DB_TABLE_SESSIONS.as_str();

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            id TEXT PRIMARY KEY NOT NULL,
            last_accessed TIMESTAMP NOT NULL,
            session_data TEXT
        )
        "#,
        table_name
    ))
    .execute(pool)
    .await
    .map_err(|e| SessionError::Storage(e.to_string()))?;

    Ok(())
}

/// Insert a fresh session row. Returns false when the id collided with an
/// existing row so the caller can retry with a new id.
pub(super) async fn insert_session_sqlite(
    pool: &Pool<Sqlite>,
    id: &str,
    now: DateTime<Utc>,
) -> Result<bool, SessionError> {
    let table_name = DB_TABLE_SESSIONS.as_str();

    // Ensure tables exist before any operations - this is critical for in-memory
    // databases where different connections might get different database instances
    create_tables_sqlite(pool).await?;

    match sqlx::query(&format!(
        r#"
        INSERT INTO {} (id, last_accessed, session_data)
        VALUES (?, ?, NULL)
        "#,
        table_name
    ))
    .bind(id)
    .bind(now)
    .execute(pool)
    .await
    {
        Ok(_) => Ok(true),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Ok(false),
        Err(e) => Err(SessionError::Storage(e.to_string())),
    }
}

pub(super) async fn get_session_sqlite(
    pool: &Pool<Sqlite>,
    id: &str,
) -> Result<Option<SessionRecord>, SessionError> {
    let table_name = DB_TABLE_SESSIONS.as_str();

    sqlx::query_as::<_, SessionRecord>(&format!(
        r#"
        SELECT * FROM {} WHERE id = ?
        "#,
        table_name
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| SessionError::Storage(e.to_string()))
}

/// Update `last_accessed` for the given id. Zero affected rows means the id
/// is unknown; more than one aborts the transaction.
pub(super) async fn touch_session_sqlite(
    pool: &Pool<Sqlite>,
    id: &str,
    now: DateTime<Utc>,
) -> Result<Option<SessionRecord>, SessionError> {
    let table_name = DB_TABLE_SESSIONS.as_str();

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| SessionError::Storage(e.to_string()))?;

    let result = sqlx::query(&format!(
        r#"
        UPDATE {} SET last_accessed = ? WHERE id = ?
        "#,
        table_name
    ))
    .bind(now)
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(|e| SessionError::Storage(e.to_string()))?;

    match result.rows_affected() {
        0 => {
            tx.commit()
                .await
                .map_err(|e| SessionError::Storage(e.to_string()))?;
            Ok(None)
        }
        1 => {
            tx.commit()
                .await
                .map_err(|e| SessionError::Storage(e.to_string()))?;
            get_session_sqlite(pool, id).await
        }
        n => {
            tx.rollback()
                .await
                .map_err(|e| SessionError::Storage(e.to_string()))?;
            Err(SessionError::Integrity(format!(
                "touch affected {n} rows for a single session id"
            )))
        }
    }
}

pub(super) async fn delete_session_sqlite(
    pool: &Pool<Sqlite>,
    id: &str,
) -> Result<(), SessionError> {
    let table_name = DB_TABLE_SESSIONS.as_str();

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| SessionError::Storage(e.to_string()))?;

    let result = sqlx::query(&format!(
        r#"
        DELETE FROM {} WHERE id = ?
        "#,
        table_name
    ))
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(|e| SessionError::Storage(e.to_string()))?;

    match result.rows_affected() {
        0 => {
            tx.rollback()
                .await
                .map_err(|e| SessionError::Storage(e.to_string()))?;
            Err(SessionError::InvalidSessionId(id.to_string()))
        }
        1 => tx
            .commit()
            .await
            .map_err(|e| SessionError::Storage(e.to_string())),
        n => {
            tx.rollback()
                .await
                .map_err(|e| SessionError::Storage(e.to_string()))?;
            Err(SessionError::Integrity(format!(
                "delete affected {n} rows for a single session id"
            )))
        }
    }
}

/// Upsert the encoded session data for an id, touching `last_accessed`.
pub(super) async fn save_session_data_sqlite(
    pool: &Pool<Sqlite>,
    id: &str,
    data: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(), SessionError> {
    let table_name = DB_TABLE_SESSIONS.as_str();

    create_tables_sqlite(pool).await?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| SessionError::Storage(e.to_string()))?;

    let result = sqlx::query(&format!(
        r#"
        INSERT INTO {} (id, last_accessed, session_data)
        VALUES (?, ?, ?)
        ON CONFLICT (id) DO UPDATE SET
            last_accessed = excluded.last_accessed,
            session_data = excluded.session_data
        "#,
        table_name
    ))
    .bind(id)
    .bind(now)
    .bind(data)
    .execute(&mut *tx)
    .await
    .map_err(|e| SessionError::Storage(e.to_string()))?;

    match result.rows_affected() {
        0 | 1 => tx
            .commit()
            .await
            .map_err(|e| SessionError::Storage(e.to_string())),
        n => {
            tx.rollback()
                .await
                .map_err(|e| SessionError::Storage(e.to_string()))?;
            Err(SessionError::Integrity(format!(
                "save affected {n} rows for a single session id"
            )))
        }
    }
}
