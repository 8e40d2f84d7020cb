use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::session::errors::SessionError;
use crate::session::types::SessionRecord;
use crate::storage::DB_TABLE_SESSIONS;

// PostgreSQL implementations
pub(super) async fn create_tables_postgres(pool: &Pool<Postgres>) -> Result<(), SessionError> {
    let table_name = DB_TABLE_SESSIONS.as_str();

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            id TEXT PRIMARY KEY NOT NULL,
            last_accessed TIMESTAMPTZ NOT NULL,
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

pub(super) async fn insert_session_postgres(
    pool: &Pool<Postgres>,
    id: &str,
    now: DateTime<Utc>,
) -> Result<bool, SessionError> {
    let table_name = DB_TABLE_SESSIONS.as_str();

    create_tables_postgres(pool).await?;

    match sqlx::query(&format!(
        r#"
        INSERT INTO {} (id, last_accessed, session_data)
        VALUES ($1, $2, NULL)
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

pub(super) async fn get_session_postgres(
    pool: &Pool<Postgres>,
    id: &str,
) -> Result<Option<SessionRecord>, SessionError> {
    let table_name = DB_TABLE_SESSIONS.as_str();

    sqlx::query_as::<_, SessionRecord>(&format!(
        r#"
        SELECT * FROM {} WHERE id = $1
        "#,
        table_name
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| SessionError::Storage(e.to_string()))
}

pub(super) async fn touch_session_postgres(
    pool: &Pool<Postgres>,
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
        UPDATE {} SET last_accessed = $1 WHERE id = $2
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
            get_session_postgres(pool, id).await
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

pub(super) async fn delete_session_postgres(
    pool: &Pool<Postgres>,
    id: &str,
) -> Result<(), SessionError> {
    let table_name = DB_TABLE_SESSIONS.as_str();

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| SessionError::Storage(e.to_string()))?;

    let result = sqlx::query(&format!(
        r#"
        DELETE FROM {} WHERE id = $1
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

pub(super) async fn save_session_data_postgres(
    pool: &Pool<Postgres>,
    id: &str,
    data: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(), SessionError> {
    let table_name = DB_TABLE_SESSIONS.as_str();

    create_tables_postgres(pool).await?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| SessionError::Storage(e.to_string()))?;

    let result = sqlx::query(&format!(
        r#"
        INSERT INTO {} (id, last_accessed, session_data)
        VALUES ($1, $2, $3)
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
