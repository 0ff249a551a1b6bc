//! Database operations for `chat_sessions` and `chat_messages`.
//!
//! Sessions are read inputs to the matching engine; the only write is
//! appending stored messages. Conversation content is never mutated here.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `chat_sessions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionRow {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A row from the `chat_messages` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MessageRow {
    pub id: Uuid,
    pub session_id: Uuid,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Fetch a session by id. `None` for unknown sessions.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_session(pool: &PgPool, id: Uuid) -> Result<Option<SessionRow>, DbError> {
    let row = sqlx::query_as::<_, SessionRow>(
        "SELECT id, creator_id, created_at FROM chat_sessions WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Last `limit` messages for a session, newest first.
///
/// Callers reverse to chronological order before building context strings.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn recent_messages(
    pool: &PgPool,
    session_id: Uuid,
    limit: i64,
) -> Result<Vec<MessageRow>, DbError> {
    let rows = sqlx::query_as::<_, MessageRow>(
        "SELECT id, session_id, role, content, created_at \
         FROM chat_messages \
         WHERE session_id = $1 \
         ORDER BY created_at DESC \
         LIMIT $2",
    )
    .bind(session_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Append a message to a session.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn append_message(
    pool: &PgPool,
    session_id: Uuid,
    role: &str,
    content: &str,
) -> Result<MessageRow, DbError> {
    let row = sqlx::query_as::<_, MessageRow>(
        "INSERT INTO chat_messages (session_id, role, content) \
         VALUES ($1, $2, $3) \
         RETURNING id, session_id, role, content, created_at",
    )
    .bind(session_id)
    .bind(role)
    .bind(content)
    .fetch_one(pool)
    .await?;
    Ok(row)
}
